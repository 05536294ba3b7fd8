use clap::Parser;
use snpcross::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{ancestry, genotype, identify},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Identify(_) => "identify",
        Command::Genotype(_) => "genotype",
        Command::Ancestry(_) => "ancestry",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Identify(args) => identify::identify(args)?,
        Command::Genotype(args) => genotype::genotype(args)?,
        Command::Ancestry(args) => ancestry::ancestry(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
