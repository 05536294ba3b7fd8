use crate::utils::{math::DEFAULT_LR_THRESHOLD, AncestryModel, Result};
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="snpcross",
          version=&**FULL_VERSION,
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Identify a sample as a panel accession, an F1 or an F2 cross")]
    Identify(IdentifyArgs),
    #[clap(about = "Genotype cross progeny window by window against two parents")]
    Genotype(GenotypeArgs),
    #[clap(about = "Decode the ancestry of a cross sample along each chromosome")]
    Ancestry(AncestryArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("identify")))]
#[command(arg_required_else_help(true))]
pub struct IdentifyArgs {
    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "panel")]
    #[clap(help = "Reference panel of accession genotypes (TSV, optionally gzipped)")]
    #[clap(value_name = "PANEL")]
    #[arg(value_parser = check_file_exists)]
    pub panel_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "input")]
    #[clap(help = "Sample genotypes (VCF, BCF or BED-like text)")]
    #[clap(value_name = "INPUT")]
    #[arg(value_parser = check_file_exists)]
    pub input_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(short = 'w')]
    #[clap(long = "window")]
    #[clap(help = "Window length in bp")]
    #[clap(value_name = "WINDOW")]
    #[clap(default_value = "300000")]
    #[arg(value_parser = window_len_positive)]
    pub window_len: u64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "genome")]
    #[clap(value_name = "GENOME")]
    #[clap(help = "Genome layout (tair10 or file with label, length and cM/Mb per line)")]
    #[clap(default_value = "tair10")]
    pub genome: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "lr-threshold")]
    #[clap(value_name = "LR")]
    #[clap(help = "Likelihood ratio below which accessions are indistinguishable")]
    #[clap(default_value_t = DEFAULT_LR_THRESHOLD)]
    #[arg(value_parser = lr_threshold_valid)]
    pub lr_threshold: f64,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("samples").required(true).args(["input_path", "population_path"])))]
#[command(group(ArgGroup::new("parent_source").required(true).args(["parents", "parent_paths"])))]
#[command(arg_required_else_help(true))]
pub struct GenotypeArgs {
    #[clap(short = 'p')]
    #[clap(long = "panel")]
    #[clap(help = "Reference panel holding both parents")]
    #[clap(value_name = "PANEL")]
    #[clap(requires = "parents")]
    #[arg(value_parser = check_file_exists)]
    pub panel_path: Option<PathBuf>,

    #[clap(long = "parents")]
    #[clap(help = "Parents in the panel, given as ID1xID2")]
    #[clap(value_name = "PARENTS")]
    #[clap(requires = "panel_path")]
    #[arg(value_parser = check_parents_format)]
    pub parents: Option<String>,

    #[clap(long = "parent-files")]
    #[clap(help = "Genotype files of the two parents")]
    #[clap(value_name = "PARENT")]
    #[clap(num_args = 2)]
    #[arg(value_parser = check_file_exists)]
    pub parent_paths: Option<Vec<PathBuf>>,

    #[clap(short = 'i')]
    #[clap(long = "input")]
    #[clap(help = "Genotypes of a single cross sample")]
    #[clap(value_name = "INPUT")]
    #[arg(value_parser = check_file_exists)]
    pub input_path: Option<PathBuf>,

    #[clap(long = "population")]
    #[clap(help = "Genotype matrix of a cross population (TSV, one column per sample)")]
    #[clap(value_name = "MATRIX")]
    #[arg(value_parser = check_file_exists)]
    pub population_path: Option<PathBuf>,

    #[clap(long = "good-samples")]
    #[clap(help = "File listing the population samples to keep")]
    #[clap(value_name = "SAMPLES")]
    #[clap(requires = "population_path")]
    #[arg(value_parser = check_file_exists)]
    pub good_samples_path: Option<PathBuf>,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output file")]
    #[clap(value_name = "OUTPUT")]
    #[arg(value_parser = check_prefix_path)]
    pub output_path: String,

    #[clap(short = 'w')]
    #[clap(long = "window")]
    #[clap(help = "Window length in bp")]
    #[clap(value_name = "WINDOW")]
    #[clap(default_value = "200000")]
    #[arg(value_parser = window_len_positive)]
    pub window_len: u64,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "genome")]
    #[clap(value_name = "GENOME")]
    #[clap(help = "Genome layout (tair10 or file with label, length and cM/Mb per line)")]
    #[clap(default_value = "tair10")]
    pub genome: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "lr-threshold")]
    #[clap(value_name = "LR")]
    #[clap(help = "Likelihood ratio below which a window is left uncalled")]
    #[clap(default_value_t = DEFAULT_LR_THRESHOLD)]
    #[arg(value_parser = lr_threshold_valid)]
    pub lr_threshold: f64,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("ancestry")))]
#[command(arg_required_else_help(true))]
pub struct AncestryArgs {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "input")]
    #[clap(help = "Genotypes of the cross sample at segregating sites")]
    #[clap(value_name = "INPUT")]
    #[arg(value_parser = check_file_exists)]
    pub input_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output TSV of decoded states")]
    #[clap(value_name = "OUTPUT")]
    #[arg(value_parser = check_prefix_path)]
    pub output_path: String,

    #[clap(short = 'm')]
    #[clap(long = "model")]
    #[clap(value_name = "MODEL")]
    #[clap(help = "Ancestry model (het or f2)")]
    #[clap(default_value = "f2")]
    pub model: AncestryModel,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "genome")]
    #[clap(value_name = "GENOME")]
    #[clap(help = "Genome layout (tair10 or file with label, length and cM/Mb per line)")]
    #[clap(default_value = "tair10")]
    pub genome: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "recomb-rate")]
    #[clap(value_name = "CM_PER_MB")]
    #[clap(help = "Recombination rate [default: 3.3 for het, 3.5 for f2]")]
    pub recomb_rate: Option<f64>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "avg-depth")]
    #[clap(value_name = "DEPTH")]
    #[clap(help = "Average sequencing depth at called sites")]
    #[clap(default_value = "1.5")]
    pub avg_depth: f64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "base-error")]
    #[clap(value_name = "RATE")]
    #[clap(help = "Sequencing error rate [default: 0.0001 for het, 0.01 for f2]")]
    #[arg(value_parser = ensure_unit_float)]
    pub base_error: Option<f64>,

    #[clap(help_heading("Het model"))]
    #[clap(long = "delta-het-parents")]
    #[clap(value_name = "FRACTION")]
    #[clap(help = "Fraction of sites where the parental genomes are heterozygous [default: 0.99]")]
    #[arg(value_parser = ensure_unit_float)]
    pub delta_het_parents: Option<f64>,

    #[clap(help_heading("Het model"))]
    #[clap(long = "sites-segregating")]
    #[clap(value_name = "FRACTION")]
    #[clap(help = "Fraction of sites segregating between the parents [default: 0.01]")]
    #[arg(value_parser = ensure_unit_float)]
    pub sites_segregating: Option<f64>,

    #[clap(help_heading("F2 model"))]
    #[clap(long = "error-p1")]
    #[clap(value_name = "RATE")]
    #[clap(help = "Genotyping error rate of the first parent [default: 0.00001]")]
    #[arg(value_parser = ensure_unit_float)]
    pub error_p1: Option<f64>,

    #[clap(help_heading("F2 model"))]
    #[clap(long = "error-p2")]
    #[clap(value_name = "RATE")]
    #[clap(help = "Genotyping error rate of the second parent [default: 0.00001]")]
    #[arg(value_parser = ensure_unit_float)]
    pub error_p2: Option<f64>,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn window_len_positive(s: &str) -> Result<u64> {
    let len: u64 = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid window length", s))?;
    if len >= 1 {
        Ok(len)
    } else {
        Err("Window length must be at least 1".into())
    }
}

fn lr_threshold_valid(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if value.is_finite() && value >= 1.0 {
        Ok(value)
    } else {
        Err(format!("Likelihood ratio threshold must be at least 1, got: {}", value))
    }
}

fn check_parents_format(s: &str) -> Result<String> {
    match s.split_once('x') {
        Some((p1, p2)) if !p1.is_empty() && !p2.is_empty() && !p2.contains('x') => Ok(s.to_string()),
        _ => Err(format!("Parents should be given as ID1xID2, got: {}", s)),
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn ensure_unit_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between 0.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}
