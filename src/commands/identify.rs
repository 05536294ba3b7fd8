use crate::cli::IdentifyArgs;
use crate::cross::CrossIdentifier;
use crate::inputs::{read_sample, ReferencePanel};
use crate::utils::{GenomeLayout, Result};

pub fn identify(args: IdentifyArgs) -> Result<()> {
    let layout = GenomeLayout::new(&args.genome)?;
    let panel = ReferencePanel::from_path(&args.panel_path)?;
    let mut sample = read_sample(&args.input_path)?;
    sample.filter_chr_names(&panel)?;

    let identifier = CrossIdentifier::new(&panel, &layout, args.window_len, args.lr_threshold);
    let report = identifier.run(&sample, &args.output_prefix)?;
    if let Some(parents) = &report.parents {
        match &parents.father {
            Some((father, _)) => log::info!("Parents: {} and {}", parents.mother.0, father),
            None => log::info!("Parent: {}", parents.mother.0),
        }
    }
    log::info!("Finished identification: {}.matches.json", args.output_prefix);
    Ok(())
}
