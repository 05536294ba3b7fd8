use crate::cli::AncestryArgs;
use crate::cross::writers::TableWriter;
use crate::hmm::{
    build_f2_hmm, build_het_stretch_hmm, AncestryHmm, AncestryState, F2AncestryParams, HetStretchParams,
};
use crate::inputs::{read_sample, SampleInputs};
use crate::utils::{AncestryModel, GenomeLayout, Genotype, Result};
use itertools::Itertools;

/// Decoded state of one site.
#[derive(Debug, Clone, PartialEq)]
pub struct AncestryRow<S> {
    pub chrom: String,
    pub position: u64,
    pub genotype: Genotype,
    pub state: S,
}

impl<S: AncestryState> AncestryRow<S> {
    pub fn to_line(&self) -> String {
        format!("{}\t{}\t{}\t{}", self.chrom, self.position, self.genotype, self.state)
    }
}

pub fn ancestry(args: AncestryArgs) -> Result<()> {
    let layout = GenomeLayout::new(&args.genome)?;
    let sample = read_sample(&args.input_path)?;
    let mut writer = TableWriter::new(&args.output_path)?;

    match args.model {
        AncestryModel::HetStretches => {
            let params = het_stretch_params(&args);
            log::info!("Decoding stretches of heterozygosity");
            let rows = decode_chromosomes(&sample, &layout, |size_mb, num_markers| {
                build_het_stretch_hmm(&params, size_mb, num_markers)
            })?;
            write_rows(&mut writer, &rows)?;
        }
        AncestryModel::F2 => {
            let params = f2_params(&args);
            log::info!("Decoding F2 ancestry");
            let rows = decode_chromosomes(&sample, &layout, |size_mb, num_markers| {
                build_f2_hmm(&params, size_mb, num_markers)
            })?;
            write_rows(&mut writer, &rows)?;
        }
    }

    writer.finish()?;
    log::info!("Finished ancestry decoding: {}", args.output_path);
    Ok(())
}

/// Model parameters from the command line, falling back to the model defaults.
pub fn het_stretch_params(args: &AncestryArgs) -> HetStretchParams {
    let defaults = HetStretchParams::default();
    HetStretchParams {
        avg_depth: args.avg_depth,
        delta_het_parents: args.delta_het_parents.unwrap_or(defaults.delta_het_parents),
        avg_sites_segregating: args.sites_segregating.unwrap_or(defaults.avg_sites_segregating),
        base_error: args.base_error.unwrap_or(defaults.base_error),
        recomb_rate: args.recomb_rate.unwrap_or(defaults.recomb_rate),
    }
}

pub fn f2_params(args: &AncestryArgs) -> F2AncestryParams {
    let defaults = F2AncestryParams::default();
    F2AncestryParams {
        recomb_rate: args.recomb_rate.unwrap_or(defaults.recomb_rate),
        error_p1: args.error_p1.unwrap_or(defaults.error_p1),
        error_p2: args.error_p2.unwrap_or(defaults.error_p2),
        base_error: args.base_error.unwrap_or(defaults.base_error),
        avg_depth: args.avg_depth,
    }
}

/// Builds one model per chromosome of the layout from its size and number
/// of sites, and decodes the sample calls on it.
pub fn decode_chromosomes<S, F>(sample: &SampleInputs, layout: &GenomeLayout, build: F) -> Result<Vec<AncestryRow<S>>>
where
    S: AncestryState,
    F: Fn(f64, usize) -> Result<AncestryHmm<S>>,
{
    let mut rows = Vec::with_capacity(sample.len());
    let mut num_decoded = 0;
    for spec in layout.chromosomes() {
        let sites = sample.chromosome_rows(&spec.label);
        if sites.is_empty() {
            log::warn!("No sites on chromosome {}", spec.label);
            continue;
        }
        if sites.iter().tuple_windows().any(|(a, b)| sample.positions[*a] > sample.positions[*b]) {
            return Err(format!("Positions on chromosome {} are not sorted", spec.label));
        }

        let model = build(spec.length as f64 / 1_000_000.0, sites.len())
            .map_err(|e| format!("Chromosome {}: {}", spec.label, e))?;
        let genotypes = sites.iter().map(|row| sample.genotypes[*row]).collect_vec();
        let path = model.decode(&genotypes)?;
        log::info!(
            "Chromosome {}: {} sites, log-likelihood {:.4}",
            spec.label,
            sites.len(),
            path.log_likelihood
        );

        rows.extend(sites.iter().zip(path.states).map(|(row, state)| AncestryRow {
            chrom: spec.label.clone(),
            position: sample.positions[*row],
            genotype: sample.genotypes[*row],
            state,
        }));
        num_decoded += 1;
    }

    if num_decoded == 0 {
        return Err("None of the sample chromosomes are part of the genome layout".to_string());
    }
    Ok(rows)
}

fn write_rows<S: AncestryState>(writer: &mut TableWriter, rows: &[AncestryRow<S>]) -> Result<()> {
    for row in rows {
        writer.write_line(&row.to_line())?;
    }
    Ok(())
}
