use super::sample::{weights_from_pl, SampleInputs};
use crate::utils::{Genotype, Result};
use rust_htslib::bcf::{self, Read};
use std::path::Path;

/// Loads the first sample of a VCF/BCF file. Only biallelic records with a
/// genotype call are kept; weights come from `PL` when present and from `GT`
/// otherwise.
pub fn read_vcf(path: &Path) -> Result<SampleInputs> {
    log::info!("Start loading VCF {:?}", path);
    let mut reader = bcf::Reader::from_path(path)
        .map_err(|e| format!("Failed to open VCF file {}: {}", path.display(), e))?;

    let sample_count = reader.header().sample_count();
    if sample_count == 0 {
        return Err(format!("VCF file has no samples: {}", path.display()));
    }
    if sample_count > 1 {
        log::warn!(
            "{} has {} samples, only the first one is used",
            path.display(),
            sample_count
        );
    }

    let mut inputs = SampleInputs::default();
    let mut skipped = 0;
    let mut no_calls = 0;
    for result in reader.records() {
        let record = result.map_err(|e| format!("Error reading VCF record: {}", e))?;
        if record.alleles().len() != 2 {
            skipped += 1;
            continue;
        }

        let rid = record
            .rid()
            .ok_or_else(|| "VCF record without a chromosome".to_string())?;
        let chrom = record
            .header()
            .rid2name(rid)
            .map_err(|e| format!("Unknown chromosome id {}: {}", rid, e))?;
        let chrom = String::from_utf8_lossy(chrom).to_string();

        let genotypes = record
            .genotypes()
            .map_err(|e| format!("Error accessing FORMAT GT at {}:{}: {}", chrom, record.pos() + 1, e))?;
        let alleles: Vec<Option<u32>> = genotypes.get(0).iter().map(|a| a.index()).collect();
        let genotype = Genotype::from_alleles(&alleles);
        if !genotype.is_called() {
            no_calls += 1;
            continue;
        }

        let weights = match record.format(b"PL").integer() {
            Ok(pl) => weights_from_pl(pl[0]),
            Err(_) => None,
        }
        .unwrap_or_else(|| genotype.one_hot_weights());

        let depth = match record.format(b"DP").integer() {
            Ok(dp) => dp[0].first().and_then(|d| u32::try_from(*d).ok()),
            Err(_) => None,
        };

        inputs.push(&chrom, record.pos() as u64 + 1, genotype, weights, depth);
    }

    if skipped > 0 {
        log::debug!("Skipped {} multiallelic records in {}", skipped, path.display());
    }
    if no_calls > 0 {
        log::debug!("Skipped {} records without a genotype call in {}", no_calls, path.display());
    }
    log::info!("Finished loading VCF {:?}", path);
    Ok(inputs)
}
