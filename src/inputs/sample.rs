use super::{panel::ReferencePanel, vcf_reader::read_vcf};
use crate::utils::{normalize_chrom_label, open_text_reader, Genotype, Result};
use std::io::BufRead;
use std::path::Path;

/// Genotype calls of one sample, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleInputs {
    /// Normalized chromosome labels.
    pub chrs: Vec<String>,
    pub positions: Vec<u64>,
    pub genotypes: Vec<Genotype>,
    /// `[w_homref, w_het, w_homalt]` per site.
    pub weights: Vec<[f64; 3]>,
    pub depths: Vec<Option<u32>>,
}

impl SampleInputs {
    pub fn push(
        &mut self,
        chrom: &str,
        position: u64,
        genotype: Genotype,
        weights: [f64; 3],
        depth: Option<u32>,
    ) {
        self.chrs.push(normalize_chrom_label(chrom));
        self.positions.push(position);
        self.genotypes.push(genotype);
        self.weights.push(weights);
        self.depths.push(depth);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Mean read depth over the sites reporting one, NaN when none do.
    pub fn mean_depth(&self) -> f64 {
        let depths: Vec<f64> = self.depths.iter().flatten().map(|d| *d as f64).collect();
        if depths.is_empty() {
            f64::NAN
        } else {
            depths.iter().sum::<f64>() / depths.len() as f64
        }
    }

    /// Keeps only the sites on chromosomes the reference panel knows about.
    pub fn filter_chr_names(&mut self, panel: &ReferencePanel) -> Result<()> {
        let keep: Vec<bool> = self.chrs.iter().map(|c| panel.has_chromosome(c)).collect();
        let kept = keep.iter().filter(|k| **k).count();
        if kept == 0 {
            return Err("None of the sample chromosomes are present in the reference panel".into());
        }
        if kept < self.len() {
            log::info!(
                "Removed {} sites on chromosomes absent from the reference panel",
                self.len() - kept
            );
        }
        *self = self.subset(|row| keep[row]);
        Ok(())
    }

    pub fn subset<F>(&self, keep: F) -> Self
    where
        F: Fn(usize) -> bool,
    {
        let mut subset = SampleInputs::default();
        for row in (0..self.len()).filter(|row| keep(*row)) {
            subset.chrs.push(self.chrs[row].clone());
            subset.positions.push(self.positions[row]);
            subset.genotypes.push(self.genotypes[row]);
            subset.weights.push(self.weights[row]);
            subset.depths.push(self.depths[row]);
        }
        subset
    }

    /// Rows on one chromosome, in input order.
    pub fn chromosome_rows(&self, label: &str) -> Vec<usize> {
        let label = normalize_chrom_label(label);
        self.chrs
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == label)
            .map(|(row, _)| row)
            .collect()
    }
}

/// Reads a sample from a VCF/BCF file or from a whitespace separated
/// `chrom pos genotype [depth]` text file.
pub fn read_sample(path: &Path) -> Result<SampleInputs> {
    let name = path.to_string_lossy().to_lowercase();
    let inputs = if name.ends_with(".vcf") || name.ends_with(".vcf.gz") || name.ends_with(".bcf") {
        read_vcf(path)?
    } else {
        let reader = open_text_reader(path)?;
        read_bed(reader).map_err(|e| format!("{}: {}", path.display(), e))?
    };
    if inputs.is_empty() {
        return Err(format!("No usable sites found in {}", path.display()));
    }
    log::info!("Loaded {} sites from {}", inputs.len(), path.display());
    Ok(inputs)
}

/// Sites without a call are dropped.
pub fn read_bed<R: BufRead>(reader: R) -> Result<SampleInputs> {
    let mut inputs = SampleInputs::default();
    let mut no_calls = 0;
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(format!(
                "Expected 'chrom pos genotype [depth]' at line {}: {}",
                line_number + 1,
                line
            ));
        }
        let position = fields[1]
            .parse::<u64>()
            .map_err(|e| format!("Invalid position at line {}: {}", line_number + 1, e))?;
        let genotype = fields[2]
            .parse::<Genotype>()
            .map_err(|e| format!("{} at line {}", e, line_number + 1))?;
        if !genotype.is_called() {
            no_calls += 1;
            continue;
        }
        let depth = match fields.get(3) {
            Some(dp) => Some(
                dp.parse::<u32>()
                    .map_err(|e| format!("Invalid depth at line {}: {}", line_number + 1, e))?,
            ),
            None => None,
        };
        inputs.push(fields[0], position, genotype, genotype.one_hot_weights(), depth);
    }
    if no_calls > 0 {
        log::debug!("Skipped {} sites without a genotype call", no_calls);
    }
    Ok(inputs)
}

/// Normalized genotype likelihoods from phred-scaled PL values
/// (hom-ref, het, hom-alt).
pub fn weights_from_pl(pl: &[i32]) -> Option<[f64; 3]> {
    if pl.len() < 3 || pl[..3].iter().any(|v| *v < 0) {
        return None;
    }
    let mut weights = [0.0; 3];
    for (w, phred) in weights.iter_mut().zip(&pl[..3]) {
        *w = 10f64.powf(-(*phred as f64) / 10.0);
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }
    weights.iter_mut().for_each(|w| *w /= total);
    Some(weights)
}
