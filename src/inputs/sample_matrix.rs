use super::panel::GenotypeMatrix;
use super::table::GenotypeTable;
use crate::utils::{open_text_reader, Genotype, Result};
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

/// Genotypes of a segregating population, one column per sample.
#[derive(Debug, Clone)]
pub struct SampleMatrix {
    pub samples: Vec<String>,
    /// Normalized chromosome labels, one per site.
    pub chrs: Vec<String>,
    pub positions: Vec<u64>,
    pub calls: GenotypeMatrix,
}

impl SampleMatrix {
    pub fn from_path(path: &Path, good_samples: Option<&Path>) -> Result<Self> {
        log::info!("Loading sample matrix {}", path.display());
        let reader = open_text_reader(path)?;
        let matrix = Self::from_reader(reader)
            .map_err(|e| format!("Sample matrix {}: {}", path.display(), e))?;
        let matrix = match good_samples {
            Some(list_path) => {
                let list = read_sample_list(open_text_reader(list_path)?)?;
                matrix.filter_good_samples(&list)?
            }
            None => matrix,
        };
        log::info!("Number of samples: {}", matrix.num_samples());
        Ok(matrix)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let table = GenotypeTable::from_reader(reader)?;
        let calls = GenotypeMatrix::new(table.positions.len(), table.columns.len(), table.calls)?;
        Ok(Self {
            samples: table.columns,
            chrs: table.chrs,
            positions: table.positions,
            calls,
        })
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn num_sites(&self) -> usize {
        self.positions.len()
    }

    /// Keeps the columns whose sample name is listed. A name like `12_A_x`
    /// is looked up as `12`, then as `12A`.
    pub fn filter_good_samples(self, good_samples: &HashSet<String>) -> Result<Self> {
        let keep: Vec<usize> = self
            .samples
            .iter()
            .enumerate()
            .filter(|(_, name)| is_good_sample(name, good_samples))
            .map(|(ix, _)| ix)
            .collect();
        log::debug!(
            "Kept {} of {} samples from the good samples list",
            keep.len(),
            self.samples.len()
        );

        if keep.is_empty() {
            return Err("No sample of the matrix is on the good samples list".to_string());
        }

        let mut data = Vec::with_capacity(self.num_sites() * keep.len());
        for site in 0..self.num_sites() {
            data.extend(keep.iter().map(|&sample| self.calls.get(site, sample)));
        }
        let calls = GenotypeMatrix::new(self.num_sites(), keep.len(), data)?;
        Ok(Self {
            samples: keep.iter().map(|&ix| self.samples[ix].clone()).collect(),
            chrs: self.chrs,
            positions: self.positions,
            calls,
        })
    }

    /// Calls of one sample on the given rows.
    pub fn sample_calls(&self, sample: usize, rows: &[usize]) -> Vec<Genotype> {
        rows.iter().map(|&row| self.calls.get(row, sample)).collect()
    }
}

fn is_good_sample(name: &str, good_samples: &HashSet<String>) -> bool {
    let mut fields = name.split('_');
    let first = fields.next().unwrap_or(name);
    if good_samples.contains(first) {
        return true;
    }
    match fields.next() {
        Some(second) => good_samples.contains(&format!("{}{}", first, second)),
        None => false,
    }
}

pub fn read_sample_list<R: BufRead>(reader: R) -> Result<HashSet<String>> {
    let mut samples = HashSet::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
        if let Some(id) = line.split_whitespace().next() {
            samples.insert(id.to_string());
        }
    }
    Ok(samples)
}
