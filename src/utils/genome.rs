use crate::utils::{normalize_chrom_label, Result};
use std::{fs, io::BufRead};

/// Arabidopsis thaliana (TAIR10) nuclear chromosomes.
const TAIR10_LABELS: [&str; 5] = ["1", "2", "3", "4", "5"];
const TAIR10_LENGTHS: [u64; 5] = [30427671, 19698289, 23459830, 18585056, 26975502];
// cM/Mb, Salome et al. 2011
const TAIR10_RECOMB_RATES: [f64; 5] = [3.4, 3.6, 3.5, 3.8, 3.6];

#[derive(Debug, PartialEq, Clone)]
pub struct ChromosomeSpec {
    pub label: String,
    pub length: u64,
    pub recomb_rate: f64,
}

/// Ordered chromosome set that every binning call walks through.
#[derive(Debug, PartialEq, Clone)]
pub struct GenomeLayout {
    chromosomes: Vec<ChromosomeSpec>,
}

impl GenomeLayout {
    pub fn new(encoding: &str) -> Result<Self> {
        match encoding.to_lowercase().as_str() {
            "tair10" | "athaliana" => Ok(Self::tair10()),
            _ => {
                let file =
                    fs::File::open(encoding).map_err(|e| format!("File {}: {}", encoding, e))?;
                let reader = std::io::BufReader::new(file);
                Self::from_reader(reader)
            }
        }
    }

    pub fn tair10() -> Self {
        let chromosomes = TAIR10_LABELS
            .iter()
            .zip(TAIR10_LENGTHS.iter())
            .zip(TAIR10_RECOMB_RATES.iter())
            .map(|((label, length), rate)| ChromosomeSpec {
                label: label.to_string(),
                length: *length,
                recomb_rate: *rate,
            })
            .collect();
        Self { chromosomes }
    }

    pub fn from_specs(chromosomes: Vec<ChromosomeSpec>) -> Result<Self> {
        if chromosomes.is_empty() {
            return Err("Genome layout must contain at least one chromosome".to_string());
        }
        let mut seen = Vec::with_capacity(chromosomes.len());
        let mut normalized = Vec::with_capacity(chromosomes.len());
        for spec in chromosomes {
            let label = normalize_chrom_label(&spec.label);
            if seen.contains(&label) {
                return Err(format!("Duplicate chromosome in genome layout: {}", spec.label));
            }
            if spec.length == 0 {
                return Err(format!("Chromosome {} has zero length", spec.label));
            }
            seen.push(label.clone());
            normalized.push(ChromosomeSpec { label, ..spec });
        }
        Ok(Self {
            chromosomes: normalized,
        })
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut chromosomes = Vec::new();

        for (line_number, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let missing = || format!("Missing chromosome/length/rate at line {}", line_number + 1);
            let label = parts.next().ok_or_else(missing)?;
            let length = parts
                .next()
                .ok_or_else(missing)?
                .parse::<u64>()
                .map_err(|e| format!("Invalid length at line {}: {}", line_number + 1, e))?;
            let recomb_rate = parts
                .next()
                .ok_or_else(missing)?
                .parse::<f64>()
                .map_err(|e| format!("Invalid recombination rate at line {}: {}", line_number + 1, e))?;

            chromosomes.push(ChromosomeSpec {
                label: label.to_string(),
                length,
                recomb_rate,
            });
        }

        Self::from_specs(chromosomes)
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn chromosomes(&self) -> &[ChromosomeSpec] {
        &self.chromosomes
    }

    pub fn get(&self, chrom_index: usize) -> Option<&ChromosomeSpec> {
        self.chromosomes.get(chrom_index)
    }

    pub fn label(&self, chrom_index: usize) -> &str {
        &self.chromosomes[chrom_index].label
    }

    /// Index of a raw chromosome label in the layout, after normalization.
    pub fn chrom_index(&self, label: &str) -> Option<usize> {
        let label = normalize_chrom_label(label);
        self.chromosomes.iter().position(|c| c.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tair10_layout() {
        let layout = GenomeLayout::new("TAIR10").unwrap();
        assert_eq!(layout.len(), 5);
        assert_eq!(layout.label(0), "1");
        assert_eq!(layout.get(4).unwrap().length, 26975502);
        assert_eq!(layout.get(3).unwrap().recomb_rate, 3.8);
    }

    #[test]
    fn test_chrom_index_normalizes_labels() {
        let layout = GenomeLayout::tair10();
        assert_eq!(layout.chrom_index("Chr1"), Some(0));
        assert_eq!(layout.chrom_index("chr5"), Some(4));
        assert_eq!(layout.chrom_index("ChrM"), None);
    }

    #[test]
    fn test_layout_from_reader() {
        let data = "\
# label length rate\n\
chrA 1000 2.5\n\
chrB 2000 3.0\n";
        let layout = GenomeLayout::from_reader(std::io::Cursor::new(data)).unwrap();
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.label(1), "b");
        assert_eq!(layout.chrom_index("ChrB"), Some(1));
        assert_eq!(layout.get(0).unwrap().length, 1000);
    }

    #[test]
    fn test_layout_from_reader_incomplete_line() {
        let data = "chrA 1000\n";
        assert!(GenomeLayout::from_reader(std::io::Cursor::new(data)).is_err());
    }

    #[test]
    fn test_layout_from_reader_duplicate() {
        let data = "chr1 1000 3.0\n1 2000 3.0\n";
        assert!(GenomeLayout::from_reader(std::io::Cursor::new(data)).is_err());
    }

    #[test]
    fn test_layout_from_reader_empty_file() {
        assert!(GenomeLayout::from_reader(std::io::Cursor::new("")).is_err());
    }
}
