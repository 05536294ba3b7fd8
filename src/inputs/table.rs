use crate::utils::{normalize_chrom_label, Genotype, Result};
use std::io::BufRead;

/// Tab-separated genotype table: `chrom pos name1 name2 ...` header followed by
/// one row per site. Shared by the reference panel and the population matrix.
#[derive(Debug)]
pub struct GenotypeTable {
    pub columns: Vec<String>,
    pub chrs: Vec<String>,
    pub positions: Vec<u64>,
    pub calls: Vec<Genotype>,
}

impl GenotypeTable {
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines().enumerate();

        let columns = loop {
            match lines.next() {
                None => return Err("Reached end of file before parsing table header".to_string()),
                Some((line_number, line)) => {
                    let line = line
                        .map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
                    if line.trim().is_empty() || line.starts_with("##") {
                        continue;
                    }
                    let header: Vec<&str> = line.split('\t').collect();
                    if header.len() < 3 {
                        return Err(format!(
                            "Table header must list chromosome, position and at least one genotype column: {}",
                            line
                        ));
                    }
                    break header[2..].iter().map(|s| s.trim().to_string()).collect::<Vec<_>>();
                }
            }
        };

        let mut chrs = Vec::new();
        let mut positions = Vec::new();
        let mut calls = Vec::new();
        for (line_number, line) in lines {
            let line = line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != columns.len() + 2 {
                return Err(format!(
                    "Expected {} fields at line {}, found {}",
                    columns.len() + 2,
                    line_number + 1,
                    fields.len()
                ));
            }
            let position = fields[1]
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("Invalid position at line {}: {}", line_number + 1, e))?;
            chrs.push(normalize_chrom_label(fields[0]));
            positions.push(position);
            for field in &fields[2..] {
                let gt = field
                    .parse::<Genotype>()
                    .map_err(|e| format!("{} at line {}", e, line_number + 1))?;
                calls.push(gt);
            }
        }

        Ok(GenotypeTable {
            columns,
            chrs,
            positions,
            calls,
        })
    }
}

/// Splits per-row chromosome labels into contiguous `(label, start, end)`
/// regions, rejecting chromosomes split over several blocks and positions
/// that decrease within a chromosome.
pub fn chromosome_regions(chrs: &[String], positions: &[u64]) -> Result<Vec<(String, usize, usize)>> {
    if chrs.len() != positions.len() {
        return Err(format!(
            "Number of chromosome labels ({}) does not match number of positions ({})",
            chrs.len(),
            positions.len()
        ));
    }
    let mut regions: Vec<(String, usize, usize)> = Vec::new();
    for (row, chrom) in chrs.iter().enumerate() {
        let same_chrom = matches!(regions.last(), Some((label, _, _)) if label == chrom);
        if same_chrom {
            if positions[row] < positions[row - 1] {
                return Err(format!(
                    "Positions are not sorted on chromosome {}: {} follows {}",
                    chrom,
                    positions[row],
                    positions[row - 1]
                ));
            }
            if let Some(last) = regions.last_mut() {
                last.2 = row + 1;
            }
        } else {
            if regions.iter().any(|(label, _, _)| label == chrom) {
                return Err(format!("Rows of chromosome {} are not contiguous", chrom));
            }
            regions.push((chrom.clone(), row, row + 1));
        }
    }
    Ok(regions)
}
