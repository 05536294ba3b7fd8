use crate::inputs::GenotypeMatrix;
use crate::utils::{math, Genotype, Result};

/// Markers scored per block.
pub const CHUNK_SIZE: usize = 1000;

/// Weighted match scores and informative-site counts, one entry per
/// accession.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessionScores {
    pub scores: Vec<f64>,
    pub num_info: Vec<u64>,
}

impl AccessionScores {
    pub fn zeros(num_accessions: usize) -> Self {
        Self {
            scores: vec![0.0; num_accessions],
            num_info: vec![0; num_accessions],
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn accumulate(&mut self, other: &AccessionScores) {
        for (total, score) in self.scores.iter_mut().zip(&other.scores) {
            *total += score;
        }
        for (total, n) in self.num_info.iter_mut().zip(&other.num_info) {
            *total += n;
        }
    }

    /// `score / num_info`, NaN for accessions without informative sites.
    pub fn normalized(&self) -> Vec<f64> {
        self.scores
            .iter()
            .zip(&self.num_info)
            .map(|(score, n)| score / *n as f64)
            .collect()
    }

    pub fn likelihoods(&self) -> (Vec<f64>, Vec<f64>) {
        math::calculate_likelihoods(&self.scores, &self.num_info)
    }
}

/// Scores every accession of the panel on the matched markers. `weights[k]`
/// is the query's weight triplet at panel row `rows[k]`.
pub fn score_window(
    snps: &GenotypeMatrix,
    rows: &[usize],
    weights: &[[f64; 3]],
) -> Result<AccessionScores> {
    if rows.len() != weights.len() {
        return Err(format!(
            "Matched marker count {} does not match weight count {}",
            rows.len(),
            weights.len()
        ));
    }

    let mut totals = AccessionScores::zeros(snps.num_accessions());
    for (row_chunk, weight_chunk) in rows.chunks(CHUNK_SIZE).zip(weights.chunks(CHUNK_SIZE)) {
        let mut chunk = AccessionScores::zeros(snps.num_accessions());
        for (&row, w) in row_chunk.iter().zip(weight_chunk) {
            for (acc, gt) in snps.row(row).iter().enumerate() {
                let weight = match gt {
                    Genotype::HomRef => w[0],
                    Genotype::Het => w[1],
                    Genotype::HomAlt => w[2],
                    Genotype::Missing => continue,
                };
                chunk.scores[acc] += weight;
                chunk.num_info[acc] += 1;
            }
        }
        totals.accumulate(&chunk);
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix(rows: &[[i64; 3]]) -> GenotypeMatrix {
        let data = rows
            .iter()
            .flat_map(|r| r.iter().map(|c| Genotype::from_code(*c).unwrap()))
            .collect();
        GenotypeMatrix::new(rows.len(), 3, data).unwrap()
    }

    #[test]
    fn weights_follow_panel_genotype() {
        let snps = matrix(&[[0, 1, -1], [2, 1, 0]]);
        let weights = [[0.7, 0.2, 0.1], [1.0, 0.0, 0.0]];
        let result = score_window(&snps, &[0, 1], &weights).unwrap();
        assert_relative_eq!(result.scores[0], 0.7);
        assert_relative_eq!(result.scores[1], 0.1);
        assert_relative_eq!(result.scores[2], 1.0);
        assert_eq!(result.num_info, vec![2, 2, 1]);
        assert_relative_eq!(result.normalized()[0], 0.35);
    }

    #[test]
    fn chunking_does_not_change_totals() {
        let n = CHUNK_SIZE * 2 + 17;
        let snps = matrix(&vec![[0, 1, 2]; n]);
        let rows: Vec<usize> = (0..n).collect();
        let weights = vec![[1.0, 0.0, 0.0]; n];
        let result = score_window(&snps, &rows, &weights).unwrap();
        assert_relative_eq!(result.scores[0], n as f64);
        assert_relative_eq!(result.scores[1], 0.0);
        assert_eq!(result.num_info, vec![n as u64; 3]);
    }

    #[test]
    fn mismatched_weights_err() {
        let snps = matrix(&[[0, 0, 0]]);
        assert!(score_window(&snps, &[0], &[]).is_err());
    }

    #[test]
    fn empty_window_scores_zero() {
        let snps = matrix(&[[0, 0, 0]]);
        let result = score_window(&snps, &[], &[]).unwrap();
        assert_eq!(result, AccessionScores::zeros(3));
        assert!(result.normalized().iter().all(|v| v.is_nan()));
    }
}
