use crate::utils::{math, Genotype};
use itertools::Itertools;
use std::fmt;

/// Windows with fewer informative markers are not called.
pub const MIN_MARKERS: u64 = 5;

/// Genotype of a cross window relative to its two parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowGenotype {
    Parent1,
    Het,
    Parent2,
    NotCalled,
}

impl fmt::Display for WindowGenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowGenotype::Parent1 => write!(f, "0"),
            WindowGenotype::Het => write!(f, "1"),
            WindowGenotype::Parent2 => write!(f, "2"),
            WindowGenotype::NotCalled => write!(f, "NA"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowCall {
    pub genotype: WindowGenotype,
    /// Likelihood ratios of the three classes, absent when the window was
    /// not tested.
    pub ratios: Option<Vec<f64>>,
}

impl WindowCall {
    pub fn not_called() -> Self {
        Self {
            genotype: WindowGenotype::NotCalled,
            ratios: None,
        }
    }

    /// Ratios with two decimals joined by `,`, or `NA`.
    pub fn pvalues(&self) -> String {
        match &self.ratios {
            Some(ratios) => ratios
                .iter()
                .map(|r| if r.is_nan() { "nan".to_string() } else { format!("{:.2}", r) })
                .join(","),
            None => "NA".to_string(),
        }
    }
}

/// Calls a window from its `[parent1, het, parent2]` match counts.
pub fn call_window(counts: [u64; 3], total: u64, lr_threshold: f64, min_markers: u64) -> WindowCall {
    if total < min_markers || counts.iter().all(|c| *c == 0) {
        return WindowCall::not_called();
    }

    let scores: Vec<f64> = counts.iter().map(|c| *c as f64).collect();
    let (likelihoods, ratios) = math::calculate_likelihoods(&scores, &[total; 3]);

    let runner_up: Vec<f64> = ratios.iter().copied().filter(|r| *r != 1.0).collect();
    let ambiguous = matches!(math::nan_min(&runner_up), Some(r) if r < lr_threshold);
    let genotype = if ambiguous {
        WindowGenotype::NotCalled
    } else if ratios.iter().filter(|r| **r == 1.0).count() > 1 {
        WindowGenotype::Het
    } else {
        match math::nan_argmin(&likelihoods) {
            Some(0) => WindowGenotype::Parent1,
            Some(2) => WindowGenotype::Parent2,
            _ => WindowGenotype::Het,
        }
    };
    WindowCall {
        genotype,
        ratios: Some(ratios),
    }
}

/// Counts how often the sample carries parent 1's allele, a heterozygous call
/// or parent 2's allele on sites segregating between the parents.
pub fn parental_counts(sample: &[Genotype], parent1: &[Genotype], parent2: &[Genotype]) -> [u64; 3] {
    let mut counts = [0; 3];
    for ((s, p1), p2) in sample.iter().zip(parent1).zip(parent2) {
        if s == p1 {
            counts[0] += 1;
        }
        if *s == Genotype::Het {
            counts[1] += 1;
        }
        if s == p2 {
            counts[2] += 1;
        }
    }
    counts
}
