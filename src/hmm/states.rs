use crate::utils::Genotype;
use std::fmt;

/// Hidden states of an ancestry model, with the encoding of genotype calls
/// into its observation symbols.
pub trait AncestryState: Copy + fmt::Display + PartialEq + 'static {
    const STATES: &'static [Self];
    const NUM_SYMBOLS: usize;

    fn observation(genotype: Genotype) -> usize;
}

/// Homozygous (`aa`) or heterozygous (`ab`) stretch of the genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HetState {
    Aa,
    Ab,
}

impl fmt::Display for HetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HetState::Aa => write!(f, "aa"),
            HetState::Ab => write!(f, "ab"),
        }
    }
}

impl AncestryState for HetState {
    const STATES: &'static [Self] = &[HetState::Aa, HetState::Ab];
    const NUM_SYMBOLS: usize = 3;

    /// homo, het, NA
    fn observation(genotype: Genotype) -> usize {
        match genotype {
            Genotype::HomRef | Genotype::HomAlt => 0,
            Genotype::Het => 1,
            Genotype::Missing => 2,
        }
    }
}

/// Ancestry of an F2 locus: both copies from parent A, one from each, or
/// both from parent B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum F2State {
    AA,
    AB,
    BB,
}

impl fmt::Display for F2State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            F2State::AA => write!(f, "AA"),
            F2State::AB => write!(f, "AB"),
            F2State::BB => write!(f, "BB"),
        }
    }
}

impl AncestryState for F2State {
    const STATES: &'static [Self] = &[F2State::AA, F2State::AB, F2State::BB];
    const NUM_SYMBOLS: usize = 4;

    /// 00, 01, 11, NA
    fn observation(genotype: Genotype) -> usize {
        match genotype {
            Genotype::HomRef => 0,
            Genotype::Het => 1,
            Genotype::HomAlt => 2,
            Genotype::Missing => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn het_model_merges_homozygous_calls() {
        assert_eq!(HetState::observation(Genotype::HomRef), 0);
        assert_eq!(HetState::observation(Genotype::HomAlt), 0);
        assert_eq!(HetState::observation(Genotype::Het), 1);
        assert_eq!(HetState::observation(Genotype::Missing), 2);
    }

    #[test]
    fn f2_model_keeps_allele_dosage() {
        let symbols: Vec<usize> = [Genotype::HomRef, Genotype::Het, Genotype::HomAlt, Genotype::Missing]
            .into_iter()
            .map(F2State::observation)
            .collect();
        assert_eq!(symbols, vec![0, 1, 2, 3]);
    }

    fn labels<S: AncestryState>() -> Vec<String> {
        S::STATES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn states_are_listed_in_symbol_order() {
        assert_eq!(labels::<HetState>(), vec!["aa", "ab"]);
        assert_eq!(labels::<F2State>(), vec!["AA", "AB", "BB"]);
    }

    #[test]
    fn state_labels() {
        assert_eq!(HetState::Ab.to_string(), "ab");
        assert_eq!(F2State::BB.to_string(), "BB");
    }
}
