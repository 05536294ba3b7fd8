use super::hmm_model::{DecodedPath, Hmm};
use super::params::{recombination_fraction, F2AncestryParams, HetStretchParams};
use super::states::{AncestryState, F2State, HetState};
use crate::utils::{Genotype, Result};
use itertools::Itertools;
use std::marker::PhantomData;

type MatF64 = Vec<Vec<f64>>;

/// Probability of a missing call, identical for every state.
const MISSING_EMISSION: f64 = 0.5;

/// Decoded states of one chromosome.
#[derive(Debug, Clone, PartialEq)]
pub struct AncestryPath<S> {
    pub log_likelihood: f64,
    pub states: Vec<S>,
}

/// Ancestry model over the states `S`, keeping the probability matrices it
/// was built from.
#[derive(Debug)]
pub struct AncestryHmm<S> {
    pub start: Vec<f64>,
    pub trans: MatF64,
    pub ems: MatF64,
    hmm: Hmm,
    state: PhantomData<S>,
}

impl<S: AncestryState> AncestryHmm<S> {
    fn from_matrices(start: Vec<f64>, trans: MatF64, ems: MatF64) -> Self {
        log::debug!("Start probabilities: {}", format_row(&start));
        log::debug!("Transition probabilities:\n{}", format_mat(&trans));
        log::debug!("Emission probabilities:\n{}", format_mat(&ems));

        let mut hmm = Hmm::new(S::STATES.len(), S::NUM_SYMBOLS);
        hmm.set_start(&start);
        hmm.set_trans_matrix(&trans);
        for (state, row) in ems.iter().enumerate() {
            hmm.set_ems(state, row.clone());
        }
        Self {
            start,
            trans,
            ems,
            hmm,
            state: PhantomData,
        }
    }

    pub fn decode(&self, genotypes: &[Genotype]) -> Result<AncestryPath<S>> {
        let query = genotypes.iter().map(|g| S::observation(*g)).collect_vec();
        let DecodedPath {
            log_likelihood,
            states,
        } = self.hmm.decode(&query)?;
        Ok(AncestryPath {
            log_likelihood,
            states: states.into_iter().map(|s| S::STATES[s]).collect(),
        })
    }
}

/// Two-state model separating homozygous from heterozygous stretches.
pub fn build_het_stretch_hmm(
    params: &HetStretchParams,
    chromosome_size_mb: f64,
    num_markers: usize,
) -> Result<AncestryHmm<HetState>> {
    params.validate()?;
    let ri = recombination_fraction(chromosome_size_mb, num_markers, params.recomb_rate)?;
    let stay = (1.0 - ri).powi(2) + ri.powi(2);
    let switch = 2.0 * ri * (1.0 - ri);
    let trans = vec![vec![stay, switch], vec![switch, stay]];

    let (e, d) = (params.base_error, params.avg_depth);
    let p_homo_aa = (1.0 - e).powf(d) + e.powf(d);
    let p_homo_ab = 2.0 * 0.5_f64.powf(d);
    let delta = params.delta_het_parents;
    let seg = params.avg_sites_segregating;
    let p_homo_zaa = delta * p_homo_aa + (1.0 - delta) * p_homo_ab;
    let p_homo_zab = (1.0 - seg) * p_homo_aa + seg * p_homo_ab;
    if (p_homo_zaa - p_homo_zab).abs() < 1e-12 {
        log::warn!(
            "Emissions of aa and ab coincide (delta {} with {} segregating sites), decoding ignores the genotypes",
            delta,
            seg
        );
    }
    let ems = vec![
        vec![p_homo_zaa, 1.0 - p_homo_zaa, MISSING_EMISSION],
        vec![p_homo_zab, 1.0 - p_homo_zab, MISSING_EMISSION],
    ];

    Ok(AncestryHmm::from_matrices(vec![0.5, 0.5], trans, ems))
}

/// Three-state model of the ancestry of an F2 individual.
pub fn build_f2_hmm(
    params: &F2AncestryParams,
    chromosome_size_mb: f64,
    num_markers: usize,
) -> Result<AncestryHmm<F2State>> {
    params.validate()?;
    let ri = recombination_fraction(chromosome_size_mb, num_markers, params.recomb_rate)?;
    let trans = vec![
        vec![(1.0 - ri).powi(2), 2.0 * ri * (1.0 - ri), ri.powi(2)],
        vec![ri * (1.0 - ri), (1.0 - ri).powi(2) + ri.powi(2), ri * (1.0 - ri)],
        vec![ri.powi(2), 2.0 * ri * (1.0 - ri), (1.0 - ri).powi(2)],
    ];

    let g_given_z = prob_g_given_z(params.error_p1, params.error_p2);
    let x_given_g = prob_x_given_g(params.base_error, params.avg_depth);
    let ems = g_given_z
        .iter()
        .map(|g_row| {
            let mut row = (0..F2State::NUM_SYMBOLS)
                .map(|x| g_row.iter().zip(&x_given_g).map(|(pg, x_row)| pg * x_row[x]).sum())
                .collect_vec();
            row[F2State::NUM_SYMBOLS - 1] = MISSING_EMISSION;
            row
        })
        .collect_vec();

    Ok(AncestryHmm::from_matrices(vec![0.25, 0.5, 0.25], trans, ems))
}

/// Parental genotype (00, 01, 11) given the ancestry.
fn prob_g_given_z(error_p1: f64, error_p2: f64) -> MatF64 {
    let conf_p1 = 1.0 - error_p1;
    let conf_p2 = 1.0 - error_p2;
    vec![
        vec![conf_p1.powi(2), 2.0 * conf_p1 * error_p1, error_p1.powi(2)],
        vec![conf_p1 * error_p2, conf_p1 * conf_p2 + error_p1 * error_p2, conf_p2 * error_p1],
        vec![error_p2.powi(2), 2.0 * conf_p2 * error_p2, conf_p2.powi(2)],
    ]
}

/// Observed call (00, 01, 11, NA) given the genotype.
fn prob_x_given_g(base_error: f64, avg_depth: f64) -> MatF64 {
    let hom_right = (1.0 - base_error).powf(avg_depth);
    let hom_wrong = base_error.powf(avg_depth);
    let het_hom = (0.5 * (1.0 - base_error)).powf(avg_depth);
    vec![
        vec![hom_right, 1.0 - hom_wrong - hom_right, hom_wrong, MISSING_EMISSION],
        vec![het_hom, 1.0 - 2.0 * het_hom, het_hom, MISSING_EMISSION],
        vec![hom_wrong, 1.0 - hom_wrong - hom_right, hom_right, MISSING_EMISSION],
    ]
}

fn format_row(row: &[f64]) -> String {
    row.iter().map(|v| format!("{:.6}", v)).join("\t")
}

fn format_mat(mat: &MatF64) -> String {
    mat.iter().map(|row| format_row(row)).join("\n")
}
