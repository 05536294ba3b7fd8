/// Per-site probability that a true match is observed as a match.
const MATCH_PROB: f64 = 0.99999999;

/// Likelihood ratio below which a candidate cannot be told apart from the
/// best one (chi-square, 1 d.f., alpha 0.1).
pub const DEFAULT_LR_THRESHOLD: f64 = 2.706;

/// Binomial test of `matched` out of `informative` sites against the
/// near-perfect match expectation. Smaller is better; perfect matches score 1.
pub fn likelihood_test(informative: u64, matched: u64) -> f64 {
    if informative > 0 && matched > 0 && matched < informative {
        let p_obs = matched as f64 / informative as f64;
        let a = matched as f64 * (p_obs / MATCH_PROB).ln();
        let b = (informative - matched) as f64 * ((1.0 - p_obs) / (1.0 - MATCH_PROB)).ln();
        a + b
    } else if informative > 0 && matched == informative {
        1.0
    } else {
        f64::NAN
    }
}

/// Likelihoods and likelihood ratios against the best (minimum) likelihood.
/// Scores are truncated to whole matches before testing.
pub fn calculate_likelihoods(scores: &[f64], num_info: &[u64]) -> (Vec<f64>, Vec<f64>) {
    assert_eq!(scores.len(), num_info.len());
    let likelihoods: Vec<f64> = scores
        .iter()
        .zip(num_info)
        .map(|(&score, &n)| likelihood_test(n, score.max(0.0) as u64))
        .collect();
    let top_hit = nan_min(&likelihoods);
    let ratios = likelihoods
        .iter()
        .map(|l| match top_hit {
            Some(top) => l / top,
            None => f64::NAN,
        })
        .collect();
    (likelihoods, ratios)
}

/// Minimum ignoring NaN; `None` when there is no finite value.
pub fn nan_min(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            Some(m) if m <= v => Some(m),
            _ => Some(v),
        })
}

/// Index of the minimum ignoring NaN, first index on ties.
pub fn nan_argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if b <= v => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<f64>() / finite.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let var = finite.iter().map(|v| (v - m).powi(2)).sum::<f64>() / finite.len() as f64;
    Some(var.sqrt())
}
