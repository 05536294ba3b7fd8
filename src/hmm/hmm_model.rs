use crate::utils::Result;
use itertools::Itertools;

// List of abbreviations
// lp = log probability
// ems = emissions

type MatF64 = Vec<Vec<f64>>;
type MatInt = Vec<Vec<usize>>;

/// Most likely state path of an observation sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPath {
    pub log_likelihood: f64,
    pub states: Vec<usize>,
}

/// Discrete hidden Markov model stored in log space.
#[derive(Debug, PartialEq)]
pub struct Hmm {
    num_states: usize,
    num_symbols: usize,
    start_lps: Vec<f64>,
    ems: MatF64,
    in_states: MatInt,
    in_lps: MatF64,
}

impl Hmm {
    pub fn new(num_states: usize, num_symbols: usize) -> Hmm {
        Hmm {
            num_states,
            num_symbols,
            start_lps: vec![f64::NEG_INFINITY; num_states],
            ems: vec![vec![f64::NEG_INFINITY; num_symbols]; num_states],
            in_states: vec![Vec::new(); num_states],
            in_lps: vec![Vec::new(); num_states],
        }
    }

    pub fn set_start(&mut self, start_probs: &[f64]) {
        assert_eq!(start_probs.len(), self.num_states);
        self.start_lps = start_probs.iter().map(|v| v.ln()).collect_vec();
    }

    pub fn set_trans(&mut self, target_state: usize, in_states: Vec<usize>, in_probs: Vec<f64>) {
        assert_eq!(in_states.len(), in_probs.len());
        self.in_states[target_state] = in_states;
        self.in_lps[target_state] = in_probs.iter().map(|v| v.ln()).collect_vec();
    }

    pub fn set_ems(&mut self, target_state: usize, ems: Vec<f64>) {
        assert_eq!(ems.len(), self.num_symbols);
        self.ems[target_state] = ems.iter().map(|v| v.ln()).collect_vec();
    }

    /// Sets every transition from a row-major matrix `trans[from][to]`.
    pub fn set_trans_matrix(&mut self, trans: &[Vec<f64>]) {
        for target_state in 0..self.num_states {
            let in_probs = trans.iter().map(|row| row[target_state]).collect_vec();
            self.set_trans(target_state, (0..self.num_states).collect(), in_probs);
        }
    }

    fn calc_viterbi_score(&self, scores: &MatF64, state: usize, symbol: usize, index: usize) -> (Option<usize>, f64) {
        let em_term = self.ems[state][symbol];
        if index == 0 {
            return (None, self.start_lps[state] + em_term);
        }

        let mut max_score = f64::NEG_INFINITY;
        let mut best_state = None;
        for (in_state_index, prev_state) in self.in_states[state].iter().enumerate() {
            let in_state_score = scores[*prev_state][index - 1] + self.in_lps[state][in_state_index];
            if best_state.is_none() || in_state_score > max_score {
                best_state = Some(*prev_state);
                max_score = in_state_score;
            }
        }
        (best_state, max_score + em_term)
    }

    fn generate_mats(&self, query: &[usize]) -> (MatF64, Vec<Vec<Option<usize>>>) {
        let mut scores = vec![vec![f64::NEG_INFINITY; query.len()]; self.num_states];
        let mut states = vec![vec![None; query.len()]; self.num_states];

        for (index, symbol) in query.iter().enumerate() {
            for state in 0..self.num_states {
                let (prev_state, score) = self.calc_viterbi_score(&scores, state, *symbol, index);
                scores[state][index] = score;
                states[state][index] = prev_state;
            }
        }
        (scores, states)
    }

    fn traceback(&self, last_state: usize, states: &[Vec<Option<usize>>]) -> Vec<usize> {
        let len = states[last_state].len();
        let mut traceback_states = Vec::with_capacity(len);
        let mut state = last_state;
        for index in (0..len).rev() {
            traceback_states.push(state);
            if let Some(prev_state) = states[state][index] {
                state = prev_state;
            }
        }
        traceback_states.reverse();
        traceback_states
    }

    /// Viterbi decoding of a sequence of observation symbols.
    pub fn decode(&self, query: &[usize]) -> Result<DecodedPath> {
        if query.is_empty() {
            return Ok(DecodedPath {
                log_likelihood: 0.0,
                states: Vec::new(),
            });
        }
        if let Some(symbol) = query.iter().find(|s| **s >= self.num_symbols) {
            return Err(format!(
                "Observation symbol {} out of range for a model with {} symbols",
                symbol, self.num_symbols
            ));
        }

        let (scores, states) = self.generate_mats(query);
        let last = query.len() - 1;
        let mut last_state = 0;
        for state in 1..self.num_states {
            if scores[state][last] > scores[last_state][last] {
                last_state = state;
            }
        }
        let log_likelihood = scores[last_state][last];
        if !log_likelihood.is_finite() {
            return Err("No state path can emit the observations".to_string());
        }

        Ok(DecodedPath {
            log_likelihood,
            states: self.traceback(last_state, &states),
        })
    }
}
