mod builder;
pub mod hmm_model;
mod params;
mod states;

pub use builder::{build_f2_hmm, build_het_stretch_hmm, AncestryHmm, AncestryPath};
pub use hmm_model::{DecodedPath, Hmm};
pub use params::{recombination_fraction, F2AncestryParams, HetStretchParams};
pub use states::{AncestryState, F2State, HetState};
