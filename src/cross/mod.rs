pub mod binning;
pub mod caller;
pub mod cross_genotyper;
pub mod identifier;
pub mod interpreter;
pub mod report;
pub mod scoring;
pub mod writers;

pub use caller::{call_window, WindowCall, WindowGenotype};
pub use cross_genotyper::{CrossGenotyper, SegregatingSites};
pub use identifier::CrossIdentifier;
pub use report::{CrossReport, ScoringReport};
