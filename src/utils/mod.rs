mod ancestry_model;
mod genome;
mod genotype_code;
mod io_utils;
pub mod math;
mod readers;
mod util;

pub use ancestry_model::AncestryModel;
pub use genome::{ChromosomeSpec, GenomeLayout};
pub use genotype_code::Genotype;
pub use io_utils::{create_writer, open_output_file};
pub use readers::{is_gzipped, open_text_reader};
pub use util::{handle_error_and_exit, normalize_chrom_label, Result};
