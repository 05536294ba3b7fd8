mod panel;
mod sample;
mod sample_matrix;
mod table;
mod vcf_reader;

pub use panel::{GenotypeMatrix, ReferencePanel};
pub use sample::{read_bed, read_sample, weights_from_pl, SampleInputs};
pub use sample_matrix::{read_sample_list, SampleMatrix};
pub use table::chromosome_regions;
pub use vcf_reader::read_vcf;
