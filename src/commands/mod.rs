pub mod ancestry;
pub mod genotype;
pub mod identify;
