pub mod cli;
pub mod commands;
pub mod cross;
pub mod hmm;
pub mod inputs;
pub mod utils;
