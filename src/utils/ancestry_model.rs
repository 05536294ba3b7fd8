use std::str::FromStr;

/// Which hidden Markov model the `ancestry` command decodes with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AncestryModel {
    HetStretches,
    F2,
}

impl FromStr for AncestryModel {
    type Err = &'static str;
    fn from_str(model: &str) -> Result<Self, Self::Err> {
        match model {
            "het" => Ok(AncestryModel::HetStretches),
            "f2" => Ok(AncestryModel::F2),
            _ => Err("Invalid ancestry model (expected het or f2)"),
        }
    }
}
