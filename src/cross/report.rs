//! Versioned JSON reports. The scoring report is written after the genome-wide
//! scan; the cross report is derived from it and written once interpretation
//! is done.

use crate::utils::{open_output_file, open_text_reader, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

pub const REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub case: u8,
    pub text: String,
}

impl Interpretation {
    pub fn new(case: u8, text: &str) -> Self {
        Self {
            case,
            text: text.to_string(),
        }
    }
}

/// Accession that cannot be told apart from the best one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopHit {
    pub accession: String,
    pub normalized_score: f64,
    pub num_info: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringReport {
    pub version: u32,
    pub interpretation: Interpretation,
    /// Fraction of the sample's sites found in the panel, and their number.
    pub overlap: (f64, u64),
    pub top_hits: Vec<TopHit>,
    pub depth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parents {
    pub mother: (String, u64),
    pub father: Option<(String, u64)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: Option<Vec<usize>>,
    pub y: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenotypeWindows {
    pub chr_bins: Option<BTreeMap<String, usize>>,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReport {
    pub version: u32,
    pub interpretation: Interpretation,
    pub overlap: (f64, u64),
    pub top_hits: Vec<TopHit>,
    /// Accessions with their number of homozygous window hits, descending.
    pub matches: Vec<(String, usize)>,
    pub parents: Option<Parents>,
    pub genotype_windows: Option<GenotypeWindows>,
}

impl From<ScoringReport> for CrossReport {
    fn from(report: ScoringReport) -> Self {
        Self {
            version: REPORT_VERSION,
            interpretation: report.interpretation,
            overlap: report.overlap,
            top_hits: report.top_hits,
            matches: Vec::new(),
            parents: None,
            genotype_windows: None,
        }
    }
}

pub fn load_report<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = open_text_reader(path)?;
    serde_json::from_reader(reader).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

pub fn save_report<T: Serialize>(report: &T, path: &str) -> Result<()> {
    let mut writer = open_output_file(path)?;
    serde_json::to_writer(&mut writer, report)
        .map_err(|e| format!("Failed to serialize report {}: {}", path, e))?;
    writer
        .flush()
        .map_err(|e| format!("Failed to write {}: {}", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scoring_report() -> ScoringReport {
        ScoringReport {
            version: REPORT_VERSION,
            interpretation: Interpretation::new(3, "Ambiguous sample"),
            overlap: (0.75, 1200),
            top_hits: vec![TopHit {
                accession: "6909".to_string(),
                normalized_score: 0.9,
                num_info: 1000,
            }],
            depth: None,
        }
    }

    #[test]
    fn scoring_report_survives_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.scores.txt.matches.json");
        let report = scoring_report();
        save_report(&report, path.to_str().unwrap()).unwrap();
        let loaded: ScoringReport = load_report(&path).unwrap();
        assert_eq!(loaded, report);
    }

    #[test]
    fn cross_report_starts_without_parents() {
        let report = CrossReport::from(scoring_report());
        assert_eq!(report.interpretation.case, 3);
        assert!(report.matches.is_empty());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["parents"].is_null());
        assert!(json["genotype_windows"].is_null());
        assert_eq!(json["overlap"][1], 1200);
    }

    #[test]
    fn parents_serialize_as_pairs() {
        let parents = Parents {
            mother: ("6909".to_string(), 12),
            father: None,
        };
        let json = serde_json::to_value(&parents).unwrap();
        assert_eq!(json["mother"][0], "6909");
        assert_eq!(json["mother"][1], 12);
        assert!(json["father"].is_null());
    }
}
