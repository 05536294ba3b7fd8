//! Tab-separated score tables written by the cross identifier and read back
//! by the interpreter, plus the cross genotype tables.

use super::caller::WindowCall;
use crate::utils::{open_output_file, Result};
use itertools::Itertools;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::str::FromStr;

/// One ambiguous accession in one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowScoreRecord {
    pub accession: String,
    pub score: u64,
    pub num_info: u64,
    pub normalized: f64,
    pub likelihood: f64,
    /// Smallest ratio above the threshold in the window, 1 when none.
    pub next_best: f64,
    pub num_ambiguous: usize,
    /// 1-based genome-wide window number.
    pub window: usize,
}

/// Genome-wide score of one accession or simulated hybrid.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub accession: String,
    pub score: u64,
    pub num_info: u64,
    pub normalized: f64,
    pub likelihood: f64,
    pub ratio: f64,
    pub num_snps: u64,
    pub depth: f64,
}

fn parse_field<T: FromStr>(fields: &[&str], ix: usize, name: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let field = fields
        .get(ix)
        .ok_or_else(|| format!("Missing {} column", name))?;
    field
        .trim()
        .parse::<T>()
        .map_err(|e| format!("Invalid {} '{}': {}", name, field, e))
}

impl WindowScoreRecord {
    pub fn from_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 8 {
            return Err(format!("Expected 8 columns in window score line: {}", line));
        }
        Ok(Self {
            accession: fields[0].to_string(),
            score: parse_field(&fields, 1, "score")?,
            num_info: parse_field(&fields, 2, "informative sites")?,
            normalized: parse_field(&fields, 3, "normalized score")?,
            likelihood: parse_field(&fields, 4, "likelihood")?,
            next_best: parse_field(&fields, 5, "next best ratio")?,
            num_ambiguous: parse_field(&fields, 6, "ambiguous count")?,
            window: parse_field(&fields, 7, "window")?,
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.accession,
            self.score,
            self.num_info,
            self.normalized,
            self.likelihood,
            self.next_best,
            self.num_ambiguous,
            self.window
        )
    }
}

impl ScoreRecord {
    pub fn from_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 8 {
            return Err(format!("Expected 8 columns in score line: {}", line));
        }
        Ok(Self {
            accession: fields[0].to_string(),
            score: parse_field(&fields, 1, "score")?,
            num_info: parse_field(&fields, 2, "informative sites")?,
            normalized: parse_field(&fields, 3, "normalized score")?,
            likelihood: parse_field(&fields, 4, "likelihood")?,
            ratio: parse_field(&fields, 5, "likelihood ratio")?,
            num_snps: parse_field(&fields, 6, "matched SNPs")?,
            depth: parse_field(&fields, 7, "depth")?,
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.accession,
            self.score,
            self.num_info,
            self.normalized,
            self.likelihood,
            self.ratio,
            self.num_snps,
            self.depth
        )
    }
}

/// Reads every non-empty line of a table through `parse`.
pub fn read_records<R, T, F>(reader: R, parse: F) -> Result<Vec<T>>
where
    R: BufRead,
    F: Fn(&str) -> Result<T>,
{
    let mut records = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(parse(&line).map_err(|e| format!("Line {}: {}", line_number + 1, e))?);
    }
    Ok(records)
}

/// Line-oriented writer over a buffered output file.
pub struct TableWriter {
    path: String,
    writer: BufWriter<File>,
}

impl TableWriter {
    pub fn new(output_path: &str) -> Result<TableWriter> {
        Ok(TableWriter {
            path: output_path.to_string(),
            writer: open_output_file(output_path)?,
        })
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)
            .map_err(|e| format!("Failed to write to {}: {}", self.path, e))
    }

    pub fn write_window_scores(&mut self, records: &[WindowScoreRecord]) -> Result<()> {
        for record in records {
            self.write_line(&record.to_line())?;
        }
        Ok(())
    }

    pub fn write_scores(&mut self, records: &[ScoreRecord]) -> Result<()> {
        for record in records {
            self.write_line(&record.to_line())?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| format!("Failed to flush {}: {}", self.path, e))
    }
}

/// Per-window call of one cross sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWindowRow {
    pub window: usize,
    pub num_matched: usize,
    pub num_segregating: usize,
    pub call: WindowCall,
}

impl SampleWindowRow {
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.window,
            self.num_matched,
            self.num_segregating,
            self.call.genotype,
            self.call.pvalues()
        )
    }
}

/// Per-window calls of a whole population, one per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationWindowRow {
    pub window: usize,
    pub chrom: String,
    pub cm_mid: f64,
    pub calls: Vec<WindowCall>,
}

impl PopulationWindowRow {
    pub fn header(num_samples: usize) -> String {
        format!("pheno,,{}", ",0".repeat(num_samples))
    }

    pub fn to_line(&self) -> String {
        let mut line = format!("{},{},{}", self.window, self.chrom, self.cm_mid);
        if !self.calls.is_empty() {
            line.push(',');
            line.push_str(&self.calls.iter().map(|c| c.genotype).join(","));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cross::caller::WindowGenotype;

    #[test]
    fn window_score_line_parses_back() {
        let record = WindowScoreRecord {
            accession: "6909".to_string(),
            score: 40,
            num_info: 41,
            normalized: 40.0 / 41.0,
            likelihood: 1.0,
            next_best: 1.0,
            num_ambiguous: 2,
            window: 17,
        };
        assert_eq!(WindowScoreRecord::from_line(&record.to_line()).unwrap(), record);
    }

    #[test]
    fn score_line_keeps_nan_depth() {
        let line = "6909x6046\t10\t12\t0.8333333333333334\t5.5\t5.5\t100\tNaN";
        let record = ScoreRecord::from_line(line).unwrap();
        assert_eq!(record.accession, "6909x6046");
        assert!(record.depth.is_nan());
        assert!(ScoreRecord::from_line("a\t1\t2").is_err());
    }

    #[test]
    fn tables_are_read_line_by_line() {
        let data = "A\t1\t2\t0.5\t3\t1\t1\t1\n\nB\t1\t2\t0.5\t3\t1\t1\t2\n";
        let records = read_records(std::io::Cursor::new(data), WindowScoreRecord::from_line).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].window, 2);
    }

    #[test]
    fn population_row_formatting() {
        let called = WindowCall {
            genotype: WindowGenotype::Parent2,
            ratios: Some(vec![f64::NAN, f64::NAN, 1.0]),
        };
        let missing = WindowCall {
            genotype: WindowGenotype::NotCalled,
            ratios: None,
        };
        let row = PopulationWindowRow {
            window: 3,
            chrom: "1".to_string(),
            cm_mid: 0.5,
            calls: vec![called.clone(), missing],
        };
        assert_eq!(PopulationWindowRow::header(2), "pheno,,,0,0");
        assert_eq!(row.to_line(), "3,1,0.5,2,NA");

        let sample_row = SampleWindowRow {
            window: 3,
            num_matched: 7,
            num_segregating: 9,
            call: called,
        };
        assert_eq!(sample_row.to_line(), "3\t7\t9\t2\tnan,nan,1.00");
    }
}
