use super::identifier::PROB_THRESHOLD;
use super::report::{load_report, Coordinates, CrossReport, GenotypeWindows, Interpretation, Parents, ScoringReport};
use super::writers::{read_records, ScoreRecord, WindowScoreRecord};
use crate::utils::{math, open_text_reader, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

/// Normalized score above which the best simulated hybrid explains the sample.
pub const F1_THRESHOLD: f64 = 0.9;

/// Reloads the tables and the scoring report written under `output_prefix`
/// and turns the report into a cross report. Only samples classified as a
/// likely mixture are interpreted further.
pub fn interpret_cross(output_prefix: &str, accessions: &[String], window_chroms: &[String]) -> Result<CrossReport> {
    let scoring: ScoringReport =
        load_report(Path::new(&format!("{}.scores.txt.matches.json", output_prefix)))?;
    if scoring.interpretation.case != 3 {
        return Ok(CrossReport::from(scoring));
    }

    log::info!("Running cross interpreter");
    let window_path = format!("{}.windowscore.txt", output_prefix);
    let windows = read_records(open_text_reader(Path::new(&window_path))?, WindowScoreRecord::from_line)
        .map_err(|e| format!("{}: {}", window_path, e))?;
    let score_path = format!("{}.scores.txt", output_prefix);
    let scores = read_records(open_text_reader(Path::new(&score_path))?, ScoreRecord::from_line)
        .map_err(|e| format!("{}: {}", score_path, e))?;
    interpret(scoring, &windows, &scores, accessions, window_chroms)
}

/// Windows where the reported accessions match almost perfectly on a
/// reasonable number of informative sites.
pub fn homozygous_windows(records: &[WindowScoreRecord]) -> BTreeSet<usize> {
    let info: Vec<f64> = records.iter().map(|r| r.num_info as f64).collect();
    let info_threshold = match (math::mean(&info), math::std_dev(&info)) {
        (Some(mean), Some(std)) => mean - std,
        _ => return BTreeSet::new(),
    };

    let mut by_window: BTreeMap<usize, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for record in records {
        let entry = by_window.entry(record.window).or_default();
        entry.0.push(record.normalized);
        entry.1.push(record.num_info as f64);
    }
    by_window
        .into_iter()
        .filter(|(_, (normalized, info))| {
            math::mean(normalized).is_some_and(|m| m > PROB_THRESHOLD)
                && math::mean(info).is_some_and(|m| m > info_threshold)
        })
        .map(|(window, _)| window)
        .collect()
}

/// Occurrences per accession, most frequent first; ties keep name order.
fn count_accessions<'a, I>(records: I) -> Vec<(String, usize)>
where
    I: Iterator<Item = &'a WindowScoreRecord>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.accession.as_str()).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(accession, count)| (accession.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn interpret(
    scoring: ScoringReport,
    windows: &[WindowScoreRecord],
    scores: &[ScoreRecord],
    accessions: &[String],
    window_chroms: &[String],
) -> Result<CrossReport> {
    let mut report = CrossReport::from(scoring);
    let homozygous = homozygous_windows(windows);
    report.matches = count_accessions(windows.iter().filter(|r| homozygous.contains(&r.window)));

    let panel: HashSet<&str> = accessions.iter().map(|a| a.as_str()).collect();
    let hybrids: Vec<&ScoreRecord> = scores
        .iter()
        .filter(|r| !panel.contains(r.accession.as_str()))
        .collect();
    let ratios: Vec<f64> = hybrids.iter().map(|r| r.ratio).collect();
    if let Some(best) = math::nan_argmin(&ratios).map(|ix| hybrids[ix]) {
        if best.normalized > F1_THRESHOLD {
            let (mother, father) = best
                .accession
                .split_once('x')
                .ok_or_else(|| format!("Hybrid label is not of the form IDxID: {}", best.accession))?;
            report.interpretation = Interpretation::new(5, "Sample may be a F1! or a contamination!");
            report.parents = Some(Parents {
                mother: (mother.to_string(), 1),
                father: Some((father.to_string(), 1)),
            });
            report.genotype_windows = Some(GenotypeWindows::default());
            return Ok(report);
        }
    }

    let clean = count_accessions(windows.iter().filter(|r| r.num_ambiguous == 1));
    let parents: Vec<(String, usize)> = clean.into_iter().take(2).collect();
    if parents.is_empty() {
        report.interpretation = Interpretation::new(7, "Sample may just be contamination!");
        report.parents = None;
        report.genotype_windows = Some(GenotypeWindows::default());
        return Ok(report);
    }

    let xs: Vec<usize> = windows
        .iter()
        .map(|r| r.window)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut ys = vec!["NA".to_string(); xs.len()];
    for (parent, _) in &parents {
        for record in windows
            .iter()
            .filter(|r| r.accession == *parent && homozygous.contains(&r.window))
        {
            if let Ok(ix) = xs.binary_search(&record.window) {
                ys[ix] = parent.clone();
            }
        }
    }

    let chr_bins = if parents.len() == 2 {
        report.interpretation = Interpretation::new(6, "Sample may be a F2!");
        let mut bins: BTreeMap<String, usize> = BTreeMap::new();
        for chrom in window_chroms {
            *bins.entry(chrom.clone()).or_default() += 1;
        }
        Some(bins)
    } else {
        report.interpretation = Interpretation::new(6, "Sample may be a F2! but only one parent found!");
        None
    };
    report.parents = Some(Parents {
        mother: (parents[0].0.clone(), parents[0].1 as u64),
        father: parents.get(1).map(|(id, count)| (id.clone(), *count as u64)),
    });
    report.genotype_windows = Some(GenotypeWindows {
        chr_bins,
        coordinates: Coordinates {
            x: Some(xs),
            y: Some(ys),
        },
    });
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cross::report::REPORT_VERSION;

    fn window(accession: &str, normalized: f64, num_info: u64, num_ambiguous: usize, window: usize) -> WindowScoreRecord {
        WindowScoreRecord {
            accession: accession.to_string(),
            score: (normalized * num_info as f64) as u64,
            num_info,
            normalized,
            likelihood: 1.0,
            next_best: 10.0,
            num_ambiguous,
            window,
        }
    }

    fn score(accession: &str, normalized: f64, ratio: f64) -> ScoreRecord {
        ScoreRecord {
            accession: accession.to_string(),
            score: 0,
            num_info: 100,
            normalized,
            likelihood: ratio,
            ratio,
            num_snps: 100,
            depth: f64::NAN,
        }
    }

    fn mixture_report() -> ScoringReport {
        ScoringReport {
            version: REPORT_VERSION,
            interpretation: Interpretation::new(3, "Ambiguous sample"),
            overlap: (0.9, 100),
            top_hits: Vec::new(),
            depth: None,
        }
    }

    fn accessions() -> Vec<String> {
        vec!["1".to_string(), "2".to_string(), "3".to_string()]
    }

    #[test]
    fn homozygous_windows_need_high_score_and_enough_sites() {
        let records = vec![
            window("1", 1.0, 50, 1, 1),
            window("2", 1.0, 50, 1, 2),
            window("1", 0.9, 50, 1, 3),
            window("3", 1.0, 2, 1, 4),
        ];
        let homozygous = homozygous_windows(&records);
        assert_eq!(homozygous.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn strong_hybrid_is_an_f1() {
        let scores = vec![
            score("1", 0.6, 50.0),
            score("2", 0.6, 50.0),
            score("1x2", 0.95, 1.0),
            score("1x3", 0.7, 30.0),
        ];
        let report = interpret(mixture_report(), &[], &scores, &accessions(), &[]).unwrap();
        assert_eq!(report.interpretation.case, 5);
        let parents = report.parents.unwrap();
        assert_eq!(parents.mother, ("1".to_string(), 1));
        assert_eq!(parents.father, Some(("2".to_string(), 1)));
        assert_eq!(report.genotype_windows, Some(GenotypeWindows::default()));
    }

    #[test]
    fn unique_windows_of_two_accessions_are_an_f2() {
        let windows = vec![
            window("1", 1.0, 50, 1, 1),
            window("1", 1.0, 50, 1, 2),
            window("2", 1.0, 50, 1, 3),
            window("1", 0.99, 40, 2, 4),
            window("3", 0.99, 40, 2, 4),
        ];
        let scores = vec![score("1", 0.7, 1.0), score("1x2", 0.8, 2.0)];
        let chroms: Vec<String> = ["1", "1", "2", "2"].iter().map(|c| c.to_string()).collect();
        let report = interpret(mixture_report(), &windows, &scores, &accessions(), &chroms).unwrap();

        assert_eq!(report.interpretation.case, 6);
        assert_eq!(report.interpretation.text, "Sample may be a F2!");
        let parents = report.parents.unwrap();
        assert_eq!(parents.mother, ("1".to_string(), 2));
        assert_eq!(parents.father, Some(("2".to_string(), 1)));
        let genotype_windows = report.genotype_windows.unwrap();
        assert_eq!(genotype_windows.coordinates.x, Some(vec![1, 2, 3, 4]));
        assert_eq!(
            genotype_windows.coordinates.y,
            Some(vec!["1".to_string(), "1".to_string(), "2".to_string(), "NA".to_string()])
        );
        let chr_bins = genotype_windows.chr_bins.unwrap();
        assert_eq!(chr_bins["1"], 2);
        assert_eq!(chr_bins["2"], 2);
        assert_eq!(
            report.matches,
            vec![("1".to_string(), 2), ("2".to_string(), 1)]
        );
    }

    #[test]
    fn single_parent_has_no_chromosome_table() {
        let windows = vec![window("1", 1.0, 50, 1, 1), window("1", 1.0, 50, 1, 2)];
        let report = interpret(mixture_report(), &windows, &[], &accessions(), &[]).unwrap();
        assert_eq!(report.interpretation.case, 6);
        assert_eq!(
            report.interpretation.text,
            "Sample may be a F2! but only one parent found!"
        );
        assert_eq!(report.parents.unwrap().father, None);
        assert!(report.genotype_windows.unwrap().chr_bins.is_none());
    }

    #[test]
    fn no_unique_window_is_contamination() {
        let windows = vec![window("1", 0.99, 50, 2, 1), window("2", 0.99, 50, 2, 1)];
        let report = interpret(mixture_report(), &windows, &[], &accessions(), &[]).unwrap();
        assert_eq!(report.interpretation.case, 7);
        assert!(report.parents.is_none());
    }

    #[test]
    fn non_mixture_report_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("sample");
        let prefix = prefix.to_str().unwrap();
        let mut scoring = mixture_report();
        scoring.interpretation = Interpretation::new(0, "Unique hit");
        crate::cross::report::save_report(&scoring, &format!("{}.scores.txt.matches.json", prefix)).unwrap();
        let report = interpret_cross(prefix, &accessions(), &[]).unwrap();
        assert_eq!(report.interpretation.case, 0);
        assert!(report.parents.is_none());
    }
}
