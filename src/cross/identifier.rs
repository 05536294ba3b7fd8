use super::binning::{align_bins, bin_arrays, bin_panel, intersect_rows, match_positions};
use super::interpreter;
use super::report::{save_report, CrossReport, Interpretation, ScoringReport, TopHit, REPORT_VERSION};
use super::scoring::{score_window, AccessionScores};
use super::writers::{ScoreRecord, TableWriter, WindowScoreRecord};
use crate::inputs::{ReferencePanel, SampleInputs};
use crate::utils::{create_writer, math, GenomeLayout, Genotype, Result};
use itertools::Itertools;
use std::cmp::Ordering;

/// Mean normalized score above which top hits are considered identical.
pub const PROB_THRESHOLD: f64 = 0.98;
/// Fraction of sample sites found in the panel separating a mixture from a
/// sample missing from the panel.
pub const OVERLAP_THRESHOLD: f64 = 0.5;
/// Accessions combined into simulated F1 hybrids.
pub const NUM_F1_PARENTS: usize = 10;
const PROGRESS_INTERVAL: usize = 50;

/// Genome-wide totals of the windowed scan.
#[derive(Debug, Clone)]
pub struct GenomeScan {
    pub totals: AccessionScores,
    pub num_matched: u64,
    pub overlap: f64,
    pub depth: f64,
    /// Chromosome of every window, in window order.
    pub window_chroms: Vec<String>,
}

pub struct CrossIdentifier<'a> {
    panel: &'a ReferencePanel,
    layout: &'a GenomeLayout,
    bin_len: u64,
    lr_threshold: f64,
}

impl<'a> CrossIdentifier<'a> {
    pub fn new(
        panel: &'a ReferencePanel,
        layout: &'a GenomeLayout,
        bin_len: u64,
        lr_threshold: f64,
    ) -> Self {
        Self {
            panel,
            layout,
            bin_len,
            lr_threshold,
        }
    }

    /// Scores the sample against the panel, simulates F1 hybrids among the best
    /// accessions and interprets the result. Writes the window score table,
    /// the score table and both reports under `output_prefix`.
    pub fn run(&self, sample: &SampleInputs, output_prefix: &str) -> Result<CrossReport> {
        let mut window_writer = create_writer(output_prefix, "windowscore.txt", TableWriter::new)?;
        let scan = self.scan_windows(sample, &mut window_writer)?;
        window_writer.finish()?;

        let scoring = self.scoring_report(&scan);
        log::info!(
            "Upstream interpretation: case {} ({})",
            scoring.interpretation.case,
            scoring.interpretation.text
        );
        create_writer(output_prefix, "scores.txt.matches.json", |path| {
            save_report(&scoring, path)
        })?;

        log::info!("Simulating F1s for top {} accessions", NUM_F1_PARENTS);
        let (hybrids, hybrid_scores) = self.simulate_f1s(sample, &scan);
        let table = self.score_table(&scan, &hybrids, &hybrid_scores);
        let mut score_writer = create_writer(output_prefix, "scores.txt", TableWriter::new)?;
        score_writer.write_scores(&table)?;
        score_writer.finish()?;

        let report = interpreter::interpret_cross(output_prefix, &self.panel.accessions, &scan.window_chroms)?;
        create_writer(output_prefix, "matches.json", |path| save_report(&report, path))?;
        log::info!(
            "Cross interpretation: case {} ({})",
            report.interpretation.case,
            report.interpretation.text
        );
        Ok(report)
    }

    /// Walks the genome window by window, writing the ambiguous accessions of
    /// every window and accumulating genome-wide totals.
    pub fn scan_windows(&self, sample: &SampleInputs, writer: &mut TableWriter) -> Result<GenomeScan> {
        let panel_bins = bin_panel(self.panel, self.layout, self.bin_len)?;
        let sample_bins = bin_arrays(&sample.chrs, &sample.positions, self.layout, self.bin_len)?;

        let mut totals = AccessionScores::zeros(self.panel.num_accessions());
        let mut num_matched = 0;
        let mut window_chroms = Vec::new();
        for pair in align_bins(panel_bins, sample_bins) {
            let pair = pair?;
            let (panel_rows, sample_rows) =
                match_positions(&pair, &self.panel.positions, &sample.positions);
            let weights: Vec<[f64; 3]> = sample_rows.iter().map(|&row| sample.weights[row]).collect();
            let scores = score_window(&self.panel.snps, &panel_rows, &weights)?;
            num_matched += panel_rows.len() as u64;
            totals.accumulate(&scores);

            let window = pair.reference.index + 1;
            writer.write_window_scores(&self.window_records(window, &scores))?;
            window_chroms.push(self.layout.label(pair.reference.chrom_index).to_string());
            if window % PROGRESS_INTERVAL == 0 {
                log::info!("Done analysing {} positions", num_matched);
            }
        }

        Ok(GenomeScan {
            totals,
            num_matched,
            overlap: num_matched as f64 / sample.len() as f64,
            depth: sample.mean_depth(),
            window_chroms,
        })
    }

    /// Records of the accessions indistinguishable from the best one in a
    /// window. Nothing is reported when none or all of them are.
    pub fn window_records(&self, window: usize, scores: &AccessionScores) -> Vec<WindowScoreRecord> {
        let (likelihoods, ratios) = scores.likelihoods();
        let ambiguous: Vec<usize> = (0..ratios.len())
            .filter(|&ix| ratios[ix] < self.lr_threshold)
            .collect();
        if ambiguous.is_empty() || ambiguous.len() >= scores.len() {
            return Vec::new();
        }

        let above: Vec<f64> = ratios
            .iter()
            .copied()
            .filter(|r| *r > self.lr_threshold)
            .collect();
        let next_best = math::nan_min(&above).unwrap_or(1.0);
        let normalized = scores.normalized();
        ambiguous
            .iter()
            .map(|&ix| WindowScoreRecord {
                accession: self.panel.accessions[ix].clone(),
                score: scores.scores[ix] as u64,
                num_info: scores.num_info[ix],
                normalized: normalized[ix],
                likelihood: likelihoods[ix],
                next_best,
                num_ambiguous: ambiguous.len(),
                window,
            })
            .collect()
    }

    pub fn scoring_report(&self, scan: &GenomeScan) -> ScoringReport {
        let (_, ratios) = scan.totals.likelihoods();
        let normalized = scan.totals.normalized();
        let mut top_hits: Vec<TopHit> = (0..ratios.len())
            .filter(|&ix| ratios[ix] < self.lr_threshold)
            .map(|ix| TopHit {
                accession: self.panel.accessions[ix].clone(),
                normalized_score: normalized[ix],
                num_info: scan.totals.num_info[ix],
            })
            .collect();
        top_hits.sort_by(|a, b| descending(a.normalized_score, b.normalized_score));

        ScoringReport {
            version: REPORT_VERSION,
            interpretation: upstream_case(&top_hits, scan.overlap),
            overlap: (scan.overlap, scan.num_matched),
            top_hits,
            depth: if scan.depth.is_nan() {
                None
            } else {
                Some(scan.depth)
            },
        }
    }

    /// Scores every pair of the best accessions as an F1 hybrid: sites where
    /// both parents are homozygous for the same allele expect that allele,
    /// sites where they differ expect a heterozygote.
    pub fn simulate_f1s(&self, sample: &SampleInputs, scan: &GenomeScan) -> (Vec<String>, AccessionScores) {
        let normalized = scan.totals.normalized();
        let ranked: Vec<usize> = (0..normalized.len())
            .sorted_by(|&a, &b| descending(normalized[a], normalized[b]))
            .take(NUM_F1_PARENTS)
            .collect();

        let mut panel_rows = Vec::new();
        let mut sample_rows = Vec::new();
        for chrom in &self.panel.chromosomes {
            let panel_chrom: Vec<usize> = self.panel.chromosome_rows(chrom).collect();
            let sample_chrom = sample.chromosome_rows(chrom);
            let (p, s) = intersect_rows(
                &panel_chrom,
                &self.panel.positions,
                &sample_chrom,
                &sample.positions,
            );
            panel_rows.extend(p);
            sample_rows.extend(s);
        }

        let mut labels = Vec::new();
        let mut scores = AccessionScores::zeros(0);
        for (&i, &j) in ranked.iter().tuple_combinations() {
            let mut score = 0.0;
            let mut num_info = 0;
            for (&panel_row, &sample_row) in panel_rows.iter().zip(&sample_rows) {
                let w = sample.weights[sample_row];
                let weight = match (self.panel.snps.get(panel_row, i), self.panel.snps.get(panel_row, j)) {
                    (Genotype::HomRef, Genotype::HomRef) => w[0],
                    (Genotype::HomAlt, Genotype::HomAlt) => w[2],
                    (Genotype::Missing, _) | (_, Genotype::Missing) => continue,
                    (p1, p2) if p1 != p2 => w[1],
                    _ => continue,
                };
                score += weight;
                num_info += 1;
            }
            labels.push(format!("{}x{}", self.panel.accessions[i], self.panel.accessions[j]));
            scores.scores.push(score);
            scores.num_info.push(num_info);
        }
        (labels, scores)
    }

    /// Genome-wide table of the panel accessions followed by the simulated
    /// hybrids, with likelihood ratios against the best row of either kind.
    pub fn score_table(&self, scan: &GenomeScan, hybrids: &[String], hybrid_scores: &AccessionScores) -> Vec<ScoreRecord> {
        let mut all = scan.totals.clone();
        all.scores.extend(&hybrid_scores.scores);
        all.num_info.extend(&hybrid_scores.num_info);
        let (likelihoods, ratios) = all.likelihoods();
        let normalized = all.normalized();

        self.panel
            .accessions
            .iter()
            .chain(hybrids)
            .enumerate()
            .map(|(ix, accession)| ScoreRecord {
                accession: accession.clone(),
                score: all.scores[ix] as u64,
                num_info: all.num_info[ix],
                normalized: normalized[ix],
                likelihood: likelihoods[ix],
                ratio: ratios[ix],
                num_snps: scan.num_matched,
                depth: scan.depth,
            })
            .collect()
    }
}

/// Descending order with NaN last.
fn descending(a: f64, b: f64) -> Ordering {
    let key = |v: f64| if v.is_nan() { f64::NEG_INFINITY } else { v };
    key(b).total_cmp(&key(a))
}

/// Classifies the genome-wide match before any cross interpretation.
pub fn upstream_case(top_hits: &[TopHit], overlap: f64) -> Interpretation {
    if top_hits.is_empty() {
        return Interpretation::new(1, "Ambiguous sample");
    }
    if top_hits.len() == 1 {
        return Interpretation::new(0, "Unique hit");
    }
    let scores: Vec<f64> = top_hits.iter().map(|h| h.normalized_score).collect();
    if math::mean(&scores).is_some_and(|m| m > PROB_THRESHOLD) {
        Interpretation::new(2, "Ambiguous sample: Accessions in top hits can be really close")
    } else if overlap > OVERLAP_THRESHOLD {
        Interpretation::new(
            3,
            "Ambiguous sample: Sample might contain mixture of DNA or contamination",
        )
    } else {
        Interpretation::new(
            4,
            "Ambiguous sample: Overlap of SNPs is very low, sample may not be in database",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ChromosomeSpec;

    fn hit(accession: &str, normalized_score: f64) -> TopHit {
        TopHit {
            accession: accession.to_string(),
            normalized_score,
            num_info: 100,
        }
    }

    fn small_layout() -> GenomeLayout {
        GenomeLayout::from_specs(vec![ChromosomeSpec {
            label: "1".to_string(),
            length: 100,
            recomb_rate: 3.5,
        }])
        .unwrap()
    }

    fn three_accession_panel() -> ReferencePanel {
        let mut data = String::from("chrom\tpos\t101\t102\t103\n");
        for pos in 1..=20 {
            let c = if pos % 2 == 0 { 0 } else { 1 };
            data.push_str(&format!("1\t{}\t0\t1\t{}\n", pos * 5, c));
        }
        ReferencePanel::from_reader(std::io::Cursor::new(data)).unwrap()
    }

    #[test]
    fn upstream_cases() {
        assert_eq!(upstream_case(&[], 0.9).case, 1);
        assert_eq!(upstream_case(&[hit("a", 0.5)], 0.1).case, 0);
        assert_eq!(upstream_case(&[hit("a", 0.99), hit("b", 0.985)], 0.9).case, 2);
        assert_eq!(upstream_case(&[hit("a", 0.7), hit("b", 0.6)], 0.9).case, 3);
        assert_eq!(upstream_case(&[hit("a", 0.7), hit("b", 0.6)], 0.3).case, 4);
    }

    #[test]
    fn descending_puts_nan_last() {
        let mut values = vec![0.2, f64::NAN, 0.9, 0.5];
        values.sort_by(|a, b| descending(*a, *b));
        assert_eq!(&values[..3], &[0.9, 0.5, 0.2]);
        assert!(values[3].is_nan());
    }

    #[test]
    fn window_records_list_ambiguous_accessions() {
        let panel = three_accession_panel();
        let layout = small_layout();
        let identifier = CrossIdentifier::new(&panel, &layout, 50, math::DEFAULT_LR_THRESHOLD);
        let scores = AccessionScores {
            scores: vec![20.0, 20.0, 5.0],
            num_info: vec![20, 20, 20],
        };
        let records = identifier.window_records(4, &scores);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].accession, "101");
        assert_eq!(records[1].accession, "102");
        assert_eq!(records[0].num_ambiguous, 2);
        assert_eq!(records[0].window, 4);
        assert!(records[0].next_best > math::DEFAULT_LR_THRESHOLD);

        let all_equal = AccessionScores {
            scores: vec![20.0; 3],
            num_info: vec![20; 3],
        };
        assert!(identifier.window_records(1, &all_equal).is_empty());
    }

    #[test]
    fn hybrid_of_homozygous_parents_matches_heterozygous_sample() {
        let panel = three_accession_panel();
        let layout = small_layout();
        let identifier = CrossIdentifier::new(&panel, &layout, 50, math::DEFAULT_LR_THRESHOLD);

        let mut sample = SampleInputs::default();
        for pos in 1..=20 {
            sample.push("Chr1", pos * 5, Genotype::Het, [0.0, 1.0, 0.0], Some(10));
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.windowscore.txt");
        let mut writer = TableWriter::new(path.to_str().unwrap()).unwrap();
        let scan = identifier.scan_windows(&sample, &mut writer).unwrap();
        writer.finish().unwrap();
        assert_eq!(scan.num_matched, 20);
        assert_eq!(scan.window_chroms, vec!["1", "1"]);

        let (labels, hybrid_scores) = identifier.simulate_f1s(&sample, &scan);
        assert_eq!(labels, vec!["101x102", "101x103", "102x103"]);
        assert_eq!(hybrid_scores.scores[0], 20.0);
        assert_eq!(hybrid_scores.num_info[0], 20);

        let table = identifier.score_table(&scan, &labels, &hybrid_scores);
        assert_eq!(table.len(), 6);
        assert_eq!(table[3].accession, "101x102");
        assert_eq!(table[3].ratio, 1.0);
        assert_eq!(table[3].num_snps, 20);
    }

    fn two_chromosome_layout() -> GenomeLayout {
        let spec = |label: &str| ChromosomeSpec {
            label: label.to_string(),
            length: 1000,
            recomb_rate: 3.5,
        };
        GenomeLayout::from_specs(vec![spec("1"), spec("2")]).unwrap()
    }

    // Windows of 100 bp holding 10, 12, 14, 16 or 18 sites.
    fn two_chromosome_sites() -> Vec<(&'static str, u64)> {
        let mut sites = Vec::new();
        for chrom in ["1", "2"] {
            for window in 0..10u64 {
                let count = 10 + (window % 5) * 2;
                for k in 0..count {
                    sites.push((chrom, window * 100 + 5 * (k + 1)));
                }
            }
        }
        sites
    }

    fn panel_from_calls<F: Fn(usize) -> [u8; 4]>(calls: F) -> ReferencePanel {
        let mut data = String::from("chrom\tpos\t1001\t1002\t1003\t1004\n");
        for (site, (chrom, pos)) in two_chromosome_sites().into_iter().enumerate() {
            let c = calls(site);
            data.push_str(&format!("{}\t{}\t{}\t{}\t{}\t{}\n", chrom, pos, c[0], c[1], c[2], c[3]));
        }
        ReferencePanel::from_reader(std::io::Cursor::new(data)).unwrap()
    }

    fn sample_from_calls<F: Fn(usize, &str) -> Genotype>(call: F) -> SampleInputs {
        let mut sample = SampleInputs::default();
        for (site, (chrom, pos)) in two_chromosome_sites().into_iter().enumerate() {
            let genotype = call(site, chrom);
            sample.push(chrom, pos, genotype, genotype.one_hot_weights(), None);
        }
        sample
    }

    fn homozygous(code: u8) -> Genotype {
        if code == 0 {
            Genotype::HomRef
        } else {
            Genotype::HomAlt
        }
    }

    fn identify(panel: &ReferencePanel, sample: &SampleInputs) -> CrossReport {
        let layout = two_chromosome_layout();
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("sample");
        let identifier = CrossIdentifier::new(panel, &layout, 100, math::DEFAULT_LR_THRESHOLD);
        let report = identifier.run(sample, prefix.to_str().unwrap()).unwrap();
        assert!(dir.path().join("sample.matches.json").exists());
        assert!(dir.path().join("sample.scores.txt").exists());
        report
    }

    // 1001 and 1002 alternate with different periods, 1003 and 1004 are
    // constant.
    fn patterned_calls(site: usize) -> [u8; 4] {
        [(site % 2) as u8, ((site / 2) % 2) as u8, 0, 1]
    }

    #[test]
    fn sample_identical_to_an_accession_is_a_unique_hit() {
        let panel = panel_from_calls(patterned_calls);
        let sample = sample_from_calls(|site, _| homozygous(patterned_calls(site)[0]));
        let report = identify(&panel, &sample);

        assert_eq!(report.interpretation.case, 0);
        assert_eq!(report.top_hits.len(), 1);
        assert_eq!(report.top_hits[0].accession, "1001");
        assert_eq!(report.overlap.1, 280);
        assert!(report.parents.is_none());
        assert!(report.matches.is_empty());
    }

    #[test]
    fn heterozygous_sample_is_an_f1_of_its_parents() {
        let panel = panel_from_calls(patterned_calls);
        let sample = sample_from_calls(|site, _| {
            let calls = patterned_calls(site);
            if calls[0] == calls[1] {
                homozygous(calls[0])
            } else {
                Genotype::Het
            }
        });
        let report = identify(&panel, &sample);

        assert_eq!(report.interpretation.case, 5);
        let parents = report.parents.unwrap();
        assert_eq!(parents.mother.0, "1001");
        assert_eq!(parents.father.unwrap().0, "1002");
    }

    #[test]
    fn block_mixture_of_two_accessions_is_an_f2() {
        let panel = panel_from_calls(|site| [0, 1, (site % 2) as u8, ((site / 2) % 2) as u8]);
        let sample = sample_from_calls(|_, chrom| if chrom == "1" { Genotype::HomRef } else { Genotype::HomAlt });
        let report = identify(&panel, &sample);

        assert_eq!(report.interpretation.case, 6);
        assert_eq!(report.interpretation.text, "Sample may be a F2!");
        let parents = report.parents.unwrap();
        assert_eq!(parents.mother, ("1001".to_string(), 10));
        assert_eq!(parents.father, Some(("1002".to_string(), 10)));
        assert_eq!(report.matches, vec![("1001".to_string(), 8), ("1002".to_string(), 8)]);

        let genotype_windows = report.genotype_windows.unwrap();
        let chr_bins = genotype_windows.chr_bins.unwrap();
        assert_eq!(chr_bins["1"], 10);
        assert_eq!(chr_bins["2"], 10);
        // Windows with 10 sites fall below the informative-site cutoff.
        let expected: Vec<String> = (1..=20)
            .map(|window| match window {
                1 | 6 | 11 | 16 => "NA",
                w if w <= 10 => "1001",
                _ => "1002",
            })
            .map(|label| label.to_string())
            .collect();
        assert_eq!(genotype_windows.coordinates.x, Some((1..=20).collect()));
        assert_eq!(genotype_windows.coordinates.y, Some(expected));
    }
}
