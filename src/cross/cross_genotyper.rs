use super::binning::{align_bins, bin_arrays, match_positions, WindowPair};
use super::caller::{call_window, parental_counts, WindowCall, MIN_MARKERS};
use super::writers::{PopulationWindowRow, SampleWindowRow};
use crate::inputs::{ReferencePanel, SampleInputs, SampleMatrix};
use crate::utils::{GenomeLayout, Genotype, Result};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const PROGRESS_INTERVAL: usize = 40;

/// Sites where both parents are homozygous for different alleles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegregatingSites {
    pub chrs: Vec<String>,
    pub positions: Vec<u64>,
    pub parent1: Vec<Genotype>,
    pub parent2: Vec<Genotype>,
}

impl SegregatingSites {
    /// Parents given as `ID1xID2`, both looked up in the panel.
    pub fn from_panel(panel: &ReferencePanel, parents: &str) -> Result<Self> {
        let ids: Vec<&str> = parents.split('x').collect();
        if ids.len() != 2 || ids.iter().any(|id| id.is_empty()) {
            return Err(format!("Parents should be provided as 'ID1xID2', got '{}'", parents));
        }
        let lookup = |id: &str| {
            panel
                .accession_index(id)
                .ok_or_else(|| format!("Parent {} is not in the reference panel", id))
        };
        let (p1, p2) = (lookup(ids[0])?, lookup(ids[1])?);

        let mut sites = SegregatingSites::default();
        for (chrom, &(start, end)) in panel.chromosomes.iter().zip(&panel.chr_regions) {
            for row in start..end {
                sites.push(chrom, panel.positions[row], panel.snps.get(row, p1), panel.snps.get(row, p2));
            }
        }
        log::info!("Number of segregating SNPs between parents: {}", sites.len());
        Ok(sites)
    }

    /// Parents given as two genotype files. Sites are merged per chromosome
    /// over the union of positions; a site absent from one parent is missing
    /// for it.
    pub fn from_parent_samples(parent1: &SampleInputs, parent2: &SampleInputs) -> Self {
        let calls1 = calls_by_site(parent1);
        let calls2 = calls_by_site(parent2);
        let union: BTreeSet<(&str, u64)> = calls1.keys().chain(calls2.keys()).copied().collect();

        let mut sites = SegregatingSites::default();
        for key in union {
            let g1 = calls1.get(&key).copied().unwrap_or(Genotype::Missing);
            let g2 = calls2.get(&key).copied().unwrap_or(Genotype::Missing);
            sites.push(key.0, key.1, g1, g2);
        }
        log::info!("Number of segregating SNPs between parents: {}", sites.len());
        sites
    }

    fn push(&mut self, chrom: &str, position: u64, g1: Genotype, g2: Genotype) {
        if g1.is_homozygous() && g2.is_homozygous() && g1 != g2 {
            self.chrs.push(chrom.to_string());
            self.positions.push(position);
            self.parent1.push(g1);
            self.parent2.push(g2);
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

fn calls_by_site(inputs: &SampleInputs) -> BTreeMap<(&str, u64), Genotype> {
    let mut calls = BTreeMap::new();
    for row in 0..inputs.len() {
        calls
            .entry((inputs.chrs[row].as_str(), inputs.positions[row]))
            .or_insert(inputs.genotypes[row]);
    }
    calls
}

/// Calls windows of cross progeny as parent 1, heterozygous or parent 2.
pub struct CrossGenotyper<'a> {
    sites: SegregatingSites,
    layout: &'a GenomeLayout,
    bin_len: u64,
    lr_threshold: f64,
}

impl<'a> CrossGenotyper<'a> {
    pub fn new(sites: SegregatingSites, layout: &'a GenomeLayout, bin_len: u64, lr_threshold: f64) -> Result<Self> {
        if sites.is_empty() {
            return Err("No site segregates between the parents".to_string());
        }
        Ok(Self {
            sites,
            layout,
            bin_len,
            lr_threshold,
        })
    }

    fn call(&self, sample: &[Genotype], site_rows: &[usize]) -> WindowCall {
        let parent1: Vec<Genotype> = site_rows.iter().map(|&r| self.sites.parent1[r]).collect();
        let parent2: Vec<Genotype> = site_rows.iter().map(|&r| self.sites.parent2[r]).collect();
        let counts = parental_counts(sample, &parent1, &parent2);
        call_window(counts, site_rows.len() as u64, self.lr_threshold, MIN_MARKERS)
    }

    fn window_pairs<S: AsRef<str>>(&self, chrs: &[S], positions: &[u64]) -> Result<Vec<WindowPair>> {
        let site_bins = bin_arrays(&self.sites.chrs, &self.sites.positions, self.layout, self.bin_len)?;
        let sample_bins = bin_arrays(chrs, positions, self.layout, self.bin_len)?;
        align_bins(site_bins, sample_bins).collect()
    }

    /// One row per window for a single sample.
    pub fn genotype_sample(&self, sample: &SampleInputs) -> Result<Vec<SampleWindowRow>> {
        log::info!("Running cross genotyper");
        let mut rows = Vec::new();
        for pair in self.window_pairs(&sample.chrs, &sample.positions)? {
            let (site_rows, sample_rows) = match_positions(&pair, &self.sites.positions, &sample.positions);
            let call = if sample_rows.is_empty() {
                WindowCall::not_called()
            } else {
                let calls: Vec<Genotype> = sample_rows.iter().map(|&r| sample.genotypes[r]).collect();
                self.call(&calls, &site_rows)
            };
            rows.push(SampleWindowRow {
                window: pair.reference.index + 1,
                num_matched: sample_rows.len(),
                num_segregating: pair.reference.rows.len(),
                call,
            });
            if rows.len() % PROGRESS_INTERVAL == 0 {
                log::info!("Progress: {} windows", rows.len());
            }
        }
        Ok(rows)
    }

    /// One row per window for every sample of a population, windows called
    /// in parallel on the current rayon pool.
    pub fn genotype_population(&self, matrix: &SampleMatrix) -> Result<Vec<PopulationWindowRow>> {
        log::info!("Running cross genotyper on {} samples", matrix.num_samples());
        let pairs = self.window_pairs(&matrix.chrs, &matrix.positions)?;
        let rows = pairs
            .par_iter()
            .map(|pair| {
                let (site_rows, sample_rows) =
                    match_positions(pair, &self.sites.positions, &matrix.positions);
                let calls = (0..matrix.num_samples())
                    .map(|sample| {
                        if sample_rows.is_empty() {
                            WindowCall::not_called()
                        } else {
                            self.call(&matrix.sample_calls(sample, &sample_rows), &site_rows)
                        }
                    })
                    .collect();
                let spec = &self.layout.chromosomes()[pair.reference.chrom_index];
                PopulationWindowRow {
                    window: pair.reference.index + 1,
                    chrom: spec.label.clone(),
                    cm_mid: spec.recomb_rate * pair.reference.midpoint() as f64 / 1_000_000.0,
                    calls,
                }
            })
            .collect();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cross::caller::WindowGenotype;
    use crate::utils::ChromosomeSpec;

    fn layout() -> GenomeLayout {
        GenomeLayout::from_specs(vec![ChromosomeSpec {
            label: "1".to_string(),
            length: 200,
            recomb_rate: 4.0,
        }])
        .unwrap()
    }

    fn panel() -> ReferencePanel {
        let mut data = String::from("chrom\tpos\tP1\tP2\tP3\n");
        for pos in 1..=20 {
            let p2 = if pos == 20 { "0" } else { "1" };
            data.push_str(&format!("1\t{}\t0\t{}\t-1\n", pos * 5, p2));
        }
        ReferencePanel::from_reader(std::io::Cursor::new(data)).unwrap()
    }

    #[test]
    fn segregating_sites_from_panel() {
        let sites = SegregatingSites::from_panel(&panel(), "P1xP2").unwrap();
        assert_eq!(sites.len(), 19);
        assert_eq!(sites.parent1[0], Genotype::HomRef);
        assert_eq!(sites.parent2[0], Genotype::HomAlt);
        assert!(SegregatingSites::from_panel(&panel(), "P1xP3").unwrap().is_empty());
    }

    #[test]
    fn malformed_or_unknown_parents_err() {
        assert!(SegregatingSites::from_panel(&panel(), "P1P2").is_err());
        assert!(SegregatingSites::from_panel(&panel(), "P1xP9").is_err());
        assert!(SegregatingSites::from_panel(&panel(), "P1xP2xP3").is_err());
    }

    #[test]
    fn segregating_sites_from_parent_files() {
        let mut p1 = SampleInputs::default();
        let mut p2 = SampleInputs::default();
        for pos in [10, 20, 30] {
            p1.push("1", pos, Genotype::HomRef, Genotype::HomRef.one_hot_weights(), None);
        }
        p2.push("1", 20, Genotype::HomAlt, Genotype::HomAlt.one_hot_weights(), None);
        p2.push("1", 30, Genotype::HomRef, Genotype::HomRef.one_hot_weights(), None);
        p2.push("1", 40, Genotype::HomAlt, Genotype::HomAlt.one_hot_weights(), None);
        let sites = SegregatingSites::from_parent_samples(&p1, &p2);
        assert_eq!(sites.positions, vec![20]);
    }

    #[test]
    fn genotypes_windows_of_one_sample() {
        let sites = SegregatingSites::from_panel(&panel(), "P1xP2").unwrap();
        let layout = layout();
        let genotyper = CrossGenotyper::new(sites, &layout, 50, 2.706).unwrap();

        let mut sample = SampleInputs::default();
        for pos in 1..=10 {
            sample.push("1", pos * 5, Genotype::HomRef, [1.0, 0.0, 0.0], None);
        }
        for pos in 11..=19 {
            sample.push("1", pos * 5, Genotype::HomAlt, [0.0, 0.0, 1.0], None);
        }
        let rows = genotyper.genotype_sample(&sample).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].call.genotype, WindowGenotype::Parent1);
        assert_eq!(rows[0].num_matched, 10);
        assert_eq!(rows[1].call.genotype, WindowGenotype::Parent2);
        assert_eq!(rows[2].call.genotype, WindowGenotype::NotCalled);
        assert_eq!(rows[2].to_line(), "3\t0\t0\tNA\tNA");
    }

    #[test]
    fn genotypes_population_in_window_order() {
        let sites = SegregatingSites::from_panel(&panel(), "P1xP2").unwrap();
        let layout = layout();
        let genotyper = CrossGenotyper::new(sites, &layout, 50, 2.706).unwrap();

        let mut data = String::from("chrom\tpos\tF2_1\tF2_2\n");
        for pos in 1..=19 {
            data.push_str(&format!("1\t{}\t0/1\t1/1\n", pos * 5));
        }
        let matrix = SampleMatrix::from_reader(std::io::Cursor::new(data)).unwrap();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let rows = pool.install(|| genotyper.genotype_population(&matrix)).unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows.iter().map(|r| r.window).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(rows[0].calls[0].genotype, WindowGenotype::Het);
        assert_eq!(rows[0].calls[1].genotype, WindowGenotype::Parent2);
        assert_eq!(rows[3].to_line(), "4,1,0.0007,NA,NA");
    }
}
