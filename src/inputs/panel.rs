use super::table::{chromosome_regions, GenotypeTable};
use crate::utils::{normalize_chrom_label, open_text_reader, Genotype, Result};
use std::io::BufRead;
use std::ops::Range;
use std::path::Path;

/// Dense marker-by-accession genotype matrix, row-major.
#[derive(Debug, Clone)]
pub struct GenotypeMatrix {
    num_markers: usize,
    num_accessions: usize,
    data: Vec<Genotype>,
}

impl GenotypeMatrix {
    pub fn new(num_markers: usize, num_accessions: usize, data: Vec<Genotype>) -> Result<Self> {
        if data.len() != num_markers * num_accessions {
            return Err(format!(
                "Genotype matrix of {} x {} cannot hold {} calls",
                num_markers,
                num_accessions,
                data.len()
            ));
        }
        Ok(Self {
            num_markers,
            num_accessions,
            data,
        })
    }

    #[inline]
    pub fn get(&self, marker: usize, accession: usize) -> Genotype {
        self.data[marker * self.num_accessions + accession]
    }

    pub fn row(&self, marker: usize) -> &[Genotype] {
        let start = marker * self.num_accessions;
        &self.data[start..start + self.num_accessions]
    }

    pub fn num_markers(&self) -> usize {
        self.num_markers
    }

    pub fn num_accessions(&self) -> usize {
        self.num_accessions
    }
}

/// Reference panel of accessions genotyped on a shared set of sites.
#[derive(Debug, Clone)]
pub struct ReferencePanel {
    pub accessions: Vec<String>,
    /// Normalized chromosome labels in file order.
    pub chromosomes: Vec<String>,
    /// Row range `[start, end)` of each entry in `chromosomes`.
    pub chr_regions: Vec<(usize, usize)>,
    pub positions: Vec<u64>,
    pub snps: GenotypeMatrix,
}

impl ReferencePanel {
    pub fn from_path(path: &Path) -> Result<Self> {
        log::info!("Loading reference panel {}", path.display());
        let reader = open_text_reader(path)?;
        let panel = Self::from_reader(reader)
            .map_err(|e| format!("Reference panel {}: {}", path.display(), e))?;
        log::info!(
            "Loaded {} accessions on {} sites",
            panel.num_accessions(),
            panel.num_markers()
        );
        Ok(panel)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let table = GenotypeTable::from_reader(reader)?;
        Self::new(table.columns, table.chrs, table.positions, table.calls)
    }

    pub fn new(
        accessions: Vec<String>,
        chrs: Vec<String>,
        positions: Vec<u64>,
        calls: Vec<Genotype>,
    ) -> Result<Self> {
        let chrs: Vec<String> = chrs.iter().map(|c| normalize_chrom_label(c)).collect();
        let regions = chromosome_regions(&chrs, &positions)?;
        let snps = GenotypeMatrix::new(positions.len(), accessions.len(), calls)?;
        Ok(Self {
            accessions,
            chromosomes: regions.iter().map(|(label, _, _)| label.clone()).collect(),
            chr_regions: regions.iter().map(|(_, start, end)| (*start, *end)).collect(),
            positions,
            snps,
        })
    }

    pub fn num_accessions(&self) -> usize {
        self.accessions.len()
    }

    pub fn num_markers(&self) -> usize {
        self.positions.len()
    }

    pub fn accession_index(&self, name: &str) -> Option<usize> {
        self.accessions.iter().position(|a| a == name)
    }

    pub fn has_chromosome(&self, label: &str) -> bool {
        let label = normalize_chrom_label(label);
        self.chromosomes.iter().any(|c| *c == label)
    }

    /// Rows of the panel on a chromosome, empty when the panel lacks it.
    pub fn chromosome_rows(&self, label: &str) -> Range<usize> {
        let label = normalize_chrom_label(label);
        self.chromosomes
            .iter()
            .position(|c| *c == label)
            .map(|ix| self.chr_regions[ix].0..self.chr_regions[ix].1)
            .unwrap_or(0..0)
    }

    /// Genotype column of one accession.
    pub fn accession_calls(&self, accession: usize) -> Vec<Genotype> {
        (0..self.num_markers())
            .map(|marker| self.snps.get(marker, accession))
            .collect()
    }
}
