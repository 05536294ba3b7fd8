use crate::inputs::{chromosome_regions, ReferencePanel};
use crate::utils::{normalize_chrom_label, GenomeLayout, Result};
use itertools::{EitherOrBoth, Itertools};

/// Fixed-length window `[start, end]` on one chromosome and the rows of the
/// binned array that fall inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Genome-wide window number, starting at 0.
    pub index: usize,
    pub chrom_index: usize,
    pub start: u64,
    pub end: u64,
    pub rows: Vec<usize>,
}

impl Window {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Integer midpoint of the window bounds.
    pub fn midpoint(&self) -> u64 {
        (self.start + self.end) / 2
    }
}

/// Panel-side and sample-side windows with identical bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPair {
    pub reference: Window,
    pub sample: Window,
}

/// Lazy windows over one chromosome.
#[derive(Debug, Clone)]
pub struct ChromBins<'a> {
    chrom_index: usize,
    positions: &'a [u64],
    offset: usize,
    chrom_len: u64,
    bin_len: u64,
    next_start: u64,
    cursor: usize,
}

impl<'a> ChromBins<'a> {
    pub fn new(
        chrom_index: usize,
        positions: &'a [u64],
        chrom_len: u64,
        bin_len: u64,
        offset: usize,
    ) -> Result<Self> {
        if bin_len == 0 {
            return Err("Window length must be greater than 0".to_string());
        }
        Ok(Self {
            chrom_index,
            positions,
            offset,
            chrom_len,
            bin_len,
            next_start: 1,
            cursor: 0,
        })
    }
}

impl Iterator for ChromBins<'_> {
    type Item = (usize, u64, u64, Vec<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_start > self.chrom_len {
            return None;
        }
        let start = self.next_start;
        let end = start.saturating_add(self.bin_len - 1);

        while self.cursor < self.positions.len() && self.positions[self.cursor] < start {
            self.cursor += 1;
        }
        let mut rows = Vec::new();
        while self.cursor < self.positions.len() && self.positions[self.cursor] <= end {
            rows.push(self.offset + self.cursor);
            self.cursor += 1;
        }

        self.next_start = end.saturating_add(1);
        Some((self.chrom_index, start, end, rows))
    }
}

/// Genome-wide window sequence, chromosome by chromosome in layout order.
#[derive(Debug, Clone)]
pub struct GenomeBins<'a> {
    chroms: std::vec::IntoIter<ChromBins<'a>>,
    current: Option<ChromBins<'a>>,
    emitted: usize,
}

impl<'a> GenomeBins<'a> {
    fn new(chroms: Vec<ChromBins<'a>>) -> Self {
        let mut chroms = chroms.into_iter();
        let current = chroms.next();
        Self {
            chroms,
            current,
            emitted: 0,
        }
    }
}

impl Iterator for GenomeBins<'_> {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        loop {
            let bins = self.current.as_mut()?;
            match bins.next() {
                Some((chrom_index, start, end, rows)) => {
                    let window = Window {
                        index: self.emitted,
                        chrom_index,
                        start,
                        end,
                        rows,
                    };
                    self.emitted += 1;
                    return Some(window);
                }
                None => self.current = self.chroms.next(),
            }
        }
    }
}

/// Windows over the reference panel. The panel must list the layout's
/// chromosomes first and in layout order.
pub fn bin_panel<'a>(
    panel: &'a ReferencePanel,
    layout: &GenomeLayout,
    bin_len: u64,
) -> Result<GenomeBins<'a>> {
    if panel.chromosomes.len() < layout.len()
        || panel
            .chromosomes
            .iter()
            .zip(layout.chromosomes())
            .any(|(label, spec)| *label != spec.label)
    {
        return Err(format!(
            "Reference panel chromosomes ({}) do not match the genome layout ({})",
            panel.chromosomes.iter().join(","),
            layout.chromosomes().iter().map(|c| &c.label).join(",")
        ));
    }

    let chroms = layout
        .chromosomes()
        .iter()
        .enumerate()
        .map(|(ix, spec)| {
            let (start, end) = panel.chr_regions[ix];
            ChromBins::new(ix, &panel.positions[start..end], spec.length, bin_len, start)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(GenomeBins::new(chroms))
}

/// Windows over an arbitrary chromosome/position array pair. Chromosomes of
/// the layout missing from the arrays still yield all their empty windows.
pub fn bin_arrays<'a, S: AsRef<str>>(
    chrs: &[S],
    positions: &'a [u64],
    layout: &GenomeLayout,
    bin_len: u64,
) -> Result<GenomeBins<'a>> {
    let labels: Vec<String> = chrs.iter().map(|c| normalize_chrom_label(c.as_ref())).collect();
    let regions = chromosome_regions(&labels, positions)?;
    if !regions
        .iter()
        .any(|(label, _, _)| layout.chrom_index(label).is_some())
    {
        return Err(format!(
            "None of the chromosomes ({}) are in the genome layout",
            regions.iter().map(|(label, _, _)| label).join(",")
        ));
    }

    let chroms = layout
        .chromosomes()
        .iter()
        .enumerate()
        .map(|(ix, spec)| {
            match regions.iter().find(|(label, _, _)| *label == spec.label) {
                Some((_, start, end)) => {
                    ChromBins::new(ix, &positions[*start..*end], spec.length, bin_len, *start)
                }
                None => ChromBins::new(ix, &[], spec.length, bin_len, 0),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(GenomeBins::new(chroms))
}

/// Zips two window sequences, failing on the first pair whose bounds differ
/// or when one sequence ends early.
pub fn align_bins<A, B>(reference: A, sample: B) -> impl Iterator<Item = Result<WindowPair>>
where
    A: Iterator<Item = Window>,
    B: Iterator<Item = Window>,
{
    reference.zip_longest(sample).map(|pair| match pair {
        EitherOrBoth::Both(reference, sample) => {
            if reference.chrom_index != sample.chrom_index
                || reference.start != sample.start
                || reference.end != sample.end
            {
                Err(format!(
                    "Window sequences out of sync: {}:{}-{} vs {}:{}-{}",
                    reference.chrom_index,
                    reference.start,
                    reference.end,
                    sample.chrom_index,
                    sample.start,
                    sample.end
                ))
            } else {
                Ok(WindowPair { reference, sample })
            }
        }
        EitherOrBoth::Left(w) | EitherOrBoth::Right(w) => Err(format!(
            "Window sequences have different lengths, unmatched window {}:{}-{}",
            w.chrom_index, w.start, w.end
        )),
    })
}

/// Rows of both sides that share a position inside the window pair, as two
/// equally long lists.
pub fn match_positions(
    pair: &WindowPair,
    reference_positions: &[u64],
    sample_positions: &[u64],
) -> (Vec<usize>, Vec<usize>) {
    intersect_rows(
        &pair.reference.rows,
        reference_positions,
        &pair.sample.rows,
        sample_positions,
    )
}

/// Two-pointer intersection of two row lists sorted by position.
pub fn intersect_rows(
    a_rows: &[usize],
    a_positions: &[u64],
    b_rows: &[usize],
    b_positions: &[u64],
) -> (Vec<usize>, Vec<usize>) {
    let mut matched_a = Vec::new();
    let mut matched_b = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a_rows.len() && j < b_rows.len() {
        let pos_a = a_positions[a_rows[i]];
        let pos_b = b_positions[b_rows[j]];
        if pos_a < pos_b {
            i += 1;
        } else if pos_a > pos_b {
            j += 1;
        } else {
            matched_a.push(a_rows[i]);
            matched_b.push(b_rows[j]);
            i += 1;
            j += 1;
        }
    }
    (matched_a, matched_b)
}
