use crate::utils::Result;

/// Parameters of the two-state model for stretches of heterozygosity.
#[derive(Debug, Clone, PartialEq)]
pub struct HetStretchParams {
    pub avg_depth: f64,
    /// Fraction of sites where the parental genomes are heterozygous
    pub delta_het_parents: f64,
    /// Fraction of sites segregating between the parents
    pub avg_sites_segregating: f64,
    pub base_error: f64,
    /// cM per Mb
    pub recomb_rate: f64,
}

impl Default for HetStretchParams {
    fn default() -> Self {
        Self {
            avg_depth: 1.5,
            delta_het_parents: 0.99,
            avg_sites_segregating: 0.01,
            base_error: 0.0001,
            recomb_rate: 3.3,
        }
    }
}

impl HetStretchParams {
    pub fn validate(&self) -> Result<()> {
        check_depth(self.avg_depth)?;
        check_unit("delta_het_parents", self.delta_het_parents)?;
        check_unit("avg_sites_segregating", self.avg_sites_segregating)?;
        check_unit("base_error", self.base_error)?;
        check_rate(self.recomb_rate)
    }
}

/// Parameters of the three-state ancestry model of an F2 individual.
#[derive(Debug, Clone, PartialEq)]
pub struct F2AncestryParams {
    /// cM per Mb
    pub recomb_rate: f64,
    pub error_p1: f64,
    pub error_p2: f64,
    pub base_error: f64,
    pub avg_depth: f64,
}

impl Default for F2AncestryParams {
    fn default() -> Self {
        Self {
            recomb_rate: 3.5,
            error_p1: 0.00001,
            error_p2: 0.00001,
            base_error: 0.01,
            avg_depth: 1.5,
        }
    }
}

impl F2AncestryParams {
    pub fn validate(&self) -> Result<()> {
        check_unit("error_p1", self.error_p1)?;
        check_unit("error_p2", self.error_p2)?;
        check_unit("base_error", self.base_error)?;
        check_depth(self.avg_depth)?;
        check_rate(self.recomb_rate)
    }
}

/// Probability of a crossover between two adjacent markers, assuming the
/// markers are evenly spread over the chromosome.
pub fn recombination_fraction(chromosome_size_mb: f64, num_markers: usize, recomb_rate: f64) -> Result<f64> {
    if num_markers == 0 {
        return Err("Cannot build an ancestry model without markers".to_string());
    }
    let ri = (chromosome_size_mb / num_markers as f64) * recomb_rate / 100.0;
    if !(0.0..=1.0).contains(&ri) {
        return Err(format!(
            "Recombination fraction between markers must lie in [0, 1], got {:.4} ({} markers on {} Mb)",
            ri, num_markers, chromosome_size_mb
        ));
    }
    Ok(ri)
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("{} must lie in [0, 1], got {}", name, value));
    }
    Ok(())
}

fn check_depth(avg_depth: f64) -> Result<()> {
    if avg_depth.is_nan() || avg_depth < 1.0 {
        return Err(format!("Average depth must be at least 1, got {}", avg_depth));
    }
    Ok(())
}

fn check_rate(recomb_rate: f64) -> Result<()> {
    if recomb_rate.is_nan() || recomb_rate < 0.0 {
        return Err(format!("Recombination rate must be non-negative, got {}", recomb_rate));
    }
    Ok(())
}
