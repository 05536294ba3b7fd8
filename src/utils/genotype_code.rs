use std::fmt;
use std::str::FromStr;

/// Diploid genotype call in the binary code scheme of the reference panel:
/// `0` homozygous reference, `1` homozygous alternative, `2` heterozygous,
/// `-1` missing.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Genotype {
    HomRef,
    HomAlt,
    Het,
    Missing,
}

impl Genotype {
    pub fn code(self) -> i8 {
        match self {
            Genotype::HomRef => 0,
            Genotype::HomAlt => 1,
            Genotype::Het => 2,
            Genotype::Missing => -1,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, String> {
        match code {
            0 => Ok(Genotype::HomRef),
            1 => Ok(Genotype::HomAlt),
            2 => Ok(Genotype::Het),
            -1 => Ok(Genotype::Missing),
            _ => Err(format!("Unknown genotype code: {}", code)),
        }
    }

    /// Builds a call from the allele indices of a VCF genotype field.
    pub fn from_alleles(alleles: &[Option<u32>]) -> Self {
        if alleles.is_empty() || alleles.iter().any(|a| a.is_none()) {
            return Genotype::Missing;
        }
        let first = alleles[0];
        if alleles.iter().any(|a| *a != first) {
            Genotype::Het
        } else if first == Some(0) {
            Genotype::HomRef
        } else {
            Genotype::HomAlt
        }
    }

    pub fn is_called(self) -> bool {
        self != Genotype::Missing
    }

    pub fn is_homozygous(self) -> bool {
        matches!(self, Genotype::HomRef | Genotype::HomAlt)
    }

    /// One-hot weight triplet `[w_homref, w_het, w_homalt]`.
    pub fn one_hot_weights(self) -> [f64; 3] {
        match self {
            Genotype::HomRef => [1.0, 0.0, 0.0],
            Genotype::Het => [0.0, 1.0, 0.0],
            Genotype::HomAlt => [0.0, 0.0, 1.0],
            Genotype::Missing => [0.0, 0.0, 0.0],
        }
    }
}

impl FromStr for Genotype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "-1" | "." | "./." | ".|." | "NA" | "" => return Ok(Genotype::Missing),
            "0" => return Ok(Genotype::HomRef),
            "1" => return Ok(Genotype::HomAlt),
            "2" => return Ok(Genotype::Het),
            _ => {}
        }

        // VCF-style genotype, possibly followed by other FORMAT fields
        let gt = s.split(':').next().unwrap_or(s);
        let alleles = gt
            .split(['/', '|'])
            .map(|a| match a {
                "." => Ok(None),
                _ => a
                    .parse::<u32>()
                    .map(Some)
                    .map_err(|_| format!("Failed to parse genotype: {}", s)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if alleles.len() < 2 {
            return Err(format!("Failed to parse genotype: {}", s));
        }
        Ok(Genotype::from_alleles(&alleles))
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
