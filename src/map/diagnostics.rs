//! Non-fatal problems found while mapping scores.

/// A non-fatal problem; the affected row does not make it into the output.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// The score of a row differs from the score of the mapping entry it is
    /// aligned with.
    ScoreMismatch {
        /// Accession of the score row.
        accession: String,
        /// Protein change of the score row.
        hgvs_pro: String,
        /// Score of the score row.
        score: f64,
        /// Score of the mapping entry.
        mapped_score: Option<f64>,
    },
    /// An HGVS string has no entry in the cross-reference matches.
    MissingMatch {
        /// The HGVS string.
        hgvs: String,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::ScoreMismatch {
                accession,
                hgvs_pro,
                ..
            } => write!(f, "score mismatch for {}; {}", accession, hgvs_pro),
            Warning::MissingMatch { hgvs } => {
                write!(f, "{} not found in HGVSp-variant matches", hgvs)
            }
        }
    }
}

/// Collects warnings in the order they are encountered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// The warnings.
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Log and remember `warning`.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", &warning);
        self.warnings.push(warning);
    }

    /// The collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of score mismatches.
    pub fn score_mismatches(&self) -> usize {
        self.warnings
            .iter()
            .filter(|warning| matches!(warning, Warning::ScoreMismatch { .. }))
            .count()
    }

    /// Number of missing matches.
    pub fn missing_matches(&self) -> usize {
        self.warnings
            .iter()
            .filter(|warning| matches!(warning, Warning::MissingMatch { .. }))
            .count()
    }

    /// Whether no warning was collected.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
