//! Alignment of score rows with mapping entries.
//!
//! The score table and the mapping document share no key.  Both are in
//! score set order though, so they are walked in lock-step and the score
//! value is used to detect when they run out of step.

use crate::{
    common::Tolerance,
    data::{mappings::MappedScore, scores::ScoreRow},
};

use super::diagnostics::{Diagnostics, Warning};

/// A score row together with the mapping entry it was aligned to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair<'a> {
    /// The score row.
    pub row: &'a ScoreRow,
    /// The mapping entry.
    pub entry: &'a MappedScore,
}

/// Cursor over the mapping entries.
#[derive(Debug, Clone)]
pub struct Aligner<'a> {
    /// The mapping entries.
    entries: &'a [MappedScore],
    /// Tolerance for comparing scores.
    tolerance: Tolerance,
    /// Position of the next candidate entry.
    cursor: usize,
}

impl<'a> Aligner<'a> {
    /// Create a new `Aligner` positioned at the first entry.
    pub fn new(entries: &'a [MappedScore], tolerance: Tolerance) -> Self {
        Self {
            entries,
            tolerance,
            cursor: 0,
        }
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move past entries without score and return the candidate entry.
    ///
    /// Once the cursor has run past the end, the last entry is returned, so
    /// trailing rows are compared against it again.
    fn candidate(&mut self) -> Option<&'a MappedScore> {
        while self.cursor < self.entries.len() && self.entries[self.cursor].score.is_none() {
            self.cursor += 1;
        }
        let last = self.entries.len().checked_sub(1)?;
        Some(&self.entries[self.cursor.min(last)])
    }

    /// Try to align the row with the given score.
    ///
    /// # Returns
    ///
    /// The aligned entry if the scores agree.  Otherwise, a mismatch is
    /// recorded in `diagnostics`, `None` is returned, and the cursor stays
    /// where it is.
    ///
    /// # Errors
    ///
    /// If there are no entries at all.
    pub fn offer(
        &mut self,
        row: &ScoreRow,
        score: f64,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<&'a MappedScore>, anyhow::Error> {
        let entry = self
            .candidate()
            .ok_or_else(|| anyhow::anyhow!("mapping document has no mapped scores"))?;

        match entry.score {
            Some(mapped_score) if self.tolerance.is_close(score, mapped_score) => {
                self.cursor += 1;
                Ok(Some(entry))
            }
            mapped_score => {
                diagnostics.warn(Warning::ScoreMismatch {
                    accession: row.accession().to_string(),
                    hgvs_pro: row.hgvs_pro().to_string(),
                    score,
                    mapped_score,
                });
                Ok(None)
            }
        }
    }
}

/// Align score rows with mapping entries.
///
/// Rows with sentinel `hgvs_pro` values and rows without score are skipped.
///
/// # Arguments
///
/// * `rows` - Score rows, sorted by accession index.
/// * `entries` - Mapping entries in document order.
/// * `tolerance` - Tolerance for comparing scores.
/// * `diagnostics` - Receives a warning for each mismatching row.
///
/// # Returns
///
/// The aligned pairs in row order.
///
/// # Errors
///
/// If a score is not a number or there are no mapping entries.
pub fn align<'a>(
    rows: &'a [ScoreRow],
    entries: &'a [MappedScore],
    tolerance: Tolerance,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Pair<'a>>, anyhow::Error> {
    let mut aligner = Aligner::new(entries, tolerance);
    let mut result = Vec::new();
    for row in rows {
        if row.is_sentinel() {
            continue;
        }
        let Some(score) = row.score()? else {
            continue;
        };

        if let Some(entry) = aligner.offer(row, score, diagnostics)? {
            result.push(Pair { row, entry });
        }
    }

    Ok(result)
}

#[cfg(test)]
mod test {
    use crate::data::record::Record;

    use super::*;

    fn row(index: u64, hgvs_pro: &str, score: &str) -> ScoreRow {
        let fields: Record = [
            ("accession".to_string(), format!("x#{}", index)),
            ("hgvs_pro".to_string(), hgvs_pro.to_string()),
            ("score".to_string(), score.to_string()),
        ]
        .into_iter()
        .collect();
        ScoreRow { index, fields }
    }

    fn entry(score: Option<f64>) -> MappedScore {
        MappedScore {
            score,
            post_mapped: serde_json::Value::Null,
        }
    }

    fn aligned(pairs: &[Pair]) -> Vec<(u64, Option<f64>)> {
        pairs
            .iter()
            .map(|pair| (pair.row.index, pair.entry.score))
            .collect()
    }

    #[test]
    fn align_in_step() -> Result<(), anyhow::Error> {
        let rows = vec![row(1, "p.Met1Leu", "1.0"), row(2, "p.Ala2Val", "2.0")];
        let entries = vec![entry(Some(1.0)), entry(Some(2.0))];
        let mut diagnostics = Diagnostics::default();

        let pairs = align(&rows, &entries, Tolerance::default(), &mut diagnostics)?;

        assert_eq!(aligned(&pairs), vec![(1, Some(1.0)), (2, Some(2.0))]);
        assert!(diagnostics.is_empty());

        Ok(())
    }

    #[test]
    fn align_skips_sentinels_and_missing() -> Result<(), anyhow::Error> {
        let rows = vec![
            row(1, "_wt", "0.0"),
            row(2, "_sy", "0.1"),
            row(3, "p.Met1Leu", "NA"),
            row(4, "p.Ala2Val", "1.0"),
        ];
        let entries = vec![entry(Some(1.0))];
        let mut diagnostics = Diagnostics::default();

        let pairs = align(&rows, &entries, Tolerance::default(), &mut diagnostics)?;

        assert_eq!(aligned(&pairs), vec![(4, Some(1.0))]);
        assert!(diagnostics.is_empty());

        Ok(())
    }

    #[test]
    fn align_skips_null_entries() -> Result<(), anyhow::Error> {
        let rows = vec![row(1, "p.Met1Leu", "1.0"), row(2, "p.Ala2Val", "2.0")];
        let entries = vec![entry(None), entry(Some(1.0)), entry(None), entry(Some(2.0))];
        let mut diagnostics = Diagnostics::default();

        let pairs = align(&rows, &entries, Tolerance::default(), &mut diagnostics)?;

        assert_eq!(aligned(&pairs), vec![(1, Some(1.0)), (2, Some(2.0))]);
        assert!(diagnostics.is_empty());

        Ok(())
    }

    #[tracing_test::traced_test]
    #[test]
    fn mismatch_does_not_advance() -> Result<(), anyhow::Error> {
        let rows = vec![row(1, "p.Met1Leu", "1.0"), row(2, "p.Ala2Val", "2.0")];
        let entries = vec![entry(Some(2.0))];
        let mut diagnostics = Diagnostics::default();

        let pairs = align(&rows, &entries, Tolerance::default(), &mut diagnostics)?;

        assert_eq!(aligned(&pairs), vec![(2, Some(2.0))]);
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::ScoreMismatch {
                accession: "x#1".into(),
                hgvs_pro: "p.Met1Leu".into(),
                score: 1.0,
                mapped_score: Some(2.0),
            }]
        );
        assert!(logs_contain("score mismatch for x#1; p.Met1Leu"));

        Ok(())
    }

    #[test]
    fn offer_keeps_cursor_on_mismatch() -> Result<(), anyhow::Error> {
        let entries = vec![entry(Some(2.0)), entry(Some(3.0))];
        let mut aligner = Aligner::new(&entries, Tolerance::default());
        let mut diagnostics = Diagnostics::default();

        assert!(aligner
            .offer(&row(1, "p.Met1Leu", "1.0"), 1.0, &mut diagnostics)?
            .is_none());
        assert_eq!(aligner.cursor(), 0);
        assert!(aligner
            .offer(&row(2, "p.Ala2Val", "2.0"), 2.0, &mut diagnostics)?
            .is_some());
        assert_eq!(aligner.cursor(), 1);

        Ok(())
    }

    #[test]
    fn exhausted_cursor_compares_with_last() -> Result<(), anyhow::Error> {
        let rows = vec![
            row(1, "p.Met1Leu", "1.0"),
            row(2, "p.Ala2Val", "2.0"),
            row(3, "p.Ala2Gly", "2.0"),
        ];
        let entries = vec![entry(Some(1.0)), entry(Some(2.0))];
        let mut diagnostics = Diagnostics::default();

        let pairs = align(&rows, &entries, Tolerance::default(), &mut diagnostics)?;

        // The third row matches the last entry a second time.
        assert_eq!(
            aligned(&pairs),
            vec![(1, Some(1.0)), (2, Some(2.0)), (3, Some(2.0))]
        );

        Ok(())
    }

    #[test]
    fn exhausted_cursor_on_null_entry_is_mismatch() -> Result<(), anyhow::Error> {
        let rows = vec![row(1, "p.Met1Leu", "1.0"), row(2, "p.Ala2Val", "2.0")];
        let entries = vec![entry(Some(1.0)), entry(None)];
        let mut diagnostics = Diagnostics::default();

        let pairs = align(&rows, &entries, Tolerance::default(), &mut diagnostics)?;

        assert_eq!(aligned(&pairs), vec![(1, Some(1.0))]);
        assert_eq!(diagnostics.score_mismatches(), 1);

        Ok(())
    }

    #[test]
    fn no_entries_is_fatal() {
        let rows = vec![row(1, "p.Met1Leu", "1.0")];
        let mut diagnostics = Diagnostics::default();

        assert!(align(&rows, &[], Tolerance::default(), &mut diagnostics).is_err());
    }

    #[test]
    fn invalid_score_is_fatal() {
        let rows = vec![row(1, "p.Met1Leu", "high")];
        let entries = vec![entry(Some(1.0))];
        let mut diagnostics = Diagnostics::default();

        assert!(align(&rows, &entries, Tolerance::default(), &mut diagnostics).is_err());
    }
}
