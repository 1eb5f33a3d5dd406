//! Joining of aligned score rows with variant information.

use itertools::Itertools as _;

use crate::{
    data::{
        mappings::{MappingDocument, PostMapped, VariantDescriptor},
        record::Record,
        xref::{Matches, HGVSP_FIELD},
    },
    ensembl::ChromosomeCache,
};

use super::{
    align::Pair,
    diagnostics::{Diagnostics, Warning},
    round::round_record,
};

/// Per-dataset fields shared by all output records.
///
/// # Arguments
///
/// * `document` - The mapping document.
///
/// # Returns
///
/// Record with `urn`, `publish_date`, `refseq`, and `pubmed`.
pub fn metadata(document: &MappingDocument) -> Record {
    let pubmed = document
        .pubmed_ids
        .iter()
        .map(|pubmed_id| pubmed_id.identifier.as_str())
        .join(",");
    [
        ("urn", document.urn.as_str()),
        ("publish_date", document.publish_date.as_deref().unwrap_or_default()),
        ("refseq", document.refseq().unwrap_or_default()),
        ("pubmed", pubmed.as_str()),
    ]
    .into_iter()
    .collect()
}

/// Combines aligned pairs with coordinates and metadata into output records.
pub struct Joiner<'a> {
    /// Per-dataset fields.
    metadata: Record,
    /// Cross-reference matches; without them, expressions are genomic.
    matches: Option<&'a Matches>,
    /// Chromosome lookup for genomic expressions.
    chromosomes: &'a mut ChromosomeCache,
    /// Number of decimal places to round score fields to, if any.
    round: Option<usize>,
}

impl<'a> Joiner<'a> {
    /// Create a new `Joiner`.
    ///
    /// # Arguments
    ///
    /// * `metadata` - Per-dataset fields, see [`metadata`].
    /// * `matches` - Cross-reference matches, if any.
    /// * `chromosomes` - Chromosome lookup, only used without matches.
    /// * `round` - Number of decimal places for numeric score fields.
    pub fn new(
        metadata: Record,
        matches: Option<&'a Matches>,
        chromosomes: &'a mut ChromosomeCache,
        round: Option<usize>,
    ) -> Self {
        Self {
            metadata,
            matches,
            chromosomes,
            round,
        }
    }

    /// Build the output records of one aligned pair.
    ///
    /// Haplotypes yield records for each member.
    ///
    /// # Errors
    ///
    /// If the descriptor of the mapping entry is malformed or the chromosome
    /// cannot be resolved.
    pub fn join(
        &mut self,
        pair: &Pair,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Record>, anyhow::Error> {
        let mut row = pair.row.fields.clone();
        if let Some(places) = self.round {
            round_record(&mut row, places);
        }

        let post_mapped = pair.entry.post_mapped().map_err(|e| {
            anyhow::anyhow!("mapping for {} is malformed: {}", pair.row.accession(), e)
        })?;
        match post_mapped {
            PostMapped::Variant(variant) => self.join_variant(&variant, &row, diagnostics),
            PostMapped::Haplotype(members) => {
                let mut result = Vec::new();
                for member in &members {
                    result.extend(self.join_variant(member, &row, diagnostics)?);
                }
                Ok(result)
            }
        }
    }

    /// Build the output records of a single variant.
    fn join_variant(
        &mut self,
        variant: &VariantDescriptor,
        row: &Record,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Record>, anyhow::Error> {
        let hgvs = variant.hgvs()?;
        let matches = self.matches;
        let mut result = match matches {
            None => vec![self.genomic_record(hgvs, variant)?],
            Some(matches) => match matches.get(hgvs) {
                None => {
                    diagnostics.warn(Warning::MissingMatch {
                        hgvs: hgvs.to_string(),
                    });
                    Vec::new()
                }
                Some(candidates) => candidates
                    .iter()
                    .map(|candidate| {
                        let mut record = candidate.clone();
                        let hgvsp = candidate.get(HGVSP_FIELD).unwrap_or(hgvs).to_string();
                        record.insert("hgvs", hgvsp);
                        record
                    })
                    .collect(),
            },
        };

        for record in result.iter_mut() {
            record.update(&self.metadata);
            record.update(row);
        }
        Ok(result)
    }

    /// Coordinates of a genomic expression from its VRS descriptor.
    fn genomic_record(
        &mut self,
        hgvs: &str,
        variant: &VariantDescriptor,
    ) -> Result<Record, anyhow::Error> {
        let interval = &variant.variation()?.location.interval;
        let chrom = self.chromosomes.chromosome_for(hgvs)?;

        Ok([
            ("chr", chrom),
            ("start", (interval.start.value + 1).to_string()),
            ("end", interval.end.value.to_string()),
            ("ref", variant.reference()?.to_string()),
            ("alt", variant.alt()?.to_string()),
            ("hgvs", hgvs.to_string()),
        ]
        .into_iter()
        .collect())
    }
}
