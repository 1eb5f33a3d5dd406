//! MaveDB mapping documents as produced by the variant mapping pipeline.

use std::{io::BufReader, path::Path};

use serde::{Deserialize, Deserializer};

/// Deserialize a score that is either a JSON number, a numeric string, or `null`.
fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(value)) => Ok(Some(value)),
        Some(NumberOrString::String(value)) => value
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid score {:?}: {}", value, e))),
    }
}

/// Top-level mapping document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MappingDocument {
    /// Score set URN, e.g., `urn:mavedb:00000001-a-1`.
    pub urn: String,
    /// Publication date of the score set.
    pub publish_date: Option<String>,
    /// Target of the score set.
    #[serde(default)]
    pub target: Option<Target>,
    /// PubMed identifiers of the score set publications.
    pub pubmed_ids: Vec<PubmedId>,
    /// The mapped scores, in score set order.
    pub mapped_scores: Vec<MappedScore>,
}

impl MappingDocument {
    /// The RefSeq identifier of the target, if any.
    pub fn refseq(&self) -> Option<&str> {
        self.target
            .as_ref()
            .and_then(|target| target.refseq.as_ref())
            .map(|refseq| refseq.identifier.as_str())
    }
}

/// Target of a score set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Target {
    /// RefSeq information, if any.
    #[serde(default)]
    pub refseq: Option<Refseq>,
}

/// RefSeq information of a target.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Refseq {
    /// RefSeq identifier, e.g., `NM_000001.1`.
    pub identifier: String,
}

/// A PubMed identifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PubmedId {
    /// The identifier.
    pub identifier: String,
}

/// One entry of `mapped_scores`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MappedScore {
    /// The score; `None` if the mapping failed for this entry.
    #[serde(deserialize_with = "deserialize_score")]
    pub score: Option<f64>,
    /// The raw post-mapping variant descriptor.
    ///
    /// Entries without a score often come with descriptors of a different
    /// shape, so this is only decoded when the entry is used.
    #[serde(default)]
    pub post_mapped: serde_json::Value,
}

impl MappedScore {
    /// Decode the post-mapping descriptor.
    ///
    /// # Errors
    ///
    /// If the descriptor does not have the expected structure.
    pub fn post_mapped(&self) -> Result<PostMapped, anyhow::Error> {
        let kind = self.post_mapped.get("type").and_then(serde_json::Value::as_str);
        if kind == Some("Haplotype") {
            let haplotype = Haplotype::deserialize(&self.post_mapped)
                .map_err(|e| anyhow::anyhow!("invalid haplotype descriptor: {}", e))?;
            Ok(PostMapped::Haplotype(haplotype.members))
        } else {
            let variant = VariantDescriptor::deserialize(&self.post_mapped)
                .map_err(|e| anyhow::anyhow!("invalid variant descriptor: {}", e))?;
            Ok(PostMapped::Variant(variant))
        }
    }
}

/// Decoded post-mapping descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum PostMapped {
    /// Single variant.
    Variant(VariantDescriptor),
    /// Multiple co-occurring variants.
    Haplotype(Vec<VariantDescriptor>),
}

/// Haplotype descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Haplotype {
    /// The member variants.
    members: Vec<VariantDescriptor>,
}

/// Single variant descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariantDescriptor {
    /// HGVS expressions of the variant.
    pub expressions: Vec<Expression>,
    /// VRS variation.
    #[serde(default)]
    pub variation: Option<Variation>,
    /// Reference allele sequence.
    #[serde(default)]
    pub vrs_ref_allele_seq: Option<String>,
    /// Alternate allele, for descriptors that carry it next to `variation`.
    #[serde(default)]
    pub state: Option<State>,
}

impl VariantDescriptor {
    /// The first HGVS expression.
    ///
    /// # Errors
    ///
    /// If there are no expressions.
    pub fn hgvs(&self) -> Result<&str, anyhow::Error> {
        self.expressions
            .first()
            .map(|expression| expression.value.as_str())
            .ok_or_else(|| anyhow::anyhow!("variant descriptor has no expressions"))
    }

    /// The VRS variation.
    ///
    /// # Errors
    ///
    /// If the descriptor has no `variation`.
    pub fn variation(&self) -> Result<&Variation, anyhow::Error> {
        self.variation
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("variant descriptor has no variation"))
    }

    /// The reference allele sequence.
    ///
    /// # Errors
    ///
    /// If the descriptor has no `vrs_ref_allele_seq`.
    pub fn reference(&self) -> Result<&str, anyhow::Error> {
        self.vrs_ref_allele_seq
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("variant descriptor has no vrs_ref_allele_seq"))
    }

    /// The alternate allele sequence.
    ///
    /// Taken from `variation.state` and from the descriptor's own `state`
    /// as a fallback.
    ///
    /// # Errors
    ///
    /// If neither carries a state.
    pub fn alt(&self) -> Result<&str, anyhow::Error> {
        self.variation
            .as_ref()
            .and_then(|variation| variation.state.as_ref())
            .or(self.state.as_ref())
            .map(|state| state.sequence.as_str())
            .ok_or_else(|| anyhow::anyhow!("variant descriptor has no state sequence"))
    }
}

/// An HGVS expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Expression {
    /// The HGVS string.
    pub value: String,
}

/// VRS variation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Variation {
    /// The location.
    pub location: Location,
    /// The alternate allele.
    #[serde(default)]
    pub state: Option<State>,
}

/// VRS sequence location.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    /// Interval on the sequence.
    pub interval: Interval,
}

/// VRS sequence interval, 0-based and half-open.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Interval {
    /// Start position.
    pub start: Number,
    /// End position.
    pub end: Number,
}

/// VRS number.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Number {
    /// The value.
    pub value: i64,
}

/// VRS literal sequence expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct State {
    /// The sequence.
    pub sequence: String,
}

/// Load mapping document JSON file.
///
/// # Arguments
///
/// * `path` - Path to the mapping document.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub fn load_file<P>(path: P) -> Result<MappingDocument, anyhow::Error>
where
    P: AsRef<Path>,
{
    tracing::debug!("opening mappings file: {:?}", path.as_ref());
    let reader = std::fs::File::open(path.as_ref())
        .map_err(|e| anyhow::anyhow!("problem opening file {:?}: {}", path.as_ref(), e))
        .map(BufReader::new)?;
    let document: MappingDocument = serde_json::from_reader(reader)
        .map_err(|e| anyhow::anyhow!("problem parsing mappings {:?}: {}", path.as_ref(), e))?;
    tracing::debug!(
        "read a total of {} mapped scores",
        document.mapped_scores.len()
    );

    Ok(document)
}
