//! Cross-references from HGVS protein changes to genomic variants.
//!
//! Two sources are supported: the JSON output of Ensembl Variant Recoder run
//! with `vcf_string` enabled, and a TSV file that already contains an `HGVSp`
//! column next to the variant columns.

use std::{
    io::{BufReader, Read},
    path::Path,
};

use super::record::Record;

/// Marker that Variant Recoder puts into the entry of an input it failed on.
pub const RECODER_FAILURE_MARKER: &str = "Unable to parse";

/// Name of the column holding the HGVS protein change.
pub const HGVSP_FIELD: &str = "HGVSp";

/// Mapping from HGVS protein change to candidate variant records.
pub type Matches = rustc_hash::FxHashMap<String, Vec<Record>>;

/// Format of a cross-reference file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    /// Guess from the file extension: `.tsv` and `.txt` are TSV, anything else JSON.
    #[default]
    Auto,
    /// Variant Recoder JSON output.
    Json,
    /// Tab-separated file with an `HGVSp` column.
    Tsv,
}

impl Format {
    /// Resolve `Auto` for the given path.
    pub fn resolve(self, path: &Path) -> Self {
        match self {
            Format::Auto => match path.extension().and_then(|ext| ext.to_str()) {
                Some("tsv") | Some("txt") => Format::Tsv,
                _ => Format::Json,
            },
            other => other,
        }
    }
}

/// Successful Variant Recoder result for one allele.
#[derive(Debug, Clone, serde::Deserialize)]
struct RecoderResult {
    /// The HGVS string given as input.
    input: String,
    /// VCF-style `chr-start-ref-alt` strings.
    vcf_string: Vec<String>,
}

/// Convert a VCF-style `chr-start-ref-alt` string into a record.
///
/// # Errors
///
/// If the string does not consist of four parts or the start is not a number.
pub fn parse_vcf_string(hgvs: &str, vcf_string: &str) -> Result<Record, anyhow::Error> {
    let parts = vcf_string.split('-').collect::<Vec<_>>();
    let [chrom, start, reference, alternative] = parts.as_slice() else {
        anyhow::bail!("invalid vcf_string {:?} for {}", vcf_string, hgvs);
    };
    let start_pos = start
        .parse::<i64>()
        .map_err(|e| anyhow::anyhow!("invalid start in vcf_string {:?}: {}", vcf_string, e))?;
    let end = start_pos + alternative.chars().count() as i64 - 1;

    Ok([
        (HGVSP_FIELD, hgvs.to_string()),
        ("chr", chrom.to_string()),
        ("start", start.to_string()),
        ("end", end.to_string()),
        ("ref", reference.to_string()),
        ("alt", alternative.to_string()),
    ]
    .into_iter()
    .collect())
}

/// Whether a Variant Recoder list entry signals a failure.
fn is_recoder_failure(entries: &[serde_json::Value]) -> bool {
    entries
        .first()
        .and_then(serde_json::Value::as_str)
        .map(|message| message.contains(RECODER_FAILURE_MARKER))
        .unwrap_or(false)
}

/// Load Variant Recoder JSON output from a reader.
///
/// # Errors
///
/// If the JSON does not have the expected structure.
pub fn load_recoder_reader<R>(reader: R) -> Result<Matches, anyhow::Error>
where
    R: Read,
{
    let results: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_reader(reader)
            .map_err(|e| anyhow::anyhow!("problem parsing Variant Recoder output: {}", e))?;

    let mut matches = Matches::default();
    for result in &results {
        for (allele, info) in result {
            if let serde_json::Value::Array(entries) = info {
                if is_recoder_failure(entries) {
                    tracing::debug!("skipping failed Variant Recoder entry {:?}", entries);
                    continue;
                }
            }

            let info = <RecoderResult as serde::Deserialize>::deserialize(info).map_err(|e| {
                anyhow::anyhow!("invalid Variant Recoder entry for allele {}: {}", allele, e)
            })?;
            for vcf_string in &info.vcf_string {
                let record = parse_vcf_string(&info.input, vcf_string)?;
                matches.entry(info.input.clone()).or_default().push(record);
            }
        }
    }

    Ok(matches)
}

/// Load `HGVSp` to variant matches from a TSV reader.
///
/// # Errors
///
/// If the TSV cannot be parsed or lacks the `HGVSp` column.
pub fn load_tsv_reader<R>(reader: R) -> Result<Matches, anyhow::Error>
where
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|e| anyhow::anyhow!("problem reading header: {}", e))?
        .clone();
    if !headers.iter().any(|header| header == HGVSP_FIELD) {
        anyhow::bail!("matches file lacks column {:?}", HGVSP_FIELD);
    }

    let mut matches = Matches::default();
    for record in csv_reader.records() {
        let record = record.map_err(|e| anyhow::anyhow!("problem parsing record: {}", e))?;
        let record: Record = headers.iter().zip(record.iter()).collect();
        let hgvs = record.get(HGVSP_FIELD).unwrap_or_default().to_string();
        matches.entry(hgvs).or_default().push(record);
    }

    Ok(matches)
}

/// Load cross-reference file.
///
/// # Arguments
///
/// * `path` - Path to the Variant Recoder JSON or `HGVSp` TSV file.
/// * `format` - File format; `Format::Auto` guesses from the extension.
///
/// # Returns
///
/// Candidate variant records by HGVS protein change.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub fn load_file<P>(path: P, format: Format) -> Result<Matches, anyhow::Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let format = format.resolve(path);
    tracing::debug!("opening {:?} cross-reference file: {:?}", format, path);
    let reader = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("problem opening file {:?}: {}", path, e))
        .map(BufReader::new)?;
    let matches = match format {
        Format::Tsv => load_tsv_reader(reader)?,
        Format::Json | Format::Auto => load_recoder_reader(reader)?,
    };
    tracing::debug!("read matches for {} HGVS protein changes", matches.len());

    Ok(matches)
}
