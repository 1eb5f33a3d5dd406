//! MaveDB score tables.

use std::{
    io::{BufReader, Read},
    path::Path,
};

use super::record::Record;

/// Values of `hgvs_pro` that mark synonymous and wild-type rows.
pub const SENTINEL_HGVS_PRO: &[&str] = &["_sy", "_wt"];

/// Name of the bookkeeping field holding the sort index.
pub const INDEX_FIELD: &str = "index";

/// One row of a MaveDB score table.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    /// Sort index taken from the `#N` suffix of the accession.
    pub index: u64,
    /// All columns of the row in file order, plus the `index` field.
    pub fields: Record,
}

impl ScoreRow {
    /// The `accession` value of the row.
    pub fn accession(&self) -> &str {
        self.fields.get("accession").unwrap_or_default()
    }

    /// The `hgvs_pro` value of the row.
    pub fn hgvs_pro(&self) -> &str {
        self.fields.get("hgvs_pro").unwrap_or_default()
    }

    /// Whether the row is a synonymous or wild-type row.
    pub fn is_sentinel(&self) -> bool {
        SENTINEL_HGVS_PRO.contains(&self.hgvs_pro())
    }

    /// The numeric score of the row.
    ///
    /// # Returns
    ///
    /// `None` if the score is missing, i.e., `NA` or empty.
    ///
    /// # Errors
    ///
    /// In the case that the score is present but not a number.
    pub fn score(&self) -> Result<Option<f64>, anyhow::Error> {
        match self.fields.get("score").map(str::trim) {
            None | Some("") | Some("NA") => Ok(None),
            Some(value) => value.parse::<f64>().map(Some).map_err(|e| {
                anyhow::anyhow!(
                    "invalid score {:?} for accession {}: {}",
                    value,
                    self.accession(),
                    e
                )
            }),
        }
    }
}

/// Extract the sort index from an accession such as `urn:mavedb:00000001-a-1#42`.
///
/// # Errors
///
/// If the accession has no `#` suffix or the suffix is not an integer.
pub fn accession_index(accession: &str) -> Result<u64, anyhow::Error> {
    let (_, suffix) = accession
        .split_once('#')
        .ok_or_else(|| anyhow::anyhow!("accession {:?} lacks a '#<index>' suffix", accession))?;
    let suffix = suffix.split('#').next().unwrap_or_default();
    suffix
        .parse::<u64>()
        .map_err(|e| anyhow::anyhow!("invalid index in accession {:?}: {}", accession, e))
}

/// Load MaveDB scores from a reader, sorted by accession index.
///
/// # Errors
///
/// If the CSV cannot be parsed, one of the columns `accession`, `hgvs_pro`,
/// or `score` is missing, or an accession has no valid index.
pub fn load_reader<R>(reader: R) -> Result<Vec<ScoreRow>, anyhow::Error>
where
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|e| anyhow::anyhow!("problem reading header: {}", e))?
        .clone();
    for column in ["accession", "hgvs_pro", "score"] {
        if !headers.iter().any(|header| header == column) {
            anyhow::bail!("score table lacks column {:?}", column);
        }
    }

    let mut result = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| anyhow::anyhow!("problem parsing record: {}", e))?;
        let mut fields: Record = headers.iter().zip(record.iter()).collect();
        let index = accession_index(fields.get("accession").unwrap_or_default())?;
        fields.insert(INDEX_FIELD, index.to_string());
        result.push(ScoreRow { index, fields });
    }
    result.sort_by_key(|row| row.index);

    Ok(result)
}

/// Load MaveDB scores CSV file.
///
/// # Arguments
///
/// * `path` - Path to the scores file as downloaded from MaveDB.
///
/// # Returns
///
/// Score rows, sorted ascending by accession index.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub fn load_file<P>(path: P) -> Result<Vec<ScoreRow>, anyhow::Error>
where
    P: AsRef<Path>,
{
    tracing::debug!("opening scores file: {:?}", path.as_ref());
    let reader = std::fs::File::open(path.as_ref())
        .map_err(|e| anyhow::anyhow!("problem opening file {:?}: {}", path.as_ref(), e))
        .map(BufReader::new)?;
    let result = load_reader(reader)?;
    tracing::debug!("read a total of {} score rows", result.len());

    Ok(result)
}
