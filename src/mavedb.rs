//! Download of score sets from the MaveDB API.

use std::{
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
    time::Duration,
};

/// Base URL of the MaveDB API.
pub const MAVEDB_API_URL: &str = "https://api.mavedb.org/api/v1";

/// Prefix of MaveDB URNs.
pub const URN_PREFIX: &str = "urn:mavedb:";

/// Strip the `urn:mavedb:` prefix from a score set identifier, if present.
pub fn score_set_id(urn: &str) -> &str {
    urn.strip_prefix(URN_PREFIX).unwrap_or(urn)
}

/// A file that is removed when the value is dropped.
///
/// This makes sure that the downloaded scores do not outlive the run, also
/// when it ends with an error.
#[derive(Debug)]
pub struct ScratchFile {
    /// Path to the file.
    path: PathBuf,
}

impl ScratchFile {
    /// Take ownership of the file at `path`, which need not exist yet.
    pub fn new<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { path: path.into() }
    }

    /// Path to the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("removed scratch file {:?}", &self.path),
            Err(e) => tracing::warn!("could not remove scratch file {:?}: {}", &self.path, e),
        }
    }
}

/// Blocking client for the MaveDB API.
#[derive(Debug, Clone)]
pub struct Client {
    /// The HTTP client.
    client: reqwest::blocking::Client,
    /// Base URL without trailing slash.
    base_url: String,
}

impl Client {
    /// Create a new `Client`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the API.
    /// * `timeout` - Timeout for each request.
    ///
    /// # Errors
    ///
    /// If the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the scores CSV of the given score set.
    pub fn scores_url(&self, urn: &str) -> String {
        format!(
            "{}/score-sets/{}{}/scores",
            self.base_url,
            URN_PREFIX,
            score_set_id(urn)
        )
    }

    /// Download the scores of a score set into `work_dir`.
    ///
    /// The scores are written to `{work_dir}/{id}_scores.txt`.  If that file
    /// exists already, it is used as is.
    ///
    /// # Arguments
    ///
    /// * `urn` - Score set identifier, with or without `urn:mavedb:` prefix.
    /// * `work_dir` - Directory for the scratch file.
    ///
    /// # Returns
    ///
    /// The scratch file; dropping it removes the file.
    ///
    /// # Errors
    ///
    /// If the download fails.  Partially written files are removed.
    pub fn fetch_scores(&self, urn: &str, work_dir: &Path) -> Result<ScratchFile, anyhow::Error> {
        let id = score_set_id(urn);
        let scratch = ScratchFile::new(work_dir.join(format!("{}_scores.txt", id)));
        if scratch.path().exists() {
            tracing::info!("Using cached MaveDB scores {:?}", scratch.path());
            return Ok(scratch);
        }

        let url = self.scores_url(id);
        tracing::info!("Downloading MaveDB scores...");
        tracing::debug!("  url = {}", &url);
        let mut response = self
            .client
            .get(&url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| anyhow::anyhow!("could not download scores for {}: {}", id, e))?;

        let file = std::fs::File::create(scratch.path())
            .map_err(|e| anyhow::anyhow!("problem creating file {:?}: {}", scratch.path(), e))?;
        let mut writer = BufWriter::new(file);
        response
            .copy_to(&mut writer)
            .map_err(|e| anyhow::anyhow!("could not download scores for {}: {}", id, e))?;
        writer.flush()?;

        Ok(scratch)
    }
}
