//! Chromosome name resolution through the Ensembl REST API.

use std::time::Duration;

/// Base URL of the Ensembl REST API.
pub const ENSEMBL_REST_URL: &str = "https://rest.ensembl.org";

/// Resolution of sequence accessions to chromosome names.
pub trait ChromosomeResolver {
    /// Resolve the given accession, e.g., `NC_000001.11`, to a chromosome name
    /// without `chr` prefix, e.g., `1`.
    fn resolve(&self, accession: &str) -> Result<String, anyhow::Error>;
}

/// Synonym entry of an Ensembl assembly region.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Synonym {
    /// The synonym.
    pub name: String,
    /// The database the synonym comes from.
    pub dbname: String,
}

/// Response of the `info/assembly/:species/:region_name` endpoint.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct AssemblyRegion {
    /// Synonyms of the region.
    #[serde(default)]
    pub synonyms: Vec<Synonym>,
}

impl AssemblyRegion {
    /// The UCSC name of the region with any `chr` removed.
    ///
    /// # Errors
    ///
    /// If there is no UCSC synonym.
    pub fn ucsc_chromosome(&self) -> Result<String, anyhow::Error> {
        self.synonyms
            .iter()
            .find(|synonym| synonym.dbname == "UCSC")
            .map(|synonym| synonym.name.replace("chr", ""))
            .ok_or_else(|| anyhow::anyhow!("no UCSC synonym in Ensembl response"))
    }
}

/// Blocking client for the Ensembl REST API.
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
    /// * `base_url` - Base URL of the REST API.
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

    /// URL of the assembly information on the given region.
    pub fn assembly_url(&self, region: &str) -> String {
        format!(
            "{}/info/assembly/homo_sapiens/{}?synonyms=1&content-type=application/json",
            self.base_url, region
        )
    }
}

impl ChromosomeResolver for Client {
    fn resolve(&self, accession: &str) -> Result<String, anyhow::Error> {
        let url = self.assembly_url(accession);
        tracing::debug!("querying Ensembl: {}", &url);
        let region: AssemblyRegion = self
            .client
            .get(&url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| anyhow::anyhow!("Ensembl request for {} failed: {}", accession, e))?
            .json()
            .map_err(|e| anyhow::anyhow!("invalid Ensembl response for {}: {}", accession, e))?;
        region
            .ucsc_chromosome()
            .map_err(|e| anyhow::anyhow!("could not resolve {}: {}", accession, e))
    }
}

/// Memoizing chromosome lookup, owned by one run.
pub struct ChromosomeCache {
    /// The underlying resolver.
    resolver: Box<dyn ChromosomeResolver>,
    /// Resolved names by accession.
    names: rustc_hash::FxHashMap<String, String>,
}

impl ChromosomeCache {
    /// Create a new, empty `ChromosomeCache`.
    pub fn new<R>(resolver: R) -> Self
    where
        R: ChromosomeResolver + 'static,
    {
        Self {
            resolver: Box::new(resolver),
            names: Default::default(),
        }
    }

    /// The chromosome of a genomic HGVS string such as `NC_000001.11:g.100A>T`.
    ///
    /// The accession before the first `:` is resolved once and remembered.
    ///
    /// # Errors
    ///
    /// If the resolution fails.
    pub fn chromosome_for(&mut self, hgvs: &str) -> Result<String, anyhow::Error> {
        let accession = hgvs.split(':').next().unwrap_or_default();
        if let Some(name) = self.names.get(accession) {
            return Ok(name.clone());
        }

        let name = self.resolver.resolve(accession)?;
        tracing::debug!("resolved {} to chromosome {}", accession, &name);
        self.names.insert(accession.to_string(), name.clone());
        Ok(name)
    }

    /// Number of resolved accessions.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
