//! Mapping of MaveDB scores to variants.

pub mod align;
pub mod diagnostics;
pub mod join;
pub mod round;

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    common::Tolerance,
    data::{
        mappings::{self, MappingDocument},
        record::Record,
        scores::{self, ScoreRow},
        xref::{self, Matches},
    },
    ensembl::{self, ChromosomeCache},
    mavedb, output,
};

use self::{diagnostics::Diagnostics, join::Joiner};

/// Command line arguments for mapping scores to variants.
#[derive(Parser, Debug)]
#[group(id = "map_args")]
pub struct Args {
    /// Path to Variant Recoder output (with `vcf_string` enabled) or to a TSV
    /// file with `HGVSp` to variant matches.
    #[clap(long)]
    pub vr: Option<PathBuf>,
    /// Format of the file given with `--vr`.
    #[clap(long, value_enum, default_value_t = xref::Format::Auto)]
    pub vr_format: xref::Format,
    /// Path to the MaveDB mappings JSON file.
    #[clap(long)]
    pub mappings: PathBuf,
    /// MaveDB score set URN, e.g., `00000046-a-2` or `urn:mavedb:00000046-a-2`.
    #[clap(long)]
    pub urn: String,
    /// Path to the output TSV file.
    #[clap(short, long)]
    pub output: PathBuf,
    /// Number of decimal places for rounding numeric score fields.
    #[clap(long)]
    pub round: Option<usize>,
    /// Relative tolerance when comparing scores.
    #[clap(long, default_value_t = Tolerance::default().rel)]
    pub rel_tol: f64,
    /// Absolute tolerance when comparing scores.
    #[clap(long, default_value_t = Tolerance::default().abs)]
    pub abs_tol: f64,
    /// Directory for the downloaded scores file.
    #[clap(long, default_value = ".")]
    pub work_dir: PathBuf,
    /// Base URL of the MaveDB API.
    #[clap(long, default_value = mavedb::MAVEDB_API_URL)]
    pub mavedb_url: String,
    /// Base URL of the Ensembl REST API.
    #[clap(long, default_value = ensembl::ENSEMBL_REST_URL)]
    pub ensembl_url: String,
    /// Timeout for HTTP requests in seconds.
    #[clap(long, default_value_t = 60)]
    pub http_timeout: u64,
}

/// Configuration of the mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Config {
    /// Tolerance for comparing scores.
    pub tolerance: Tolerance,
    /// Number of decimal places for rounding numeric score fields, if any.
    pub round: Option<usize>,
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            tolerance: Tolerance {
                rel: args.rel_tol,
                abs: args.abs_tol,
            },
            round: args.round,
        }
    }
}

/// Result of mapping scores to variants.
#[derive(Debug, Clone, Default)]
pub struct Mapped {
    /// The output records.
    pub records: Vec<Record>,
    /// Warnings about rows that were left out.
    pub diagnostics: Diagnostics,
}

/// Map MaveDB scores to variants.
///
/// # Arguments
///
/// * `scores` - Score rows, sorted by accession index.
/// * `document` - The mapping document.
/// * `matches` - `HGVSp` to variant matches; without them, the mapped
///   expressions are taken as genomic HGVS.
/// * `chromosomes` - Chromosome lookup for genomic HGVS.
/// * `config` - Mapping configuration.
///
/// # Returns
///
/// The output records together with the collected warnings.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub fn map_scores_to_variants(
    scores: &[ScoreRow],
    document: &MappingDocument,
    matches: Option<&Matches>,
    chromosomes: &mut ChromosomeCache,
    config: &Config,
) -> Result<Mapped, anyhow::Error> {
    let mut diagnostics = Diagnostics::default();
    let pairs = align::align(
        scores,
        &document.mapped_scores,
        config.tolerance,
        &mut diagnostics,
    )?;
    tracing::debug!("aligned {} of {} score rows", pairs.len(), scores.len());

    let mut joiner = Joiner::new(join::metadata(document), matches, chromosomes, config.round);
    let mut records = Vec::new();
    for pair in &pairs {
        records.extend(joiner.join(pair, &mut diagnostics)?);
    }

    Ok(Mapped {
        records,
        diagnostics,
    })
}

/// Main entry point for mapping scores to variants.
///
/// # Arguments
///
/// * `common_args` - Commonly used command line arguments.
/// * `args` - Command line arguments specific to mapping.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub fn run(common_args: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("  common_args = {:?}", &common_args);
    tracing::info!("  args = {:?}", &args);

    let timeout = Duration::from_secs(args.http_timeout);
    let mavedb_client = mavedb::Client::new(&args.mavedb_url, timeout)?;
    // Removes the downloaded scores when going out of scope.
    let scores_file = mavedb_client.fetch_scores(&args.urn, &args.work_dir)?;

    tracing::info!("Loading MaveDB data...");
    let scores = scores::load_file(scores_file.path())?;
    let document = mappings::load_file(&args.mappings)?;
    let matches = args
        .vr
        .as_ref()
        .map(|path| xref::load_file(path, args.vr_format))
        .transpose()?;

    tracing::info!("Preparing mappings between variants and MaveDB scores...");
    let mut chromosomes =
        ChromosomeCache::new(ensembl::Client::new(&args.ensembl_url, timeout)?);
    let mapped = map_scores_to_variants(
        &scores,
        &document,
        matches.as_ref(),
        &mut chromosomes,
        &Config::from(args),
    )?;
    tracing::info!(
        "mapped {} score rows to {} variants ({} score mismatches, {} missing matches)",
        scores.len(),
        mapped.records.len(),
        mapped.diagnostics.score_mismatches(),
        mapped.diagnostics.missing_matches()
    );

    tracing::info!("Writing {:?}...", &args.output);
    output::write_file(&args.output, &mapped.records)?;

    Ok(())
}

#[cfg(test)]
mod test {
    use crate::{data::xref::Format, ensembl::test::FixedResolver};

    use super::*;

    fn load_scores() -> Result<Vec<ScoreRow>, anyhow::Error> {
        scores::load_file("tests/data/mavedb/00000001-a-1_scores.csv")
    }

    fn write_to_string(records: &[Record]) -> Result<String, anyhow::Error> {
        let mut buf = Vec::new();
        output::write(&mut buf, records)?;
        Ok(String::from_utf8(buf)?)
    }

    #[tracing_test::traced_test]
    #[test]
    fn map_genomic() -> Result<(), anyhow::Error> {
        let scores = load_scores()?;
        let document = mappings::load_file("tests/data/mavedb/00000001-a-1_mappings.json")?;
        let resolver = FixedResolver::grch38();
        let calls = resolver.calls.clone();
        let mut chromosomes = ChromosomeCache::new(resolver);

        let mapped = map_scores_to_variants(
            &scores,
            &document,
            None,
            &mut chromosomes,
            &Config::default(),
        )?;

        assert_eq!(mapped.records.len(), 5);
        assert!(mapped.diagnostics.is_empty());
        assert_eq!(calls.get(), 1);
        insta::assert_snapshot!(write_to_string(&mapped.records)?);

        Ok(())
    }

    #[test]
    fn map_genomic_rounded() -> Result<(), anyhow::Error> {
        let scores = load_scores()?;
        let document = mappings::load_file("tests/data/mavedb/00000001-a-1_mappings.json")?;
        let mut chromosomes = ChromosomeCache::new(FixedResolver::grch38());
        let config = Config {
            round: Some(2),
            ..Default::default()
        };

        let mapped =
            map_scores_to_variants(&scores, &document, None, &mut chromosomes, &config)?;

        assert_eq!(
            mapped
                .records
                .iter()
                .map(|record| record.get("sd").unwrap_or_default())
                .collect::<Vec<_>>(),
            vec!["0.1", "0.12", "0.2", "0.3", "0.3"]
        );
        assert_eq!(mapped.records[0].get("score"), Some("1.5"));

        Ok(())
    }

    #[tracing_test::traced_test]
    #[test]
    fn map_with_recoder_matches() -> Result<(), anyhow::Error> {
        let scores = load_scores()?;
        let document =
            mappings::load_file("tests/data/mavedb/00000001-a-1_mappings_protein.json")?;
        let matches = xref::load_file("tests/data/xref/variant_recoder.json", Format::Auto)?;
        let mut chromosomes = ChromosomeCache::new(FixedResolver::grch38());

        let mapped = map_scores_to_variants(
            &scores,
            &document,
            Some(&matches),
            &mut chromosomes,
            &Config::default(),
        )?;

        assert_eq!(
            mapped
                .records
                .iter()
                .map(|record| record.get("hgvs").unwrap_or_default())
                .collect::<Vec<_>>(),
            vec![
                "NP_000001.1:p.Met1Leu",
                "NP_000001.1:p.Met1Leu",
                "NP_000001.1:p.Ala2Val",
                "NP_000001.1:p.Ala2Val",
                "NP_000001.1:p.Ala3Gly",
            ]
        );
        assert_eq!(mapped.diagnostics.missing_matches(), 1);
        assert!(logs_contain(
            "NP_000001.1:p.Ala2Ser not found in HGVSp-variant matches"
        ));
        insta::assert_snapshot!(write_to_string(&mapped.records)?);

        Ok(())
    }

    #[test]
    fn map_with_tsv_matches() -> Result<(), anyhow::Error> {
        let scores = load_scores()?;
        let document =
            mappings::load_file("tests/data/mavedb/00000001-a-1_mappings_protein.json")?;
        let matches = xref::load_file("tests/data/xref/hgvsp_matches.tsv", Format::Auto)?;
        let mut chromosomes = ChromosomeCache::new(FixedResolver::grch38());

        let mapped = map_scores_to_variants(
            &scores,
            &document,
            Some(&matches),
            &mut chromosomes,
            &Config::default(),
        )?;

        // p.Met1Leu once, p.Ala2Val twice on its own and twice in the haplotype.
        assert_eq!(mapped.records.len(), 5);
        assert_eq!(mapped.records[0].get("gene"), Some("GENE1"));
        assert_eq!(mapped.diagnostics.missing_matches(), 2);

        Ok(())
    }

    #[tracing_test::traced_test]
    #[test]
    fn map_reports_mismatches() -> Result<(), anyhow::Error> {
        let mut scores = load_scores()?;
        // Shift the score of p.Ala2Val (#3) so that it no longer agrees.
        scores[2].fields.insert("score", "-0.5");
        let document = mappings::load_file("tests/data/mavedb/00000001-a-1_mappings.json")?;
        let mut chromosomes = ChromosomeCache::new(FixedResolver::grch38());

        let mapped = map_scores_to_variants(
            &scores,
            &document,
            None,
            &mut chromosomes,
            &Config::default(),
        )?;

        // #3 mismatches against -0.25; #5 and #6 then mismatch as well because
        // the cursor is stuck at -0.25.
        assert_eq!(mapped.records.len(), 1);
        assert_eq!(mapped.diagnostics.score_mismatches(), 3);
        assert!(logs_contain(
            "score mismatch for urn:mavedb:00000001-a-1#3; p.Ala2Val"
        ));

        Ok(())
    }

    #[test]
    fn config_from_args() {
        let args = Args::parse_from([
            "mavedb-scores",
            "--mappings",
            "mappings.json",
            "--urn",
            "00000001-a-1",
            "-o",
            "out.tsv",
            "--round",
            "3",
            "--abs-tol",
            "0.001",
        ]);

        let config = Config::from(&args);

        assert_eq!(config.round, Some(3));
        assert_eq!(config.tolerance.rel, 1e-9);
        assert_eq!(config.tolerance.abs, 0.001);
        assert_eq!(args.vr_format, Format::Auto);
        assert_eq!(args.work_dir, PathBuf::from("."));
    }
}
