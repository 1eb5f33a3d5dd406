//! Main entry point for the `mavedb-scores` application.

// #![deny(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
// #![warn(missing_docs)]

use clap::Parser;

pub mod common;
pub mod data;
pub mod ensembl;
pub mod map;
pub mod mavedb;
pub mod output;

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "mavedb-scores - map MaveDB scores to variants",
    long_about = "This tool joins the scores of a MaveDB score set with the variants \
                  from its mapping document and writes them as TSV"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// Arguments for mapping scores to variants
    #[command(flatten)]
    map: map::Args,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();
    tracing::subscriber::set_global_default(collector)?;

    tracing::info!("Starting mavedb-scores...");

    map::run(&cli.common, &cli.map)?;

    tracing::info!("All done. Have a nice day!");

    Ok(())
}

#[cfg(test)]
mod test {
    use clap::CommandFactory as _;

    #[test]
    fn verify_cli() {
        super::Cli::command().debug_assert();
    }
}
