//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up diagnostics
//! - parses CLI arguments into a `RunConfig`
//! - loads the cluster table and credentials
//! - connects to WSDB and runs the cross-match loop
//! - prints a run summary

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::db::WsdbClient;
use crate::domain::{ReferenceCatalog, RunConfig, TGAS, validate_reference_set};
use crate::error::AppError;
use crate::io::{load_clusters, load_credentials, prepare_output_dir};

pub mod pipeline;

/// Entry point for the `xmatch` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may carry WSDB_CREDENTIALS and RUST_LOG.
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = run_config_from_args(cli)?;

    // Inputs are checked before a connection is opened.
    let clusters = load_clusters(&config.clusters_path)?;
    let credentials = load_credentials(&config.credentials_path)?;
    prepare_output_dir(&config.output_dir)?;
    tracing::info!(
        clusters = clusters.len(),
        references = config.references.len(),
        "loaded inputs"
    );

    let db = WsdbClient::connect(&credentials)?;
    let stdout = std::io::stdout();
    let summary = pipeline::run_with_database(db, &clusters, &config, &mut stdout.lock())?;

    println!(
        "Wrote {} files for {} clusters into {}",
        summary.files.len(),
        summary.clusters,
        config.output_dir.display()
    );
    Ok(())
}

/// Resolve CLI arguments, falling back to the default reference catalogs.
pub fn run_config_from_args(cli: Cli) -> Result<RunConfig, AppError> {
    let references = if cli.references.is_empty() {
        ReferenceCatalog::defaults()
    } else {
        cli.references
    };
    validate_reference_set(&references, &TGAS)?;

    Ok(RunConfig {
        clusters_path: cli.clusters,
        credentials_path: cli.credentials,
        output_dir: cli.output_dir,
        references,
        overwrite: cli.overwrite,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Progress lines own stdout; diagnostics go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_references_when_none_given() {
        let cli = Cli::try_parse_from(["xmatch"]).unwrap();
        let config = run_config_from_args(cli).unwrap();
        assert_eq!(config.references, ReferenceCatalog::defaults());
        assert!(!config.overwrite);
    }

    #[test]
    fn explicit_references_replace_defaults() {
        let cli = Cli::try_parse_from(["xmatch", "--reference", "twomass.psc:decl", "--overwrite"]).unwrap();
        let config = run_config_from_args(cli).unwrap();
        assert_eq!(config.references.len(), 1);
        assert_eq!(config.references[0].dec_column(), "decl");
        assert!(config.overwrite);
    }

    #[test]
    fn colliding_short_names_fail_before_connecting() {
        let cli = Cli::try_parse_from([
            "xmatch",
            "--reference",
            "twomass.psc:decl",
            "--reference",
            "twomass.xsc:decl",
        ])
        .unwrap();
        let err = run_config_from_args(cli).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }
}
