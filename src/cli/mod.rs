//! Command-line parsing for the cluster cross-match run.
//!
//! Every flag is optional; with none given the run reads `clusters.txt` and
//! `wsdb.yaml` from the working directory and writes CSVs next to them.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::ReferenceCatalog;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "xmatch",
    version,
    about = "Cone-search Gaia TGAS around star clusters and cross-match against reference catalogs on WSDB"
)]
pub struct Cli {
    /// Cluster table: name, ra, dec, radius (degrees), N.
    #[arg(long, value_name = "PATH", default_value = "clusters.txt")]
    pub clusters: PathBuf,

    /// YAML file with WSDB connection parameters.
    #[arg(long, value_name = "PATH", env = "WSDB_CREDENTIALS", default_value = "wsdb.yaml")]
    pub credentials: PathBuf,

    /// Directory for the output CSV files.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Reference catalog as TABLE:DEC_COLUMN (repeatable, replaces the default set).
    ///
    /// Default: apassdr9.main:dec, twomass.psc:decl, unwise.sdss_forced:dec
    #[arg(long = "reference", value_name = "TABLE:DEC_COLUMN")]
    pub references: Vec<ReferenceCatalog>,

    /// Replace output files that already exist.
    #[arg(long)]
    pub overwrite: bool,
}
