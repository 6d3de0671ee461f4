//! The cone-search / cross-match loop.
//!
//! Per cluster, in input order:
//! cone search -> CSV -> (cross-match -> CSV) for each reference catalog
//!
//! Every query depends only on the cluster row, so there is no state carried
//! between iterations. The first failure aborts the run; files already
//! written stay on disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::db::CatalogDatabase;
use crate::domain::{ClusterRecord, PrimaryCatalog, ReferenceCatalog, ResultTable, RunConfig, TGAS};
use crate::error::AppError;
use crate::io::export::{cone_search_file_name, cross_match_file_name, write_table_csv};
use crate::query::{cluster_params, cone_search_sql, cross_match_sql};

/// One CSV produced by the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// Everything a completed run produced, in write order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub clusters: usize,
    pub files: Vec<WrittenFile>,
}

/// Run the loop over `clusters` and release `db` afterwards, on success or failure.
pub fn run_with_database<D: CatalogDatabase, W: Write>(
    mut db: D,
    clusters: &[ClusterRecord],
    config: &RunConfig,
    out: &mut W,
) -> Result<RunSummary, AppError> {
    let result = cross_match_clusters(&mut db, clusters, config, out);

    if let Err(e) = db.close() {
        warn!(error = %e, "database connection did not close cleanly");
    }
    result
}

/// Query and write every cluster against `TGAS` and the configured references.
pub fn cross_match_clusters<D: CatalogDatabase, W: Write>(
    db: &mut D,
    clusters: &[ClusterRecord],
    config: &RunConfig,
    out: &mut W,
) -> Result<RunSummary, AppError> {
    let mut summary = RunSummary::default();
    for cluster in clusters {
        let files = process_cluster(db, cluster, &TGAS, &config.references, &config.output_dir, config.overwrite, out)?;
        summary.files.extend(files);
        summary.clusters += 1;
    }
    Ok(summary)
}

fn process_cluster<D: CatalogDatabase, W: Write>(
    db: &mut D,
    cluster: &ClusterRecord,
    primary: &PrimaryCatalog,
    references: &[ReferenceCatalog],
    output_dir: &Path,
    overwrite: bool,
    out: &mut W,
) -> Result<Vec<WrittenFile>, AppError> {
    let name = &cluster.name;
    let params = cluster_params(cluster);
    let mut files = Vec::with_capacity(references.len() + 1);

    say(out, format_args!("Querying {} for {name}", primary.label))?;
    let sources = db.retrieve_table(&cone_search_sql(primary), &params)?;
    files.push(write_result(&output_dir.join(cone_search_file_name(name, primary)), &sources, overwrite)?);
    say(out, format_args!("Found {} {} sources for {name}", sources.len(), primary.label))?;

    for reference in references {
        say(
            out,
            format_args!("Cross-matching {} with {} for {name}", primary.label, reference.table()),
        )?;
        let matched = db.retrieve_table(&cross_match_sql(primary, reference), &params)?;
        let path = output_dir.join(cross_match_file_name(name, primary, reference));
        files.push(write_result(&path, &matched, overwrite)?);
        say(
            out,
            format_args!(
                "Found {} {}-{} sources for {name}",
                matched.len(),
                primary.label,
                reference.short_name()
            ),
        )?;
    }

    Ok(files)
}

fn write_result(path: &Path, table: &ResultTable, overwrite: bool) -> Result<WrittenFile, AppError> {
    write_table_csv(path, table, overwrite)?;
    info!(path = %path.display(), rows = table.len(), "wrote result");
    Ok(WrittenFile {
        path: path.to_path_buf(),
        rows: table.len(),
    })
}

fn say<W: Write>(out: &mut W, line: std::fmt::Arguments<'_>) -> Result<(), AppError> {
    writeln!(out, "{line}").map_err(|e| AppError::output(format!("Failed to write progress output: {e}")))
}
