//! Write query results to CSV.
//!
//! One file per (cluster, catalog) pair, named deterministically:
//! `{cluster}-tgas.csv` for the cone search and `{cluster}-tgas-{short}.csv`
//! for each cross-match.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::{PrimaryCatalog, ReferenceCatalog, ResultTable};
use crate::error::AppError;

/// File name for a cluster's cone-search result.
pub fn cone_search_file_name(cluster: &str, primary: &PrimaryCatalog) -> String {
    format!("{cluster}-{}.csv", primary.alias)
}

/// File name for a cluster's cross-match result against `reference`.
pub fn cross_match_file_name(cluster: &str, primary: &PrimaryCatalog, reference: &ReferenceCatalog) -> String {
    format!("{cluster}-{}-{}.csv", primary.alias, reference.short_name())
}

/// Write `table` to `path` as CSV with a header row.
///
/// Refuses to replace an existing file unless `overwrite` is set.
pub fn write_table_csv(path: &Path, table: &ResultTable, overwrite: bool) -> Result<(), AppError> {
    let file = open_output(path, overwrite)?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(table.columns())
        .map_err(|e| AppError::output(format!("Failed to write CSV header to '{}': {e}", path.display())))?;

    for row in table.rows() {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .map_err(|e| AppError::output(format!("Failed to write CSV row to '{}': {e}", path.display())))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush CSV '{}': {e}", path.display())))?;
    Ok(())
}

fn open_output(path: &Path, overwrite: bool) -> Result<File, AppError> {
    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    options.open(path).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => AppError::output(format!(
            "Output file '{}' already exists (use --overwrite to replace it).",
            path.display()
        )),
        _ => AppError::output(format!("Failed to create output CSV '{}': {e}", path.display())),
    })
}

/// Create the output directory if needed and return it.
pub fn prepare_output_dir(dir: &Path) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        AppError::output(format!("Failed to create output directory '{}': {e}", dir.display()))
    })?;
    Ok(dir.to_path_buf())
}
