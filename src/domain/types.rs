//! Cluster records and catalog descriptors.
//!
//! Catalog names end up in SQL text (table names and column names cannot be
//! bound as parameters), so every descriptor is validated when it is built.
//! Numeric values never reach the SQL text; see `db::params`.

use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

/// Cross-match join radius: one arcsecond, in degrees.
///
/// Independent of the cluster search radius.
pub const CONE_TOLERANCE_DEG: f64 = 1.0 / 3600.0;

/// One row of the cluster table.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRecord {
    pub name: String,
    /// Cone center right ascension, in degrees.
    pub ra: f64,
    /// Cone center declination, in degrees.
    pub dec: f64,
    /// Search radius, in degrees.
    pub radius: f64,
    /// The `N` column. Loaded and carried along, never used by the queries.
    pub count: f64,
}

/// The catalog every cone search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryCatalog {
    /// Fully qualified table name.
    pub table: &'static str,
    /// Local alias in cross-match queries; also the file name label.
    pub alias: &'static str,
    /// Human-readable label for console output.
    pub label: &'static str,
}

/// Gaia DR1 TGAS.
pub const TGAS: PrimaryCatalog = PrimaryCatalog {
    table: "gaia_dr1.tgas_source",
    alias: "tgas",
    label: "TGAS",
};

/// Default reference catalogs, in query order: `(table, declination column)`.
///
/// 2MASS PSC names its declination column `decl`.
pub const DEFAULT_REFERENCE_CATALOGS: [(&str, &str); 3] = [
    ("apassdr9.main", "dec"),
    ("twomass.psc", "decl"),
    ("unwise.sdss_forced", "dec"),
];

/// A catalog cross-matched against the primary cone-search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceCatalog {
    table: String,
    dec_column: String,
}

impl ReferenceCatalog {
    pub fn new(table: &str, dec_column: &str) -> Result<Self, AppError> {
        let table = table.trim();
        let dec_column = dec_column.trim();

        if table.is_empty() || !table.split('.').all(is_identifier) {
            return Err(AppError::input(format!(
                "Invalid catalog table name '{table}': expected dot-separated SQL identifiers."
            )));
        }
        if !is_identifier(dec_column) {
            return Err(AppError::input(format!(
                "Invalid declination column '{dec_column}' for catalog '{table}'."
            )));
        }

        Ok(Self {
            table: table.to_string(),
            dec_column: dec_column.to_string(),
        })
    }

    /// The default reference set (APASS DR9, 2MASS PSC, unWISE).
    pub fn defaults() -> Vec<Self> {
        DEFAULT_REFERENCE_CATALOGS
            .iter()
            .map(|(table, dec_column)| Self {
                table: (*table).to_string(),
                dec_column: (*dec_column).to_string(),
            })
            .collect()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn dec_column(&self) -> &str {
        &self.dec_column
    }

    /// Leading component of the dotted table name (`twomass.psc` -> `twomass`).
    pub fn short_name(&self) -> &str {
        match self.table.split_once('.') {
            Some((head, _)) => head,
            None => &self.table,
        }
    }
}

/// Parses `TABLE:DEC_COLUMN`, as given to `--reference`.
impl FromStr for ReferenceCatalog {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((table, dec_column)) = s.split_once(':') else {
            return Err(AppError::input(format!(
                "Invalid reference catalog '{s}': expected TABLE:DEC_COLUMN (e.g. twomass.psc:decl)."
            )));
        };
        Self::new(table, dec_column)
    }
}

/// Resolved settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub clusters_path: PathBuf,
    pub credentials_path: PathBuf,
    pub output_dir: PathBuf,
    /// Cross-matched in this order for every cluster.
    pub references: Vec<ReferenceCatalog>,
    pub overwrite: bool,
}

/// Check a reference set before any connection is opened.
///
/// Short names key both the query aliases and the output file names, so they
/// must be unique and distinct from the primary alias.
pub fn validate_reference_set(references: &[ReferenceCatalog], primary: &PrimaryCatalog) -> Result<(), AppError> {
    if references.is_empty() {
        return Err(AppError::input("At least one reference catalog is required."));
    }

    let mut seen = HashSet::new();
    for reference in references {
        let short = reference.short_name();
        if short == primary.alias {
            return Err(AppError::input(format!(
                "Reference catalog '{}' has short name '{short}', which is reserved for the primary catalog.",
                reference.table()
            )));
        }
        if !seen.insert(short) {
            return Err(AppError::input(format!(
                "Reference catalogs must have unique short names; '{short}' appears more than once."
            )));
        }
    }
    Ok(())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
