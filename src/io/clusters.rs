//! Cluster table loading.
//!
//! The table is a whitespace-separated ASCII file with five positional
//! columns: name, ra, dec, radius, N. An optional header line is detected and
//! skipped; column names are not interpreted.
//!
//! Unlike a bulk ingest, there is no row-level leniency here: one bad line
//! fails the whole run, because every cluster maps to output files.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::domain::ClusterRecord;
use crate::error::AppError;

const N_COLUMNS: usize = 5;

/// Load the cluster table at `path`, preserving file order.
pub fn load_clusters(path: &Path) -> Result<Vec<ClusterRecord>, AppError> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::input(format!("Failed to read cluster table '{}': {e}", path.display()))
    })?;
    parse_clusters(&text).map_err(|e| AppError::input(format!("{}: {}", path.display(), e.message())))
}

/// Parse cluster table text.
pub fn parse_clusters(text: &str) -> Result<Vec<ClusterRecord>, AppError> {
    let mut clusters = Vec::new();
    let mut names = HashSet::new();
    let mut seen_first_line = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields = split_fields(line).map_err(|e| AppError::input(format!("line {line_no}: {e}")))?;
        if fields.len() != N_COLUMNS {
            return Err(AppError::input(format!(
                "line {line_no}: expected {N_COLUMNS} columns (name ra dec radius N), found {}.",
                fields.len()
            )));
        }

        let first_line = !seen_first_line;
        seen_first_line = true;
        if first_line && is_header(&fields) {
            continue;
        }

        let record = parse_record(&fields).map_err(|e| AppError::input(format!("line {line_no}: {e}")))?;
        if !names.insert(record.name.clone()) {
            return Err(AppError::input(format!(
                "line {line_no}: duplicate cluster name '{}'.",
                record.name
            )));
        }
        clusters.push(record);
    }

    if clusters.is_empty() {
        return Err(AppError::input("Cluster table has no data rows."));
    }
    Ok(clusters)
}

/// A header names every column; a row with some numeric fields is data, even if malformed.
fn is_header(fields: &[String]) -> bool {
    fields[1..].iter().all(|f| f.parse::<f64>().is_err())
}

fn parse_record(fields: &[String]) -> Result<ClusterRecord, String> {
    let name = fields[0].clone();
    if name.is_empty() {
        return Err("empty cluster name.".to_string());
    }
    if name.contains(['/', '\\']) {
        return Err(format!("cluster name '{name}' contains a path separator."));
    }

    let ra = parse_finite(&fields[1], "ra")?;
    let dec = parse_finite(&fields[2], "dec")?;
    let radius = parse_finite(&fields[3], "radius")?;
    let count = parse_finite(&fields[4], "N")?;

    if !(-90.0..=90.0).contains(&dec) {
        return Err(format!("dec {dec} is outside [-90, 90] for '{name}'."));
    }
    if radius <= 0.0 {
        return Err(format!("radius must be positive for '{name}', got {radius}."));
    }

    Ok(ClusterRecord {
        name,
        ra,
        dec,
        radius,
        count,
    })
}

fn parse_finite(raw: &str, column: &str) -> Result<f64, String> {
    let v = raw
        .parse::<f64>()
        .map_err(|_| format!("invalid `{column}` value '{raw}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("non-finite `{column}` value '{raw}'."))
    }
}

/// Split on runs of whitespace; double quotes group a field containing spaces.
fn split_fields(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let Some(&c) = chars.peek() else {
            break;
        };

        let mut field = String::new();
        if c == '"' {
            chars.next();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '"' {
                    closed = true;
                    break;
                }
                field.push(c);
            }
            if !closed {
                return Err("unterminated quoted field.".to_string());
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                field.push(c);
                chars.next();
            }
        }
        fields.push(field);
    }

    Ok(fields)
}
