//! Tabular query results.
//!
//! Columns are whatever the query selected (`SELECT *`), so cells are typed
//! dynamically. Rendering follows the conventions of the CSV files the
//! downstream notebooks already read: empty for null, `True`/`False`,
//! floats always with a decimal point or exponent.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AppError;

/// A single decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// `real` columns keep single precision so they print without widening noise.
    Float32(f32),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Array(Vec<Cell>),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Float(v) => write_float(f, *v),
            Cell::Float32(v) => write_float32(f, *v),
            Cell::Text(s) => f.write_str(s),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            Cell::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match item {
                        Cell::Null => f.write_str("--")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        f.write_str("nan")
    } else if v.is_infinite() {
        f.write_str(if v > 0.0 { "inf" } else { "-inf" })
    } else {
        // Debug gives the shortest round-trip form and keeps `.0` on integral values.
        write!(f, "{v:?}")
    }
}

fn write_float32(f: &mut fmt::Formatter<'_>, v: f32) -> fmt::Result {
    if v.is_nan() {
        f.write_str("nan")
    } else if v.is_infinite() {
        f.write_str(if v > 0.0 { "inf" } else { "-inf" })
    } else {
        write!(f, "{v:?}")
    }
}

/// Result of one query: column names plus rows of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; its width must match the column count.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), AppError> {
        if row.len() != self.columns.len() {
            return Err(AppError::query(format!(
                "Row has {} values but the result has {} columns.",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_render_like_python_repr() {
        assert_eq!(Cell::Float(67.0).to_string(), "67.0");
        assert_eq!(Cell::Float(0.25).to_string(), "0.25");
        assert_eq!(Cell::Float(f64::NAN).to_string(), "nan");
        assert_eq!(Cell::Float(f64::NEG_INFINITY).to_string(), "-inf");
    }

    #[test]
    fn single_precision_floats_render_without_widening() {
        assert_eq!(Cell::Float32(12.345).to_string(), "12.345");
        assert_eq!(Cell::Float32(15.0).to_string(), "15.0");
        assert_eq!(Cell::Float32(f32::NAN).to_string(), "nan");
    }

    #[test]
    fn scalar_rendering() {
        assert_eq!(Cell::Null.to_string(), "");
        assert_eq!(Cell::Bool(true).to_string(), "True");
        assert_eq!(Cell::Int(-7).to_string(), "-7");
        assert_eq!(Cell::Text("A".into()).to_string(), "A");

        let d = NaiveDate::from_ymd_opt(2016, 9, 14).unwrap();
        assert_eq!(Cell::Date(d).to_string(), "2016-09-14");
        let ts = d.and_hms_opt(12, 30, 0).unwrap();
        assert!(Cell::Timestamp(ts).to_string().starts_with("2016-09-14 12:30:00"));
    }

    #[test]
    fn arrays_mark_missing_elements() {
        let cell = Cell::Array(vec![Cell::Float(1.5), Cell::Null, Cell::Int(3)]);
        assert_eq!(cell.to_string(), "[1.5, --, 3]");
    }

    #[test]
    fn push_row_checks_width() {
        let mut table = ResultTable::new(vec!["ra".into(), "dec".into()]);
        table.push_row(vec![Cell::Float(1.0), Cell::Float(2.0)]).unwrap();
        assert!(table.push_row(vec![Cell::Float(1.0)]).is_err());
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
    }
}
