//! PostgreSQL client for WSDB.
//!
//! One synchronous connection, opened once and reused for every query.
//! Statements are prepared with explicit `float8` parameter types so that
//! overloaded Q3C functions resolve the same way regardless of value.

use std::error::Error;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use postgres::types::{FromSql, ToSql, Type};
use postgres::{Client, NoTls, Row};
use tracing::{debug, info};

use crate::db::{CatalogDatabase, QueryParams, bind_named};
use crate::domain::{Cell, ResultTable};
use crate::error::{AppError, EXIT_CONNECT};
use crate::io::Credentials;

pub struct WsdbClient {
    client: Client,
}

impl WsdbClient {
    pub fn connect(credentials: &Credentials) -> Result<Self, AppError> {
        let config = credentials.to_pg_config()?;
        let client = config
            .connect(NoTls)
            .map_err(|e| AppError::new(EXIT_CONNECT, format!("Failed to connect to WSDB: {e}")))?;

        info!(dbname = config.get_dbname().unwrap_or(""), "connected to WSDB");
        Ok(Self { client })
    }
}

impl CatalogDatabase for WsdbClient {
    fn retrieve_table(&mut self, query: &str, params: &QueryParams) -> Result<ResultTable, AppError> {
        let bound = bind_named(query, params)?;
        debug!(sql = %bound.sql, names = ?bound.names, values = ?bound.values, "executing query");

        let types = vec![Type::FLOAT8; bound.values.len()];
        let statement = self
            .client
            .prepare_typed(&bound.sql, &types)
            .map_err(|e| AppError::query(format!("Failed to prepare query: {e}")))?;

        let args: Vec<&(dyn ToSql + Sync)> = bound.values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        let rows = self
            .client
            .query(&statement, &args)
            .map_err(|e| AppError::query(format!("Query failed: {e}")))?;

        let columns = statement.columns().iter().map(|c| c.name().to_string()).collect();
        rows_to_table(columns, &rows)
    }

    fn close(self) -> Result<(), AppError> {
        self.client
            .close()
            .map_err(|e| AppError::query(format!("Failed to close WSDB connection cleanly: {e}")))?;
        info!("closed WSDB connection");
        Ok(())
    }
}

fn rows_to_table(columns: Vec<String>, rows: &[Row]) -> Result<ResultTable, AppError> {
    let mut table = ResultTable::new(columns);
    for row in rows {
        let mut cells = Vec::with_capacity(row.len());
        for idx in 0..row.len() {
            let cell: Cell = row
                .try_get(idx)
                .map_err(|e| AppError::query(format!("Failed to decode column {idx}: {e}")))?;
            cells.push(cell);
        }
        table.push_row(cells)?;
    }
    Ok(table)
}

type DecodeError = Box<dyn Error + Sync + Send>;

impl<'a> FromSql<'a> for Cell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, DecodeError> {
        let cell = if *ty == Type::BOOL {
            Cell::Bool(bool::from_sql(ty, raw)?)
        } else if *ty == Type::CHAR {
            // Single-byte `"char"`, read back as a one-character string.
            Cell::Text(char::from(i8::from_sql(ty, raw)? as u8).to_string())
        } else if *ty == Type::INT2 {
            Cell::Int(i16::from_sql(ty, raw)?.into())
        } else if *ty == Type::INT4 {
            Cell::Int(i32::from_sql(ty, raw)?.into())
        } else if *ty == Type::INT8 {
            Cell::Int(i64::from_sql(ty, raw)?)
        } else if *ty == Type::OID {
            Cell::Int(u32::from_sql(ty, raw)?.into())
        } else if *ty == Type::FLOAT4 {
            Cell::Float32(f32::from_sql(ty, raw)?)
        } else if *ty == Type::FLOAT8 {
            Cell::Float(f64::from_sql(ty, raw)?)
        } else if *ty == Type::DATE {
            Cell::Date(NaiveDate::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMP {
            Cell::Timestamp(NaiveDateTime::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMPTZ {
            Cell::Timestamp(DateTime::<Utc>::from_sql(ty, raw)?.naive_utc())
        } else if <&str as FromSql>::accepts(ty) {
            Cell::Text(<&str>::from_sql(ty, raw)?.to_string())
        } else if let Some(member) = array_member(ty) {
            decode_array(ty, member, raw)?
        } else {
            return Err(format!("unsupported column type `{ty}`").into());
        };
        Ok(cell)
    }

    fn from_sql_null(_: &Type) -> Result<Self, DecodeError> {
        Ok(Cell::Null)
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

fn array_member(ty: &Type) -> Option<&Type> {
    match ty.kind() {
        postgres::types::Kind::Array(member) => Some(member),
        _ => None,
    }
}

fn decode_array(ty: &Type, member: &Type, raw: &[u8]) -> Result<Cell, DecodeError> {
    fn wrap<T>(items: Vec<Option<T>>, f: impl Fn(T) -> Cell) -> Cell {
        Cell::Array(items.into_iter().map(|v| v.map_or(Cell::Null, &f)).collect())
    }

    let cell = if *member == Type::BOOL {
        wrap(Vec::<Option<bool>>::from_sql(ty, raw)?, Cell::Bool)
    } else if *member == Type::INT2 {
        wrap(Vec::<Option<i16>>::from_sql(ty, raw)?, |v| Cell::Int(v.into()))
    } else if *member == Type::INT4 {
        wrap(Vec::<Option<i32>>::from_sql(ty, raw)?, |v| Cell::Int(v.into()))
    } else if *member == Type::INT8 {
        wrap(Vec::<Option<i64>>::from_sql(ty, raw)?, Cell::Int)
    } else if *member == Type::FLOAT4 {
        wrap(Vec::<Option<f32>>::from_sql(ty, raw)?, Cell::Float32)
    } else if *member == Type::FLOAT8 {
        wrap(Vec::<Option<f64>>::from_sql(ty, raw)?, Cell::Float)
    } else if <&str as FromSql>::accepts(member) {
        wrap(Vec::<Option<String>>::from_sql(ty, raw)?, Cell::Text)
    } else {
        return Err(format!("unsupported array column type `{ty}`").into());
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_binary_scalars() {
        let v = Cell::from_sql(&Type::FLOAT8, &67.0f64.to_be_bytes()).unwrap();
        assert_eq!(v, Cell::Float(67.0));

        let v = Cell::from_sql(&Type::FLOAT4, &1.5f32.to_be_bytes()).unwrap();
        assert_eq!(v, Cell::Float32(1.5));

        let v = Cell::from_sql(&Type::INT8, &6_000_000_000i64.to_be_bytes()).unwrap();
        assert_eq!(v, Cell::Int(6_000_000_000));

        let v = Cell::from_sql(&Type::INT2, &(-3i16).to_be_bytes()).unwrap();
        assert_eq!(v, Cell::Int(-3));

        let v = Cell::from_sql(&Type::BOOL, &[1]).unwrap();
        assert_eq!(v, Cell::Bool(true));

        let v = Cell::from_sql(&Type::VARCHAR, b"AAA").unwrap();
        assert_eq!(v, Cell::Text("AAA".into()));
    }

    #[test]
    fn real_columns_keep_their_printed_precision() {
        let v = Cell::from_sql(&Type::FLOAT4, &12.345f32.to_be_bytes()).unwrap();
        assert_eq!(v.to_string(), "12.345");
    }

    #[test]
    fn char_columns_decode_as_text() {
        let v = Cell::from_sql(&Type::CHAR, b"A").unwrap();
        assert_eq!(v, Cell::Text("A".into()));
        assert_eq!(v.to_string(), "A");
    }

    #[test]
    fn nulls_and_unsupported_types() {
        assert_eq!(Cell::from_sql_null(&Type::FLOAT8).unwrap(), Cell::Null);
        assert!(Cell::accepts(&Type::NUMERIC));

        let err = Cell::from_sql(&Type::NUMERIC, &[0, 0]).unwrap_err();
        assert!(err.to_string().contains("numeric"), "{err}");
    }
}
