//! Database access.
//!
//! The pipeline only needs one operation, `retrieve_table`, so it talks to a
//! `CatalogDatabase` rather than to a concrete client. `WsdbClient` is the
//! PostgreSQL implementation; tests substitute an in-memory one.

pub mod params;
pub mod wsdb;

pub use params::{BoundQuery, QueryParams, bind_named};
pub use wsdb::WsdbClient;

use crate::domain::ResultTable;
use crate::error::AppError;

/// A database that can run a parameterized query and return its rows.
pub trait CatalogDatabase {
    /// Run `query` (with `%(name)s` placeholders) bound against `params`.
    fn retrieve_table(&mut self, query: &str, params: &QueryParams) -> Result<ResultTable, AppError>;

    /// Release the connection.
    fn close(self) -> Result<(), AppError>
    where
        Self: Sized;
}
