//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input records (`ClusterRecord`)
//! - catalog descriptors (`PrimaryCatalog`, `ReferenceCatalog`)
//! - query results (`ResultTable`, `Cell`)

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;
