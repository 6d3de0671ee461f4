//! Input/output helpers.
//!
//! - cluster table loading (`clusters`)
//! - WSDB credentials (`credentials`)
//! - CSV output of query results (`export`)

pub mod clusters;
pub mod credentials;
pub mod export;

pub use clusters::*;
pub use credentials::*;
pub use export::*;
