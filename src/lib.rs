//! `cluster-xmatch` library crate.
//!
//! The binary (`xmatch`) is a thin wrapper around this library so that the
//! query loop can be tested against an in-memory database without spawning
//! processes or reaching WSDB.

pub mod app;
pub mod cli;
pub mod db;
pub mod domain;
pub mod error;
pub mod io;
pub mod query;
