//! Media catalog storage for the library inventory
//!
//! This crate owns the in-memory catalog, enforces the lending and
//! reservation rules, and persists the catalog to a semicolon-delimited text
//! file after every change.

mod access;
mod codec;
mod error;
mod library;
mod storage;

pub use codec::*;
pub use error::*;
pub use library::*;
pub use storage::*;
