//! User accounts for the library inventory.
//!
//! This crate provides:
//! - A JSON file store for user accounts, seeded with default accounts
//! - Case-insensitive user lookup and plain-text authentication
//! - Account management (add, update, password change, removal)

mod error;
mod store;

pub use error::*;
pub use store::*;

/// File name of the user store inside the data directory.
pub const USERS_FILE_NAME: &str = "Benutzer.json";
