//! Core entity definitions for the library inventory.
//!
//! This crate defines the data types shared by the catalog and user stores:
//! media items with their lending state machine, user accounts with roles,
//! and lending history entries.

mod history;
mod media;
mod user;

pub use history::*;
pub use media::*;
pub use user::*;
