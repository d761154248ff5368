//! User store error types.

use thiserror::Error;

/// Errors that can occur during user store operations.
#[derive(Debug, Error)]
pub enum UserStoreError {
    /// Required input missing.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A user with the same name (ignoring case) already exists.
    #[error("User already exists: {username}")]
    AlreadyExists { username: String },

    /// No user with this name.
    #[error("User not found: {username}")]
    NotFound { username: String },

    /// User name and password do not match.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Reading or writing the user file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The user file is not valid JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl UserStoreError {
    /// Creates a not found error.
    pub fn not_found(username: impl Into<String>) -> Self {
        Self::NotFound {
            username: username.into(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(username: impl Into<String>) -> Self {
        Self::AlreadyExists {
            username: username.into(),
        }
    }
}

/// Result type for user store operations.
pub type UserStoreResult<T> = Result<T, UserStoreError>;
