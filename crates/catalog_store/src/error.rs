//! Catalog store error types.

use thiserror::Error;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Required input missing or invalid.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An item with the same identifier (ignoring case) already exists.
    #[error("Medium already exists: {id}")]
    DuplicateIdentifier { id: String },

    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The acting user's role does not allow the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The item is reserved by somebody else.
    #[error("Medium {id} is already reserved by {holder}")]
    ReservationHeld { id: String, holder: String },

    /// A guest already holds the maximum number of reservations.
    #[error("{user} already holds the maximum of {limit} reservations")]
    QuotaExceeded { user: String, limit: usize },

    /// The item is currently lent out.
    #[error("Medium {id} is currently lent")]
    MediumLent { id: String },

    /// Reading or writing the catalog failed.
    #[error("Failed to access {location}: {source}")]
    Persistence {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    /// Creates a not found error for a media item.
    pub fn medium_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Medium",
            id: id.into(),
        }
    }

    /// Creates a duplicate identifier error.
    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateIdentifier { id: id.into() }
    }

    /// Creates a persistence error.
    pub fn persistence(location: impl Into<String>, source: std::io::Error) -> Self {
        Self::Persistence {
            location: location.into(),
            source,
        }
    }
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
