//! Application configuration.

use std::{env, path::PathBuf};

use anyhow::Context;
use catalog_store::DEFAULT_GUEST_RESERVATION_LIMIT;
use user_store::USERS_FILE_NAME;

/// File name of the catalog inside the data directory.
pub const CATALOG_FILE_NAME: &str = "medien.csv";

/// Name of the data directory next to the executable.
pub const DATA_DIR_NAME: &str = "Data";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the catalog and user files.
    pub data_dir: PathBuf,
    /// Log level.
    pub log_level: String,
    /// Maximum number of reservations per guest.
    pub guest_reservation_limit: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = match env::var_os("LIBRARY_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        Ok(Self {
            data_dir,
            log_level: env::var("LIBRARY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            guest_reservation_limit: env::var("LIBRARY_GUEST_RESERVATION_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_GUEST_RESERVATION_LIMIT),
        })
    }

    /// Creates a configuration rooted at `data_dir` with default settings.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_level: "info".to_string(),
            guest_reservation_limit: DEFAULT_GUEST_RESERVATION_LIMIT,
        }
    }

    /// Returns the catalog file path.
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILE_NAME)
    }

    /// Returns the user file path.
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE_NAME)
    }
}

/// Returns the `Data` directory next to the running executable.
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    let exe = env::current_exe().context("Failed to locate the running executable")?;
    let dir = exe
        .parent()
        .context("Executable path has no parent directory")?;
    Ok(dir.join(DATA_DIR_NAME))
}
