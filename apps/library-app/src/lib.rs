//! Library inventory application.
//!
//! Wires configuration, logging and the catalog and user stores together.

pub mod config;

use std::fs;

use anyhow::Context;
use catalog_store::Library;
use entities::{MediaKind, MediaStatus, User};
use user_store::UserStore;

use crate::config::Config;

/// Initializes tracing.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Counts shown after startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    pub books: usize,
    pub dvds: usize,
    pub software: usize,
    pub available: usize,
    pub reserved: usize,
    pub lent: usize,
    pub users: usize,
}

/// The opened stores.
#[derive(Debug)]
pub struct LibraryApp {
    pub config: Config,
    pub library: Library,
    pub users: UserStore,
}

impl LibraryApp {
    /// Creates the data directory if needed and opens both stores.
    pub fn open(config: Config) -> anyhow::Result<Self> {
        fs::create_dir_all(&config.data_dir).with_context(|| {
            format!(
                "Failed to create data directory {}",
                config.data_dir.display()
            )
        })?;

        let library = Library::open(config.catalog_path())
            .with_guest_reservation_limit(config.guest_reservation_limit);
        let users = UserStore::open(config.users_path());

        Ok(Self {
            config,
            library,
            users,
        })
    }

    /// Authenticates a user.
    pub fn login(&self, username: &str, password: &str) -> Option<&User> {
        let user = self.users.authenticate(username, password);
        match user {
            Some(user) => {
                tracing::info!(username = %user.username, role = %user.role, "Login succeeded")
            }
            None => tracing::warn!(username, "Login failed"),
        }
        user
    }

    /// Summarizes the catalog and accounts.
    pub fn summary(&self) -> CatalogSummary {
        let media = self.library.media();
        let count_status =
            |status: MediaStatus| media.iter().filter(|m| m.status() == status).count();

        CatalogSummary {
            books: self.library.by_kind(MediaKind::Book).count(),
            dvds: self.library.by_kind(MediaKind::Dvd).count(),
            software: self.library.by_kind(MediaKind::Software).count(),
            available: count_status(MediaStatus::Available),
            reserved: count_status(MediaStatus::Reserved),
            lent: count_status(MediaStatus::Lent),
            users: self.users.users().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use entities::Media;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_open_creates_data_files() {
        let dir = tempdir().unwrap();
        let config = Config::with_data_dir(dir.path().join("Data"));

        let app = LibraryApp::open(config.clone()).unwrap();
        assert!(config.catalog_path().exists());
        assert!(config.users_path().exists());
        assert_eq!(
            app.summary(),
            CatalogSummary {
                users: 3,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_session_round_trip() {
        let dir = tempdir().unwrap();
        let config = Config::with_data_dir(dir.path());

        {
            let mut app = LibraryApp::open(config.clone()).unwrap();
            let bib = app.login("bib", "bib").unwrap().clone();
            let gast = app.login("Gast", "gast").unwrap().clone();
            assert!(app.login("gast", "GAST").is_none());

            app.library
                .add_as(&bib, Media::book("B001", "Faust; Teil 1", "Goethe", "Reclam"))
                .unwrap();
            app.library
                .add_as(&bib, Media::dvd("D001", "Metropolis", "Fritz Lang", 153))
                .unwrap();
            app.library.reserve_as(&gast, "B001").unwrap();
            app.library.toggle_lending_as(&bib, "D001").unwrap();
        }

        let app = LibraryApp::open(config).unwrap();
        assert_eq!(
            app.summary(),
            CatalogSummary {
                books: 1,
                dvds: 1,
                software: 0,
                available: 0,
                reserved: 1,
                lent: 1,
                users: 3,
            }
        );
        let book = app.library.get("b001").unwrap();
        assert_eq!(book.title, "Faust; Teil 1");
        assert!(book.is_reserved_by("gast"));
    }
}
