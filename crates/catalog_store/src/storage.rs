//! Catalog storage backends.

use std::{
    fs,
    path::{Path, PathBuf},
};

use entities::Media;

use crate::{decode_catalog, encode_catalog, CatalogError, CatalogResult, CATALOG_HEADER};

/// Where the catalog is loaded from and saved to.
///
/// Every save replaces the whole catalog.
pub trait CatalogStorage {
    /// Loads all items in stored order. A missing catalog loads as empty.
    fn load(&mut self) -> CatalogResult<Vec<Media>>;

    /// Replaces the stored catalog with `media`, in order.
    fn save(&mut self, media: &[Media]) -> CatalogResult<()>;
}

/// Catalog stored as a semicolon-delimited text file.
#[derive(Debug, Clone)]
pub struct CsvFileStorage {
    path: PathBuf,
}

impl CsvFileStorage {
    /// Creates a storage for the file at `path`. Nothing is touched yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the catalog file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the parent directory and a header-only file if missing.
    pub fn ensure_exists(&self) -> CatalogResult<()> {
        if self.path.exists() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }

        tracing::info!(path = %self.path.display(), "Creating empty catalog file");
        fs::write(&self.path, format!("{CATALOG_HEADER}\n")).map_err(|e| self.error(e))
    }

    fn error(&self, source: std::io::Error) -> CatalogError {
        CatalogError::persistence(self.path.display().to_string(), source)
    }
}

impl CatalogStorage for CsvFileStorage {
    fn load(&mut self) -> CatalogResult<Vec<Media>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let text = fs::read_to_string(&self.path).map_err(|e| self.error(e))?;
        Ok(decode_catalog(&text))
    }

    fn save(&mut self, media: &[Media]) -> CatalogResult<()> {
        fs::write(&self.path, encode_catalog(media)).map_err(|e| self.error(e))?;
        tracing::debug!(path = %self.path.display(), count = media.len(), "Catalog saved");
        Ok(())
    }
}

/// In-memory storage for testing purposes.
///
/// Keeps the encoded catalog text, so loads and saves go through the same
/// codec as the file backend.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    contents: Option<String>,
    saves: usize,
}

impl MemoryStorage {
    /// Creates an empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage preloaded with catalog text.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
            saves: 0,
        }
    }

    /// Returns the stored catalog text, if anything was stored.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Returns how many times the catalog was saved.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl CatalogStorage for MemoryStorage {
    fn load(&mut self) -> CatalogResult<Vec<Media>> {
        Ok(self
            .contents
            .as_deref()
            .map(decode_catalog)
            .unwrap_or_default())
    }

    fn save(&mut self, media: &[Media]) -> CatalogResult<()> {
        self.contents = Some(encode_catalog(media));
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_ensure_exists_writes_header() {
        let dir = tempdir().unwrap();
        let storage = CsvFileStorage::new(dir.path().join("Data").join("medien.csv"));

        storage.ensure_exists().unwrap();

        let text = fs::read_to_string(storage.path()).unwrap();
        assert_eq!(text.trim_end(), CATALOG_HEADER);
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempdir().unwrap();
        let mut storage = CsvFileStorage::new(dir.path().join("medien.csv"));
        let media = vec![
            Media::book("B001", "Faust", "Goethe", "Reclam"),
            Media::dvd("D001", "Metropolis", "Fritz Lang", 153),
        ];

        storage.save(&media).unwrap();
        assert_eq!(storage.load().unwrap(), media);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let mut storage = CsvFileStorage::new(dir.path().join("missing.csv"));
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let mut storage = CsvFileStorage::new(dir.path().join("nope").join("medien.csv"));

        let err = storage.save(&[]).unwrap_err();
        assert!(matches!(err, CatalogError::Persistence { .. }));
    }

    #[test]
    fn test_memory_storage_counts_saves() {
        let mut storage = MemoryStorage::new();
        storage.save(&[]).unwrap();
        storage.save(&[]).unwrap();

        assert_eq!(storage.save_count(), 2);
        assert_eq!(storage.contents().map(str::trim_end), Some(CATALOG_HEADER));
    }
}
