//! A catalog persisted as a JSON file.
//!
//! The file holds exactly what the storefront reads as seed data: a JSON
//! array of gift records. Every mutation is written straight back to disk
//! through a temporary file in the same directory, so a crash never leaves a
//! half-written catalog behind.

use std::{fs, io, path::PathBuf};

use tracing::instrument;

use crate::{
    domain::{GiftDraft, GiftId, GiftRecord},
    storage::{
        memory::MemoryCatalog,
        repository::{export_json, CatalogRepository, Clock, RepositoryError, SystemClock},
    },
};

/// A file-backed catalog store.
#[derive(Debug)]
pub struct JsonCatalog<C = SystemClock> {
    path: PathBuf,
    inner: MemoryCatalog<C>,
}

impl JsonCatalog {
    /// Opens the catalog at `path`.
    ///
    /// A missing file is treated as an empty catalog; it is created on the
    /// first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: PathBuf) -> Result<Self, RepositoryError> {
        Self::open_with_clock(path, SystemClock)
    }

    /// Creates (or overwrites) the catalog at `path` with the given records.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn create(path: PathBuf, gifts: Vec<GiftRecord>) -> Result<Self, RepositoryError> {
        let catalog = Self {
            path,
            inner: MemoryCatalog::new(gifts),
        };
        catalog.flush()?;
        Ok(catalog)
    }
}

impl<C: Clock> JsonCatalog<C> {
    /// Opens the catalog at `path`, taking timestamps from `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    #[instrument(skip(clock))]
    pub fn open_with_clock(path: PathBuf, clock: C) -> Result<Self, RepositoryError> {
        let gifts = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| {
                RepositoryError::Json {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("catalog file does not exist yet, starting empty");
                Vec::new()
            }
            Err(source) => return Err(RepositoryError::Io { path, source }),
        };

        Ok(Self {
            path,
            inner: MemoryCatalog::with_clock(gifts, clock),
        })
    }

    /// Writes the current records to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn flush(&self) -> Result<(), RepositoryError> {
        let io_error = |source| RepositoryError::Io {
            path: self.path.clone(),
            source,
        };

        let content = export_json(self.inner.list()).map_err(|source| RepositoryError::Json {
            path: self.path.clone(),
            source,
        })?;

        super::write_file(&self.path, format!("{content}\n").as_bytes()).map_err(io_error)?;

        tracing::debug!(path = %self.path.display(), count = self.inner.list().len(), "catalog written");
        Ok(())
    }
}

impl<C: Clock> CatalogRepository for JsonCatalog<C> {
    fn list(&self) -> &[GiftRecord] {
        self.inner.list()
    }

    fn create(&mut self, draft: GiftDraft) -> Result<GiftRecord, RepositoryError> {
        let gift = self.inner.create(draft)?;
        self.flush()?;
        Ok(gift)
    }

    fn update(&mut self, id: &GiftId, draft: GiftDraft) -> Result<GiftRecord, RepositoryError> {
        let gift = self.inner.update(id, draft)?;
        self.flush()?;
        Ok(gift)
    }

    fn delete(&mut self, id: &GiftId) -> Result<Option<GiftRecord>, RepositoryError> {
        let removed = self.inner.delete(id)?;
        if removed.is_some() {
            self.flush()?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::*;
    use crate::{
        domain::Category,
        storage::{memory::tests::ManualClock, seed::seed_gifts},
    };

    #[test]
    fn missing_file_opens_empty() {
        let tmp = tempdir().unwrap();
        let catalog = JsonCatalog::open(tmp.path().join("gifts.json")).unwrap();
        assert!(catalog.list().is_empty());
    }

    #[test]
    fn mutations_are_written_through() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("data").join("gifts.json");

        let mut catalog = JsonCatalog::open(path.clone()).unwrap();
        let kept = catalog.create(GiftDraft::named("Diya").unwrap()).unwrap();
        let dropped = catalog.create(GiftDraft::named("Vase").unwrap()).unwrap();
        catalog.delete(&dropped.id).unwrap();

        let reopened = JsonCatalog::open(path).unwrap();
        assert_eq!(reopened.list(), std::slice::from_ref(&kept));
    }

    #[test]
    fn invalid_file_is_reported() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("gifts.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonCatalog::open(path).unwrap_err();
        assert!(matches!(err, RepositoryError::Json { .. }));
    }

    #[test]
    fn seeded_catalog_round_trips() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("gifts.json");

        JsonCatalog::create(path.clone(), seed_gifts()).unwrap();
        let reopened = JsonCatalog::open(path).unwrap();

        assert_eq!(reopened.list(), seed_gifts().as_slice());
    }

    #[test]
    fn created_gift_exports_with_generated_fields() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("gifts.json");
        let now = Utc.with_ymd_and_hms(2025, 7, 19, 15, 22, 43).unwrap();
        let clock = ManualClock::at(now);

        let mut catalog = JsonCatalog::open_with_clock(path.clone(), &clock).unwrap();
        catalog
            .create(
                GiftDraft::named("Diya")
                    .unwrap()
                    .with_category(Category::HomeDecor)
                    .with_prices(20, 40),
            )
            .unwrap();

        let exported: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let gifts = exported.as_array().unwrap();
        assert_eq!(gifts.len(), 1);

        let gift = &gifts[0];
        assert_eq!(gift["name"], "Diya");
        assert_eq!(gift["category"], "Home Decor");
        assert_eq!(gift["priceRangeMin"], 20);
        assert_eq!(gift["priceRangeMax"], 40);
        assert_eq!(gift["id"], now.timestamp_millis().to_string());
        assert_eq!(gift["createdAt"], "2025-07-19T15:22:43Z");
        assert_eq!(gift["updatedAt"], "2025-07-19T15:22:43Z");
    }
}
