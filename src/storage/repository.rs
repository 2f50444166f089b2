use std::{io, path::PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::{GiftDraft, GiftId, GiftRecord};

/// Errors raised by a catalog store.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No record has the given identifier.
    #[error("gift {0} not found")]
    NotFound(GiftId),
    /// The backing file could not be read or written.
    #[error("failed to access catalog file {path}")]
    Io {
        /// The catalog file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The backing file does not contain a valid catalog.
    #[error("catalog file {path} is not valid JSON")]
    Json {
        /// The catalog file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// An ordered collection of gift records.
///
/// Callers only ever talk to this trait, so the storage behind it can be
/// swapped (memory, a JSON file, a database) without changing them.
pub trait CatalogRepository {
    /// All records, in insertion order.
    fn list(&self) -> &[GiftRecord];

    /// Looks up a record by identifier.
    fn get(&self, id: &GiftId) -> Option<&GiftRecord> {
        self.list().iter().find(|gift| &gift.id == id)
    }

    /// Records shown on the public catalog.
    fn list_active(&self) -> Vec<&GiftRecord> {
        self.list().iter().filter(|gift| gift.is_active).collect()
    }

    /// Adds a new record built from the draft.
    ///
    /// The store assigns a fresh identifier and sets both timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted.
    fn create(&mut self, draft: GiftDraft) -> Result<GiftRecord, RepositoryError>;

    /// Replaces the editable content of an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no record has `id`, or an
    /// error if the change cannot be persisted.
    fn update(&mut self, id: &GiftId, draft: GiftDraft) -> Result<GiftRecord, RepositoryError>;

    /// Removes a record.
    ///
    /// Removing an identifier that is not present is a no-op and returns
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted.
    fn delete(&mut self, id: &GiftId) -> Result<Option<GiftRecord>, RepositoryError>;
}

/// Source of the current time for record timestamps.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Renders records as pretty-printed JSON in the storefront seed-data shape.
///
/// # Errors
///
/// Fails only if a record cannot be serialised, which does not happen for
/// well-formed records.
pub fn export_json(records: &[GiftRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}
