//! An in-memory catalog.
//!
//! The [`MemoryCatalog`] knows nothing about files. It owns the ordered list
//! of records and the rules for identity and timestamps; the file-backed
//! store wraps it.

use tracing::instrument;

use crate::{
    domain::{GiftDraft, GiftId, GiftRecord},
    storage::repository::{CatalogRepository, Clock, RepositoryError, SystemClock},
};

/// An ordered, in-memory list of gift records.
#[derive(Debug, Default)]
pub struct MemoryCatalog<C = SystemClock> {
    gifts: Vec<GiftRecord>,
    clock: C,
}

impl MemoryCatalog {
    /// Creates a catalog seeded with the given records.
    #[must_use]
    pub const fn new(gifts: Vec<GiftRecord>) -> Self {
        Self {
            gifts,
            clock: SystemClock,
        }
    }
}

impl<C: Clock> MemoryCatalog<C> {
    /// Creates a catalog that takes timestamps from `clock`.
    #[must_use]
    pub const fn with_clock(gifts: Vec<GiftRecord>, clock: C) -> Self {
        Self { gifts, clock }
    }

    /// Picks an identifier derived from `millis` that no record uses yet.
    ///
    /// Two gifts created within the same millisecond would otherwise
    /// collide, so the value is bumped until it is free.
    fn fresh_id(&self, millis: i64) -> GiftId {
        let mut candidate = millis;
        loop {
            let id = GiftId::from_millis(candidate);
            if !self.gifts.iter().any(|gift| gift.id == id) {
                return id;
            }
            candidate += 1;
        }
    }

    fn position(&self, id: &GiftId) -> Option<usize> {
        self.gifts.iter().position(|gift| &gift.id == id)
    }
}

impl<C: Clock> CatalogRepository for MemoryCatalog<C> {
    fn list(&self) -> &[GiftRecord] {
        &self.gifts
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    fn create(&mut self, draft: GiftDraft) -> Result<GiftRecord, RepositoryError> {
        let now = self.clock.now();
        let id = self.fresh_id(now.timestamp_millis());
        let gift = GiftRecord::new(id, draft, now);
        tracing::debug!(id = %gift.id, "created gift");
        self.gifts.push(gift.clone());
        Ok(gift)
    }

    #[instrument(skip(self, draft))]
    fn update(&mut self, id: &GiftId, draft: GiftDraft) -> Result<GiftRecord, RepositoryError> {
        let now = self.clock.now();
        let index = self
            .position(id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        let gift = &mut self.gifts[index];
        gift.apply(draft, now);
        tracing::debug!(%id, "updated gift");
        Ok(gift.clone())
    }

    #[instrument(skip(self))]
    fn delete(&mut self, id: &GiftId) -> Result<Option<GiftRecord>, RepositoryError> {
        let removed = self.position(id).map(|index| self.gifts.remove(index));
        if removed.is_none() {
            tracing::debug!(%id, "nothing to delete");
        }
        Ok(removed)
    }
}
