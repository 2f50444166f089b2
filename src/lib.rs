//! Gift catalog administration
//!
//! The catalog is a JSON file of gift records maintained by a single admin.
//! Visitors' inquiries are relayed to the storefront mailbox, with the mail
//! client as a fallback, and product images are inlined or uploaded to a
//! hosted folder.

pub mod domain;
pub use domain::{Config, GiftDraft, GiftForm, GiftId, GiftRecord, Submission};

/// Catalog and session persistence.
pub mod storage;
pub use storage::{CatalogRepository, JsonCatalog, MemoryCatalog, SessionStore};

pub mod dispatch;
pub use dispatch::{DeliveryOutcome, Dispatcher};

pub mod media;
pub use media::{DriveClient, ImageFile, ImageStore};

/// Opening URIs with the system handler.
pub mod launch;

#[cfg(test)]
mod test_support;
