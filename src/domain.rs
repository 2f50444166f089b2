//! Domain models for the gift catalog.
//!
//! This module contains the core domain types: gift records and the drafts
//! that create them, inquiries, the admin identity, and configuration.

/// Gift records and their vocabulary.
pub mod gift;
pub use gift::{Category, Dimensions, GiftId, GiftRecord, Unit, OCCASIONS};

/// Drafts and form parsing for gift records.
pub mod draft;
pub use draft::{GiftDraft, GiftForm};

pub mod inquiry;
pub use inquiry::{
    CurationForm, CurationRequest, InquiryForm, InquirySubmission, InquiryType, Submission,
};

pub mod auth;
pub use auth::{AdminUser, AuthError, Authenticator, Credentials, Session};

mod config;
pub use config::{
    AdminConfig, Config, DriveConfig, DriveEndpoints, MailConfig, UploadConfig,
    DEFAULT_MAX_IMAGE_BYTES,
};

mod validation;
pub use validation::{FieldError, ValidationErrors};
