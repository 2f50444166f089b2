//! Acquiring product images.
//!
//! An image reaches a gift record in one of three ways:
//!
//! - inlined as a `data:` URI, for previews and offline catalogs,
//! - posted to an upload endpoint that answers with the hosted URL,
//! - uploaded to a cloud storage folder through [`DriveClient`], which
//!   shares the file publicly and hands back a direct view link.
//!
//! Every path enforces the same size limit before anything leaves the
//! machine.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;

mod drive;
mod endpoint;
/// Authorisation against the storage provider.
pub mod oauth;

pub use drive::{DriveClient, InitState, PollPolicy, public_url};
pub use endpoint::EndpointUploader;

/// An image read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// File name, without directories.
    pub name: String,
    /// MIME type, always `image/*`.
    pub mime: &'static str,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Wraps in-memory bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the name does not carry a known image extension.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ImageError> {
        let name = name.into();
        let mime = mime_for(Path::new(&name)).ok_or_else(|| ImageError::UnsupportedType {
            name: name.clone(),
        })?;
        Ok(Self { name, mime, bytes })
    }

    /// Reads an image from disk, refusing files over `limit` bytes without
    /// reading them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not an image, is too large, or cannot
    /// be read.
    pub fn read(path: &Path, limit: u64) -> Result<Self, ImageError> {
        let io_error = |source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        };

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime_for(path).ok_or_else(|| ImageError::UnsupportedType { name: name.clone() })?;

        let size = fs::metadata(path).map_err(io_error)?.len();
        check_size(size, limit)?;

        let bytes = fs::read(path).map_err(io_error)?;
        Ok(Self { name, mime, bytes })
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Inlines the image as a `data:` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Rejects images larger than `limit` bytes.
///
/// # Errors
///
/// Returns [`ImageError::TooLarge`] when `size` exceeds `limit`.
pub fn check_size(size: u64, limit: u64) -> Result<(), ImageError> {
    if size > limit {
        Err(ImageError::TooLarge { size, limit })
    } else {
        Ok(())
    }
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "avif" => "image/avif",
        _ => return None,
    };
    Some(mime)
}

/// Problems with an image file itself.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The file is over the size limit.
    #[error("image is {size} bytes; the limit is {limit} bytes")]
    TooLarge {
        /// Actual size.
        size: u64,
        /// Configured limit.
        limit: u64,
    },

    /// The file is not a recognised image type.
    #[error("'{name}' is not a supported image (png, jpg, gif, webp, svg, bmp, avif)")]
    UnsupportedType {
        /// The offending file name.
        name: String,
    },

    /// The file could not be read.
    #[error("failed to read {path}")]
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// The storage provider could not be made ready.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitializationError {
    /// A required credential is not configured.
    #[error("missing {0}; set it under [drive] in the workspace config")]
    MissingCredential(&'static str),

    /// The storage API has not been enabled for the project.
    #[error("the storage API is not enabled for this project; enable it in the provider console")]
    ApiNotEnabled,

    /// The API key was rejected.
    #[error("the API key is not valid; check drive.api_key")]
    InvalidApiKey,

    /// The OAuth client id was rejected.
    #[error("the OAuth client id is not valid; check drive.client_id")]
    InvalidClientId,

    /// The provider never became reachable.
    #[error("the storage API did not respond after {attempts} attempts")]
    Timeout {
        /// How many probes were made.
        attempts: u32,
    },

    /// Any other failure, with the provider's message.
    #[error("failed to initialise storage: {0}")]
    Other(String),
}

impl InitializationError {
    /// Classifies a provider error message.
    #[must_use]
    pub fn from_message(message: &str) -> Self {
        if message.contains("API discovery response missing required fields")
            || message.contains("SERVICE_DISABLED")
            || message.contains("has not been used")
        {
            Self::ApiNotEnabled
        } else if message.contains("API key not valid") {
            Self::InvalidApiKey
        } else if message.contains("client_id") {
            Self::InvalidClientId
        } else {
            Self::Other(message.to_string())
        }
    }
}

/// Sign-in did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignInError {
    /// The user closed the consent page or never finished it.
    #[error("sign-in was cancelled")]
    Cancelled,

    /// The user refused the requested access.
    #[error("access was denied; grant the requested permission to upload images")]
    PermissionDenied,

    /// The provider could not be initialised first.
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    /// Any other failure.
    #[error("sign-in failed: {0}")]
    Failed(String),
}

/// A storage operation failed.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The image was rejected before upload.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// A remote operation was attempted before signing in.
    #[error("not signed in to image storage")]
    NotSignedIn,

    /// The provider answered with an error.
    #[error("storage request failed with HTTP {status}: {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Provider message.
        message: String,
    },

    /// The provider could not be reached or answered with garbage.
    #[error("storage request failed")]
    Request(#[from] reqwest::Error),

    /// A configured endpoint is not a valid URL.
    #[error("invalid storage endpoint '{0}'")]
    InvalidEndpoint(String),
}

/// A file held by the storage provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    /// Provider identifier.
    pub id: String,
    /// File name.
    pub name: String,
    /// Link to the provider's viewer, if it reported one.
    #[serde(default)]
    pub web_view_link: Option<String>,
}

/// A remote image host.
#[async_trait]
pub trait ImageStore: Send {
    /// Prepares the client. Idempotent.
    async fn initialize(&mut self) -> Result<(), InitializationError>;

    /// Obtains authorisation, initialising first if needed.
    async fn sign_in(&mut self) -> Result<(), SignInError>;

    /// Forgets any authorisation.
    async fn sign_out(&mut self);

    /// Whether the client currently holds authorisation.
    fn is_signed_in(&self) -> bool;

    /// Uploads `file` and returns a public URL for it.
    ///
    /// Requires a prior successful [`ImageStore::sign_in`].
    async fn upload_image(&mut self, file: &ImageFile) -> Result<String, StorageError>;

    /// Deletes the stored file `id`.
    async fn delete_image(&mut self, id: &str) -> Result<(), StorageError>;

    /// Lists the stored images, newest first.
    async fn list_images(&mut self) -> Result<Vec<StoredImage>, StorageError>;
}

/// Reads the provider's error message out of a failed response.
pub(crate) async fn api_error(response: reqwest::Response) -> StorageError {
    #[derive(Deserialize)]
    struct Envelope {
        error: Detail,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Detail {
        Object { message: String },
        Code(String),
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<Envelope>(&body) {
        Ok(Envelope {
            error: Detail::Object { message } | Detail::Code(message),
        }) => message,
        Err(_) => body,
    };
    StorageError::Api { status, message }
}
