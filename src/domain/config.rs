use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::auth::{AdminUser, DigestAuthenticator};

/// Default upper bound on image uploads (5 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Configuration for a catalog workspace.
///
/// Stored as TOML in `.giftdesk/config.toml` under the workspace root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Path of the catalog JSON file, relative to the workspace root.
    catalog: PathBuf,

    /// Brand name used in message subjects and bodies.
    brand: String,

    /// Outbound mail settings.
    pub mail: MailConfig,

    /// The admin account, if one has been set up.
    pub admin: Option<AdminConfig>,

    /// Cloud storage used as an image host.
    pub drive: DriveConfig,

    /// Image upload settings.
    pub upload: UploadConfig,
}

/// Where inquiries are delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailConfig {
    /// Address used for the `mailto:` fallback.
    pub mailbox: String,
    /// Form relay endpoint tried first.
    pub relay_endpoint: String,
    /// Page the relay redirects the sender to after a successful post.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thank_you_url: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            mailbox: "saavi.gifts@gmail.com".to_string(),
            relay_endpoint: "https://formsubmit.co/saavi.gifts@gmail.com".to_string(),
            thank_you_url: None,
        }
    }
}

/// The single admin account.
///
/// Only a digest of the password is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Login name.
    pub username: String,
    /// Hex SHA-256 of `username:password`.
    pub password_sha256: String,
    /// Name shown once signed in.
    pub display_name: String,
    /// Contact address of the admin.
    pub email: String,
}

impl AdminConfig {
    /// Builds the authenticator for this account.
    #[must_use]
    pub fn authenticator(&self) -> DigestAuthenticator {
        DigestAuthenticator::new(
            self.username.clone(),
            self.password_sha256.clone(),
            AdminUser {
                id: "1".to_string(),
                name: self.display_name.clone(),
                email: self.email.clone(),
            },
        )
    }
}

/// OAuth client and endpoints for the cloud storage image host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveConfig {
    /// OAuth client identifier.
    #[serde(default)]
    pub client_id: String,
    /// OAuth client secret (installed-app clients treat this as public).
    #[serde(default)]
    pub client_secret: String,
    /// API key used for the discovery probe.
    #[serde(default)]
    pub api_key: String,
    /// Name of the folder images are uploaded into.
    #[serde(default = "default_folder_name")]
    pub folder_name: String,
    /// Service endpoints. Only overridden in tests.
    #[serde(default, skip_serializing_if = "DriveEndpoints::is_default")]
    pub endpoints: DriveEndpoints,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            api_key: String::new(),
            folder_name: default_folder_name(),
            endpoints: DriveEndpoints::default(),
        }
    }
}

fn default_folder_name() -> String {
    "Saavi Product Images".to_string()
}

/// Base URLs of the storage provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveEndpoints {
    /// OAuth consent page.
    pub auth_url: String,
    /// OAuth token exchange.
    pub token_url: String,
    /// Metadata API base (`/files`, `/files/{id}/permissions`).
    pub api_base: String,
    /// Media upload base.
    pub upload_base: String,
    /// API discovery document probed during initialisation.
    pub discovery_url: String,
}

impl Default for DriveEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            upload_base: "https://www.googleapis.com/upload/drive/v3".to_string(),
            discovery_url: "https://www.googleapis.com/discovery/v1/apis/drive/v3/rest"
                .to_string(),
        }
    }
}

impl DriveEndpoints {
    fn is_default(&self) -> bool {
        self == &Self::default()
    }

    /// Points every endpoint at a single base URL (used against local stubs).
    #[must_use]
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{base}/auth"),
            token_url: format!("{base}/token"),
            api_base: format!("{base}/drive/v3"),
            upload_base: format!("{base}/upload/drive/v3"),
            discovery_url: format!("{base}/discovery"),
        }
    }
}

/// Image upload settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload endpoint for server-upload mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Largest accepted image, in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

const fn default_max_bytes() -> u64 {
    DEFAULT_MAX_IMAGE_BYTES
}

fn default_catalog() -> PathBuf {
    PathBuf::from("data/gifts.json")
}

fn default_brand() -> String {
    "Saavi".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            brand: default_brand(),
            mail: MailConfig::default(),
            admin: None,
            drive: DriveConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {e}"))?;
        }
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Path of the catalog file, relative to the workspace root.
    #[must_use]
    pub fn catalog(&self) -> &Path {
        &self.catalog
    }

    /// Sets the catalog path.
    pub fn set_catalog(&mut self, path: PathBuf) {
        self.catalog = path;
    }

    /// Brand name used in outbound messages.
    #[must_use]
    pub fn brand(&self) -> &str {
        &self.brand
    }
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_catalog")]
        catalog: PathBuf,

        #[serde(default = "default_brand")]
        brand: String,

        #[serde(default)]
        mail: MailConfig,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        admin: Option<AdminConfig>,

        #[serde(default)]
        drive: DriveConfig,

        #[serde(default)]
        upload: UploadConfig,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                catalog,
                brand,
                mail,
                admin,
                drive,
                upload,
            } => Self {
                catalog,
                brand,
                mail,
                admin,
                drive,
                upload,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            catalog: config.catalog,
            brand: config.brand,
            mail: config.mail,
            admin: config.admin,
            drive: config.drive,
            upload: config.upload,
        }
    }
}
