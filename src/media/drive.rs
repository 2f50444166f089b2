use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Response, Url, header::CONTENT_TYPE};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use uuid::Uuid;

use crate::{
    domain::DriveConfig,
    media::{
        ImageFile, ImageStore, InitializationError, SignInError, StorageError, StoredImage,
        api_error, check_size,
        oauth::{
            ConsentPrompt, ConsentRequest, DRIVE_FILE_SCOPE, LoopbackConsent, TokenCache,
            TokenEndpoint, TokenSet,
        },
    },
};

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Direct view link for a publicly shared file.
#[must_use]
pub fn public_url(id: &str) -> String {
    format!("https://drive.google.com/uc?export=view&id={id}")
}

/// Lifecycle of a [`DriveClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// Not yet probed, or the last probe failed.
    Uninitialized,
    /// A probe is in progress.
    Initializing,
    /// The API answered and the client can sign in.
    Ready,
}

/// How long initialisation waits for the API to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Probes before giving up.
    pub attempts: u32,
    /// Pause between probes.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 50,
            interval: Duration::from_millis(100),
        }
    }
}

#[derive(Deserialize)]
struct FileList<T> {
    #[serde(default = "Vec::new")]
    files: Vec<T>,
}

#[derive(Deserialize)]
struct FileId {
    id: String,
}

/// Image host backed by a cloud storage folder.
///
/// Uploaded files land in a single named folder, created on first use, and
/// are shared with anyone holding the link.
#[derive(Debug)]
pub struct DriveClient<P = LoopbackConsent> {
    http: reqwest::Client,
    config: DriveConfig,
    max_bytes: u64,
    prompt: P,
    tokens: TokenEndpoint,
    cache: Option<TokenCache>,
    poll: PollPolicy,
    state: InitState,
    token: Option<TokenSet>,
    folder_id: Option<String>,
}

impl<P: ConsentPrompt> DriveClient<P> {
    /// A client for `config`, refusing uploads over `max_bytes` and asking
    /// for consent through `prompt`.
    pub fn new(config: DriveConfig, max_bytes: u64, prompt: P) -> Self {
        let http = reqwest::Client::new();
        let tokens = TokenEndpoint::new(
            http.clone(),
            config.endpoints.token_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        );
        Self {
            http,
            config,
            max_bytes,
            prompt,
            tokens,
            cache: None,
            poll: PollPolicy::default(),
            state: InitState::Uninitialized,
            token: None,
            folder_id: None,
        }
    }

    /// Persists tokens in `cache` between runs.
    #[must_use]
    pub fn with_token_cache(mut self, cache: TokenCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Overrides how initialisation polls the API.
    #[must_use]
    pub const fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Where the client is in its lifecycle.
    #[must_use]
    pub const fn state(&self) -> InitState {
        self.state
    }

    async fn probe(&self) -> Result<(), InitializationError> {
        let url = Url::parse_with_params(
            &self.config.endpoints.discovery_url,
            &[("key", self.config.api_key.as_str())],
        )
        .map_err(|e| InitializationError::Other(e.to_string()))?;

        for attempt in 1..=self.poll.attempts {
            match self.http.get(url.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    let document: serde_json::Value = response
                        .json()
                        .await
                        .map_err(|e| InitializationError::Other(e.to_string()))?;
                    return if document.pointer("/resources/files").is_some() {
                        Ok(())
                    } else {
                        Err(InitializationError::ApiNotEnabled)
                    };
                }
                Ok(response) => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(InitializationError::from_message(&body));
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    tracing::debug!(attempt, "storage API not reachable yet: {e}");
                    tokio::time::sleep(self.poll.interval).await;
                }
                Err(e) => return Err(InitializationError::Other(e.to_string())),
            }
        }

        Err(InitializationError::Timeout {
            attempts: self.poll.attempts,
        })
    }

    async fn consent(&self) -> Result<TokenSet, SignInError> {
        let request = ConsentRequest {
            auth_url: self.config.endpoints.auth_url.clone(),
            client_id: self.config.client_id.clone(),
            scope: DRIVE_FILE_SCOPE.to_string(),
            state: Uuid::new_v4().simple().to_string(),
        };
        let authorization = self.prompt.authorize(&request).await?;
        self.tokens.exchange(&authorization).await
    }

    fn store(&mut self, tokens: TokenSet) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save(&tokens) {
                tracing::warn!("failed to cache storage token in {}: {e}", cache.path().display());
            }
        }
        self.token = Some(tokens);
    }

    fn bearer(&self) -> Result<String, StorageError> {
        match &self.token {
            Some(token) if self.is_signed_in() => Ok(token.access_token.clone()),
            _ => Err(StorageError::NotSignedIn),
        }
    }

    fn endpoint(&self, base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url, StorageError> {
        let raw = format!("{base}{path}");
        Url::parse_with_params(&raw, params).map_err(|_| StorageError::InvalidEndpoint(raw))
    }

    async fn folder(&mut self, token: &str) -> Result<String, StorageError> {
        if let Some(id) = &self.folder_id {
            return Ok(id.clone());
        }

        let query = format!(
            "name='{}' and mimeType='{FOLDER_MIME}' and trashed=false",
            escape_literal(&self.config.folder_name)
        );
        let url = self.endpoint(
            &self.config.endpoints.api_base,
            "/files",
            &[("q", query.as_str()), ("fields", "files(id,name)")],
        )?;
        let found: FileList<FileId> = ok_json(self.http.get(url).bearer_auth(token).send().await?).await?;

        let id = if let Some(folder) = found.files.into_iter().next() {
            folder.id
        } else {
            let url = self.endpoint(&self.config.endpoints.api_base, "/files", &[("fields", "id")])?;
            let created: FileId = ok_json(
                self.http
                    .post(url)
                    .bearer_auth(token)
                    .json(&json!({ "name": self.config.folder_name, "mimeType": FOLDER_MIME }))
                    .send()
                    .await?,
            )
            .await?;
            tracing::info!(folder = %self.config.folder_name, "created image folder");
            created.id
        };

        self.folder_id = Some(id.clone());
        Ok(id)
    }

    async fn share_publicly(&self, token: &str, id: &str) -> Result<(), StorageError> {
        let url = self.endpoint(
            &self.config.endpoints.api_base,
            &format!("/files/{id}/permissions"),
            &[],
        )?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }
}

#[async_trait]
impl<P: ConsentPrompt> ImageStore for DriveClient<P> {
    #[tracing::instrument(skip(self))]
    async fn initialize(&mut self) -> Result<(), InitializationError> {
        if self.state == InitState::Ready {
            return Ok(());
        }
        if self.config.client_id.is_empty() {
            return Err(InitializationError::MissingCredential("client id"));
        }
        if self.config.api_key.is_empty() {
            return Err(InitializationError::MissingCredential("API key"));
        }

        self.state = InitState::Initializing;
        let result = self.probe().await;
        self.state = if result.is_ok() {
            InitState::Ready
        } else {
            InitState::Uninitialized
        };
        result
    }

    #[tracing::instrument(skip(self))]
    async fn sign_in(&mut self) -> Result<(), SignInError> {
        self.initialize().await?;

        let now = Utc::now();
        if self.token.as_ref().is_some_and(|token| token.is_fresh(now)) {
            return Ok(());
        }

        let stored = self
            .token
            .take()
            .or_else(|| self.cache.as_ref().and_then(TokenCache::load));
        let tokens = match stored {
            Some(tokens) if tokens.is_fresh(now) => tokens,
            Some(TokenSet {
                refresh_token: Some(refresh),
                ..
            }) => match self.tokens.refresh(&refresh).await {
                Ok(tokens) => tokens,
                Err(e @ SignInError::Initialization(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("token refresh failed, asking for consent again: {e}");
                    self.consent().await?
                }
            },
            _ => self.consent().await?,
        };

        self.store(tokens);
        tracing::info!("signed in to image storage");
        Ok(())
    }

    async fn sign_out(&mut self) {
        self.token = None;
        self.folder_id = None;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear() {
                tracing::warn!("failed to remove {}: {e}", cache.path().display());
            }
        }
    }

    fn is_signed_in(&self) -> bool {
        self.state == InitState::Ready
            && self
                .token
                .as_ref()
                .is_some_and(|token| token.is_fresh(Utc::now()))
    }

    #[tracing::instrument(skip_all, fields(name = %file.name, size = file.len()))]
    async fn upload_image(&mut self, file: &ImageFile) -> Result<String, StorageError> {
        check_size(file.len(), self.max_bytes)?;

        let token = self.bearer()?;
        let folder = self.folder(&token).await?;

        let boundary = format!("giftdesk-{}", Uuid::new_v4().simple());
        let metadata = json!({ "name": file.name, "parents": [folder] });
        let url = self.endpoint(
            &self.config.endpoints.upload_base,
            "/files",
            &[("uploadType", "multipart"), ("fields", "id")],
        )?;
        let created: FileId = ok_json(
            self.http
                .post(url)
                .bearer_auth(&token)
                .header(CONTENT_TYPE, format!("multipart/related; boundary={boundary}"))
                .body(related_body(&boundary, &metadata, file))
                .send()
                .await?,
        )
        .await?;

        self.share_publicly(&token, &created.id).await?;
        let url = public_url(&created.id);
        tracing::info!(id = %created.id, "image uploaded");
        Ok(url)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_image(&mut self, id: &str) -> Result<(), StorageError> {
        let token = self.bearer()?;
        let url = self.endpoint(&self.config.endpoints.api_base, &format!("/files/{id}"), &[])?;
        let response = self.http.delete(url).bearer_auth(&token).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }

    async fn list_images(&mut self) -> Result<Vec<StoredImage>, StorageError> {
        let token = self.bearer()?;
        let folder = self.folder(&token).await?;
        let query = format!("'{}' in parents and trashed=false", escape_literal(&folder));
        let url = self.endpoint(
            &self.config.endpoints.api_base,
            "/files",
            &[
                ("q", query.as_str()),
                ("fields", "files(id,name,webViewLink)"),
                ("orderBy", "createdTime desc"),
            ],
        )?;
        let list: FileList<StoredImage> = ok_json(self.http.get(url).bearer_auth(&token).send().await?).await?;
        Ok(list.files)
    }
}

async fn ok_json<T: DeserializeOwned>(response: Response) -> Result<T, StorageError> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        Err(api_error(response).await)
    }
}

/// Escapes a string literal inside a search query.
fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn related_body(boundary: &str, metadata: &serde_json::Value, file: &ImageFile) -> Vec<u8> {
    let mut body = Vec::with_capacity(file.bytes.len() + 512);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n--{boundary}\r\nContent-Type: {}\r\n\r\n",
            file.mime
        )
        .as_bytes(),
    );
    body.extend_from_slice(&file.bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
