//! OAuth 2.0 for installed applications.
//!
//! Consent happens in the user's browser, which redirects back to a
//! short-lived listener on the loopback interface. The resulting tokens are
//! cached on disk so later runs can reuse or refresh them silently.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

use reqwest::Url;

use crate::media::SignInError;

/// Scope limited to files this application creates.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: TimeDelta = TimeDelta::seconds(60);
const DEFAULT_LIFETIME: TimeDelta = TimeDelta::hours(1);

/// Tokens granted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Token for obtaining new access tokens, if granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// When the access token stops working.
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Whether the access token can still be used at `now`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }
}

/// Token file on disk.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    /// A cache stored at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached tokens. A missing or unreadable cache yields `None`.
    #[must_use]
    pub fn load(&self) -> Option<TokenSet> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content)
            .inspect_err(|e| tracing::warn!("ignoring corrupt token cache: {e}"))
            .ok()
    }

    /// Stores `tokens`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, tokens: &TokenSet) -> io::Result<()> {
        let content = serde_json::to_vec_pretty(tokens).map_err(io::Error::other)?;
        crate::storage::write_file(&self.path, &content)
    }

    /// Removes the cache file, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// What the user is asked to consent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentRequest {
    /// Provider's consent page.
    pub auth_url: String,
    /// OAuth client identifier.
    pub client_id: String,
    /// Requested scope.
    pub scope: String,
    /// Anti-forgery token echoed back by the provider.
    pub state: String,
}

impl ConsentRequest {
    /// The consent page URL, redirecting to `redirect_uri`.
    ///
    /// # Errors
    ///
    /// Fails if the configured consent page is not a valid URL.
    pub fn url(&self, redirect_uri: &str) -> Result<Url, SignInError> {
        Url::parse_with_params(
            &self.auth_url,
            [
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", self.scope.as_str()),
                ("state", self.state.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| SignInError::Failed(format!("invalid consent page '{}': {e}", self.auth_url)))
    }
}

/// An authorisation code ready to be exchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// The one-time code.
    pub code: String,
    /// Redirect URI the code was issued for.
    pub redirect_uri: String,
}

/// Obtains the user's consent.
#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    /// Asks the user to approve `request`.
    async fn authorize(&self, request: &ConsentRequest) -> Result<Authorization, SignInError>;
}

/// Consent through the system browser and a loopback redirect.
#[derive(Debug, Clone)]
pub struct LoopbackConsent {
    timeout: Duration,
    open_browser: bool,
}

impl Default for LoopbackConsent {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            open_browser: true,
        }
    }
}

impl LoopbackConsent {
    /// Gives up, as if cancelled, after `timeout` without a redirect.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Only prints the consent URL instead of launching a browser.
    #[must_use]
    pub const fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    async fn await_redirect(listener: &TcpListener, state: &str) -> Result<String, SignInError> {
        loop {
            let (mut stream, _) = listener
                .accept()
                .await
                .map_err(|e| SignInError::Failed(e.to_string()))?;

            let mut buf = vec![0u8; 8192];
            let n = stream
                .read(&mut buf)
                .await
                .map_err(|e| SignInError::Failed(e.to_string()))?;
            let request = String::from_utf8_lossy(&buf[..n]);
            let Some(target) = request.split_whitespace().nth(1) else {
                continue;
            };
            let Some(params) = redirect_params(target) else {
                // favicon and similar
                let _ = respond(&mut stream, "404 Not Found", "").await;
                continue;
            };

            let outcome = params.into_outcome(state);
            let page = if outcome.is_ok() {
                "Signed in. You can close this window."
            } else {
                "Sign-in did not complete. You can close this window."
            };
            let _ = respond(&mut stream, "200 OK", page).await;
            return outcome;
        }
    }
}

#[async_trait]
impl ConsentPrompt for LoopbackConsent {
    async fn authorize(&self, request: &ConsentRequest) -> Result<Authorization, SignInError> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| SignInError::Failed(e.to_string()))?;
        let port = listener
            .local_addr()
            .map_err(|e| SignInError::Failed(e.to_string()))?
            .port();
        let redirect_uri = format!("http://127.0.0.1:{port}");
        let url = request.url(&redirect_uri)?;

        eprintln!("Sign in to continue: {url}");
        if self.open_browser {
            if let Err(e) = crate::launch::open_uri(url.as_str()) {
                tracing::warn!("could not open a browser: {e}");
            }
        }

        let code = tokio::time::timeout(self.timeout, Self::await_redirect(&listener, &request.state))
            .await
            .map_err(|_| SignInError::Cancelled)??;

        Ok(Authorization { code, redirect_uri })
    }
}

#[derive(Debug, Default)]
struct RedirectParams {
    code: Option<String>,
    error: Option<String>,
    state: Option<String>,
}

impl RedirectParams {
    fn into_outcome(self, expected_state: &str) -> Result<String, SignInError> {
        if let Some(error) = self.error {
            return Err(consent_error(&error));
        }
        if self.state.as_deref() != Some(expected_state) {
            return Err(SignInError::Failed("state mismatch in redirect".to_string()));
        }
        self.code
            .ok_or_else(|| SignInError::Failed("redirect carried no code".to_string()))
    }
}

fn redirect_params(target: &str) -> Option<RedirectParams> {
    let url = Url::parse(&format!("http://127.0.0.1{target}")).ok()?;
    if url.path() != "/" {
        return None;
    }
    let mut params = RedirectParams::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => params.code = Some(value.into_owned()),
            "error" => params.error = Some(value.into_owned()),
            "state" => params.state = Some(value.into_owned()),
            _ => {}
        }
    }
    Some(params)
}

/// Maps an OAuth error code to a sign-in failure.
#[must_use]
pub fn consent_error(code: &str) -> SignInError {
    match code {
        "popup_closed" | "popup_closed_by_user" => SignInError::Cancelled,
        "access_denied" => SignInError::PermissionDenied,
        other => SignInError::Failed(other.to_string()),
    }
}

async fn respond(stream: &mut tokio::net::TcpStream, status: &str, body: &str) -> io::Result<()> {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

const fn default_expires_in() -> i64 {
    3600
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Talks to the provider's token endpoint.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    client: reqwest::Client,
    url: String,
    client_id: String,
    client_secret: String,
}

impl TokenEndpoint {
    /// An endpoint at `url` for the given client.
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Exchanges an authorisation code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the code.
    pub async fn exchange(&self, authorization: &Authorization) -> Result<TokenSet, SignInError> {
        self.request(&[
            ("grant_type", "authorization_code"),
            ("code", &authorization.code),
            ("redirect_uri", &authorization.redirect_uri),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ])
        .await
    }

    /// Obtains a new access token with `refresh_token`.
    ///
    /// The refresh token is carried over when the provider does not rotate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, SignInError> {
        let mut tokens = self
            .request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ])
            .await?;
        tokens
            .refresh_token
            .get_or_insert_with(|| refresh_token.to_string());
        Ok(tokens)
    }

    async fn request(&self, params: &[(&str, &str)]) -> Result<TokenSet, SignInError> {
        let failed = |e: reqwest::Error| SignInError::Failed(e.to_string());

        let response = self
            .client
            .post(&self.url)
            .form(params)
            .send()
            .await
            .map_err(failed)?;

        let status = response.status();
        let body = response.text().await.map_err(failed)?;
        if !status.is_success() {
            return Err(match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(TokenErrorResponse { error, .. }) if error == "invalid_client" => {
                    SignInError::Initialization(super::InitializationError::InvalidClientId)
                }
                Ok(TokenErrorResponse {
                    error,
                    error_description,
                }) => SignInError::Failed(error_description.unwrap_or(error)),
                Err(_) => SignInError::Failed(format!("token endpoint returned HTTP {status}")),
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| SignInError::Failed(e.to_string()))?;
        Ok(TokenSet {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: expiry(Utc::now(), token.expires_in),
        })
    }
}

/// When a token issued at `now` with a lifetime of `expires_in` seconds
/// expires. Lifetimes that do not fit a timestamp count as one hour.
fn expiry(now: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    TimeDelta::try_seconds(expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or_else(|| now + DEFAULT_LIFETIME)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use test_case::test_case;

    use super::*;
    use crate::test_support::{StubResponse, StubServer};

    fn consent_request() -> ConsentRequest {
        ConsentRequest {
            auth_url: "https://accounts.example.com/auth".to_string(),
            client_id: "client-1".to_string(),
            scope: DRIVE_FILE_SCOPE.to_string(),
            state: "xyz".to_string(),
        }
    }

    #[test]
    fn consent_url_carries_client_and_scope() {
        let parsed = consent_request().url("http://127.0.0.1:4000").unwrap();
        let param = |name: &str| {
            parsed
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        assert_eq!(param("client_id").as_deref(), Some("client-1"));
        assert_eq!(param("scope").as_deref(), Some(DRIVE_FILE_SCOPE));
        assert_eq!(param("redirect_uri").as_deref(), Some("http://127.0.0.1:4000"));
        assert_eq!(param("response_type").as_deref(), Some("code"));
        assert_eq!(param("state").as_deref(), Some("xyz"));
    }

    #[test]
    fn malformed_consent_page_is_a_sign_in_failure() {
        let request = ConsentRequest {
            auth_url: "not a url".to_string(),
            ..consent_request()
        };
        assert!(matches!(request.url("http://127.0.0.1:4000"), Err(SignInError::Failed(_))));
    }

    #[test_case(3600, TimeDelta::hours(1); "typical lifetime")]
    #[test_case(0, TimeDelta::zero(); "already expired")]
    #[test_case(i64::MAX, TimeDelta::hours(1); "out of range falls back")]
    #[test_case(i64::MAX / 1000, TimeDelta::hours(1); "beyond the calendar falls back")]
    fn token_expiry(expires_in: i64, lifetime: TimeDelta) {
        let now = Utc::now();
        assert_eq!(expiry(now, expires_in), now + lifetime);
    }

    #[test_case("popup_closed", SignInError::Cancelled)]
    #[test_case("access_denied", SignInError::PermissionDenied)]
    #[test_case("server_error", SignInError::Failed("server_error".to_string()))]
    fn maps_consent_errors(code: &str, expected: SignInError) {
        assert_eq!(consent_error(code), expected);
    }

    #[test]
    fn redirect_with_code_and_matching_state() {
        let params = redirect_params("/?state=xyz&code=4%2Fabc").unwrap();
        assert_eq!(params.into_outcome("xyz"), Ok("4/abc".to_string()));
    }

    #[test]
    fn redirect_with_wrong_state_is_rejected() {
        let params = redirect_params("/?state=other&code=abc").unwrap();
        assert!(matches!(params.into_outcome("xyz"), Err(SignInError::Failed(_))));
    }

    #[test]
    fn redirect_with_denial() {
        let params = redirect_params("/?error=access_denied&state=xyz").unwrap();
        assert_eq!(params.into_outcome("xyz"), Err(SignInError::PermissionDenied));
    }

    #[test]
    fn other_paths_are_ignored() {
        assert!(redirect_params("/favicon.ico").is_none());
    }

    #[tokio::test]
    async fn loopback_times_out_as_cancelled() {
        let consent = LoopbackConsent::default()
            .without_browser()
            .with_timeout(Duration::from_millis(20));

        let result = consent.authorize(&consent_request()).await;

        assert_eq!(result, Err(SignInError::Cancelled));
    }

    #[test]
    fn freshness_honours_margin() {
        let now = Utc::now();
        let tokens = TokenSet {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: now + TimeDelta::seconds(30),
        };
        assert!(!tokens.is_fresh(now));
        assert!(tokens.is_fresh(now - TimeDelta::seconds(60)));
    }

    #[test]
    fn cache_round_trip_and_clear() {
        let tmp = tempdir().unwrap();
        let cache = TokenCache::new(tmp.path().join(".giftdesk").join("drive-token.json"));
        assert_eq!(cache.load(), None);

        let tokens = TokenSet {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Utc::now(),
        };
        cache.save(&tokens).unwrap();
        assert_eq!(cache.load(), Some(tokens));

        cache.clear().unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.load(), None);
    }

    #[cfg(unix)]
    #[test]
    fn cached_tokens_are_private_to_the_owner() {
        use std::os::unix::fs::PermissionsExt as _;

        let tmp = tempdir().unwrap();
        let cache = TokenCache::new(tmp.path().join("drive-token.json"));
        cache
            .save(&TokenSet {
                access_token: "access".to_string(),
                refresh_token: Some("refresh".to_string()),
                expires_at: Utc::now(),
            })
            .unwrap();

        let mode = fs::metadata(cache.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn exchange_posts_form_encoded_code() {
        let server = StubServer::start(|_| {
            StubResponse::json(&serde_json::json!({
                "access_token": "at",
                "refresh_token": "rt",
                "expires_in": 3599,
                "token_type": "Bearer"
            }))
        });
        let endpoint = TokenEndpoint::new(reqwest::Client::new(), server.url("/token"), "cid", "secret");

        let tokens = endpoint
            .exchange(&Authorization {
                code: "4/abc".to_string(),
                redirect_uri: "http://127.0.0.1:5000".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "at");
        assert_eq!(tokens.refresh_token.as_deref(), Some("rt"));
        let body = server.requests()[0].body_text();
        assert!(body.contains("grant_type=authorization_code"));
        assert!(body.contains("code=4%2Fabc"));
        assert!(body.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A5000"));
    }

    #[tokio::test]
    async fn refresh_keeps_refresh_token() {
        let server = StubServer::start(|_| {
            StubResponse::json(&serde_json::json!({"access_token": "new", "expires_in": 3600}))
        });
        let endpoint = TokenEndpoint::new(reqwest::Client::new(), server.url("/token"), "cid", "secret");

        let tokens = endpoint.refresh("rt").await.unwrap();

        assert_eq!(tokens.access_token, "new");
        assert_eq!(tokens.refresh_token.as_deref(), Some("rt"));
    }

    #[tokio::test]
    async fn rejected_client_is_an_initialisation_error() {
        let server = StubServer::start(|_| {
            StubResponse::status(401, r#"{"error": "invalid_client", "error_description": "Unauthorized"}"#)
        });
        let endpoint = TokenEndpoint::new(reqwest::Client::new(), server.url("/token"), "cid", "secret");

        let error = endpoint.refresh("rt").await.unwrap_err();

        assert_eq!(
            error,
            SignInError::Initialization(crate::media::InitializationError::InvalidClientId)
        );
    }
}
