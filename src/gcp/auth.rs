/// GCP authentication
///
/// Obtains OAuth2 access tokens for the Kubernetes Engine API. Credentials
/// are discovered in this order:
/// 1. `GOOGLE_OAUTH_ACCESS_TOKEN`, a ready-made token
/// 2. `GOOGLE_APPLICATION_CREDENTIALS`, a service account key file
/// 3. The GCE metadata server, the runtime identity on Cloud Functions
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

use super::types::{AccessToken, ServiceAccount};

/// The Google OAuth2 token endpoint
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scope requested for service account tokens
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

const METADATA_TOKEN_PATH: &str = "computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Errors raised while obtaining an access token
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to read credentials file {path}: {source}")]
    ReadCredentials {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid credentials file {path}: {source}")]
    InvalidCredentials {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to sign token request: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Where access tokens come from
#[derive(Debug, Clone)]
pub enum Credentials {
    /// A pre-issued token, used as is
    Static(String),
    /// Service account key, exchanged through the JWT bearer grant
    ServiceAccount(ServiceAccount),
    /// GCE metadata server at the given host
    Metadata { host: String },
}

impl Credentials {
    /// Discover credentials from the process environment
    pub fn from_env() -> Result<Self, AuthError> {
        if let Some(token) = non_empty_var("GOOGLE_OAUTH_ACCESS_TOKEN") {
            debug!("Using access token from GOOGLE_OAUTH_ACCESS_TOKEN");
            return Ok(Self::Static(token));
        }

        if let Some(path) = non_empty_var("GOOGLE_APPLICATION_CREDENTIALS") {
            debug!("Using service account key from {}", path);
            return Self::from_key_file(path);
        }

        let host = non_empty_var("GCE_METADATA_HOST")
            .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string());
        debug!("Using metadata server at {}", host);
        Ok(Self::Metadata { host })
    }

    /// Load a service account key file
    pub fn from_key_file<P: AsRef<Path>>(path: P) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| AuthError::ReadCredentials {
            path: path.display().to_string(),
            source,
        })?;
        let account: ServiceAccount =
            serde_json::from_str(&content).map_err(|source| AuthError::InvalidCredentials {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self::ServiceAccount(account))
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Static(_) => "static token",
            Credentials::ServiceAccount(_) => "service account",
            Credentials::Metadata { .. } => "metadata server",
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Claims of the JWT bearer assertion
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Hands out access tokens, caching them until shortly before expiry
pub struct TokenProvider {
    credentials: Credentials,
    http: reqwest::Client,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            http: reqwest::Client::new(),
            cache: Mutex::new(None),
        }
    }

    /// Return a valid access token, fetching a new one when needed
    pub async fn access_token(&self) -> Result<String, AuthError> {
        match &self.credentials {
            Credentials::Static(token) => Ok(token.clone()),
            Credentials::ServiceAccount(account) => {
                self.cached(|| self.exchange_jwt(account)).await
            }
            Credentials::Metadata { host } => self.cached(|| self.fetch_from_metadata(host)).await,
        }
    }

    async fn cached<F, Fut>(&self, fetch: F) -> Result<String, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, AuthError>>,
    {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > Utc::now() {
                return Ok(cached.value.clone());
            }
        }

        let token = fetch().await?;
        debug!("Fetched access token valid for {}s", token.expires_in);

        let lifetime = token.expires_in as i64 - EXPIRY_MARGIN_SECS;
        *cache = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(lifetime.max(0)),
        });

        Ok(token.access_token)
    }

    /// Server-to-server OAuth2 flow: sign a JWT with the key and trade it for a token
    async fn exchange_jwt(&self, account: &ServiceAccount) -> Result<AccessToken, AuthError> {
        let token_uri = if account.token_uri.is_empty() {
            TOKEN_URL
        } else {
            account.token_uri.as_str()
        };

        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: account.client_email.clone(),
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
            aud: token_uri.to_string(),
            exp: now + 3600,
            iat: now,
        };

        let mut header = Header::new(Algorithm::RS256);
        if !account.private_key_id.is_empty() {
            header.kid = Some(account.private_key_id.clone());
        }
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())?;
        let jwt = encode(&header, &claims, &key)?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", jwt.as_str()),
        ];
        let response = self.http.post(token_uri).form(&params).send().await?;
        Self::read_token(response).await
    }

    async fn fetch_from_metadata(&self, host: &str) -> Result<AccessToken, AuthError> {
        let url = format!("http://{}/{}", host, METADATA_TOKEN_PATH);
        let response = self
            .http
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;
        Self::read_token(response).await
    }

    async fn read_token(response: reqwest::Response) -> Result<AccessToken, AuthError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<AccessToken>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr.to_string()
    }

    #[tokio::test]
    async fn test_static_token() {
        let provider = TokenProvider::new(Credentials::Static("abc".to_string()));
        assert_eq!(provider.access_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_metadata_token_is_cached() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let app = Router::new().route(
            "/computeMetadata/v1/instance/service-accounts/default/token",
            get(move |headers: axum::http::HeaderMap| {
                let counter = counter.clone();
                async move {
                    assert_eq!(headers.get("Metadata-Flavor").unwrap(), "Google");
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({
                        "access_token": "from-metadata",
                        "expires_in": 3599,
                        "token_type": "Bearer"
                    }))
                }
            }),
        );
        let host = serve(app).await;

        let provider = TokenProvider::new(Credentials::Metadata { host });
        assert_eq!(provider.access_token().await.unwrap(), "from-metadata");
        assert_eq!(provider.access_token().await.unwrap(), "from-metadata");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_metadata_rejection() {
        let app = Router::new().route(
            "/computeMetadata/v1/instance/service-accounts/default/token",
            get(|| async { (axum::http::StatusCode::NOT_FOUND, "no service account") }),
        );
        let host = serve(app).await;

        let provider = TokenProvider::new(Credentials::Metadata { host });
        let err = provider.access_token().await.unwrap_err();
        match err {
            AuthError::Rejected { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no service account");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_key_file_parsing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "type": "service_account",
                "project_id": "demo",
                "private_key_id": "k1",
                "private_key": "not a key",
                "client_email": "sa@demo.iam.gserviceaccount.com",
                "token_uri": "https://oauth2.googleapis.com/token"
            }}"#
        )
        .unwrap();

        match Credentials::from_key_file(file.path()).unwrap() {
            Credentials::ServiceAccount(account) => {
                assert_eq!(account.client_email, "sa@demo.iam.gserviceaccount.com");
                assert_eq!(account.project_id, "demo");
            }
            other => panic!("unexpected credentials: {:?}", other),
        }
    }

    #[test]
    fn test_key_file_errors() {
        let err = Credentials::from_key_file("/nonexistent/key.json").unwrap_err();
        assert!(matches!(err, AuthError::ReadCredentials { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = Credentials::from_key_file(file.path()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials { .. }));
    }

    #[tokio::test]
    async fn test_invalid_private_key() {
        let provider = TokenProvider::new(Credentials::ServiceAccount(ServiceAccount {
            account_type: "service_account".to_string(),
            project_id: "demo".to_string(),
            private_key_id: String::new(),
            private_key: "not a key".to_string(),
            client_email: "sa@demo.iam.gserviceaccount.com".to_string(),
            token_uri: String::new(),
        }));

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::Signing(_)));
    }
}
