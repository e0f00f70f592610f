/// Kubernetes Engine API client
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::cluster::location_path;
use super::error::GkeError;
use super::models::*;
use crate::gcp::TokenProvider;

/// Submits cluster operations to a managed Kubernetes control plane
#[async_trait]
pub trait ClusterManager: Send + Sync {
    /// Start creating a cluster. Returns as soon as the operation is accepted.
    async fn create_cluster(&self, body: &CreateClusterBody) -> Result<Operation, GkeError>;
}

/// REST client for `container.googleapis.com/v1`
#[derive(Clone)]
pub struct GkeClient {
    client: Client,
    base_url: Url,
    tokens: Arc<TokenProvider>,
}

impl GkeClient {
    /// Create a new client against the given API endpoint
    pub fn new(base_url: Url, tokens: Arc<TokenProvider>) -> Result<Self, GkeError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            tokens,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), endpoint)
    }

    /// Make a GET request to the API
    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GkeError> {
        let url = self.url(endpoint);
        debug!("GET {}", url);

        let token = self.tokens.access_token().await?;
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        Self::handle_response(response).await
    }

    /// Make a POST request to the API
    async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<R, GkeError> {
        let url = self.url(endpoint);
        debug!("POST {}", url);

        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle API response, checking for errors
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GkeError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&text)?);
        }

        // Google APIs wrap failures in {"error": {...}}
        if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&text) {
            return Err(GkeError::Api {
                status: status.as_u16(),
                code: error_response.error.status,
                message: error_response.error.message,
            });
        }

        Err(GkeError::Api {
            status: status.as_u16(),
            code: status
                .canonical_reason()
                .unwrap_or("UNKNOWN")
                .to_string(),
            message: text,
        })
    }

    /// Get a long-running operation
    pub async fn get_operation(
        &self,
        project_id: &str,
        location: &str,
        operation: &str,
    ) -> Result<Operation, GkeError> {
        self.get(&format!(
            "{}/operations/{}",
            location_path(project_id, location),
            operation
        ))
        .await
    }

    /// Get a cluster by name
    pub async fn get_cluster(
        &self,
        project_id: &str,
        location: &str,
        name: &str,
    ) -> Result<serde_json::Value, GkeError> {
        self.get(&format!(
            "{}/clusters/{}",
            location_path(project_id, location),
            name
        ))
        .await
    }
}

#[async_trait]
impl ClusterManager for GkeClient {
    async fn create_cluster(&self, body: &CreateClusterBody) -> Result<Operation, GkeError> {
        self.post(&format!("{}/clusters", body.parent), body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::gcp::Credentials;
    use crate::gke::cluster::build_create_cluster_request;
    use crate::gke::request::CreateClusterRequest;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };

    async fn serve(app: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{}/v1", addr)).unwrap()
    }

    fn client(base_url: Url) -> GkeClient {
        let tokens = Arc::new(TokenProvider::new(Credentials::Static("token".to_string())));
        GkeClient::new(base_url, tokens).unwrap()
    }

    fn body() -> CreateClusterBody {
        let request = CreateClusterRequest {
            name: "demo".to_string(),
            description: "demo cluster".to_string(),
            ..Default::default()
        };
        build_create_cluster_request(&ServiceConfig::with_defaults("demo"), &request)
    }

    #[tokio::test]
    async fn test_create_cluster_posts_to_parent() {
        let app = Router::new().route(
            "/v1/projects/demo/locations/australia-southeast1-a/clusters",
            post(|headers: HeaderMap, Json(body): Json<CreateClusterBody>| async move {
                assert_eq!(headers.get("authorization").unwrap(), "Bearer token");
                assert_eq!(body.cluster.name, "demo");
                Json(serde_json::json!({
                    "name": "operation-1",
                    "operationType": "CREATE_CLUSTER",
                    "status": "RUNNING"
                }))
            }),
        );
        let base_url = serve(app).await;

        let operation = client(base_url).create_cluster(&body()).await.unwrap();
        assert_eq!(operation.name, "operation-1");
        assert_eq!(operation.status, OperationStatus::Running);
    }

    #[tokio::test]
    async fn test_api_error_surfaced() {
        let app = Router::new().route(
            "/v1/projects/demo/locations/australia-southeast1-a/clusters",
            post(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(serde_json::json!({
                        "error": {
                            "code": 409,
                            "message": "Already exists: demo",
                            "status": "ALREADY_EXISTS"
                        }
                    })),
                )
            }),
        );
        let base_url = serve(app).await;

        let err = client(base_url).create_cluster(&body()).await.unwrap_err();
        assert_eq!(err.api_status(), Some(409));
        assert_eq!(
            err.to_string(),
            "API error: 409 ALREADY_EXISTS - Already exists: demo"
        );
    }

    #[tokio::test]
    async fn test_non_json_error_surfaced() {
        let app = Router::new().route(
            "/v1/projects/demo/locations/australia-southeast1-a/clusters",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base_url = serve(app).await;

        let err = client(base_url).create_cluster(&body()).await.unwrap_err();
        match err {
            GkeError::Api { status, message, .. } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_get_operation() {
        let app = Router::new().route(
            "/v1/projects/demo/locations/australia-southeast1-a/operations/:name",
            get(|Path(name): Path<String>| async move {
                Json(serde_json::json!({ "name": name, "status": "DONE" }))
            }),
        );
        let base_url = serve(app).await;

        let operation = client(base_url)
            .get_operation("demo", "australia-southeast1-a", "operation-7")
            .await
            .unwrap();
        assert_eq!(operation.name, "operation-7");
        assert!(operation.is_done());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Nothing listens on port 9 locally
        let base_url = Url::parse("http://127.0.0.1:9/v1").unwrap();
        let err = client(base_url).create_cluster(&body()).await.unwrap_err();
        assert!(matches!(err, GkeError::Transport(_)));
    }
}
