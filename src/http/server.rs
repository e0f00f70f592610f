/// HTTP entry point for cluster creation
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tracing::{debug, error, info};

use crate::gke::{CreateClusterRequest, GkeService};

/// HTTP server exposing the create-cluster function
#[derive(Clone)]
pub struct HttpServer {
    service: GkeService,
    address: SocketAddr,
}

impl HttpServer {
    pub fn new(service: GkeService, address: SocketAddr) -> Self {
        Self { service, address }
    }

    /// Routes served by this function
    pub fn router(service: GkeService) -> Router {
        Router::new()
            .route("/", post(handle_create_cluster))
            .route("/clusters", post(handle_create_cluster))
            .route("/healthz", get(handle_health))
            .with_state(service)
    }

    pub async fn start(self) -> std::io::Result<()> {
        info!("Starting HTTP server on {}", self.address);

        let app = Self::router(self.service);

        let listener = tokio::net::TcpListener::bind(self.address)
            .await
            .map_err(|e| {
                error!("Failed to bind HTTP server on {}: {}", self.address, e);
                e
            })?;

        info!("HTTP server listening on {}", self.address);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("HTTP server error: {}", e);
                e
            })?;

        info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Create a new GKE cluster
///
/// 202 once the create call is dispatched, 500 for any failure including a
/// body that is not a valid request.
async fn handle_create_cluster(State(service): State<GkeService>, body: Bytes) -> Response {
    let request: CreateClusterRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!("Rejected undecodable request: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to decode the provided request. Error: {}\n", e),
            )
                .into_response();
        }
    };

    match service.create_cluster(&request).await {
        Ok(_) => StatusCode::ACCEPTED.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to create cluster. Error: {}\n", e),
        )
            .into_response(),
    }
}

async fn handle_health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::gke::service::tests::FakeClusterManager;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(manager: Arc<FakeClusterManager>) -> Router {
        HttpServer::router(GkeService::new(ServiceConfig::with_defaults("demo"), manager))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_accepted_with_empty_body() {
        let manager = Arc::new(FakeClusterManager::default());
        let response = app(manager.clone())
            .oneshot(post_json(
                "/",
                r#"{"name":"edge","description":"Edge","clusterLabels":{"team":"edge"}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(body_text(response).await.is_empty());

        let submitted = manager.submitted.lock().await;
        assert_eq!(submitted.len(), 1);
        assert_eq!(
            submitted[0].cluster.resource_labels.get("team").unwrap(),
            "edge"
        );
    }

    #[tokio::test]
    async fn test_clusters_route() {
        let manager = Arc::new(FakeClusterManager::default());
        let response = app(manager)
            .oneshot(post_json("/clusters", r#"{"name":"edge","description":"Edge"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_malformed_json_is_500() {
        let manager = Arc::new(FakeClusterManager::default());
        let response = app(manager.clone())
            .oneshot(post_json("/", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response)
            .await
            .starts_with("Failed to decode the provided request. Error:"));
        assert!(manager.submitted.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_is_500() {
        let manager = Arc::new(FakeClusterManager::default());
        let response = app(manager.clone())
            .oneshot(post_json("/", r#"{"name":"","description":"Edge"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body_text(response).await;
        assert!(text.starts_with("Failed to create cluster. Error: Request validation failed"));
        assert!(text.contains("name: cannot be blank"));
        assert!(manager.submitted.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_downstream_failure_is_500() {
        let manager = Arc::new(FakeClusterManager::failing("quota exceeded"));
        let response = app(manager)
            .oneshot(post_json("/", r#"{"name":"edge","description":"Edge"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_health() {
        let manager = Arc::new(FakeClusterManager::default());
        let response = app(manager)
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }
}
