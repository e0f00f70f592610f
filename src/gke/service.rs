/// GKE service: validates requests and dispatches cluster creation
use std::sync::Arc;
use tracing::{error, info};

use super::client::ClusterManager;
use super::cluster::build_create_cluster_request;
use super::error::GkeError;
use super::request::{CreateClusterRequest, CreateClusterResponse};
use crate::config::ServiceConfig;

/// Creates GKE clusters from the service configuration and a request
#[derive(Clone)]
pub struct GkeService {
    config: Arc<ServiceConfig>,
    manager: Arc<dyn ClusterManager>,
}

impl GkeService {
    /// Create a new service. The configuration is captured once.
    pub fn new(config: ServiceConfig, manager: Arc<dyn ClusterManager>) -> Self {
        Self {
            config: Arc::new(config),
            manager,
        }
    }

    /// Create a new GKE cluster
    ///
    /// Returns once the API has accepted the create operation; it does not
    /// wait for the cluster to become ready.
    pub async fn create_cluster(
        &self,
        request: &CreateClusterRequest,
    ) -> Result<CreateClusterResponse, GkeError> {
        request.validate()?;

        let body = build_create_cluster_request(&self.config, request);

        info!(
            "Creating cluster {} in {} (project: {})",
            request.name, self.config.zone, self.config.project_id
        );

        let operation = self.manager.create_cluster(&body).await.map_err(|e| {
            error!("Failed to create cluster {}: {}", request.name, e);
            e
        })?;

        info!(
            "Operation result: {} {} ({})",
            operation.name, operation.operation_type, operation.status
        );

        Ok(CreateClusterResponse {
            operation: Some(operation.name).filter(|name| !name.is_empty()),
        })
    }
}
