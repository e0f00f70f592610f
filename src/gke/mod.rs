/// Google Kubernetes Engine cluster provisioning
pub mod client;
pub mod cluster;
pub mod error;
pub mod models;
pub mod operation;
pub mod request;
pub mod service;

pub use client::{ClusterManager, GkeClient};
pub use error::GkeError;
pub use request::{CreateClusterRequest, CreateClusterResponse};
pub use service::GkeService;
