/// Configuration management for the GKE provisioner
///
/// Every setting comes from the environment. Blank or absent variables fall
/// back to a default, except `PROJECT_ID` which is required.
use std::collections::HashMap;
use std::str::FromStr;

use serde::Serialize;
use url::Url;

pub const PROJECT_ID: &str = "PROJECT_ID";
pub const REGION: &str = "REGION";
pub const ZONE: &str = "ZONE";
pub const KUBERNETES_CLUSTER_VERSION: &str = "KUBERNETES_CLUSTER_VERSION";
pub const MACHINE_TYPE: &str = "MACHINE_TYPE";
pub const DISK_SIZE: &str = "DISK_SIZE";
pub const DISK_TYPE: &str = "DISK_TYPE";
pub const IMAGE_TYPE: &str = "IMAGE_TYPE";
pub const NODE_COUNT: &str = "NODE_COUNT";
pub const MAX_PODS_PER_NODE: &str = "MAX_PODS_PER_NODE";
pub const GKE_API_ENDPOINT: &str = "GKE_API_ENDPOINT";

pub const DEFAULT_REGION: &str = "australia-southeast1";
pub const DEFAULT_ZONE: &str = "australia-southeast1-a";
pub const DEFAULT_KUBERNETES_CLUSTER_VERSION: &str = "latest";
pub const DEFAULT_MACHINE_TYPE: &str = "e2-medium";
pub const DEFAULT_DISK_SIZE_GB: i32 = 32;
pub const DEFAULT_DISK_TYPE: &str = "pd-standard";
pub const DEFAULT_IMAGE_TYPE: &str = "COS";
pub const DEFAULT_NODE_COUNT: i32 = 1;
pub const DEFAULT_MAX_PODS_PER_NODE: i64 = 110;
pub const DEFAULT_GKE_API_ENDPOINT: &str = "https://container.googleapis.com/v1";

/// Errors raised while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Failed to convert {name} to integer: {value:?}")]
    InvalidInteger { name: &'static str, value: String },

    #[error("Invalid URL in {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Source of environment-style key/value settings
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Reads individual settings from an [`EnvSource`], applying defaults
pub struct EnvReader<S> {
    source: S,
}

impl<S: EnvSource> EnvReader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Non-blank value of a variable. Only spaces count as blank.
    fn non_blank(&self, name: &str) -> Option<String> {
        self.source
            .var(name)
            .filter(|value| !value.trim_matches(' ').is_empty())
    }

    fn string_or(&self, name: &str, default: &str) -> String {
        self.non_blank(name).unwrap_or_else(|| default.to_string())
    }

    fn integer_or<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.non_blank(name) {
            None => Ok(default),
            Some(value) => value
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidInteger { name, value }),
        }
    }

    /// Google Cloud project ID
    pub fn project_id(&self) -> Result<String, ConfigError> {
        self.non_blank(PROJECT_ID)
            .ok_or(ConfigError::Missing(PROJECT_ID))
    }

    /// Region that owns the default subnetwork
    pub fn region(&self) -> String {
        self.string_or(REGION, DEFAULT_REGION)
    }

    /// Zone the cluster is created in
    pub fn zone(&self) -> String {
        self.string_or(ZONE, DEFAULT_ZONE)
    }

    /// Initial Kubernetes version of the cluster
    pub fn kubernetes_cluster_version(&self) -> String {
        self.string_or(KUBERNETES_CLUSTER_VERSION, DEFAULT_KUBERNETES_CLUSTER_VERSION)
    }

    /// Compute Engine machine type for the node pool
    pub fn machine_type(&self) -> String {
        self.string_or(MACHINE_TYPE, DEFAULT_MACHINE_TYPE)
    }

    /// Size of the disk attached to each node, in GB
    pub fn disk_size_gb(&self) -> Result<i32, ConfigError> {
        self.integer_or(DISK_SIZE, DEFAULT_DISK_SIZE_GB)
    }

    /// Disk type attached to each node (e.g. 'pd-standard', 'pd-ssd' or 'pd-balanced')
    pub fn disk_type(&self) -> String {
        self.string_or(DISK_TYPE, DEFAULT_DISK_TYPE)
    }

    /// Node image type. The latest version of the image is used.
    pub fn image_type(&self) -> String {
        self.string_or(IMAGE_TYPE, DEFAULT_IMAGE_TYPE)
    }

    /// Initial node count of the default pool
    pub fn node_count(&self) -> Result<i32, ConfigError> {
        self.integer_or(NODE_COUNT, DEFAULT_NODE_COUNT)
    }

    /// Maximum number of pods per node
    pub fn max_pods_per_node(&self) -> Result<i64, ConfigError> {
        self.integer_or(MAX_PODS_PER_NODE, DEFAULT_MAX_PODS_PER_NODE)
    }

    /// Base URL of the Kubernetes Engine API
    pub fn gke_api_endpoint(&self) -> Result<Url, ConfigError> {
        let value = self.string_or(GKE_API_ENDPOINT, DEFAULT_GKE_API_ENDPOINT);
        Url::parse(&value).map_err(|source| ConfigError::InvalidUrl {
            name: GKE_API_ENDPOINT,
            source,
        })
    }
}

/// Settings shared by every cluster this service creates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceConfig {
    pub project_id: String,
    pub region: String,
    pub zone: String,
    pub kubernetes_cluster_version: String,
    pub machine_type: String,
    pub disk_size_gb: i32,
    pub disk_type: String,
    pub image_type: String,
    pub node_count: i32,
    pub max_pods_per_node: i64,
    #[serde(serialize_with = "serialize_url")]
    pub gke_api_endpoint: Url,
}

fn serialize_url<S: serde::Serializer>(url: &Url, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(url.as_str())
}

impl ServiceConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(ProcessEnv)
    }

    /// Load configuration from an arbitrary source
    pub fn from_source<S: EnvSource>(source: S) -> Result<Self, ConfigError> {
        let reader = EnvReader::new(source);

        Ok(Self {
            project_id: reader.project_id()?,
            region: reader.region(),
            zone: reader.zone(),
            kubernetes_cluster_version: reader.kubernetes_cluster_version(),
            machine_type: reader.machine_type(),
            disk_size_gb: reader.disk_size_gb()?,
            disk_type: reader.disk_type(),
            image_type: reader.image_type(),
            node_count: reader.node_count()?,
            max_pods_per_node: reader.max_pods_per_node()?,
            gke_api_endpoint: reader.gke_api_endpoint()?,
        })
    }

    /// Configuration for the given project with every other setting defaulted
    #[cfg(test)]
    pub fn with_defaults(project_id: impl Into<String>) -> Self {
        let mut env = HashMap::new();
        env.insert(PROJECT_ID.to_string(), project_id.into());
        Self::from_source(env).expect("defaults are valid")
    }
}
