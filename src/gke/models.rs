/// Kubernetes Engine API data models
///
/// Field names follow the JSON mapping of `google.container.v1`. Only the
/// fields this service sets or reads are modelled.
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// Body of `projects.locations.clusters.create`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterBody {
    pub cluster: Cluster,
    /// `projects/{project}/locations/{location}`
    pub parent: String,
}

/// A Google Kubernetes Engine cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub name: String,
    pub description: String,
    pub master_auth: MasterAuth,
    pub network: String,
    pub addons_config: AddonsConfig,
    pub subnetwork: String,
    pub node_pools: Vec<NodePool>,
    pub locations: Vec<String>,
    pub resource_labels: HashMap<String, String>,
    pub network_policy: Enabled,
    pub ip_allocation_policy: IpAllocationPolicy,
    pub master_authorized_networks_config: Enabled,
    pub autoscaling: ClusterAutoscaling,
    pub default_max_pods_constraint: MaxPodsConstraint,
    pub authenticator_groups_config: Enabled,
    pub private_cluster_config: PrivateClusterConfig,
    pub database_encryption: DatabaseEncryption,
    pub shielded_nodes: Enabled,
    pub release_channel: ReleaseChannel,
    pub initial_cluster_version: String,
    pub location: String,
}

/// Shape shared by every `{ "enabled": bool }` message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enabled {
    pub enabled: bool,
}

/// Shape shared by every `{ "disabled": bool }` addon message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disabled {
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterAuth {
    pub client_certificate_config: ClientCertificateConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCertificateConfig {
    pub issue_client_certificate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonsConfig {
    pub http_load_balancing: Disabled,
    pub horizontal_pod_autoscaling: Disabled,
    pub dns_cache_config: Enabled,
}

/// A group of nodes sharing one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePool {
    pub name: String,
    pub config: NodeConfig,
    pub initial_node_count: i32,
    pub autoscaling: Enabled,
    pub management: NodeManagement,
    pub upgrade_settings: UpgradeSettings,
}

/// Parameters of each node in a pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub machine_type: String,
    pub disk_size_gb: i32,
    pub oauth_scopes: Vec<String>,
    pub metadata: HashMap<String, String>,
    pub image_type: String,
    pub labels: HashMap<String, String>,
    pub preemptible: bool,
    pub disk_type: String,
    pub shielded_instance_config: ShieldedInstanceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldedInstanceConfig {
    pub enable_integrity_monitoring: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeManagement {
    pub auto_upgrade: bool,
    pub auto_repair: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeSettings {
    pub max_surge: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAllocationPolicy {
    pub use_ip_aliases: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAutoscaling {
    pub enable_node_autoprovisioning: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxPodsConstraint {
    /// int64 fields are strings in the proto3 JSON mapping
    #[serde(serialize_with = "int64_as_string", deserialize_with = "int64_from_any")]
    pub max_pods_per_node: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateClusterConfig {
    pub enable_private_nodes: bool,
    pub master_ipv4_cidr_block: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseEncryption {
    pub state: DatabaseEncryptionState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatabaseEncryptionState {
    Unknown,
    Encrypted,
    Decrypted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseChannel {
    pub channel: Channel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Unspecified,
    Rapid,
    Regular,
    Stable,
}

fn int64_as_string<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

fn int64_from_any<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Number(i64),
        Text(String),
    }

    match Int64::deserialize(deserializer)? {
        Int64::Number(n) => Ok(n),
        Int64::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Long-running operation returned by mutating calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operation {
    pub name: String,
    pub zone: String,
    pub location: String,
    pub operation_type: String,
    pub status: OperationStatus,
    pub status_message: String,
    pub self_link: String,
    pub target_link: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub error: Option<Status>,
}

impl Operation {
    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    #[default]
    StatusUnspecified,
    Pending,
    Running,
    Done,
    Aborting,
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationStatus::StatusUnspecified => write!(f, "STATUS_UNSPECIFIED"),
            OperationStatus::Pending => write!(f, "PENDING"),
            OperationStatus::Running => write!(f, "RUNNING"),
            OperationStatus::Done => write!(f, "DONE"),
            OperationStatus::Aborting => write!(f, "ABORTING"),
        }
    }
}

/// `google.rpc.Status`, used for operation errors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub code: i32,
    pub message: String,
}

/// Error envelope returned by Google APIs
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiError,
}

/// API error details
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub status: String,
    pub details: Option<serde_json::Value>,
}
