/// Cluster specification builder
///
/// Everything not taken from the configuration or the request is fixed
/// policy: private nodes, preemptible machines, no client certificates,
/// IP aliasing, regular release channel.
use std::collections::HashMap;

use super::models::*;
use super::request::CreateClusterRequest;
use crate::config::ServiceConfig;

pub const DEFAULT_POOL_NAME: &str = "default-pool";
pub const MASTER_IPV4_CIDR_BLOCK: &str = "172.16.0.0/28";

/// OAuth scopes granted to every node
pub const NODE_OAUTH_SCOPES: [&str; 6] = [
    "https://www.googleapis.com/auth/devstorage.read_only",
    "https://www.googleapis.com/auth/logging.write",
    "https://www.googleapis.com/auth/monitoring",
    "https://www.googleapis.com/auth/servicecontrol",
    "https://www.googleapis.com/auth/service.management.readonly",
    "https://www.googleapis.com/auth/trace.append",
];

/// `projects/{project}/locations/{location}`
pub fn location_path(project_id: &str, location: &str) -> String {
    format!("projects/{}/locations/{}", project_id, location)
}

/// Default VPC network of the project
pub fn default_network(project_id: &str) -> String {
    format!("projects/{}/global/networks/default", project_id)
}

/// Default subnetwork of the region
pub fn default_subnetwork(project_id: &str, region: &str) -> String {
    format!(
        "projects/{}/regions/{}/subnetworks/default",
        project_id, region
    )
}

/// Build the body of a create-cluster call
pub fn build_create_cluster_request(
    config: &ServiceConfig,
    request: &CreateClusterRequest,
) -> CreateClusterBody {
    let cluster = Cluster {
        name: request.name.clone(),
        description: request.description.clone(),
        master_auth: MasterAuth {
            client_certificate_config: ClientCertificateConfig {
                issue_client_certificate: false,
            },
        },
        network: default_network(&config.project_id),
        addons_config: AddonsConfig {
            http_load_balancing: Disabled { disabled: false },
            horizontal_pod_autoscaling: Disabled { disabled: false },
            dns_cache_config: Enabled { enabled: true },
        },
        subnetwork: default_subnetwork(&config.project_id, &config.region),
        node_pools: vec![default_node_pool(config, request)],
        locations: vec![config.zone.clone()],
        resource_labels: request.cluster_labels.clone(),
        network_policy: Enabled { enabled: false },
        ip_allocation_policy: IpAllocationPolicy {
            use_ip_aliases: true,
        },
        master_authorized_networks_config: Enabled { enabled: false },
        autoscaling: ClusterAutoscaling {
            enable_node_autoprovisioning: false,
        },
        default_max_pods_constraint: MaxPodsConstraint {
            max_pods_per_node: config.max_pods_per_node,
        },
        authenticator_groups_config: Enabled { enabled: false },
        private_cluster_config: PrivateClusterConfig {
            enable_private_nodes: true,
            master_ipv4_cidr_block: MASTER_IPV4_CIDR_BLOCK.to_string(),
        },
        database_encryption: DatabaseEncryption {
            state: DatabaseEncryptionState::Decrypted,
        },
        shielded_nodes: Enabled { enabled: false },
        release_channel: ReleaseChannel {
            channel: Channel::Regular,
        },
        initial_cluster_version: config.kubernetes_cluster_version.clone(),
        location: config.zone.clone(),
    };

    CreateClusterBody {
        cluster,
        parent: location_path(&config.project_id, &config.zone),
    }
}

fn default_node_pool(config: &ServiceConfig, request: &CreateClusterRequest) -> NodePool {
    let metadata: HashMap<String, String> =
        [("disable-legacy-endpoints".to_string(), "true".to_string())]
            .into_iter()
            .collect();

    NodePool {
        name: DEFAULT_POOL_NAME.to_string(),
        config: NodeConfig {
            machine_type: config.machine_type.clone(),
            disk_size_gb: config.disk_size_gb,
            oauth_scopes: NODE_OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
            metadata,
            image_type: config.image_type.clone(),
            labels: request.node_labels.clone(),
            preemptible: true,
            disk_type: config.disk_type.clone(),
            shielded_instance_config: ShieldedInstanceConfig {
                enable_integrity_monitoring: false,
            },
        },
        initial_node_count: config.node_count,
        autoscaling: Enabled { enabled: false },
        management: NodeManagement {
            auto_upgrade: true,
            auto_repair: true,
        },
        upgrade_settings: UpgradeSettings { max_surge: 1 },
    }
}
