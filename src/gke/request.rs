/// Request and response messages for creating a cluster
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Request to create a GKE cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterRequest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Labels applied to the cluster resource
    #[serde(default, deserialize_with = "labels_or_null")]
    pub cluster_labels: HashMap<String, String>,

    /// Labels applied to every node in the default pool
    #[serde(default, deserialize_with = "labels_or_null")]
    pub node_labels: HashMap<String, String>,
}

/// Result of dispatching a create call. Carries nothing back to HTTP callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateClusterResponse {
    pub(crate) operation: Option<String>,
}

impl CreateClusterResponse {
    /// Name of the long-running operation, when the API returned one
    pub fn operation_name(&self) -> Option<&str> {
        self.operation.as_deref()
    }
}

/// Required fields missing from a request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", describe(.missing))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

fn describe(missing: &[&'static str]) -> String {
    missing
        .iter()
        .map(|field| format!("{}: cannot be blank", field))
        .collect::<Vec<_>>()
        .join("; ")
}

fn labels_or_null<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CreateClusterRequest {
    /// Load a request from a JSON or YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file {}", path.display()))?;
        // YAML is a superset of JSON
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse request file {}", path.display()))
    }

    /// Check that name and description are present
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { missing })
        }
    }
}
