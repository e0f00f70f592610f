/// Waiting on long-running Kubernetes Engine operations
use anyhow::{Context, Result};
use std::time::Duration;

use super::client::GkeClient;
use super::models::Operation;
use crate::utils::polling::{Poll, PollingConfig};

/// Decide whether a fetched operation is finished
pub fn check_operation(operation: Operation) -> Result<Poll<Operation>> {
    if !operation.is_done() {
        return Ok(Poll::Pending(format!(
            "operation {} is {}",
            operation.name, operation.status
        )));
    }

    if let Some(error) = operation.error.as_ref().filter(|e| e.code != 0) {
        anyhow::bail!(
            "Operation {} failed: {} (code {})",
            operation.name,
            error.message,
            error.code
        );
    }

    Ok(Poll::Ready(operation))
}

/// Poll an operation until it is DONE
pub async fn wait_for_operation(
    client: &GkeClient,
    project_id: &str,
    location: &str,
    operation: &str,
    timeout: Duration,
) -> Result<Operation> {
    let polling = PollingConfig::new(
        timeout,
        Duration::from_secs(10),
        format!("Waiting for operation {}", operation),
    );

    polling
        .poll(|| async {
            let current = client
                .get_operation(project_id, location, operation)
                .await
                .context("Failed to get operation status")?;
            check_operation(current)
        })
        .await
}
