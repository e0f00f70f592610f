/// Polling utilities for waiting on conditions with timeout
use anyhow::Result;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of a single poll attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Poll<T> {
    /// Condition met
    Ready(T),
    /// Not yet, with a short progress note for logs
    Pending(String),
}

/// Configuration for polling operations
pub struct PollingConfig {
    pub timeout: Duration,
    pub interval: Duration,
    pub description: String,
}

impl PollingConfig {
    pub fn new(timeout: Duration, interval: Duration, description: impl Into<String>) -> Self {
        Self {
            timeout,
            interval,
            description: description.into(),
        }
    }

    /// Poll until the condition is ready, fails, or the timeout elapses
    pub async fn poll<F, Fut, T>(&self, mut condition: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Poll<T>>>,
    {
        info!("{}...", self.description);

        let start = Instant::now();

        loop {
            match condition().await? {
                Poll::Ready(value) => {
                    info!("✓ {}", self.description);
                    return Ok(value);
                }
                Poll::Pending(progress) => {
                    debug!("{}: {}", self.description, progress);
                }
            }

            if start.elapsed() > self.timeout {
                anyhow::bail!(
                    "Timeout after {} seconds: {}",
                    self.timeout.as_secs(),
                    self.description
                );
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn config(timeout_ms: u64) -> PollingConfig {
        PollingConfig::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(10),
            "test polling",
        )
    }

    #[tokio::test]
    async fn test_polling_success() {
        let counter = Arc::new(AtomicU32::new(0));

        let result = config(5_000)
            .poll(|| {
                let c = counter.clone();
                async move {
                    let val = c.fetch_add(1, Ordering::SeqCst);
                    if val >= 2 {
                        Ok(Poll::Ready(val))
                    } else {
                        Ok(Poll::Pending(format!("attempt {}", val)))
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_polling_timeout() {
        let result = config(50)
            .poll(|| async { Ok::<Poll<()>, anyhow::Error>(Poll::Pending("waiting".into())) })
            .await;

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Timeout"));
        assert!(err_msg.contains("test polling"));
    }

    #[tokio::test]
    async fn test_polling_error_stops() {
        let counter = Arc::new(AtomicU32::new(0));

        let result: Result<()> = config(5_000)
            .poll(|| {
                let c = counter.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<Poll<()>, _>(anyhow::anyhow!("boom"))
                }
            })
            .await;

        assert_eq!(result.unwrap_err().to_string(), "boom");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
