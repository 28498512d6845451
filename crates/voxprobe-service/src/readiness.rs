use reqwest::StatusCode;
use std::time::Duration;
use voxprobe_core::config::ReadinessConfig;
use voxprobe_core::{ReadinessError, ServiceEndpoint};

/// Polls service health endpoints until each reports HTTP 200.
pub struct ReadinessGate {
    client: reqwest::Client,
    attempts: u32,
    interval: Duration,
}

impl ReadinessGate {
    pub fn new(
        attempts: u32,
        interval: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ReadinessError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ReadinessError::Client(e.to_string()))?;
        Ok(Self {
            client,
            attempts,
            interval,
        })
    }

    pub fn from_config(config: &ReadinessConfig) -> Result<Self, ReadinessError> {
        Self::new(config.attempts, config.interval(), config.request_timeout())
    }

    /// One health probe. Network errors count as "not yet healthy".
    pub async fn check_once(&self, endpoint: &ServiceEndpoint) -> bool {
        match self.client.get(&endpoint.health_check_url).send().await {
            Ok(resp) => resp.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!(service = %endpoint.name, "health request failed: {e}");
                false
            }
        }
    }

    /// Wait for a single endpoint, returning the attempt number that succeeded.
    pub async fn wait_for(&self, endpoint: &ServiceEndpoint) -> Result<u32, ReadinessError> {
        for attempt in 1..=self.attempts {
            if self.check_once(endpoint).await {
                tracing::info!(service = %endpoint.name, "healthy (attempt {attempt}/{})", self.attempts);
                return Ok(attempt);
            }
            tracing::info!(
                service = %endpoint.name,
                "waiting for service... ({attempt}/{})",
                self.attempts
            );
            if attempt < self.attempts {
                tokio::time::sleep(self.interval).await;
            }
        }
        Err(ReadinessError::Timeout {
            service: endpoint.name.clone(),
            attempts: self.attempts,
        })
    }

    /// Check endpoints in order; the first one that never becomes healthy
    /// fails the whole gate and later endpoints are not checked.
    pub async fn wait_for_all(&self, endpoints: &[ServiceEndpoint]) -> Result<(), ReadinessError> {
        for endpoint in endpoints {
            self.wait_for(endpoint).await?;
        }
        Ok(())
    }
}
