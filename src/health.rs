//! HTTP liveness probe against the managed app.
//!
//! One probe is one GET with a fixed timeout. Retry policy lives in the
//! supervisor's failure counter, never here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Upper bound for a single probe, connect and response included.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthCheckOutcome {
    /// The endpoint answered with a 2xx status.
    Success,
    /// No response: connection refused, DNS failure, timeout.
    TransportFailure(String),
    /// The endpoint answered with a non-2xx status.
    BadStatus(u16),
}

impl HealthCheckOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, HealthCheckOutcome::Success)
    }
}

/// Probe seam, so the restart policy can be driven without a network.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    async fn probe(&self, url: &str) -> HealthCheckOutcome;
}

pub struct HealthChecker {
    client: Client,
}

impl HealthChecker {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .user_agent(concat!("monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Probe for HealthChecker {
    async fn probe(&self, url: &str) -> HealthCheckOutcome {
        // The response is dropped at the end of this scope on every
        // path, which hands the connection back to the pool.
        match self.client.get(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    HealthCheckOutcome::Success
                } else {
                    debug!(%status, url, "health probe non-2xx");
                    HealthCheckOutcome::BadStatus(status.as_u16())
                }
            }
            Err(e) => {
                debug!(error = %e, url, "health probe request failed");
                HealthCheckOutcome::TransportFailure(e.to_string())
            }
        }
    }
}
