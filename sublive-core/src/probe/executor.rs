use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use super::transport::Transport;
use super::types::{AttemptError, AttemptEvent, AttemptResult, ProbeOutcome};
use crate::config::{ScanConfig, StatusCodeSet};
use crate::progress::ProgressSink;
use crate::retry::RetryExecutor;

/// Probes single hostnames through a shared transport.
///
/// Every attempt holds one permit from `slots` while its request is in flight,
/// so all executors sharing the semaphore never exceed its size in open
/// connections. Permits are released between retries.
#[derive(Clone)]
pub struct ProbeExecutor {
    transport: Arc<dyn Transport>,
    slots: Arc<Semaphore>,
    retry: RetryExecutor,
    alive_codes: StatusCodeSet,
    timeout: Duration,
}

impl ProbeExecutor {
    pub fn new(transport: Arc<dyn Transport>, slots: Arc<Semaphore>, config: &ScanConfig) -> Self {
        Self {
            transport,
            slots,
            retry: RetryExecutor::new(config.retry.clone()),
            alive_codes: config.alive_codes.clone(),
            timeout: config.timeout,
        }
    }

    /// Runs the full attempt sequence for one hostname. Never fails: every
    /// error ends up in the returned outcome.
    #[instrument(skip(self, progress, hostname), fields(hostname = %hostname))]
    pub async fn probe(
        &self,
        index: usize,
        hostname: String,
        progress: &dyn ProgressSink,
    ) -> ProbeOutcome {
        let url = format!("http://{}", hostname);
        let max_attempts = self.retry.policy().max_attempts;
        let start = Instant::now();

        let retried = self
            .retry
            .execute(|attempt| {
                let url = url.as_str();
                let hostname = hostname.as_str();
                async move {
                    let result = self.attempt(url).await;
                    let alive = matches!(result, Ok(status) if self.alive_codes.contains(status));

                    progress.on_attempt(&AttemptEvent {
                        hostname,
                        attempt,
                        max_attempts,
                        result: &result,
                        alive,
                    });

                    result
                }
            })
            .await;

        let (status, error) = match retried.result {
            Ok(status) => (Some(status), None),
            Err(e) => (None, Some(e)),
        };
        let alive = status.is_some_and(|s| self.alive_codes.contains(s));

        match &error {
            Some(e @ AttemptError::Unexpected(_)) => {
                warn!(attempts = retried.attempts, error = %e, "Probe abandoned after unexpected error");
            }
            Some(e) => {
                debug!(attempts = retried.attempts, error = %e, "Probe dead after retries");
            }
            None => {
                debug!(attempts = retried.attempts, status, alive, "Probe answered");
            }
        }

        ProbeOutcome {
            index,
            hostname,
            alive,
            status,
            attempts: retried.attempts,
            error,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn attempt(&self, url: &str) -> AttemptResult {
        let _permit = match self.slots.acquire().await {
            Ok(permit) => permit,
            Err(_) => return Err(AttemptError::Unexpected("connection gate closed".to_string())),
        };

        match tokio::time::timeout(self.timeout, self.transport.get(url)).await {
            Ok(result) => result,
            Err(_) => Err(AttemptError::Timeout),
        }
    }
}
