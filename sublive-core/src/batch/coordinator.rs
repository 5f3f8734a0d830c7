use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::session::{ScanReport, ScanSession};
use crate::config::ScanConfig;
use crate::error::Result;
use crate::probe::{HttpTransport, ProbeExecutor, Transport};
use crate::progress::ProgressSink;

/// Fans probes out over a hostname list and aggregates their outcomes.
#[derive(Clone)]
pub struct BatchCoordinator {
    config: ScanConfig,
    transport: Arc<dyn Transport>,
}

impl BatchCoordinator {
    /// Builds a coordinator with a pooled HTTP transport sized to the
    /// configured concurrency.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            config,
            transport: Arc::new(transport),
        })
    }

    pub fn with_transport(config: ScanConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, transport })
    }

    /// Opens a session for `hostnames`. Its start time names the default
    /// output file, so the session is created before the file is.
    pub fn start(&self, hostnames: Vec<String>) -> ScanSession {
        ScanSession::new(hostnames, self.config.concurrency)
    }

    /// Probes every hostname of the session and returns once all of them have
    /// an outcome.
    ///
    /// One probe future is created per hostname up front; the connection-slot
    /// semaphore queues them so at most `concurrency` requests are open at a
    /// time. Outcomes are drained as they complete, not in input order.
    pub async fn run(&self, mut session: ScanSession, progress: &dyn ProgressSink) -> ScanReport {
        let total = session.total();

        let slots = Arc::new(Semaphore::new(self.config.concurrency));
        let executor = ProbeExecutor::new(self.transport.clone(), slots, &self.config);

        info!(
            total,
            concurrency = self.config.concurrency,
            timeout_secs = self.config.timeout.as_secs_f64(),
            max_attempts = self.config.retry.max_attempts,
            "Starting scan"
        );
        progress.on_start(total);

        let mut pending: FuturesUnordered<_> = session
            .hostnames()
            .iter()
            .enumerate()
            .map(|(index, hostname)| executor.probe(index, hostname.clone(), progress))
            .collect();

        while let Some(outcome) = pending.next().await {
            progress.on_probe_complete(session.completed() + 1, total, &outcome);
            session.record(outcome);
        }

        debug_assert!(session.is_complete());
        debug!(completed = session.completed(), "All probes finished");

        let report = session.finish(self.config.order);
        info!(
            total = report.summary.total,
            alive = report.summary.alive,
            elapsed_ms = report.summary.elapsed_ms,
            "Scan finished"
        );
        progress.on_finish(&report.summary);

        report
    }
}
