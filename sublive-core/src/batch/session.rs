use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::config::SurvivorOrder;
use crate::probe::ProbeOutcome;

/// Counts and timing for a finished scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total: usize,
    pub alive: usize,
    pub dead: usize,
    /// Probes abandoned on an error outside the retryable set.
    pub unexpected_errors: usize,
    pub concurrency: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed_ms: u64,
}

impl ScanSummary {
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

/// Everything the output sinks need once a scan is over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub summary: ScanSummary,
    pub survivors: Vec<String>,
    /// One entry per input hostname, in completion order.
    #[serde(skip)]
    pub outcomes: Vec<ProbeOutcome>,
}

/// Mutable state of one run, owned by the coordinator's drain loop.
#[derive(Debug)]
pub struct ScanSession {
    hostnames: Vec<String>,
    concurrency: usize,
    started_at: DateTime<Local>,
    start: Instant,
    outcomes: Vec<ProbeOutcome>,
}

impl ScanSession {
    pub fn new(hostnames: Vec<String>, concurrency: usize) -> Self {
        let outcomes = Vec::with_capacity(hostnames.len());
        Self {
            hostnames,
            concurrency,
            started_at: Local::now(),
            start: Instant::now(),
            outcomes,
        }
    }

    pub fn hostnames(&self) -> &[String] {
        &self.hostnames
    }

    pub fn total(&self) -> usize {
        self.hostnames.len()
    }

    pub fn completed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn record(&mut self, outcome: ProbeOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.len() == self.hostnames.len()
    }

    /// Closes the session and builds the report.
    pub fn finish(self, order: SurvivorOrder) -> ScanReport {
        let elapsed = self.start.elapsed();

        let mut alive: Vec<&ProbeOutcome> = self.outcomes.iter().filter(|o| o.alive).collect();
        if order == SurvivorOrder::Input {
            alive.sort_by_key(|o| o.index);
        }
        let survivors: Vec<String> = alive.into_iter().map(|o| o.hostname.clone()).collect();

        let summary = ScanSummary {
            total: self.hostnames.len(),
            alive: survivors.len(),
            dead: self.outcomes.len() - survivors.len(),
            unexpected_errors: self
                .outcomes
                .iter()
                .filter(|o| o.ended_unexpectedly())
                .count(),
            concurrency: self.concurrency,
            started_at: self.started_at,
            finished_at: Local::now(),
            elapsed_ms: elapsed.as_millis() as u64,
        };

        ScanReport {
            summary,
            survivors,
            outcomes: self.outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, hostname: &str, alive: bool) -> ProbeOutcome {
        ProbeOutcome {
            index,
            hostname: hostname.to_string(),
            alive,
            status: alive.then_some(200),
            attempts: 1,
            error: None,
            duration_ms: 0,
        }
    }

    fn session_with_outcomes() -> ScanSession {
        let hostnames = vec!["a.example".into(), "b.example".into(), "c.example".into()];
        let mut session = ScanSession::new(hostnames, 10);
        // completion order differs from input order
        session.record(outcome(2, "c.example", true));
        session.record(outcome(1, "b.example", false));
        session.record(outcome(0, "a.example", true));
        session
    }

    #[test]
    fn test_completion_order_survivors() {
        let report = session_with_outcomes().finish(SurvivorOrder::Completion);
        assert_eq!(report.survivors, vec!["c.example", "a.example"]);
        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.alive, 2);
        assert_eq!(report.summary.dead, 1);
    }

    #[test]
    fn test_input_order_survivors() {
        let report = session_with_outcomes().finish(SurvivorOrder::Input);
        assert_eq!(report.survivors, vec!["a.example", "c.example"]);
    }

    #[test]
    fn test_completion_tracking() {
        let mut session = ScanSession::new(vec!["x.example".into()], 1);
        assert!(!session.is_complete());
        session.record(outcome(0, "x.example", false));
        assert!(session.is_complete());
        assert_eq!(session.completed(), session.total());
    }

    #[test]
    fn test_report_json_omits_outcomes() {
        let report = session_with_outcomes().finish(SurvivorOrder::Input);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("outcomes").is_none());
        assert_eq!(json["summary"]["alive"], 2);
        assert_eq!(json["survivors"][0], "a.example");
    }
}
