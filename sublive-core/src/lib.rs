//! Bounded-concurrency HTTP liveness probing.
//!
//! A [`BatchCoordinator`] takes a list of hostnames, probes each one over
//! `http://` through a shared [`Transport`], and reports which of them answered
//! with a status in the configured alive set.

pub mod batch;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod probe;
pub mod progress;
pub mod retry;

pub use error::{Result, SubliveError};

pub use batch::{BatchCoordinator, ScanReport, ScanSession, ScanSummary};
pub use config::{ScanConfig, StatusCodeSet, SurvivorOrder, TlsMode};
pub use input::{load_hostnames, parse_hostnames};
pub use output::{OutputFormat, ReportFormatter, SurvivorWriter};
pub use probe::{
    AttemptError, AttemptEvent, AttemptResult, HttpTransport, ProbeExecutor, ProbeOutcome,
    Transport,
};
pub use progress::{CallbackProgress, NoopProgress, ProgressCallback, ProgressSink};
pub use retry::{NetworkRetryClassifier, RetryExecutor, RetryPolicy};
