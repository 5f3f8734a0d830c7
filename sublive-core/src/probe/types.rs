use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single attempt failed to produce an HTTP status.
///
/// This is a closed set: the retry decision matches on it exhaustively.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AttemptError {
    #[error("timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("TLS failure: {0}")]
    Tls(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AttemptError {
    /// Short label used in logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Timeout => "timeout",
            AttemptError::Connect(_) => "connect",
            AttemptError::Tls(_) => "tls",
            AttemptError::Unexpected(_) => "unexpected",
        }
    }
}

/// Outcome of one attempt: the status code received, or why none was.
pub type AttemptResult = Result<u16, AttemptError>;

/// Terminal result of probing one hostname.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Position of the hostname in the input list.
    pub index: usize,
    pub hostname: String,
    pub alive: bool,
    /// Status of the last response, if any attempt got one.
    pub status: Option<u16>,
    pub attempts: usize,
    /// Error of the last attempt when no response was received.
    pub error: Option<AttemptError>,
    pub duration_ms: u64,
}

impl ProbeOutcome {
    pub fn ended_unexpectedly(&self) -> bool {
        matches!(self.error, Some(AttemptError::Unexpected(_)))
    }
}

/// Progress notification emitted after every attempt.
#[derive(Debug, Clone, Copy)]
pub struct AttemptEvent<'a> {
    pub hostname: &'a str,
    /// 1-based attempt number.
    pub attempt: usize,
    pub max_attempts: usize,
    pub result: &'a AttemptResult,
    pub alive: bool,
}
