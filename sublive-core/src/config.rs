//! Scan configuration.
//!
//! Everything the coordinator needs for one run lives in [`ScanConfig`], which is
//! built once (usually from CLI flags) and passed in at construction.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubliveError};
use crate::retry::RetryPolicy;

pub const DEFAULT_CONCURRENCY: usize = 250;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_REDIRECTS: usize = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("sublive/", env!("CARGO_PKG_VERSION"));

/// Whether the transport validates TLS certificates.
///
/// With `AcceptInvalid`, a host with a self-signed or mismatched certificate
/// still counts as alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    #[default]
    AcceptInvalid,
    Verify,
}

/// Order of the survivor list handed to the output sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurvivorOrder {
    /// Order in which probes finished.
    #[default]
    Completion,
    /// Order of the input list.
    Input,
}

impl FromStr for SurvivorOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completion" | "completed" => Ok(SurvivorOrder::Completion),
            "input" => Ok(SurvivorOrder::Input),
            _ => Err(format!("Unknown survivor order: {}", s)),
        }
    }
}

/// Set of HTTP status codes whose receipt proves a host is serving HTTP.
///
/// Parsed from a comma-separated list where each item is a code (`404`) or an
/// inclusive range (`200-299`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCodeSet(BTreeSet<u16>);

impl StatusCodeSet {
    pub fn contains(&self, status: u16) -> bool {
        self.0.contains(&status)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }
}

/// Any structured response from 2xx through 5xx.
impl Default for StatusCodeSet {
    fn default() -> Self {
        Self((200..=599).collect())
    }
}

fn check_code(code: u16) -> Result<()> {
    if (100..=999).contains(&code) {
        Ok(())
    } else {
        Err(SubliveError::InvalidStatusCode(code.to_string()))
    }
}

fn parse_code(s: &str) -> Result<u16> {
    let code: u16 = s
        .trim()
        .parse()
        .map_err(|_| SubliveError::InvalidStatusCode(s.trim().to_string()))?;
    check_code(code)?;
    Ok(code)
}

impl FromStr for StatusCodeSet {
    type Err = SubliveError;

    fn from_str(s: &str) -> Result<Self> {
        let mut set = BTreeSet::new();

        for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            match item.split_once('-') {
                Some((lo, hi)) => {
                    let lo = parse_code(lo)?;
                    let hi = parse_code(hi)?;
                    if lo > hi {
                        return Err(SubliveError::InvalidStatusCode(item.to_string()));
                    }
                    set.extend(lo..=hi);
                }
                None => {
                    set.insert(parse_code(item)?);
                }
            }
        }

        if set.is_empty() {
            return Err(SubliveError::InvalidConfig(
                "alive status-code set is empty".to_string(),
            ));
        }

        Ok(Self(set))
    }
}

/// Renders the set back in the list syntax, collapsing consecutive runs.
impl fmt::Display for StatusCodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        let mut codes = self.0.iter().copied().peekable();

        while let Some(start) = codes.next() {
            let mut end = start;
            while codes.peek() == Some(&(end + 1)) {
                end += 1;
                codes.next();
            }
            if start == end {
                parts.push(start.to_string());
            } else {
                parts.push(format!("{}-{}", start, end));
            }
        }

        write!(f, "{}", parts.join(","))
    }
}

/// Configuration for one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum number of simultaneously open outbound connections.
    pub concurrency: usize,
    /// Wall-clock budget for a single attempt.
    pub timeout: Duration,
    pub alive_codes: StatusCodeSet,
    pub retry: RetryPolicy,
    pub tls: TlsMode,
    pub order: SurvivorOrder,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            alive_codes: StatusCodeSet::default(),
            retry: RetryPolicy::default(),
            tls: TlsMode::default(),
            order: SurvivorOrder::default(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScanConfig {
    /// Creates a configuration with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connection cap.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the status codes that count as alive.
    pub fn with_alive_codes(mut self, codes: StatusCodeSet) -> Self {
        self.alive_codes = codes;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the TLS verification mode.
    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    /// Sets the survivor order.
    pub fn with_order(mut self, order: SurvivorOrder) -> Self {
        self.order = order;
        self
    }

    /// Sets how many redirects a probe follows.
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Sets the User-Agent header sent with every request.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Rejects settings that would make the scan meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 || self.concurrency > tokio::sync::Semaphore::MAX_PERMITS {
            return Err(SubliveError::InvalidConfig(format!(
                "concurrency must be between 1 and {}",
                tokio::sync::Semaphore::MAX_PERMITS
            )));
        }
        if self.timeout.is_zero() {
            return Err(SubliveError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.alive_codes.is_empty() {
            return Err(SubliveError::InvalidConfig(
                "alive status-code set is empty".to_string(),
            ));
        }
        Ok(())
    }
}
