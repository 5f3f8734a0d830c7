use std::error::Error as StdError;
use std::io;

use async_trait::async_trait;
use tracing::debug;

use super::types::{AttemptError, AttemptResult};
use crate::config::{ScanConfig, TlsMode};
use crate::error::Result;

/// A shared, connection-pooling HTTP client.
///
/// Implementations return the status code of the response to a GET, or the
/// classified reason none was received. They must be safe to call from many
/// probes at once.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> AttemptResult;
}

/// [`Transport`] backed by a single pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let accept_invalid = config.tls == TlsMode::AcceptInvalid;

        // Certificate and hostname checks are skipped unless asked for: a host
        // with a broken certificate still answers HTTP.
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .pool_max_idle_per_host(config.concurrency)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(accept_invalid)
            .danger_accept_invalid_hostnames(accept_invalid)
            .user_agent(config.user_agent.as_str())
            .no_proxy()
            .build()?;

        debug!(
            pool_per_host = config.concurrency,
            accept_invalid_certs = accept_invalid,
            "Built HTTP transport"
        );

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> AttemptResult {
        match self.client.get(url).send().await {
            // The body is never read; receiving the status line is enough.
            Ok(response) => Ok(response.status().as_u16()),
            Err(e) => Err(classify_reqwest_error(&e)),
        }
    }
}

/// Maps a reqwest failure onto the closed [`AttemptError`] set.
pub fn classify_reqwest_error(error: &reqwest::Error) -> AttemptError {
    let detail = root_cause(error);

    if error.is_timeout() {
        return AttemptError::Timeout;
    }

    // Skip the top-level error: its message embeds the URL, and hostnames
    // like "ssl.example.com" would otherwise look like TLS failures.
    if sources(error).any(is_tls_failure) {
        return AttemptError::Tls(detail);
    }

    if let Some(kind) = sources(error).find_map(io_error_kind) {
        match kind {
            io::ErrorKind::TimedOut => return AttemptError::Timeout,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::AddrNotAvailable => return AttemptError::Connect(detail),
            _ => {}
        }
    }

    if error.is_connect() || error.is_request() {
        return AttemptError::Connect(detail);
    }

    // Builder, redirect, body and decode errors are not network flakiness.
    AttemptError::Unexpected(detail)
}

fn sources<'a>(error: &'a reqwest::Error) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(error.source(), |e: &&'a (dyn StdError + 'static)| (*e).source())
}

fn is_tls_failure(error: &(dyn StdError + 'static)) -> bool {
    if error.downcast_ref::<native_tls::Error>().is_some() {
        return true;
    }

    // Errors that lost their type on the way up only keep the message.
    let message = error.to_string().to_lowercase();
    ["certificate", "tls", "ssl", "handshake"]
        .iter()
        .any(|needle| message.contains(needle))
}

fn io_error_kind(error: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    error.downcast_ref::<io::Error>().map(io::Error::kind)
}

fn root_cause(error: &reqwest::Error) -> String {
    sources(error)
        .last()
        .map(|e| e.to_string())
        .unwrap_or_else(|| error.to_string())
}
