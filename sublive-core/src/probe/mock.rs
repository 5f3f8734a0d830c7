//! Scripted [`Transport`] double shared by the probe and batch tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::transport::Transport;
use super::types::{AttemptError, AttemptResult};

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    Refused,
    /// Never answers within any sane timeout.
    Hang,
    Unexpected,
    /// Answers with the status after the delay.
    Slow(Duration, u16),
}

/// Replies are scripted per URL; the last reply repeats once the script runs
/// out. Unknown URLs are refused.
#[derive(Default)]
pub struct MockTransport {
    scripts: HashMap<String, Vec<Reply>>,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, hostname: &str, replies: Vec<Reply>) -> Self {
        self.scripts.insert(format!("http://{}", hostname), replies);
        self
    }

    pub fn always(self, hostname: &str, reply: Reply) -> Self {
        self.script(hostname, vec![reply])
    }

    pub fn calls(&self, hostname: &str) -> usize {
        let calls = self.calls.lock().unwrap();
        calls
            .get(&format!("http://{}", hostname))
            .copied()
            .unwrap_or(0)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, url: &str) -> Reply {
        let mut calls = self.calls.lock().unwrap();
        let count = calls.entry(url.to_string()).or_insert(0);
        let reply = match self.scripts.get(url) {
            Some(script) if !script.is_empty() => {
                script[(*count).min(script.len() - 1)].clone()
            }
            _ => Reply::Refused,
        };
        *count += 1;
        reply
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> AttemptResult {
        let reply = self.next_reply(url);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        // Timed-out attempts are dropped mid-await, so release on drop.
        let _guard = InFlight(&self.in_flight);

        match reply {
            Reply::Status(status) => {
                tokio::task::yield_now().await;
                Ok(status)
            }
            Reply::Refused => Err(AttemptError::Connect("connection refused".to_string())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(AttemptError::Unexpected("hang finished".to_string()))
            }
            Reply::Unexpected => Err(AttemptError::Unexpected("mock failure".to_string())),
            Reply::Slow(delay, status) => {
                tokio::time::sleep(delay).await;
                Ok(status)
            }
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
