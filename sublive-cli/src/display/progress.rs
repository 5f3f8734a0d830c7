//! Scan progress bar, plus tracing integration so log lines print above the bar
//! instead of tearing through it.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use sublive_core::{AttemptEvent, ProbeOutcome, ProgressSink};

/// Bar that tracing output is currently routed through, if any.
static ACTIVE_BAR: Mutex<Option<ProgressBar>> = Mutex::new(None);

pub fn set_active_bar(bar: ProgressBar) {
    *ACTIVE_BAR.lock().unwrap_or_else(PoisonError::into_inner) = Some(bar);
}

pub fn clear_active_bar() {
    *ACTIVE_BAR.lock().unwrap_or_else(PoisonError::into_inner) = None;
}

fn active_bar() -> Option<ProgressBar> {
    ACTIVE_BAR
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// [`ProgressSink`] rendering `Scanned X out of N subdomains` on an indicatif bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(total: usize, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(Some(total as u64), target);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {msg}")
                .expect("Progress bar template is hardcoded and should be valid")
                .progress_chars("█▓░"),
        );
        Self { bar }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    /// Leaves the last progress line on screen.
    pub fn finish(&self) {
        self.bar.finish();
    }

    fn show(&self, completed: u64, hostname: &str, failed: bool) {
        let total = self.bar.length().unwrap_or(0);
        self.bar.set_message(format!(
            "Scanned {} out of {} subdomains - last subdomain checked: {}{}",
            completed,
            total,
            hostname,
            if failed { " (error)" } else { "" }
        ));
    }
}

impl ProgressSink for BarProgress {
    fn on_attempt(&self, event: &AttemptEvent<'_>) {
        self.show(self.bar.position(), event.hostname, event.result.is_err());
    }

    fn on_probe_complete(&self, completed: usize, _total: usize, outcome: &ProbeOutcome) {
        self.bar.set_position(completed as u64);
        self.show(completed as u64, &outcome.hostname, outcome.error.is_some());
    }
}

/// Line-buffered writer that prints through the active bar when there is one
/// and to stderr otherwise.
#[derive(Default)]
pub struct ProgressWriter {
    buffer: Vec<u8>,
}

impl ProgressWriter {
    fn emit(line: &str) -> io::Result<()> {
        match active_bar() {
            Some(bar) => {
                bar.println(line);
                Ok(())
            }
            None => writeln!(io::stderr(), "{}", line),
        }
    }
}

impl Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            Self::emit(String::from_utf8_lossy(&line).trim_end_matches('\n'))?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let rest = String::from_utf8_lossy(&self.buffer).trim_end().to_string();
        self.buffer.clear();
        if rest.is_empty() {
            Ok(())
        } else {
            Self::emit(&rest)
        }
    }
}

impl Drop for ProgressWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// `MakeWriter` for tracing-subscriber.
#[derive(Default)]
pub struct ProgressWriterFactory;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for ProgressWriterFactory {
    type Writer = ProgressWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ProgressWriter::default()
    }
}
