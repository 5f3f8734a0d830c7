//! Hostname list loading.

use std::path::Path;

use tracing::debug;

use crate::error::{Result, SubliveError};

/// Parses a line-delimited hostname list.
///
/// Lines are trimmed; blank lines and `#` comments are skipped. Nothing else is
/// validated and duplicates are kept, in input order.
pub fn parse_hostnames(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reads and parses a hostname file. An unreadable file is fatal.
pub fn load_hostnames(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| SubliveError::io(path, e))?;
    let hostnames = parse_hostnames(&content);
    debug!(path = %path.display(), count = hostnames.len(), "Loaded hostnames");
    Ok(hostnames)
}
