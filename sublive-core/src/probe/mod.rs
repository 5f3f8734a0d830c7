//! Probe executor: one hostname, one attempt sequence, one outcome.

mod executor;
#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
pub(crate) mod mock;
mod transport;
mod types;

pub use executor::ProbeExecutor;
pub use transport::{classify_reqwest_error, HttpTransport, Transport};
pub use types::{AttemptError, AttemptEvent, AttemptResult, ProbeOutcome};
