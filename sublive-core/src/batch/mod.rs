//! Batch coordinator: fan-out, throttling and aggregation over a hostname list.

mod coordinator;
mod session;

pub use coordinator::BatchCoordinator;
pub use session::{ScanReport, ScanSession, ScanSummary};
