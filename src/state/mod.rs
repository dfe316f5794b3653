//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `BatchStatus`: lifecycle of a link batch (pending, in progress, completed, failed)
//! - `FailureKind`, `FailedUrl`, `SoftReject`: terminal outcomes recorded in checkpoints
//! - `RunStatistics`: counters for one pipeline invocation

mod batch_status;
mod failure;
mod statistics;

// Re-export main types
pub use batch_status::BatchStatus;
pub use failure::{FailedUrl, FailureKind, SoftReject};
pub use statistics::RunStatistics;
