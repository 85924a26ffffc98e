//! Background scheduling: retry policy, worker supervision, and the
//! simulator/forecaster runner.
//!
//! Failures are isolated: a failed tick or retrain is logged and skipped, a
//! crashed worker is replaced, and nothing here ever blocks readers of the
//! alert store.

pub mod retry;
pub mod runner;
pub mod supervisor;

pub use retry::{BackoffStrategy, POLL_SLICE, RetryPolicy, sleep_unless};
pub use runner::{PipelineHandle, PipelineRunner, PipelineStats};
pub use supervisor::{SupervisorExit, supervise};
