//! fvr-cli
//!
//! Library half of the `fvr` binary: file discovery, the bounded-concurrency
//! run loop, and CSV report writing.

pub mod driver;
pub mod report;

pub use driver::{discover, run, RunSummary};
