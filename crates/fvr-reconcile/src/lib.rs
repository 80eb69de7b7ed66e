//! fvr-reconcile
//!
//! Matcher: decides which historical revision of a tracked file matches the
//! snapshot currently published by the serving system.
//!
//! - revisions come from `fvr-history`, oldest first
//! - the snapshot is fetched once per file, never cached
//! - the lowest-indexed matching revision wins
//! - "no match" and "not published" are outcomes, not errors

mod engine;
mod types;

pub use engine::Matcher;
pub use types::*;
