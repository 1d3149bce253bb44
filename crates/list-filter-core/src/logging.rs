//! Logging and performance tracing facilities.
//!
//! Every crate in the workspace logs through the `tracing` crate with the
//! targets listed in [`targets`]. Nothing is printed unless the application
//! installs a subscriber:
//!
//! ```ignore
//! use tracing_subscriber::EnvFilter;
//!
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter(EnvFilter::new("list_filter=debug,list_filter_core=info"))
//!         .init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! [`PerfSpan`] measures one operation, such as a single recomputation:
//!
//! ```
//! use list_filter_core::PerfSpan;
//!
//! let _span = PerfSpan::new("recompute");
//! // ... work ...
//! ```

use std::time::Instant;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Event loop target.
    pub const EVENT_LOOP: &str = "list_filter_core::event_loop";
    /// Timer system target.
    pub const TIMER: &str = "list_filter_core::timer";
    /// Signal system target.
    pub const SIGNAL: &str = "list_filter_core::signal";
    /// Worker thread target.
    pub const WORKER: &str = "list_filter_core::worker";
    /// Filter pipeline target.
    pub const PIPELINE: &str = "list_filter::pipeline";
    /// Item store target.
    pub const STORE: &str = "list_filter::store";
    /// Item provider target.
    pub const PROVIDER: &str = "list_filter::provider";
    /// Locale collation target.
    pub const COLLATION: &str = "list_filter::collation";
    /// Performance spans target.
    pub const PERF: &str = "list_filter::perf";
}

/// A guard that keeps a tracing span entered and logs its duration on drop.
#[derive(Debug)]
pub struct PerfSpan {
    operation: &'static str,
    started: Instant,
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation);
        Self {
            operation,
            started: Instant::now(),
            span: span.entered(),
        }
    }

    /// The operation this span measures.
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Drop for PerfSpan {
    fn drop(&mut self) {
        tracing::trace!(
            target: targets::PERF,
            operation = self.operation,
            elapsed_us = self.started.elapsed().as_micros() as u64,
            "operation finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span_without_subscriber() {
        let span = PerfSpan::new("test-operation");
        assert_eq!(span.operation(), "test-operation");
        drop(span);
    }

    #[test]
    fn test_targets_follow_crate_names() {
        for target in [targets::EVENT_LOOP, targets::TIMER, targets::SIGNAL, targets::WORKER] {
            assert!(target.starts_with("list_filter_core::"));
        }
        for target in [
            targets::PIPELINE,
            targets::STORE,
            targets::PROVIDER,
            targets::COLLATION,
            targets::PERF,
        ] {
            assert!(target.starts_with("list_filter::"));
        }
    }
}
