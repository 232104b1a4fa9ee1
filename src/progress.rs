//! Progress-callback trait for per-run conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to hear about
//! each engine pass as it happens. A LaTeX document with a table of contents
//! typically needs two or three passes, each taking seconds, so a caller
//! driving a terminal or a job queue wants to show something in between.
//!
//! # Example
//!
//! ```rust
//! use tex2doc::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct CountingCallback {
//!     runs: AtomicU32,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_run_complete(&self, run: u32, max_runs: u32, stable: bool) {
//!         self.runs.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("run {}/{} done (stable: {})", run, max_runs, stable);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { runs: AtomicU32::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it drives the engine.
///
/// Runs are strictly sequential, so methods are never called concurrently
/// for one conversion. The trait is still `Send + Sync` because the config
/// holding it may be shared between conversions on different threads. All
/// methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after validation, before the workspace is created.
    fn on_conversion_start(&self, engine: &str, max_runs: u32) {
        let _ = (engine, max_runs);
    }

    /// Called just before the engine is launched. `run` is 1-indexed.
    fn on_run_start(&self, run: u32, max_runs: u32) {
        let _ = (run, max_runs);
    }

    /// Called after a clean engine exit.
    ///
    /// `stable` is true when the auxiliary file matched the previous run,
    /// i.e. this is the last run.
    fn on_run_complete(&self, run: u32, max_runs: u32, stable: bool) {
        let _ = (run, max_runs, stable);
    }

    /// Called once after the workspace has been torn down.
    ///
    /// Not called when validation rejected the request.
    fn on_conversion_complete(&self, success: bool, runs: u32) {
        let _ = (success, runs);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicU32,
        completes: AtomicU32,
        stable_at: AtomicU32,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_run_start(&self, _run: u32, _max_runs: u32) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_run_complete(&self, run: u32, _max_runs: u32, stable: bool) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            if stable {
                self.stable_at.store(run, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start("pdflatex", 5);
        cb.on_run_start(1, 5);
        cb.on_run_complete(1, 5, false);
        cb.on_conversion_complete(false, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_run_start(1, 3);
        tracker.on_run_complete(1, 3, false);
        tracker.on_run_start(2, 3);
        tracker.on_run_complete(2, 3, true);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.stable_at.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_start("tex", 2);
        cb.on_run_start(1, 2);
    }
}
