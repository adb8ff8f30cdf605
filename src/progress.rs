//! Progress-callback trait for per-page binding events.
//!
//! Inject an [`Arc<dyn BindProgressCallback>`] via
//! [`crate::config::BinderConfigBuilder::progress_callback`] to receive events
//! as the dispatcher transforms each page. Page positions are 1-indexed
//! positions in the resolved document order, not parsed page numbers.
//!
//! # Example
//!
//! ```rust
//! use scanbinder::{BindProgressCallback, BinderConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BindProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, position: usize, total: usize, source: &Path) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {}", position, total, source.display());
//!     }
//! }
//!
//! let config = BinderConfig::builder()
//!     .search_root("scans")
//!     .output_path("out.pdf")
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the pipeline as it processes each page.
///
/// Page events arrive concurrently from the dispatcher's tasks and in
/// completion order, so implementations must be `Send + Sync` and guard any
/// shared mutable state. All methods default to no-ops.
pub trait BindProgressCallback: Send + Sync {
    /// Called once, after ordering and before the first transform starts.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page's transform begins.
    fn on_page_start(&self, position: usize, total_pages: usize, source: &Path) {
        let _ = (position, total_pages, source);
    }

    /// Called when a page's artifact is fully written.
    fn on_page_complete(&self, position: usize, total_pages: usize, source: &Path) {
        let _ = (position, total_pages, source);
    }

    /// Called when a page's transform fails.
    fn on_page_error(&self, position: usize, total_pages: usize, error: &str) {
        let _ = (position, total_pages, error);
    }

    /// Called once after every page has been attempted (the full barrier).
    fn on_transforms_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BindProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BinderConfig`].
pub type ProgressCallback = Arc<dyn BindProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        succeeded: AtomicUsize,
    }

    impl BindProgressCallback for TrackingCallback {
        fn on_page_start(&self, _position: usize, _total: usize, _source: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _position: usize, _total: usize, _source: &Path) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _position: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_transforms_complete(&self, _total: usize, success_count: usize) {
            self.succeeded.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(3);
        cb.on_page_start(1, 3, Path::new("p1.jpg"));
        cb.on_page_complete(1, 3, Path::new("p1.jpg"));
        cb.on_page_error(2, 3, "boom");
        cb.on_transforms_complete(3, 2);
    }

    #[test]
    fn tracking_counts_through_trait_object() {
        let t = Arc::new(TrackingCallback::default());
        let cb: ProgressCallback = t.clone();
        cb.on_page_start(1, 2, Path::new("a1.jpg"));
        cb.on_page_complete(1, 2, Path::new("a1.jpg"));
        cb.on_page_error(2, 2, "normalize failed");
        cb.on_transforms_complete(2, 1);
        assert_eq!(t.starts.load(Ordering::SeqCst), 1);
        assert_eq!(t.completes.load(Ordering::SeqCst), 1);
        assert_eq!(t.errors.load(Ordering::SeqCst), 1);
        assert_eq!(t.succeeded.load(Ordering::SeqCst), 1);
    }
}
