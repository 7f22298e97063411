//! Progress-callback trait for per-pass extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline runs each pass.
//!
//! # Example
//!
//! ```rust
//! use pdf_content_extractor::{ExtractionConfig, ExtractionProgressCallback, PassKind};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     items: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_pass_complete(&self, pass: PassKind, items: usize) {
//!         self.items.fetch_add(items, Ordering::SeqCst);
//!         eprintln!("{pass}: {items} item(s)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { items: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::PassKind;
use std::sync::Arc;

/// Called by the extraction pipeline as it runs each pass.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: events are
/// fired from whichever Tokio worker is driving the extraction.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once, after the document has been loaded and before any pass runs.
    ///
    /// # Arguments
    /// * `passes` — number of passes that will run
    /// * `pages`  — number of selected pages
    fn on_extraction_start(&self, passes: usize, pages: usize) {
        let _ = (passes, pages);
    }

    /// Called just before a pass starts.
    fn on_pass_start(&self, pass: PassKind) {
        let _ = pass;
    }

    /// Called when a pass succeeds.
    ///
    /// # Arguments
    /// * `items` — characters of text, number of images, number of tables,
    ///   or characters of summary, depending on `pass`
    fn on_pass_complete(&self, pass: PassKind, items: usize) {
        let _ = (pass, items);
    }

    /// Called when a pass fails; its result is empty.
    fn on_pass_error(&self, pass: PassKind, error: &str) {
        let _ = (pass, error);
    }

    /// Called once after every pass has been attempted.
    ///
    /// # Arguments
    /// * `passes` — passes that ran
    /// * `failed` — passes that failed
    fn on_extraction_complete(&self, passes: usize, failed: usize) {
        let _ = (passes, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: Mutex<Vec<(PassKind, String)>>,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_pass_start(&self, _pass: PassKind) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_pass_complete(&self, _pass: PassKind, _items: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_pass_error(&self, pass: PassKind, error: &str) {
            self.errors
                .lock()
                .expect("lock")
                .push((pass, error.to_string()));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(4, 2);
        cb.on_pass_start(PassKind::Text);
        cb.on_pass_complete(PassKind::Text, 120);
        cb.on_pass_error(PassKind::Images, "boom");
        cb.on_extraction_complete(4, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_pass_start(PassKind::Text);
        tracker.on_pass_complete(PassKind::Text, 10);
        tracker.on_pass_start(PassKind::Tables);
        tracker.on_pass_error(PassKind::Tables, "no pdfium");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        let errors = tracker.errors.lock().expect("lock");
        assert_eq!(errors.as_slice(), &[(PassKind::Tables, "no pdfium".to_string())]);
    }
}
