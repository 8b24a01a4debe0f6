//! Progress-callback trait for batch, document and step events.
//!
//! Inject an [`Arc<dyn ProcessingProgressCallback>`] via
//! [`crate::config::ProcessingConfigBuilder::progress_callback`] to receive
//! events as the orchestrator works through a batch. The CLI drives its
//! progress bars from these; library callers can forward them anywhere.
//!
//! # Example
//!
//! ```rust
//! use pdf_autochunk::{ProcessingProgressCallback, ProcessingConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl ProcessingProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, input: &Path, artifacts: usize) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} → {} artifact(s)", input.display(), artifacts);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { done: AtomicUsize::new(0) });
//!
//! let config = ProcessingConfig::builder()
//!     .progress_callback(counter as Arc<dyn ProcessingProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::StepKind;
use crate::output::Artifact;
use crate::pipeline::select::Strategy;
use std::path::Path;
use std::sync::Arc;

/// Called by the orchestrator as it processes documents.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// With `concurrency > 1` events for different documents arrive from
/// different blocking threads. Implementations must protect shared mutable
/// state with `Mutex`, atomics or similar.
pub trait ProcessingProgressCallback: Send + Sync {
    /// Called once before the first document is inspected.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when work on a document begins.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position in the batch
    /// * `total` — batch size
    fn on_document_start(&self, input: &Path, index: usize, total: usize) {
        let _ = (input, index, total);
    }

    /// Called after inspection, once the strategy is fixed.
    fn on_strategy_selected(&self, input: &Path, strategy: Strategy, reason: &str) {
        let _ = (input, strategy, reason);
    }

    /// Periodic page progress inside a long-running step.
    ///
    /// Text extraction reports every 10 pages and compression every 5; both
    /// also report the final page.
    fn on_step_progress(&self, step: StepKind, done: usize, total: usize) {
        let _ = (step, done, total);
    }

    /// Called once per artifact when a document's strategy has finished, in
    /// output order, before [`on_document_complete`](Self::on_document_complete).
    ///
    /// Also called for [`ArtifactKind::Original`](crate::ArtifactKind::Original)
    /// when the input itself is the result; nothing is written in that case.
    fn on_artifact(&self, artifact: &Artifact) {
        let _ = artifact;
    }

    /// Called when a document finished successfully.
    fn on_document_complete(&self, input: &Path, artifacts: usize) {
        let _ = (input, artifacts);
    }

    /// Called when a document failed. The batch continues.
    fn on_document_error(&self, input: &Path, error: &str) {
        let _ = (input, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        let _ = (succeeded, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ProcessingProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ProcessingConfig`].
pub type ProgressCallback = Arc<dyn ProcessingProgressCallback>;

/// Emit a step-progress event every `every` pages and on the last page.
pub(crate) fn report_step(
    cb: Option<&ProgressCallback>,
    step: StepKind,
    done: usize,
    total: usize,
    every: usize,
) {
    if let Some(cb) = cb {
        if done == total || (every > 0 && done % every == 0) {
            cb.on_step_progress(step, done, total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ArtifactKind;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        started: AtomicUsize,
        completed: AtomicUsize,
        errors: AtomicUsize,
        artifacts: AtomicUsize,
        steps: Mutex<Vec<(StepKind, usize, usize)>>,
    }

    impl ProcessingProgressCallback for TrackingCallback {
        fn on_document_start(&self, _input: &Path, _index: usize, _total: usize) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }

        fn on_step_progress(&self, step: StepKind, done: usize, total: usize) {
            self.steps.lock().unwrap().push((step, done, total));
        }

        fn on_artifact(&self, _artifact: &Artifact) {
            self.artifacts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _input: &Path, _artifacts: usize) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, _input: &Path, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        let p = Path::new("a.pdf");
        cb.on_batch_start(2);
        cb.on_document_start(p, 1, 2);
        cb.on_strategy_selected(p, Strategy::Compress, "image-heavy");
        cb.on_step_progress(StepKind::Compress, 5, 10);
        cb.on_document_error(p, "boom");
        cb.on_batch_complete(1, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        let p = Path::new("a.pdf");
        tracker.on_document_start(p, 1, 1);
        tracker.on_artifact(&Artifact {
            path: PathBuf::from("processed/a_text.txt"),
            size_bytes: 10,
            kind: ArtifactKind::Text,
        });
        tracker.on_document_complete(p, 1);

        assert_eq!(tracker.started.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.artifacts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completed.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn report_step_fires_on_interval_and_last_page() {
        let tracker = Arc::new(TrackingCallback::default());
        let cb: ProgressCallback = tracker.clone();
        for done in 1..=23 {
            report_step(Some(&cb), StepKind::ExtractText, done, 23, 10);
        }
        let steps = tracker.steps.lock().unwrap().clone();
        let dones: Vec<usize> = steps.iter().map(|s| s.1).collect();
        assert_eq!(dones, vec![10, 20, 23]);
    }

    #[test]
    fn report_step_without_callback_is_silent() {
        report_step(None, StepKind::Compress, 5, 10, 5);
    }
}
