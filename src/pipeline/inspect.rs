//! Document inspection: page count, text presence and size metrics.
//!
//! Inspection is deliberately cheap. It opens the document once, asks the
//! configured [`TextDetector`] whether the document carries real text, and
//! derives every size metric from the file length. The resulting
//! [`InspectionReport`] is the only input the strategy selector sees.

use crate::engine::{EngineSession, OpenDocument};
use crate::error::{EngineError, ProcessError};
use crate::BYTES_PER_MB;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Metrics the selector decides on. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionReport {
    pub page_count: usize,
    pub size_mb: f64,
    pub has_text: bool,
    pub first_page_text_length: usize,
    pub avg_page_size_mb: f64,
}

/// An inspected file on disk.
///
/// Recomputed whenever a new physical file is produced; the compound
/// strategies re-inspect their intermediate output through this type.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub report: InspectionReport,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.report.page_count
    }

    pub fn has_substantial_text(&self) -> bool {
        self.report.has_text
    }

    pub fn avg_bytes_per_page(&self) -> f64 {
        if self.report.page_count == 0 {
            0.0
        } else {
            self.size_bytes as f64 / self.report.page_count as f64
        }
    }

    /// File stem used to name every artifact derived from this document.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string())
    }
}

/// Outcome of a text-presence probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSample {
    pub has_text: bool,
    /// Untrimmed character count of the first page's text.
    pub first_page_text_length: usize,
}

/// Pluggable heuristic deciding whether a document is text-bearing.
pub trait TextDetector: Send + Sync {
    /// Short identifier used in logs and debug output.
    fn name(&self) -> &'static str;

    fn detect(&self, doc: &dyn OpenDocument) -> Result<TextSample, EngineError>;
}

/// Samples the first page only: text-bearing when its trimmed text exceeds
/// `min_chars` characters.
///
/// Cheap, but a scanned cover page in an otherwise text-heavy document is
/// classified as image-only.
#[derive(Debug, Clone, Copy)]
pub struct FirstPageTextDetector {
    pub min_chars: usize,
}

impl Default for FirstPageTextDetector {
    fn default() -> Self {
        Self { min_chars: 100 }
    }
}

impl TextDetector for FirstPageTextDetector {
    fn name(&self) -> &'static str {
        "first_page"
    }

    fn detect(&self, doc: &dyn OpenDocument) -> Result<TextSample, EngineError> {
        let text = doc.page_text(0)?;
        Ok(TextSample {
            has_text: text.trim().chars().count() > self.min_chars,
            first_page_text_length: text.chars().count(),
        })
    }
}

/// Samples up to `samples` evenly spaced pages; text-bearing when a strict
/// majority of them exceed `min_chars` trimmed characters.
#[derive(Debug, Clone, Copy)]
pub struct SampledPagesDetector {
    pub samples: usize,
    pub min_chars: usize,
}

impl SampledPagesDetector {
    pub fn new(samples: usize) -> Self {
        Self {
            samples: samples.max(1),
            min_chars: 100,
        }
    }

    /// 0-based page indices to sample, always including the first page.
    pub fn sample_indices(&self, page_count: usize) -> Vec<usize> {
        let n = self.samples.max(1).min(page_count);
        if n == 0 {
            return Vec::new();
        }
        let mut indices: Vec<usize> = (0..n).map(|i| i * page_count / n).collect();
        indices.dedup();
        indices
    }
}

impl TextDetector for SampledPagesDetector {
    fn name(&self) -> &'static str {
        "sampled_pages"
    }

    fn detect(&self, doc: &dyn OpenDocument) -> Result<TextSample, EngineError> {
        let indices = self.sample_indices(doc.page_count());
        let mut first_page_text_length = 0;
        let mut text_pages = 0;

        for &idx in &indices {
            let text = doc.page_text(idx)?;
            if idx == 0 {
                first_page_text_length = text.chars().count();
            }
            if text.trim().chars().count() > self.min_chars {
                text_pages += 1;
            }
        }

        Ok(TextSample {
            has_text: text_pages * 2 > indices.len(),
            first_page_text_length,
        })
    }
}

/// Opens documents and produces [`Document`]s.
pub struct Inspector<'a> {
    detector: &'a dyn TextDetector,
}

impl<'a> Inspector<'a> {
    pub fn new(detector: &'a dyn TextDetector) -> Self {
        Self { detector }
    }

    /// Inspect the file at `path`.
    ///
    /// # Errors
    /// [`ProcessError::UnreadableDocument`] when the container cannot be
    /// parsed, has zero pages, or its first page cannot be read.
    pub fn inspect(&self, session: &dyn EngineSession, path: &Path) -> Result<Document, ProcessError> {
        let unreadable = |detail: String| ProcessError::UnreadableDocument {
            path: path.to_path_buf(),
            detail,
        };

        let size_bytes = std::fs::metadata(path)
            .map_err(|e| unreadable(e.to_string()))?
            .len();

        let doc = session.open(path).map_err(|e| unreadable(e.to_string()))?;
        let page_count = doc.page_count();
        if page_count == 0 {
            return Err(unreadable("document has no pages".into()));
        }

        let sample = self
            .detector
            .detect(doc.as_ref())
            .map_err(|e| unreadable(e.to_string()))?;

        let report = build_report(size_bytes, page_count, sample);

        info!(
            "Inspected {}: {:.2}MB, {} pages, {:.2}MB/page, text: {}",
            path.display(),
            report.size_mb,
            report.page_count,
            report.avg_page_size_mb,
            if report.has_text { "yes" } else { "no (image-heavy)" }
        );
        debug!(detector = self.detector.name(), ?report, "Inspection report");

        Ok(Document {
            path: path.to_path_buf(),
            size_bytes,
            report,
        })
    }
}

fn build_report(size_bytes: u64, page_count: usize, sample: TextSample) -> InspectionReport {
    let size_mb = size_bytes as f64 / BYTES_PER_MB;
    let avg_page_size_mb = if page_count > 0 {
        size_mb / page_count as f64
    } else {
        0.0
    };
    InspectionReport {
        page_count,
        size_mb,
        has_text: sample.has_text,
        first_page_text_length: sample.first_page_text_length,
        avg_page_size_mb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;
    use std::ops::Range;

    struct TextOnly(Vec<&'static str>);

    impl OpenDocument for TextOnly {
        fn page_count(&self) -> usize {
            self.0.len()
        }
        fn page_text(&self, index: usize) -> Result<String, EngineError> {
            Ok(self.0[index].to_string())
        }
        fn render_page(&self, index: usize, _dpi: u32) -> Result<DynamicImage, EngineError> {
            Err(EngineError::Render {
                page: index + 1,
                detail: "not supported".into(),
            })
        }
        fn export_pages(&self, _pages: Range<usize>) -> Result<Vec<u8>, EngineError> {
            Err(EngineError::Write("not supported".into()))
        }
    }

    fn long_text() -> &'static str {
        "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor \
         incididunt ut labore et dolore magna aliqua."
    }

    #[test]
    fn first_page_detector_threshold_is_exclusive() {
        let exactly_100: &'static str = Box::leak("x".repeat(100).into_boxed_str());
        let doc = TextOnly(vec![exactly_100]);
        let sample = FirstPageTextDetector::default().detect(&doc).unwrap();
        assert!(!sample.has_text, "100 chars is not more than 100");
        assert_eq!(sample.first_page_text_length, 100);

        let doc = TextOnly(vec![long_text()]);
        assert!(FirstPageTextDetector::default().detect(&doc).unwrap().has_text);
    }

    #[test]
    fn first_page_detector_trims_whitespace() {
        let padded: &'static str = Box::leak(format!("   {}   \n\n", "y".repeat(90)).into_boxed_str());
        let doc = TextOnly(vec![padded]);
        let sample = FirstPageTextDetector::default().detect(&doc).unwrap();
        assert!(!sample.has_text);
        // Length is reported untrimmed.
        assert_eq!(sample.first_page_text_length, 98);
    }

    #[test]
    fn first_page_detector_ignores_later_pages() {
        let doc = TextOnly(vec!["", long_text(), long_text()]);
        assert!(!FirstPageTextDetector::default().detect(&doc).unwrap().has_text);
    }

    #[test]
    fn sampled_detector_uses_majority() {
        let doc = TextOnly(vec!["", long_text(), long_text(), long_text()]);
        let detector = SampledPagesDetector::new(4);
        assert_eq!(detector.sample_indices(4), vec![0, 1, 2, 3]);
        let sample = detector.detect(&doc).unwrap();
        assert!(sample.has_text);
        assert_eq!(sample.first_page_text_length, 0);
    }

    #[test]
    fn sample_indices_spread_and_clamp() {
        let d = SampledPagesDetector::new(3);
        assert_eq!(d.sample_indices(9), vec![0, 3, 6]);
        assert_eq!(d.sample_indices(2), vec![0, 1]);
        assert!(d.sample_indices(0).is_empty());
    }

    #[test]
    fn report_metrics() {
        let sample = TextSample {
            has_text: true,
            first_page_text_length: 500,
        };
        let r = build_report(50 * 1024 * 1024, 100, sample);
        assert_eq!(r.size_mb, 50.0);
        assert_eq!(r.avg_page_size_mb, 0.5);
        assert_eq!(r.page_count, 100);
    }

    #[test]
    fn document_avg_bytes_per_page() {
        let doc = Document {
            path: PathBuf::from("/tmp/a.pdf"),
            size_bytes: 1000,
            report: build_report(
                1000,
                4,
                TextSample {
                    has_text: false,
                    first_page_text_length: 0,
                },
            ),
        };
        assert_eq!(doc.avg_bytes_per_page(), 250.0);
        assert_eq!(doc.stem(), "a");
    }
}
