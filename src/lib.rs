//! # pdf-autochunk
//!
//! Shrink PDF documents for downstream consumers with a per-file size limit.
//!
//! Each document is inspected (size, page count, whether it carries real
//! text) and mapped to a strategy: leave it alone, extract its text,
//! compress its pages, split it into parts, or a combination. The decision
//! is a pure function of the inspection report and a set of thresholds, so
//! the same document always gets the same treatment.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / directory
//!  │
//!  ├─ 1. Input    discover *.pdf files, check %PDF magic
//!  ├─ 2. Inspect  page count, text presence, size metrics (pdfium)
//!  ├─ 3. Select   size/text decision table → Strategy
//!  ├─ 4. Steps    extract text │ compress (JPEG + lopdf) │ split by pages
//!  └─ 5. Output   artifacts written atomically into the output directory
//! ```
//!
//! ## Strategies
//!
//! | Size (default thresholds) | Text  | Strategy                  |
//! |---------------------------|-------|---------------------------|
//! | ≤ 10 MB                   | any   | `none`                    |
//! | 10–30 MB                  | yes   | `extract_text`            |
//! | 10–30 MB                  | no    | `compress`                |
//! | 30–100 MB                 | yes   | `extract_text_and_split`  |
//! | 30–100 MB                 | no    | `compress_and_split`      |
//! | > 100 MB                  | any   | `split_aggressive`        |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_autochunk::{process_batch, ProcessingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProcessingConfig::default();
//!     let batch = process_batch("./scans", &config).await?;
//!     for artifact in batch.artifacts() {
//!         println!("{} ({:.1} MB)", artifact.path.display(), artifact.size_mb());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `autochunk` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ## pdfium
//!
//! Inspection, text extraction, rasterisation and splitting go through
//! pdfium. Point `PDFIUM_LIB_PATH` at the shared library (or a directory
//! containing it); otherwise `./` and the system library path are searched.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;

/// Bytes in one of the megabytes used by every threshold (MiB).
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ProcessingConfig, ProcessingConfigBuilder, SplitGranularity, Thresholds};
pub use engine::{EncodedPage, EngineSession, LopdfAssembler, OpenDocument, PageAssembler, PdfEngine, PdfiumEngine};
pub use error::{EngineError, ProcessError, StepError, StepKind};
pub use orchestrator::Orchestrator;
pub use output::{
    Artifact, ArtifactKind, BatchOutput, BatchSummary, CompressionStats, DocumentOutcome,
    DocumentResult, DocumentSummary,
};
pub use pipeline::inspect::{
    Document, FirstPageTextDetector, InspectionReport, SampledPagesDetector, TextDetector,
};
pub use pipeline::select::{select, SelectionMode, Strategy};
pub use process::{inspect, process, process_batch, process_files, process_sync};
pub use progress::{NoopProgressCallback, ProcessingProgressCallback, ProgressCallback};
