//! Error types for the pdf-autochunk library.
//!
//! Three layers of error reflect three distinct failure scopes:
//!
//! * [`ProcessError`] — **Per-document**: the document cannot be processed
//!   (unreadable container, a transformation step failed, bad input path).
//!   A batch reports it and moves on to the next document.
//!
//! * [`StepError`] — **Per-step**: the explicit result of one transformation
//!   step. The orchestrator matches on it: Compress failures are recovered by
//!   falling back to the original file, every other step failure becomes
//!   [`ProcessError::StepFailed`].
//!
//! * [`EngineError`] — **Per-capability**: the PDF engine, rasteriser or page
//!   assembler refused an operation. Mapped into one of the above depending
//!   on where it happened.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All per-document errors returned by the pdf-autochunk library.
#[derive(Debug, Error)]
pub enum ProcessError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Input path is neither a file nor a directory, is not a PDF, or holds no PDFs.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// The reader could not parse the container (corrupt, encrypted, or zero pages).
    #[error("PDF '{path}' is unreadable: {detail}")]
    UnreadableDocument { path: PathBuf, detail: String },

    /// A transformation step could not complete and has no fallback.
    #[error("{step} failed: {reason}")]
    StepFailed { step: StepKind, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory or write an artifact.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium into a system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StepError> for ProcessError {
    fn from(e: StepError) -> Self {
        ProcessError::StepFailed {
            step: e.step,
            reason: e.reason,
        }
    }
}

/// The transformation steps an orchestrator can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    ExtractText,
    Compress,
    Split,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::ExtractText => "Text extraction",
            StepKind::Compress => "Compression",
            StepKind::Split => "Split",
        };
        f.write_str(name)
    }
}

/// The failed outcome of a single transformation step.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{step} failed: {reason}")]
pub struct StepError {
    pub step: StepKind,
    pub reason: String,
}

impl StepError {
    pub fn new(step: StepKind, reason: impl Into<String>) -> Self {
        Self {
            step,
            reason: reason.into(),
        }
    }
}

/// Errors raised by the PDF engine, rasteriser and page assembler.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine library could not be loaded.
    #[error("engine unavailable: {0}")]
    Binding(String),

    /// The document could not be opened or parsed.
    #[error("cannot open document: {0}")]
    Open(String),

    /// A page-level operation failed.
    #[error("page {page}: {detail}")]
    Page { page: usize, detail: String },

    /// Rasterisation of a page failed.
    #[error("rasterisation failed for page {page}: {detail}")]
    Render { page: usize, detail: String },

    /// Building or serialising a new document failed.
    #[error("cannot write document: {0}")]
    Write(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
