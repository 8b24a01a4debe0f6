//! Capability seams between the orchestration core and the PDF libraries.
//!
//! The decision engine never talks to pdfium or lopdf directly. It only sees
//! these traits, which keeps the inspector, selector and orchestrator testable
//! with an in-memory engine and lets the rendering backend be swapped.
//!
//! ```text
//! PdfEngine ──session()──▶ EngineSession ──open()──▶ OpenDocument
//!  (Send+Sync, shared)      (one per worker)          (page count, text,
//!                                                      render, export)
//! PageAssembler: encoded page images ──▶ multi-page PDF bytes
//! ```
//!
//! A session is created on the thread that uses it and dropped there; pdfium
//! bindings are not shared across threads.

pub mod assemble;
pub mod pdfium;

use crate::error::EngineError;
use image::DynamicImage;
use std::ops::Range;
use std::path::{Path, PathBuf};

pub use assemble::LopdfAssembler;
pub use pdfium::PdfiumEngine;

/// Factory for engine sessions. Shared by every worker in a batch.
pub trait PdfEngine: Send + Sync {
    /// Bind the underlying library for use on the current thread.
    fn session(&self) -> Result<Box<dyn EngineSession>, EngineError>;
}

/// A bound engine able to open documents.
pub trait EngineSession {
    fn open(&self, path: &Path) -> Result<Box<dyn OpenDocument + '_>, EngineError>;
}

/// An opened, read-only document.
pub trait OpenDocument {
    fn page_count(&self) -> usize;

    /// Plain text of the page at 0-based `index`. Empty for image-only pages.
    fn page_text(&self, index: usize) -> Result<String, EngineError>;

    /// Rasterise the page at 0-based `index` at the given resolution.
    fn render_page(&self, index: usize, dpi: u32) -> Result<DynamicImage, EngineError>;

    /// Serialise the 0-based page range `pages` as a standalone PDF.
    fn export_pages(&self, pages: Range<usize>) -> Result<Vec<u8>, EngineError>;
}

/// One JPEG-encoded page waiting to be assembled.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    /// JPEG file on disk (inside a scoped temporary directory).
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Reassembles encoded page images into a single multi-page PDF.
pub trait PageAssembler: Send + Sync {
    fn assemble(&self, pages: &[EncodedPage], dpi: u32) -> Result<Vec<u8>, EngineError>;
}
