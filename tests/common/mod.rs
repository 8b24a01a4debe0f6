//! In-memory engine for orchestration tests; no libpdfium required.
//!
//! A fake document is a file that starts with `%PDF-FAKE`, followed by one
//! JSON header line describing its pages. The file is then extended with
//! `set_len` (sparse on most file systems) to whatever size a test needs,
//! so a "120 MB" document costs almost nothing to create.

#![allow(dead_code)]

use image::{DynamicImage, RgbImage};
use pdf_autochunk::{
    EncodedPage, EngineError, EngineSession, OpenDocument, PageAssembler, PdfEngine,
    BYTES_PER_MB,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const MAGIC: &[u8] = b"%PDF-FAKE\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakeHeader {
    pub pages: Vec<String>,
    #[serde(default)]
    pub fail_render: bool,
}

pub fn mb(n: f64) -> u64 {
    (n * BYTES_PER_MB) as u64
}

/// Write a fake PDF with the given page texts, padded to `size_bytes`.
pub fn write_fake_pdf(path: &Path, pages: &[String], size_bytes: u64, fail_render: bool) {
    let header = FakeHeader {
        pages: pages.to_vec(),
        fail_render,
    };
    let mut f = File::create(path).unwrap();
    f.write_all(MAGIC).unwrap();
    serde_json::to_writer(&mut f, &header).unwrap();
    f.write_all(b"\n").unwrap();
    let written = f.metadata().unwrap().len();
    f.set_len(size_bytes.max(written)).unwrap();
}

/// Read the header back from a fake PDF (input, part or compressed output).
pub fn read_header(path: &Path) -> Result<FakeHeader, EngineError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut magic = String::new();
    reader.read_line(&mut magic)?;
    if magic.as_bytes() != MAGIC {
        return Err(EngineError::Open(format!("bad magic {magic:?}")));
    }
    let mut line = String::new();
    reader.read_line(&mut line)?;
    serde_json::from_str(line.trim_end()).map_err(|e| EngineError::Open(e.to_string()))
}

fn header_bytes(header: &FakeHeader) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    out.extend(serde_json::to_vec(header).unwrap_or_default());
    out.push(b'\n');
    out
}

/// Text long enough to count as a text-bearing page.
pub fn prose(page: usize) -> String {
    format!(
        "Page {page}. The quick brown fox jumps over the lazy dog while the committee \
         reviews the quarterly figures and drafts its recommendations."
    )
}

/// Short markers: identifiable, but below the text-presence threshold.
pub fn markers(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("p{i}")).collect()
}

pub fn prose_pages(n: usize) -> Vec<String> {
    (1..=n).map(prose).collect()
}

// ── Engine ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct FakeEngine {
    unavailable: bool,
    pub sessions: AtomicUsize,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// An engine whose library can never be bound.
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            unavailable: true,
            sessions: AtomicUsize::new(0),
        })
    }
}

impl PdfEngine for FakeEngine {
    fn session(&self) -> Result<Box<dyn EngineSession>, EngineError> {
        if self.unavailable {
            return Err(EngineError::Binding("libpdfium.so: cannot open shared object".into()));
        }
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession))
    }
}

struct FakeSession;

impl EngineSession for FakeSession {
    fn open(&self, path: &Path) -> Result<Box<dyn OpenDocument + '_>, EngineError> {
        let header = read_header(path)?;
        Ok(Box::new(FakeDocument { header }))
    }
}

struct FakeDocument {
    header: FakeHeader,
}

impl OpenDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.header.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, EngineError> {
        self.header
            .pages
            .get(index)
            .cloned()
            .ok_or_else(|| EngineError::Page {
                page: index + 1,
                detail: "out of range".into(),
            })
    }

    fn render_page(&self, index: usize, _dpi: u32) -> Result<DynamicImage, EngineError> {
        if self.header.fail_render {
            return Err(EngineError::Render {
                page: index + 1,
                detail: "simulated rasteriser failure".into(),
            });
        }
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            8,
            8,
            image::Rgb([200, 200, 200]),
        )))
    }

    fn export_pages(&self, pages: Range<usize>) -> Result<Vec<u8>, EngineError> {
        let slice = self
            .header
            .pages
            .get(pages.clone())
            .ok_or_else(|| EngineError::Write(format!("bad range {pages:?}")))?;
        Ok(header_bytes(&FakeHeader {
            pages: slice.to_vec(),
            fail_render: false,
        }))
    }
}

// ── Assemblers ───────────────────────────────────────────────────────────────

/// Produces an image-only fake PDF padded to `output_bytes`.
#[derive(Debug)]
pub struct FakeAssembler {
    pub output_bytes: u64,
}

impl FakeAssembler {
    pub fn producing(output_bytes: u64) -> Arc<Self> {
        Arc::new(Self { output_bytes })
    }
}

impl PageAssembler for FakeAssembler {
    fn assemble(&self, pages: &[EncodedPage], _dpi: u32) -> Result<Vec<u8>, EngineError> {
        for p in pages {
            // Staged JPEGs must exist while assembling.
            std::fs::metadata(&p.path)?;
        }
        let mut out = header_bytes(&FakeHeader {
            pages: vec![String::new(); pages.len()],
            fail_render: false,
        });
        if (out.len() as u64) < self.output_bytes {
            out.resize(self.output_bytes as usize, 0);
        }
        Ok(out)
    }
}

/// Fails after checking that every page was staged.
#[derive(Debug)]
pub struct BrokenAssembler;

impl PageAssembler for BrokenAssembler {
    fn assemble(&self, pages: &[EncodedPage], _dpi: u32) -> Result<Vec<u8>, EngineError> {
        assert!(!pages.is_empty());
        for p in pages {
            std::fs::metadata(&p.path)?;
        }
        Err(EngineError::Write("simulated assembly failure".into()))
    }
}

/// Pages of every part in `paths`, concatenated in order.
pub fn pages_of(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .flat_map(|p| read_header(p).unwrap().pages)
        .collect()
}
