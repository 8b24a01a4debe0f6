//! Lossy compression by rasterising every page and re-encoding it as JPEG.
//!
//! Page images are staged in a scoped temporary directory inside the output
//! directory and handed to a [`PageAssembler`]. The directory is removed when
//! the step returns, on both success and failure.

use crate::engine::{EncodedPage, OpenDocument, PageAssembler};
use crate::error::{StepError, StepKind};
use crate::output::{Artifact, ArtifactKind, CompressionStats};
use crate::pipeline::encode::encode_jpeg;
use crate::pipeline::inspect::Document;
use crate::pipeline::write::{write_artifact, RunLedger};
use crate::progress::{report_step, ProgressCallback};
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, info};

const PROGRESS_EVERY: usize = 5;

/// Image parameters for one compression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressSettings {
    pub quality: u8,
    pub raster_dpi: u32,
    pub assembly_dpi: u32,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self {
            quality: 40,
            raster_dpi: 150,
            assembly_dpi: 100,
        }
    }
}

/// `<stem>_compressed.pdf`
pub fn compressed_file_name(stem: &str) -> String {
    format!("{stem}_compressed.pdf")
}

fn fail(reason: impl Into<String>) -> StepError {
    StepError::new(StepKind::Compress, reason)
}

/// Rasterise, re-encode and reassemble `document` into `out_dir`.
pub fn compress(
    doc: &dyn OpenDocument,
    document: &Document,
    assembler: &dyn PageAssembler,
    settings: CompressSettings,
    out_dir: &Path,
    ledger: &RunLedger,
    progress: Option<&ProgressCallback>,
) -> Result<(Artifact, CompressionStats), StepError> {
    let total = doc.page_count();
    if total == 0 {
        return Err(fail("document has no pages"));
    }

    info!(
        "Compressing {} pages (quality {}, {} DPI)",
        total, settings.quality, settings.raster_dpi
    );

    let staging = TempDir::new_in(out_dir)
        .map_err(|e| fail(format!("cannot create staging directory: {e}")))?;

    let mut pages = Vec::with_capacity(total);
    for idx in 0..total {
        let img = doc
            .render_page(idx, settings.raster_dpi)
            .map_err(|e| fail(e.to_string()))?;
        let jpeg = encode_jpeg(&img, settings.quality)
            .map_err(|e| fail(format!("page {}: JPEG encoding failed: {e}", idx + 1)))?;

        let path = staging.path().join(format!("page_{:04}.jpg", idx + 1));
        std::fs::write(&path, &jpeg)
            .map_err(|e| fail(format!("cannot stage page {}: {e}", idx + 1)))?;
        pages.push(EncodedPage {
            path,
            width: img.width(),
            height: img.height(),
        });

        let done = idx + 1;
        if done % PROGRESS_EVERY == 0 {
            info!("  Processed {}/{} pages", done, total);
        }
        report_step(progress, StepKind::Compress, done, total, PROGRESS_EVERY);
    }

    let bytes = assembler
        .assemble(&pages, settings.assembly_dpi)
        .map_err(|e| fail(e.to_string()))?;
    debug!("Assembled {} pages into {} bytes", pages.len(), bytes.len());

    let path = out_dir.join(compressed_file_name(&document.stem()));
    write_artifact(ledger, StepKind::Compress, &path, &bytes)?;

    // Staged JPEGs go away here; a failure to remove them is not a step failure.
    if let Err(e) = staging.close() {
        debug!("Could not remove staging directory: {}", e);
    }

    let stats = CompressionStats::new(document.size_bytes, bytes.len() as u64);
    info!(
        "Compressed {:.2}MB → {:.2}MB ({:.1}% reduction)",
        document.report.size_mb,
        bytes.len() as f64 / crate::BYTES_PER_MB,
        stats.reduction_percent
    );

    Ok((
        Artifact {
            path,
            size_bytes: bytes.len() as u64,
            kind: ArtifactKind::Compressed,
        },
        stats,
    ))
}
