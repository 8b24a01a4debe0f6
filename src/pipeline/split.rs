//! Split a document into consecutive page-range parts.
//!
//! Parts are numbered from 001 and never overlap; concatenating them in
//! order reproduces the original page sequence. With a size target the page
//! count per part is derived from the document's average page size, so part
//! sizes are approximate.

use crate::config::SplitGranularity;
use crate::engine::OpenDocument;
use crate::error::{StepError, StepKind};
use crate::output::{Artifact, ArtifactKind};
use crate::pipeline::inspect::Document;
use crate::pipeline::write::{write_artifact, RunLedger};
use std::ops::Range;
use std::path::Path;
use tracing::info;

/// Pages per part for a size target.
///
/// `max(1, floor(target / avg))`; `None` when the average page size is zero,
/// meaning everything fits in a single part.
pub fn pages_per_file_for_target(target_mb: f64, avg_page_size_mb: f64) -> Option<usize> {
    if avg_page_size_mb <= 0.0 || !avg_page_size_mb.is_finite() {
        return None;
    }
    let n = (target_mb / avg_page_size_mb).floor();
    Some(if n < 1.0 { 1 } else { n as usize })
}

/// Resolve a granularity to a concrete page count for `document`.
pub fn pages_per_file(granularity: SplitGranularity, document: &Document) -> usize {
    let total = document.page_count().max(1);
    match granularity {
        SplitGranularity::Pages(n) => n.max(1),
        SplitGranularity::TargetMb(mb) => {
            pages_per_file_for_target(mb, document.report.avg_page_size_mb).unwrap_or(total)
        }
    }
}

/// Consecutive 0-based page ranges of at most `per_file` pages each.
pub fn plan_parts(total_pages: usize, per_file: usize) -> Vec<Range<usize>> {
    let per_file = per_file.max(1);
    (0..total_pages)
        .step_by(per_file)
        .map(|start| start..(start + per_file).min(total_pages))
        .collect()
}

/// `<stem>_part001.pdf`, `<stem>_part002.pdf`, …
pub fn part_file_name(stem: &str, number: usize) -> String {
    format!("{stem}_part{number:03}.pdf")
}

/// Split `document` into parts under `out_dir`.
pub fn split(
    doc: &dyn OpenDocument,
    document: &Document,
    granularity: SplitGranularity,
    out_dir: &Path,
    ledger: &RunLedger,
) -> Result<Vec<Artifact>, StepError> {
    let total = doc.page_count();
    if total == 0 {
        return Err(StepError::new(StepKind::Split, "document has no pages"));
    }

    let per_file = pages_per_file(granularity, document);
    let ranges = plan_parts(total, per_file);
    let stem = document.stem();

    info!(
        "Splitting {} ({} pages) into {} part(s) of up to {} pages",
        document.path.display(),
        total,
        ranges.len(),
        per_file
    );

    let mut artifacts = Vec::with_capacity(ranges.len());
    for (i, range) in ranges.into_iter().enumerate() {
        let number = i + 1;
        let (first, last) = (range.start + 1, range.end);
        let bytes = doc.export_pages(range).map_err(|e| {
            StepError::new(
                StepKind::Split,
                format!("cannot export pages {first}-{last}: {e}"),
            )
        })?;

        let path = out_dir.join(part_file_name(&stem, number));
        write_artifact(ledger, StepKind::Split, &path, &bytes)?;

        info!(
            "  Part {}: pages {}-{} ({:.2}MB)",
            number,
            first,
            last,
            bytes.len() as f64 / crate::BYTES_PER_MB
        );
        artifacts.push(Artifact {
            path,
            size_bytes: bytes.len() as u64,
            kind: ArtifactKind::Part(number),
        });
    }

    Ok(artifacts)
}
