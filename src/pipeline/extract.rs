//! Plain-text extraction into a single page-delimited UTF-8 file.

use crate::engine::OpenDocument;
use crate::error::{StepError, StepKind};
use crate::output::{Artifact, ArtifactKind};
use crate::pipeline::inspect::Document;
use crate::pipeline::write::{write_artifact, RunLedger};
use crate::progress::{report_step, ProgressCallback};
use std::path::Path;
use tracing::info;

const RULE_WIDTH: usize = 60;
const PROGRESS_EVERY: usize = 10;

/// One page's section: a `=` rule, `Page N`, another rule, a blank line,
/// the text, and a trailing blank line.
pub fn format_page_section(page_number: usize, text: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("{rule}\nPage {page_number}\n{rule}\n\n{text}\n\n")
}

/// `<stem>_text.txt`
pub fn text_file_name(stem: &str) -> String {
    format!("{stem}_text.txt")
}

/// Extract every page's text from `document` into `out_dir`.
///
/// Pages without text still get a section, so section N is always page N.
pub fn extract_text(
    doc: &dyn OpenDocument,
    document: &Document,
    out_dir: &Path,
    ledger: &RunLedger,
    progress: Option<&ProgressCallback>,
) -> Result<Artifact, StepError> {
    let total = doc.page_count();
    info!("Extracting text from {} pages", total);

    let mut sections = Vec::with_capacity(total);
    for idx in 0..total {
        let text = doc.page_text(idx).map_err(|e| {
            StepError::new(
                StepKind::ExtractText,
                format!("page {}: {e}", idx + 1),
            )
        })?;
        sections.push(format_page_section(idx + 1, &text));

        let done = idx + 1;
        if done % PROGRESS_EVERY == 0 {
            info!("  Processed {}/{} pages", done, total);
        }
        report_step(progress, StepKind::ExtractText, done, total, PROGRESS_EVERY);
    }

    let content = sections.join("\n");
    let path = out_dir.join(text_file_name(&document.stem()));
    write_artifact(ledger, StepKind::ExtractText, &path, content.as_bytes())?;

    let artifact = Artifact {
        path,
        size_bytes: content.len() as u64,
        kind: ArtifactKind::Text,
    };
    info!(
        "Text extracted to {} ({:.2}MB)",
        artifact.path.display(),
        artifact.size_mb()
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_layout() {
        let s = format_page_section(3, "hello");
        let rule = "=".repeat(60);
        assert_eq!(s, format!("{rule}\nPage 3\n{rule}\n\nhello\n\n"));
    }

    #[test]
    fn empty_page_still_has_header() {
        let s = format_page_section(1, "");
        assert!(s.contains("Page 1\n"));
        assert!(s.ends_with("\n\n\n\n"));
    }

    #[test]
    fn file_name() {
        assert_eq!(text_file_name("report"), "report_text.txt");
    }
}
