//! Async and blocking entry points.
//!
//! The orchestrator is synchronous and pdfium is thread-affine, so every
//! document runs inside `tokio::task::spawn_blocking` with its own engine
//! session. A batch is a `futures` stream buffered at `config.concurrency`
//! (1 by default, i.e. one document after another) and results come back in
//! input order.

use crate::config::ProcessingConfig;
use crate::engine::{LopdfAssembler, PageAssembler, PdfEngine, PdfiumEngine};
use crate::error::ProcessError;
use crate::orchestrator::Orchestrator;
use crate::output::{BatchOutput, DocumentOutcome, DocumentResult};
use crate::pipeline::input::find_pdf_files;
use crate::pipeline::inspect::Document;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Process a single PDF file.
///
/// # Errors
/// Returns the document's own failure: unreadable input, a failed step, or
/// an engine that cannot be bound.
pub async fn process(
    input: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<DocumentOutcome, ProcessError> {
    let path = input.as_ref().to_path_buf();
    let orchestrator = build_orchestrator(config);

    tokio::task::spawn_blocking(move || orchestrator.run(&path))
        .await
        .map_err(|e| ProcessError::Internal(format!("processing task panicked: {e}")))?
}

/// Process every PDF under `input` (a file or a directory).
///
/// Per-document failures are captured in the returned [`BatchOutput`]; only
/// problems that affect the whole run (bad path, engine binding) are
/// returned as `Err`. A directory with no PDFs yields an empty batch.
pub async fn process_batch(
    input: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<BatchOutput, ProcessError> {
    let files = find_pdf_files(input.as_ref())?;
    process_files(files, config).await
}

/// Process an explicit list of PDF files.
pub async fn process_files(
    files: Vec<PathBuf>,
    config: &ProcessingConfig,
) -> Result<BatchOutput, ProcessError> {
    let start = Instant::now();
    let total = files.len();
    let cb = config.progress_callback.clone();

    if total == 0 {
        info!("No PDF files to process");
        return Ok(BatchOutput::default());
    }

    let orchestrator = build_orchestrator(config);

    // Fail the whole run up front if the engine cannot be bound at all.
    {
        let probe = orchestrator.clone();
        tokio::task::spawn_blocking(move || probe.session().map(|_| ()))
            .await
            .map_err(|e| ProcessError::Internal(format!("engine probe panicked: {e}")))??;
    }

    if let Some(ref cb) = cb {
        cb.on_batch_start(total);
    }
    info!("Processing {} PDF file(s), concurrency {}", total, config.concurrency);

    let documents: Vec<DocumentResult> = stream::iter(files.into_iter().enumerate().map(|(i, path)| {
        let orchestrator = orchestrator.clone();
        async move {
            let input = path.clone();
            match tokio::task::spawn_blocking(move || {
                orchestrator.process_document(&path, i + 1, total)
            })
            .await
            {
                Ok(result) => result,
                Err(e) => DocumentResult {
                    input,
                    result: Err(ProcessError::Internal(format!(
                        "processing task panicked: {e}"
                    ))),
                },
            }
        }
    }))
    .buffered(config.concurrency.max(1))
    .collect()
    .await;

    let output = BatchOutput {
        documents,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Batch complete: {}/{} succeeded in {}ms",
        output.succeeded(),
        total,
        output.total_duration_ms
    );
    if let Some(ref cb) = cb {
        cb.on_batch_complete(output.succeeded(), output.failed());
    }

    Ok(output)
}

/// Synchronous wrapper around [`process_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(
    input: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<BatchOutput, ProcessError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ProcessError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_batch(input, config))
}

/// Inspect a single PDF without transforming it.
pub async fn inspect(
    input: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<Document, ProcessError> {
    let path = input.as_ref().to_path_buf();
    let orchestrator = build_orchestrator(config);

    tokio::task::spawn_blocking(move || orchestrator.inspect(&path))
        .await
        .map_err(|e| ProcessError::Internal(format!("inspection task panicked: {e}")))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn build_orchestrator(config: &ProcessingConfig) -> Orchestrator {
    Orchestrator::new(resolve_engine(config), resolve_assembler(config), config.clone())
}

/// A pre-built engine from the config, otherwise pdfium located through
/// `PDFIUM_LIB_PATH`, `./` or the system library path.
fn resolve_engine(config: &ProcessingConfig) -> Arc<dyn PdfEngine> {
    match config.engine {
        Some(ref engine) => Arc::clone(engine),
        None => {
            debug!("No engine configured, using pdfium");
            Arc::new(PdfiumEngine::from_env())
        }
    }
}

fn resolve_assembler(config: &ProcessingConfig) -> Arc<dyn PageAssembler> {
    match config.assembler {
        Some(ref assembler) => Arc::clone(assembler),
        None => Arc::new(LopdfAssembler),
    }
}
