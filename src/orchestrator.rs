//! Per-document state machine: inspect, select, dispatch, collect artifacts.
//!
//! ```text
//! validate ──▶ inspect ──▶ select (or override) ──▶ dispatch ──▶ Completed
//!     │            │                                   │
//!     └────────────┴──────────── error ────────────────┴──────▶ Failed
//! ```
//!
//! Everything here is synchronous and runs on a blocking thread; the async
//! entry points in [`crate::process`] decide which thread. A Compress failure
//! is the only step failure recovered locally (the original file stands in
//! for the compressed one); any other step failure ends the document.
//!
//! A caller-supplied split with no fixed strategy bypasses dispatch: the
//! original is split into parts and nothing else is produced.

use crate::config::{ProcessingConfig, SplitGranularity};
use crate::engine::{EngineSession, OpenDocument, PageAssembler, PdfEngine};
use crate::error::{EngineError, ProcessError};
use crate::output::{Artifact, ArtifactKind, CompressionStats, DocumentOutcome, DocumentResult};
use crate::pipeline::compress::{compress, CompressSettings};
use crate::pipeline::extract::extract_text;
use crate::pipeline::input::validate_pdf;
use crate::pipeline::inspect::{Document, Inspector};
use crate::pipeline::select::{select, SelectionMode, Strategy};
use crate::pipeline::split::split;
use crate::pipeline::write::RunLedger;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Drives documents through inspection and their selected strategy.
///
/// Cheap to clone; clones share the engine, assembler and [`RunLedger`].
#[derive(Clone)]
pub struct Orchestrator {
    engine: Arc<dyn PdfEngine>,
    assembler: Arc<dyn PageAssembler>,
    config: ProcessingConfig,
    ledger: RunLedger,
}

/// Artifacts and compression bookkeeping accumulated during dispatch.
#[derive(Default)]
struct Dispatch {
    artifacts: Vec<Artifact>,
    compression: Option<CompressionStats>,
    compression_fallback: Option<String>,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<dyn PdfEngine>,
        assembler: Arc<dyn PageAssembler>,
        config: ProcessingConfig,
    ) -> Self {
        Self {
            engine,
            assembler,
            config,
            ledger: RunLedger::new(),
        }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    pub fn ledger(&self) -> &RunLedger {
        &self.ledger
    }

    /// Bind a fresh engine session on the current thread.
    pub fn session(&self) -> Result<Box<dyn EngineSession>, ProcessError> {
        self.engine.session().map_err(|e| match e {
            EngineError::Binding(msg) => ProcessError::PdfiumBindingFailed(msg),
            other => ProcessError::Internal(other.to_string()),
        })
    }

    /// Inspect `path` without transforming it.
    pub fn inspect(&self, path: &Path) -> Result<Document, ProcessError> {
        validate_pdf(path)?;
        let session = self.session()?;
        Inspector::new(self.config.text_detector.as_ref()).inspect(session.as_ref(), path)
    }

    /// Process one document as entry `index` (1-based) of a batch of `total`,
    /// emitting progress events around it.
    pub fn process_document(&self, path: &Path, index: usize, total: usize) -> DocumentResult {
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_document_start(path, index, total);
        }

        let result = self.run(path);

        if let Some(cb) = cb {
            match &result {
                Ok(outcome) => cb.on_document_complete(path, outcome.artifacts.len()),
                Err(e) => cb.on_document_error(path, &e.to_string()),
            }
        }
        if let Err(ref e) = result {
            warn!("Failed to process {}: {}", path.display(), e);
        }

        DocumentResult {
            input: path.to_path_buf(),
            result,
        }
    }

    /// Run the full state machine for one document.
    pub fn run(&self, path: &Path) -> Result<DocumentOutcome, ProcessError> {
        let start = Instant::now();
        info!("Processing {}", path.display());

        validate_pdf(path)?;
        let session = self.session()?;
        let inspector = Inspector::new(self.config.text_detector.as_ref());
        let document = inspector.inspect(session.as_ref(), path)?;

        let (strategy, strategy_overridden) = match self.config.strategy {
            Some(s) => (s, true),
            None => (
                select(&document.report, &self.config.thresholds, SelectionMode::Initial),
                false,
            ),
        };
        let split_only = !strategy_overridden && self.config.split.is_some();
        let reason = if strategy_overridden {
            "Strategy set by caller.".to_string()
        } else if split_only {
            "Split requested by caller; selected strategy not applied.".to_string()
        } else {
            strategy.reason(&document.report)
        };
        info!("Strategy: {} ({})", strategy, reason);
        if let Some(cb) = &self.config.progress_callback {
            cb.on_strategy_selected(path, strategy, &reason);
        }

        let dispatch = match self.config.split {
            Some(granularity) if split_only => {
                self.split_original(&document, session.as_ref(), granularity)?
            }
            _ => self.dispatch(strategy, &document, session.as_ref(), &inspector)?,
        };

        if let Some(cb) = &self.config.progress_callback {
            for artifact in &dispatch.artifacts {
                cb.on_artifact(artifact);
            }
        }

        Ok(DocumentOutcome {
            input: path.to_path_buf(),
            report: document.report,
            strategy,
            strategy_overridden,
            split_only,
            artifacts: dispatch.artifacts,
            compression: dispatch.compression,
            compression_fallback: dispatch.compression_fallback,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Split the original at the caller's granularity and do nothing else.
    fn split_original(
        &self,
        document: &Document,
        session: &dyn EngineSession,
        granularity: SplitGranularity,
    ) -> Result<Dispatch, ProcessError> {
        let out_dir = self.prepare_output_dir(document)?;
        let doc = open(session, &document.path)?;
        let parts = split(doc.as_ref(), document, granularity, &out_dir, &self.ledger)?;
        Ok(Dispatch {
            artifacts: parts,
            ..Dispatch::default()
        })
    }

    fn prepare_output_dir(&self, document: &Document) -> Result<PathBuf, ProcessError> {
        let out_dir = self.config.output_dir_for(&document.path);
        std::fs::create_dir_all(&out_dir).map_err(|e| ProcessError::OutputWriteFailed {
            path: out_dir.clone(),
            source: e,
        })?;
        Ok(out_dir)
    }

    fn dispatch(
        &self,
        strategy: Strategy,
        document: &Document,
        session: &dyn EngineSession,
        inspector: &Inspector<'_>,
    ) -> Result<Dispatch, ProcessError> {
        let mut out = Dispatch::default();
        let thresholds = &self.config.thresholds;

        if strategy == Strategy::None {
            out.artifacts.push(original_artifact(document));
            return Ok(out);
        }

        let out_dir = self.prepare_output_dir(document)?;
        let doc = open(session, &document.path)?;
        let progress = self.config.progress_callback.as_ref();

        match strategy {
            Strategy::None => {}

            Strategy::ExtractText => {
                out.artifacts.push(extract_text(
                    doc.as_ref(),
                    document,
                    &out_dir,
                    &self.ledger,
                    progress,
                )?);
            }

            Strategy::Compress => {
                let artifact = self.compress_or_fallback(doc.as_ref(), document, &out_dir, &mut out);
                out.artifacts.push(artifact);
            }

            Strategy::ExtractTextAndSplit => {
                out.artifacts.push(extract_text(
                    doc.as_ref(),
                    document,
                    &out_dir,
                    &self.ledger,
                    progress,
                )?);
                let parts = split(
                    doc.as_ref(),
                    document,
                    self.granularity(thresholds.compound_split_mb),
                    &out_dir,
                    &self.ledger,
                )?;
                out.artifacts.extend(parts);
            }

            Strategy::CompressAndSplit => {
                let compressed = self.compress_or_fallback(doc.as_ref(), document, &out_dir, &mut out);

                let rechecked = inspector.inspect(session, &compressed.path)?;
                let next = select(
                    &rechecked.report,
                    thresholds,
                    SelectionMode::NoFurtherCompression,
                );
                info!(
                    "Re-checked {} at {:.2}MB: {}",
                    compressed.file_name(),
                    rechecked.report.size_mb,
                    if next == Strategy::None {
                        "keeping as-is"
                    } else {
                        "splitting further"
                    }
                );

                if next == Strategy::None {
                    out.artifacts.push(compressed);
                } else {
                    let compressed_doc = open(session, &rechecked.path)?;
                    let parts = split(
                        compressed_doc.as_ref(),
                        &rechecked,
                        self.granularity(thresholds.compound_split_mb),
                        &out_dir,
                        &self.ledger,
                    )?;
                    out.artifacts.extend(parts);
                }
            }

            Strategy::SplitAggressive => {
                let parts = split(
                    doc.as_ref(),
                    document,
                    self.granularity(thresholds.aggressive_split_mb),
                    &out_dir,
                    &self.ledger,
                )?;
                out.artifacts.extend(parts);
                if document.has_substantial_text() {
                    out.artifacts.push(extract_text(
                        doc.as_ref(),
                        document,
                        &out_dir,
                        &self.ledger,
                        progress,
                    )?);
                }
            }
        }

        Ok(out)
    }

    /// Compress, or fall back to the original document on any step failure.
    fn compress_or_fallback(
        &self,
        doc: &dyn OpenDocument,
        document: &Document,
        out_dir: &Path,
        out: &mut Dispatch,
    ) -> Artifact {
        let settings = CompressSettings {
            quality: self.config.quality,
            raster_dpi: self.config.raster_dpi,
            assembly_dpi: self.config.assembly_dpi,
        };
        match compress(
            doc,
            document,
            self.assembler.as_ref(),
            settings,
            out_dir,
            &self.ledger,
            self.config.progress_callback.as_ref(),
        ) {
            Ok((artifact, stats)) => {
                out.compression = Some(stats);
                artifact
            }
            Err(e) => {
                warn!("{}; using original file", e);
                out.compression_fallback = Some(e.reason);
                original_artifact(document)
            }
        }
    }

    /// The caller's split override, or a size target of `default_mb`.
    fn granularity(&self, default_mb: f64) -> SplitGranularity {
        self.config
            .split
            .unwrap_or(SplitGranularity::TargetMb(default_mb))
    }
}

fn original_artifact(document: &Document) -> Artifact {
    Artifact {
        path: document.path.clone(),
        size_bytes: document.size_bytes,
        kind: ArtifactKind::Original,
    }
}

fn open<'s>(
    session: &'s dyn EngineSession,
    path: &Path,
) -> Result<Box<dyn OpenDocument + 's>, ProcessError> {
    session
        .open(path)
        .map_err(|e| ProcessError::UnreadableDocument {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}
