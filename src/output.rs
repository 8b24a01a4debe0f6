//! Result types returned to callers.

use crate::error::ProcessError;
use crate::pipeline::inspect::InspectionReport;
use crate::pipeline::select::Strategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What an artifact contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "index")]
pub enum ArtifactKind {
    /// The untouched input document.
    Original,
    /// Page-delimited UTF-8 text extraction.
    Text,
    /// Rasterised and re-encoded document.
    Compressed,
    /// One part of a split, numbered from 1.
    Part(usize),
}

/// A single output file plus its size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    #[serde(flatten)]
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / crate::BYTES_PER_MB
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Size change produced by the compress step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionStats {
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    /// Positive when the output is smaller; negative when it grew.
    pub reduction_percent: f64,
}

impl CompressionStats {
    pub fn new(original_bytes: u64, compressed_bytes: u64) -> Self {
        let reduction_percent = if original_bytes == 0 {
            0.0
        } else {
            (original_bytes as f64 - compressed_bytes as f64) / original_bytes as f64 * 100.0
        };
        Self {
            original_bytes,
            compressed_bytes,
            reduction_percent,
        }
    }
}

/// Successful processing of one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub input: PathBuf,
    pub report: InspectionReport,
    pub strategy: Strategy,
    /// `true` when the strategy came from the caller rather than the selector.
    pub strategy_overridden: bool,
    /// `true` when a caller-supplied split replaced the selected strategy:
    /// the artifacts are the original's parts and nothing else.
    #[serde(default)]
    pub split_only: bool,
    pub artifacts: Vec<Artifact>,
    /// Present when compression ran and succeeded.
    pub compression: Option<CompressionStats>,
    /// Set when compression failed and the original document was used instead.
    pub compression_fallback: Option<String>,
    pub duration_ms: u64,
}

/// Per-document entry in a batch.
#[derive(Debug)]
pub struct DocumentResult {
    pub input: PathBuf,
    pub result: Result<DocumentOutcome, ProcessError>,
}

impl DocumentResult {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a batch produced, in input order.
#[derive(Debug, Default)]
pub struct BatchOutput {
    pub documents: Vec<DocumentResult>,
    pub total_duration_ms: u64,
}

impl BatchOutput {
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.documents
            .iter()
            .filter_map(|d| d.result.as_ref().ok())
            .flat_map(|o| o.artifacts.iter())
    }

    pub fn succeeded(&self) -> usize {
        self.documents.iter().filter(|d| d.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.documents.len() - self.succeeded()
    }

    /// JSON-friendly view: errors are rendered as strings.
    pub fn to_summary(&self) -> BatchSummary {
        BatchSummary {
            documents: self
                .documents
                .iter()
                .map(|d| match &d.result {
                    Ok(outcome) => DocumentSummary {
                        input: d.input.clone(),
                        outcome: Some(outcome.clone()),
                        error: None,
                    },
                    Err(e) => DocumentSummary {
                        input: d.input.clone(),
                        outcome: None,
                        error: Some(e.to_string()),
                    },
                })
                .collect(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            total_duration_ms: self.total_duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub input: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DocumentOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub documents: Vec<DocumentSummary>,
    pub succeeded: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

/// Directory the first artifact landed in, for "saved to" messages.
pub fn common_output_dir<'a>(artifacts: &[&'a Artifact]) -> Option<&'a Path> {
    artifacts.first().and_then(|a| a.path.parent())
}
