//! Configuration types for document processing.
//!
//! All processing behaviour is controlled through [`ProcessingConfig`], built
//! via its [`ProcessingConfigBuilder`]. The size thresholds that drive strategy
//! selection live in [`Thresholds`] so a run can override them and tests can
//! exercise the selector with arbitrary boundaries.

use crate::engine::{PageAssembler, PdfEngine};
use crate::error::ProcessError;
use crate::pipeline::inspect::{FirstPageTextDetector, TextDetector};
use crate::pipeline::select::Strategy;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Size boundaries (in MiB) used by the strategy selector and orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// At or below this size a document is used as-is. Default: 10.
    pub small_mb: f64,
    /// Upper bound for single-step strategies. Default: 30.
    pub medium_mb: f64,
    /// Upper bound for compound strategies; above it splitting is aggressive. Default: 100.
    pub large_mb: f64,
    /// Compressed output above this size is split further. Default: 15.
    pub recheck_mb: f64,
    /// Part size for the compound strategies. Default: 10.
    pub compound_split_mb: f64,
    /// Part size for `split_aggressive`. Default: 8.
    pub aggressive_split_mb: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            small_mb: 10.0,
            medium_mb: 30.0,
            large_mb: 100.0,
            recheck_mb: 15.0,
            compound_split_mb: 10.0,
            aggressive_split_mb: 8.0,
        }
    }
}

impl Thresholds {
    fn validate(&self) -> Result<(), ProcessError> {
        let all = [
            ("small", self.small_mb),
            ("medium", self.medium_mb),
            ("large", self.large_mb),
            ("recheck", self.recheck_mb),
            ("compound split", self.compound_split_mb),
            ("aggressive split", self.aggressive_split_mb),
        ];
        for (name, v) in all {
            if !v.is_finite() || v <= 0.0 {
                return Err(ProcessError::InvalidConfig(format!(
                    "{name} threshold must be a positive number of MB, got {v}"
                )));
            }
        }
        if self.small_mb > self.medium_mb || self.medium_mb > self.large_mb {
            return Err(ProcessError::InvalidConfig(format!(
                "thresholds must satisfy small ≤ medium ≤ large, got {} / {} / {}",
                self.small_mb, self.medium_mb, self.large_mb
            )));
        }
        Ok(())
    }
}

/// How a split step partitions pages when the caller overrides the default target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitGranularity {
    /// Fixed number of pages per part.
    Pages(usize),
    /// Approximate part size in MiB, derived from the average page size.
    TargetMb(f64),
}

/// Configuration for processing one or more documents.
///
/// # Example
/// ```rust
/// use pdf_autochunk::{ProcessingConfig, Strategy};
///
/// let config = ProcessingConfig::builder()
///     .quality(50)
///     .strategy(Strategy::Compress)
///     .build()
///     .unwrap();
/// assert_eq!(config.quality, 50);
/// ```
#[derive(Clone)]
pub struct ProcessingConfig {
    /// Size boundaries for strategy selection.
    pub thresholds: Thresholds,

    /// Fixed strategy. `None` lets the selector choose from the inspection report.
    pub strategy: Option<Strategy>,

    /// JPEG quality used by the compress step (1–100). Default: 40.
    pub quality: u8,

    /// Rasterisation resolution for the compress step. Default: 150.
    pub raster_dpi: u32,

    /// Resolution the compressed pages are laid out at. Default: 100.
    ///
    /// Lower than `raster_dpi`, so pages come out physically larger but
    /// carry the same pixels.
    pub assembly_dpi: u32,

    /// Caller-supplied split.
    ///
    /// With no fixed `strategy`, every document is split into parts at this
    /// granularity and nothing else runs. With a fixed splitting strategy it
    /// replaces that strategy's default part size. A fixed strategy that
    /// never splits is rejected by [`ProcessingConfigBuilder::build`].
    pub split: Option<SplitGranularity>,

    /// Output directory. `None` picks a sibling of each input (see [`ProcessingConfig::output_dir_for`]).
    pub output_dir: Option<PathBuf>,

    /// Documents processed at once in a batch. Default: 1 (sequential).
    pub concurrency: usize,

    /// Text-presence heuristic used by the inspector.
    pub text_detector: Arc<dyn TextDetector>,

    /// Pre-constructed engine. `None` binds pdfium.
    pub engine: Option<Arc<dyn PdfEngine>>,

    /// Pre-constructed page assembler. `None` uses [`crate::engine::LopdfAssembler`].
    pub assembler: Option<Arc<dyn PageAssembler>>,

    /// Receives batch, document and step events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            strategy: None,
            quality: 40,
            raster_dpi: 150,
            assembly_dpi: 100,
            split: None,
            output_dir: None,
            concurrency: 1,
            text_detector: Arc::new(FirstPageTextDetector::default()),
            engine: None,
            assembler: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ProcessingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingConfig")
            .field("thresholds", &self.thresholds)
            .field("strategy", &self.strategy)
            .field("quality", &self.quality)
            .field("raster_dpi", &self.raster_dpi)
            .field("assembly_dpi", &self.assembly_dpi)
            .field("split", &self.split)
            .field("output_dir", &self.output_dir)
            .field("concurrency", &self.concurrency)
            .field("text_detector", &self.text_detector.name())
            .field("engine", &self.engine.as_ref().map(|_| "<dyn PdfEngine>"))
            .field("assembler", &self.assembler.as_ref().map(|_| "<dyn PageAssembler>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ProcessingConfig {
    /// Create a new builder for `ProcessingConfig`.
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder {
            config: Self::default(),
        }
    }

    /// Output directory for `input`.
    ///
    /// An explicit `output_dir` always wins. Otherwise a split-granularity
    /// override writes to `<parent>/<stem>_split`, and everything else to
    /// `<parent>/processed`.
    pub fn output_dir_for(&self, input: &std::path::Path) -> PathBuf {
        if let Some(ref dir) = self.output_dir {
            return dir.clone();
        }
        let parent = input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        if self.split.is_some() {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "document".to_string());
            parent.join(format!("{stem}_split"))
        } else {
            parent.join("processed")
        }
    }
}

/// Builder for [`ProcessingConfig`].
pub struct ProcessingConfigBuilder {
    config: ProcessingConfig,
}

impl fmt::Debug for ProcessingConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ProcessingConfigBuilder {
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = Some(strategy);
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.config.quality = quality.clamp(1, 100);
        self
    }

    pub fn raster_dpi(mut self, dpi: u32) -> Self {
        self.config.raster_dpi = dpi.clamp(72, 600);
        self
    }

    pub fn assembly_dpi(mut self, dpi: u32) -> Self {
        self.config.assembly_dpi = dpi.max(1);
        self
    }

    pub fn split(mut self, granularity: SplitGranularity) -> Self {
        self.config.split = Some(granularity);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn text_detector(mut self, detector: Arc<dyn TextDetector>) -> Self {
        self.config.text_detector = detector;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn PdfEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn assembler(mut self, assembler: Arc<dyn PageAssembler>) -> Self {
        self.config.assembler = Some(assembler);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessingConfig, ProcessError> {
        let c = &self.config;
        c.thresholds.validate()?;
        match c.split {
            Some(SplitGranularity::Pages(0)) => {
                return Err(ProcessError::InvalidConfig(
                    "split page count must be ≥ 1".into(),
                ));
            }
            Some(SplitGranularity::TargetMb(mb)) if !mb.is_finite() || mb <= 0.0 => {
                return Err(ProcessError::InvalidConfig(format!(
                    "split size must be a positive number of MB, got {mb}"
                )));
            }
            _ => {}
        }
        if let (Some(strategy), Some(_)) = (c.strategy, c.split) {
            if !strategy.splits() {
                return Err(ProcessError::InvalidConfig(format!(
                    "a split size or page count has no effect with strategy '{strategy}'; \
                     drop the strategy to split the original, or pick a splitting one"
                )));
            }
        }
        if c.quality == 0 || c.quality > 100 {
            return Err(ProcessError::InvalidConfig(format!(
                "quality must be 1–100, got {}",
                c.quality
            )));
        }
        Ok(self.config)
    }
}
