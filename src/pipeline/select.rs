//! Strategy selection: a pure mapping from an inspection report to a plan.
//!
//! No I/O, no hidden state. The same report, thresholds and mode always give
//! the same [`Strategy`].

use crate::config::Thresholds;
use crate::pipeline::inspect::InspectionReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The named transformation plan for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Small enough already; the original is the only artifact.
    None,
    /// Text-heavy, medium size: extract text.
    ExtractText,
    /// Image-heavy, medium size: re-encode pages at lower quality.
    Compress,
    /// Text-heavy, large: extract text and split the original.
    ExtractTextAndSplit,
    /// Image-heavy, large: compress, then split the result if still too big.
    CompressAndSplit,
    /// Very large: split into small parts (plus text when the document has it).
    SplitAggressive,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::None,
        Strategy::ExtractText,
        Strategy::Compress,
        Strategy::ExtractTextAndSplit,
        Strategy::CompressAndSplit,
        Strategy::SplitAggressive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::None => "none",
            Strategy::ExtractText => "extract_text",
            Strategy::Compress => "compress",
            Strategy::ExtractTextAndSplit => "extract_text_and_split",
            Strategy::CompressAndSplit => "compress_and_split",
            Strategy::SplitAggressive => "split_aggressive",
        }
    }

    /// Whether this strategy can produce split parts.
    pub fn splits(&self) -> bool {
        matches!(
            self,
            Strategy::ExtractTextAndSplit | Strategy::CompressAndSplit | Strategy::SplitAggressive
        )
    }

    /// Human-readable explanation of why this strategy fits a report.
    pub fn reason(&self, report: &InspectionReport) -> String {
        match self {
            Strategy::None => format!(
                "File is small enough ({:.1}MB) to use as-is.",
                report.size_mb
            ),
            Strategy::ExtractText => {
                "Text-heavy document; extracting the text is the most compact form.".to_string()
            }
            Strategy::Compress => "Image-heavy document; trying image compression.".to_string(),
            Strategy::ExtractTextAndSplit => format!(
                "Large file ({:.1}MB); extracting text and splitting.",
                report.size_mb
            ),
            Strategy::CompressAndSplit => {
                "Large image-heavy document; compressing, then splitting if needed.".to_string()
            }
            Strategy::SplitAggressive => format!(
                "Very large file ({:.1}MB); splitting into small parts.",
                report.size_mb
            ),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase().replace('-', "_");
        Strategy::ALL
            .into_iter()
            .find(|st| st.as_str() == normalised)
            .ok_or_else(|| {
                format!(
                    "unknown strategy '{s}' (expected one of: {})",
                    Strategy::ALL.map(|st| st.as_str()).join(", ")
                )
            })
    }
}

/// Which decision table the selector applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Full table for an original input document.
    #[default]
    Initial,
    /// Re-selection for an intermediate artifact that has already been
    /// compressed. Never yields a compressing strategy: the answer is either
    /// [`Strategy::None`] (keep it) or [`Strategy::SplitAggressive`] (split it).
    NoFurtherCompression,
}

/// Pick a strategy. First match wins; every boundary is inclusive on the
/// lower strategy.
///
/// | size (MB)        | text  | strategy                 |
/// |------------------|-------|--------------------------|
/// | ≤ small          | any   | `None`                   |
/// | (small, medium]  | yes   | `ExtractText`            |
/// | (small, medium]  | no    | `Compress`               |
/// | (medium, large]  | yes   | `ExtractTextAndSplit`    |
/// | (medium, large]  | no    | `CompressAndSplit`       |
/// | > large          | any   | `SplitAggressive`        |
pub fn select(report: &InspectionReport, thresholds: &Thresholds, mode: SelectionMode) -> Strategy {
    let size = report.size_mb;

    if mode == SelectionMode::NoFurtherCompression {
        return if size <= thresholds.recheck_mb {
            Strategy::None
        } else {
            Strategy::SplitAggressive
        };
    }

    if size <= thresholds.small_mb {
        Strategy::None
    } else if size <= thresholds.medium_mb {
        if report.has_text {
            Strategy::ExtractText
        } else {
            Strategy::Compress
        }
    } else if size <= thresholds.large_mb {
        if report.has_text {
            Strategy::ExtractTextAndSplit
        } else {
            Strategy::CompressAndSplit
        }
    } else {
        Strategy::SplitAggressive
    }
}
