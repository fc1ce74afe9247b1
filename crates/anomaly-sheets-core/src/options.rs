//! Detection options
//!
//! Every constant the pipeline relies on lives here with its conventional
//! default, so callers can tune a run without touching the algorithm.

use crate::color::Color;

/// Sheet name used by the monthly export
pub const DEFAULT_SHEET_NAME: &str = "TD Dados";

/// Which worksheet holds the report
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SheetSelector {
    /// A worksheet by exact name
    Named(String),
    /// The first worksheet in workbook order
    First,
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Named(DEFAULT_SHEET_NAME.to_string())
    }
}

/// Options for finding the data block
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocatorOptions {
    /// Column-A value marking the first data row
    pub sentinel: String,
    /// Column-A value that, directly above the sentinel, pushes the header
    /// one more row up
    pub two_row_header_marker: String,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            sentinel: "ABEL".to_string(),
            two_row_header_marker: "UNIDADE 1".to_string(),
        }
    }
}

/// Options for choosing the period columns
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodOptions {
    /// Lower-case substrings that disqualify a column label
    pub excluded_labels: Vec<String>,
    /// Keep at most this many of the most recent periods
    pub max_periods: usize,
}

impl Default for PeriodOptions {
    fn default() -> Self {
        Self {
            excluded_labels: vec!["total geral".to_string(), "total général".to_string()],
            max_periods: 30,
        }
    }
}

/// Options for row classification
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifierOptions {
    /// Neighbor count as a fraction of the valid points
    pub neighbor_fraction: f64,
    /// Lower bound on the neighbor count
    pub min_neighbors: usize,
    /// Upper bound on the neighbor count
    pub max_neighbors: usize,
    /// Expected share of outliers; sets the decision offset
    pub contamination: f64,
    /// A missing last value is anomalous only below this missing fraction
    pub missing_threshold: f64,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            neighbor_fraction: 0.15,
            min_neighbors: 2,
            max_neighbors: 50,
            contamination: 0.05,
            missing_threshold: 0.2,
        }
    }
}

impl ClassifierOptions {
    /// Neighbor count for a series with `valid_points` usable values:
    /// `floor(fraction × n)` clamped to `[min, max]`.
    pub fn neighbor_count(&self, valid_points: usize) -> usize {
        let raw = (self.neighbor_fraction * valid_points as f64).floor() as usize;
        raw.min(self.max_neighbors).max(self.min_neighbors)
    }
}

/// Options for the highlight pass
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HighlightOptions {
    /// 1-based column that receives the fill (2 = B)
    pub column: u16,
    /// Fill for rows whose latest value is a density outlier
    pub density_fill: Color,
    /// Fill for rows whose latest value is unexpectedly missing
    pub missing_fill: Color,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            column: 2,
            density_fill: Color::YELLOW,
            missing_fill: Color::RED,
        }
    }
}

/// All options for one detection run
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorOptions {
    /// Worksheet to analyze and highlight
    pub sheet: SheetSelector,
    /// Data block location
    pub locator: LocatorOptions,
    /// Period column selection
    pub periods: PeriodOptions,
    /// Row classification
    pub classifier: ClassifierOptions,
    /// Highlight coordinates and colors
    pub highlight: HighlightOptions,
}
