//! Per-row anomaly classification
//!
//! Each row is judged on its own numeric series over the selected periods:
//!
//! 1. If the latest value is missing while the row is otherwise well
//!    populated (missing fraction below the threshold), the gap itself is the
//!    anomaly.
//! 2. Otherwise, if the latest value is present, the series is turned into
//!    `(position, value)` points and the latest point is tested with the
//!    local outlier factor.
//!
//! Rows are independent, so the outcome never depends on processing order.

use crate::frame::DataFrame;
use crate::lof::LocalOutlierFactor;
use crate::options::ClassifierOptions;
use crate::period::SelectedPeriods;

/// Outcome for one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RowVerdict {
    /// Nothing unusual about the latest period
    Normal,
    /// The latest value is missing in an otherwise populated row
    MissingAnomaly,
    /// The latest value is locally isolated from the rest of the series
    DensityAnomaly,
}

impl RowVerdict {
    /// Whether the row should be highlighted
    pub fn is_anomaly(&self) -> bool {
        !matches!(self, RowVerdict::Normal)
    }
}

/// Verdict plus the figures that led to it
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowAssessment {
    pub verdict: RowVerdict,
    /// Share of selected periods with no numeric value
    pub missing_fraction: f64,
    /// Number of numeric values in the series
    pub valid_points: usize,
    /// Outlier factor of the latest point when the density test ran
    pub outlier_factor: Option<f64>,
}

impl RowAssessment {
    fn normal(missing_fraction: f64, valid_points: usize) -> Self {
        Self {
            verdict: RowVerdict::Normal,
            missing_fraction,
            valid_points,
            outlier_factor: None,
        }
    }
}

/// Share of `None` entries; an empty series has nothing missing.
pub fn missing_fraction(series: &[Option<f64>]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let missing = series.iter().filter(|v| v.is_none()).count();
    missing as f64 / series.len() as f64
}

/// Classify one chronologically ordered series.
pub fn classify_series(series: &[Option<f64>], options: &ClassifierOptions) -> RowAssessment {
    let fraction = missing_fraction(series);

    let Some(last) = series.last() else {
        // No periods at all: nothing to assess.
        return RowAssessment::normal(fraction, 0);
    };

    let points: Vec<[f64; 2]> = series
        .iter()
        .enumerate()
        .filter_map(|(x, y)| y.map(|y| [x as f64, y]))
        .collect();

    if last.is_none() {
        let verdict = if fraction < options.missing_threshold {
            RowVerdict::MissingAnomaly
        } else {
            RowVerdict::Normal
        };
        return RowAssessment {
            verdict,
            ..RowAssessment::normal(fraction, points.len())
        };
    }

    if points.len() < 2 {
        return RowAssessment::normal(fraction, points.len());
    }

    let n_neighbors = options.neighbor_count(points.len());
    let fit = LocalOutlierFactor::new(n_neighbors, options.contamination).fit_predict(&points);
    let last_index = points.len() - 1;

    RowAssessment {
        verdict: if fit.is_outlier(last_index) {
            RowVerdict::DensityAnomaly
        } else {
            RowVerdict::Normal
        },
        missing_fraction: fraction,
        valid_points: points.len(),
        outlier_factor: fit.negative_outlier_factor.get(last_index).map(|s| -s),
    }
}

/// Verdicts for every row of a frame
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Classification {
    rows: Vec<RowAssessment>,
}

impl Classification {
    /// Per-row assessments, in frame order
    pub fn rows(&self) -> &[RowAssessment] {
        &self.rows
    }

    /// Verdict of one logical row
    pub fn verdict(&self, row: usize) -> Option<RowVerdict> {
        self.rows.get(row).map(|a| a.verdict)
    }

    /// Ascending logical indices of density anomalies
    pub fn density_rows(&self) -> Vec<usize> {
        self.rows_with(RowVerdict::DensityAnomaly)
    }

    /// Ascending logical indices of missing anomalies
    pub fn missing_rows(&self) -> Vec<usize> {
        self.rows_with(RowVerdict::MissingAnomaly)
    }

    /// Whether any row is anomalous
    pub fn has_anomalies(&self) -> bool {
        self.rows.iter().any(|a| a.verdict.is_anomaly())
    }

    fn rows_with(&self, verdict: RowVerdict) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, a)| a.verdict == verdict)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Classify every row of `frame` over `periods`.
pub fn classify_frame(
    frame: &DataFrame,
    periods: &SelectedPeriods,
    options: &ClassifierOptions,
) -> Classification {
    let positions = periods.positions();
    let rows = (0..frame.row_count())
        .map(|row| classify_series(&frame.numeric_series(row, &positions), options))
        .collect();
    Classification { rows }
}
