//! # anomaly-sheets
//!
//! Flags the latest period of every row in a monthly report workbook.
//!
//! The workbook's analysis sheet holds one row per entity and one column per
//! month. A sentinel (`ABEL`) in column A marks where the data starts; the
//! header row sits right above it. For every row, the latest month is
//! compared with the rest of its own series:
//!
//! - **missing anomaly** (red): the latest value is absent although the row
//!   is otherwise well populated;
//! - **density anomaly** (yellow): the latest value is isolated from the
//!   rest of the series by a local outlier factor test.
//!
//! Flagged rows get a solid fill in column B. Nothing else in the workbook
//! changes.
//!
//! ## Example
//!
//! ```rust,no_run
//! let input = std::fs::read("relatorio.xlsx")?;
//! let output = anomaly_sheets::process(&input)?;
//! std::fs::write("relatorio_highlighted.xlsx", output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod detector;
pub mod observer;
pub mod prelude;
pub mod report;
pub mod stage;

pub use detector::{Detection, Detector};
pub use observer::{Diagnostics, LogObserver, NoopObserver, PipelineObserver};
pub use report::{AnomalyReport, HighlightedCell, RowReport};
pub use stage::Stage;

// Re-export core types
pub use anomaly_sheets_core::{
    CellAddress, CellValue, ClassifierOptions, Color, DataBlock, DetectorOptions, Error,
    HighlightOptions, LocatorOptions, PeriodColumn, PeriodLabel, PeriodOptions, Result,
    RowAssessment, RowVerdict, SelectedPeriods, SheetSelector, DEFAULT_SHEET_NAME,
};

// Re-export I/O types
pub use anomaly_sheets_xlsx::{CellFill, XlsxError, XlsxHighlighter, XlsxReader};

/// Highlight the anomalies of a workbook with the default options.
///
/// Returns the input bytes unchanged when nothing is flagged.
pub fn process(input: &[u8]) -> Result<Vec<u8>> {
    process_with(input, &DetectorOptions::default())
}

/// Highlight the anomalies of a workbook with custom options.
pub fn process_with(input: &[u8], options: &DetectorOptions) -> Result<Vec<u8>> {
    Detector::with_options(options.clone())
        .run(input)
        .map(|detection| detection.bytes)
}
