//! # anomaly-sheets-core
//!
//! Pure, I/O-free detection logic for anomaly-sheets.
//!
//! The pipeline stages live in their own modules:
//! - [`locate`] - find the header and data start via the sentinel in column A
//! - [`frame`] - slice the data block into a [`DataFrame`]
//! - [`period`] - select and chronologically order the period columns
//! - [`classify`] - classify every row as normal, missing- or density-anomaly
//! - [`lof`] - the local outlier factor used by the density test
//!
//! ## Example
//!
//! ```rust
//! use anomaly_sheets_core::{
//!     classify_frame, locate_data_block, select_periods, CellValue, DataFrame, DetectorOptions,
//!     RawGrid, RowVerdict,
//! };
//!
//! let grid = RawGrid::from_rows(vec![
//!     vec!["Entity".into(), "2024-01".into(), "2024-02".into(), "2024-03".into(), "Total".into()],
//!     vec!["ABEL".into(), 10.into(), 11.into(), CellValue::Empty, 21.into()],
//! ]);
//! let options = DetectorOptions::default();
//!
//! let block = locate_data_block(&grid, &options.locator).unwrap();
//! let frame = DataFrame::from_grid(&grid, &block);
//! let periods = select_periods(frame.headers(), &options.periods);
//! let classification = classify_frame(&frame, &periods, &options.classifier);
//!
//! // 1 of 3 periods missing is not "otherwise populated"
//! assert_eq!(classification.verdict(0), Some(RowVerdict::Normal));
//! ```

pub mod cell;
pub mod classify;
pub mod color;
pub mod error;
pub mod frame;
pub mod grid;
pub mod locate;
pub mod lof;
pub mod options;
pub mod period;

// Re-exports for convenience
pub use cell::{CellAddress, CellValue};
pub use classify::{
    classify_frame, classify_series, missing_fraction, Classification, RowAssessment, RowVerdict,
};
pub use color::Color;
pub use error::{Error, Result};
pub use frame::DataFrame;
pub use grid::RawGrid;
pub use locate::{locate_data_block, DataBlock};
pub use lof::{Label, LocalOutlierFactor, LofFit};
pub use options::{
    ClassifierOptions, DetectorOptions, HighlightOptions, LocatorOptions, PeriodOptions,
    SheetSelector, DEFAULT_SHEET_NAME,
};
pub use period::{
    parse_year_month, select_periods, PeriodColumn, PeriodLabel, SelectedPeriods,
};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;
