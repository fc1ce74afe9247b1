//! # anomaly-sheets-xlsx
//!
//! XLSX (Office Open XML) support for anomaly-sheets.
//!
//! - [`XlsxReader`] reads one worksheet's cached cell values into a
//!   [`RawGrid`](anomaly_sheets_core::RawGrid).
//! - [`XlsxHighlighter`] writes solid fills onto cells of an existing
//!   package, leaving everything else in it as it was.

pub mod error;
mod highlight;
mod numfmt;
mod package;
mod reader;
mod splice;
mod styles;

pub use error::{XlsxError, XlsxResult};
pub use highlight::{CellFill, XlsxHighlighter};
pub use package::SheetEntry;
pub use reader::{SheetGrid, XlsxReader};
