//! Prelude module - common imports for anomaly-sheets users
//!
//! ```rust
//! use anomaly_sheets::prelude::*;
//! ```

pub use crate::{
    process,
    process_with,
    AnomalyReport,
    Detection,
    Detector,
    DetectorOptions,
    Diagnostics,
    Error,
    LogObserver,
    PipelineObserver,
    Result,
    RowVerdict,
    SheetSelector,
    Stage,
    DEFAULT_SHEET_NAME,
};
