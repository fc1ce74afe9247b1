//! Pipeline stages

use std::fmt;

/// Where a detection run is.
///
/// Runs move strictly forward through
/// `Start → Located → ColumnsSelected → Classified → Highlighted → Done`;
/// any stage can end in `Failed` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Start,
    /// Sheet read and data block found
    Located,
    /// Period columns chosen and ordered
    ColumnsSelected,
    /// Every row has a verdict
    Classified,
    /// Output workbook produced
    Highlighted,
    Done,
    /// The run stopped; carries the error message
    Failed(String),
}

impl Stage {
    /// The stage that follows on success, if any
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Start => Some(Stage::Located),
            Stage::Located => Some(Stage::ColumnsSelected),
            Stage::ColumnsSelected => Some(Stage::Classified),
            Stage::Classified => Some(Stage::Highlighted),
            Stage::Highlighted => Some(Stage::Done),
            Stage::Done | Stage::Failed(_) => None,
        }
    }

    /// Whether the run is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed(_))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Start => write!(f, "start"),
            Stage::Located => write!(f, "located"),
            Stage::ColumnsSelected => write!(f, "columns selected"),
            Stage::Classified => write!(f, "classified"),
            Stage::Highlighted => write!(f, "highlighted"),
            Stage::Done => write!(f, "done"),
            Stage::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}
