//! Finding the data block inside an unstructured sheet
//!
//! The export carries a free-form preamble. The data block starts at the
//! first row whose column-A value is the sentinel; the header sits one row
//! above it, or two rows above when the row in between is the
//! "UNIDADE 1" sub-header.

use crate::error::{Error, Result};
use crate::grid::RawGrid;
use crate::options::LocatorOptions;

/// Where the data block lives in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataBlock {
    /// 0-based row holding the sentinel
    pub sentinel_row: usize,
    /// How many rows above the sentinel the header lives (1 or 2)
    pub header_offset: usize,
    /// 0-based header row
    pub header_row: usize,
}

impl DataBlock {
    /// Offset that turns a 0-based data row index (rows after the header)
    /// into a 1-based spreadsheet row number.
    pub fn excel_row_offset(&self) -> usize {
        self.header_row + 2
    }
}

/// Locate the header and data start via the sentinel in column A.
pub fn locate_data_block(grid: &RawGrid, options: &LocatorOptions) -> Result<DataBlock> {
    let sentinel = options.sentinel.trim().to_uppercase();
    let sentinel_row = grid
        .column(0)
        .position(|v| v.marker_key() == sentinel)
        .ok_or_else(|| Error::SentinelNotFound {
            marker: options.sentinel.clone(),
        })?;

    if sentinel_row == 0 {
        return Err(Error::NoHeaderAboveSentinel {
            marker: options.sentinel.clone(),
        });
    }

    let marker = options.two_row_header_marker.trim().to_uppercase();
    let above = grid.get(sentinel_row - 1, 0).marker_key();
    let header_offset = if above == marker { 2 } else { 1 };
    if header_offset > sentinel_row {
        return Err(Error::NoHeaderAboveSentinel {
            marker: options.sentinel.clone(),
        });
    }

    let block = DataBlock {
        sentinel_row,
        header_offset,
        header_row: sentinel_row - header_offset,
    };
    log::debug!(
        "sentinel '{}' at row {}, header at row {}",
        options.sentinel,
        block.sentinel_row,
        block.header_row
    );
    Ok(block)
}
