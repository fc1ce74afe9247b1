//! Headerless view of a worksheet

use crate::cell::{CellAddress, CellValue};

/// A worksheet read with no header interpretation: rows × columns of
/// values, 0-indexed, possibly ragged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<CellValue>>,
}

impl RawGrid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from rows of values
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Set a single cell, growing the grid as needed
    pub fn set(&mut self, addr: CellAddress, value: CellValue) {
        let row = addr.row as usize;
        let col = addr.col as usize;
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize_with(col + 1, CellValue::default);
        }
        cells[col] = value;
    }

    /// Get a cell; out-of-range coordinates read as empty
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Number of rows (including trailing rows that only hold blanks)
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of a single row
    pub fn row_width(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, Vec::len)
    }

    /// Width of the widest row
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Iterate over the values of one column, top to bottom
    pub fn column(&self, col: usize) -> impl Iterator<Item = &CellValue> + '_ {
        (0..self.rows.len()).map(move |row| self.get(row, col))
    }

    /// Whether the grid holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
