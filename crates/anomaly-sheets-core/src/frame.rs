//! Structured view of the data block

use crate::cell::CellValue;
use crate::grid::RawGrid;
use crate::locate::DataBlock;

/// The data block as a table: one row per entity, one column per header
/// label.
///
/// The header row supplies the labels. The first grid column becomes the
/// entity index and the last grid column (the grand total) is dropped by
/// position, whatever its label says. Rows are every grid row below the
/// header, so logical row `r` lives at grid row `header_row + 1 + r`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    headers: Vec<CellValue>,
    labels: Vec<String>,
    entities: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl DataFrame {
    /// Slice the located block out of the grid.
    pub fn from_grid(grid: &RawGrid, block: &DataBlock) -> Self {
        let width = grid.width();
        // Columns 1..width-1: skip the index and the trailing total.
        let data_cols = 1..width.saturating_sub(1).max(1);

        let headers: Vec<CellValue> = data_cols
            .clone()
            .map(|col| grid.get(block.header_row, col).clone())
            .collect();
        let labels = headers.iter().map(CellValue::to_string).collect();

        let first_data_row = block.header_row + 1;
        let (entities, rows) = (first_data_row..grid.row_count())
            .map(|row| {
                let entity = grid.get(row, 0).to_string();
                let values = data_cols
                    .clone()
                    .map(|col| grid.get(row, col).clone())
                    .collect();
                (entity, values)
            })
            .unzip();

        Self {
            headers,
            labels,
            entities,
            rows,
        }
    }

    /// Build a frame directly from parts; rows shorter than `labels` read
    /// as empty in the missing positions.
    pub fn from_parts(
        labels: Vec<String>,
        entities: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    ) -> Self {
        Self {
            headers: labels.iter().cloned().map(CellValue::Text).collect(),
            labels,
            entities,
            rows,
        }
    }

    /// Header cells, in sheet order
    pub fn headers(&self) -> &[CellValue] {
        &self.headers
    }

    /// Column labels, in sheet order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of entity rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Entity label (column-A value) of a logical row
    pub fn entity(&self, row: usize) -> Option<&str> {
        self.entities.get(row).map(String::as_str)
    }

    /// Value at a logical row and column; out of range reads as empty
    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Numeric series of a row over the given columns, in the given order.
    ///
    /// Non-numeric cells come back as `None`.
    pub fn numeric_series(&self, row: usize, columns: &[usize]) -> Vec<Option<f64>> {
        columns
            .iter()
            .map(|&col| self.value(row, col).as_number())
            .collect()
    }
}
