//! Detection results

use anomaly_sheets_core::{
    CellAddress, Classification, Color, DataBlock, DataFrame, Error, HighlightOptions, Result,
    RowAssessment, RowVerdict,
};

/// One logical row and its verdict
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowReport {
    /// 0-based index among the rows below the header
    pub index: usize,
    /// Column A label of the row
    pub entity: String,
    pub assessment: RowAssessment,
}

impl RowReport {
    pub fn verdict(&self) -> RowVerdict {
        self.assessment.verdict
    }
}

/// A cell that received a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HighlightedCell {
    /// Logical row the cell belongs to
    pub row: usize,
    pub cell: CellAddress,
    pub verdict: RowVerdict,
    pub color: Color,
}

/// Everything a detection run found
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnomalyReport {
    /// Worksheet that was analyzed
    pub sheet: String,
    pub block: DataBlock,
    /// Selected period labels, oldest first
    pub periods: Vec<String>,
    pub rows: Vec<RowReport>,
    /// Filled cells, density anomalies first, each group by ascending row
    pub highlights: Vec<HighlightedCell>,
}

impl AnomalyReport {
    /// Offset from a logical row index to its 1-based sheet row
    pub fn excel_row_offset(&self) -> usize {
        self.block.excel_row_offset()
    }

    /// Logical indices of density anomalies, ascending
    pub fn density_rows(&self) -> Vec<usize> {
        self.rows_with(RowVerdict::DensityAnomaly)
    }

    /// Logical indices of missing anomalies, ascending
    pub fn missing_rows(&self) -> Vec<usize> {
        self.rows_with(RowVerdict::MissingAnomaly)
    }

    pub fn has_anomalies(&self) -> bool {
        !self.highlights.is_empty()
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        format!(
            "sheet '{}': {} rows over {} periods, {} density anomalies, {} missing anomalies",
            self.sheet,
            self.rows.len(),
            self.periods.len(),
            self.density_rows().len(),
            self.missing_rows().len()
        )
    }

    fn rows_with(&self, verdict: RowVerdict) -> Vec<usize> {
        self.rows
            .iter()
            .filter(|r| r.verdict() == verdict)
            .map(|r| r.index)
            .collect()
    }
}

/// Per-row reports joined with their entity labels
pub(crate) fn row_reports(frame: &DataFrame, classification: &Classification) -> Vec<RowReport> {
    classification
        .rows()
        .iter()
        .enumerate()
        .map(|(index, assessment)| RowReport {
            index,
            entity: frame.entity(index).unwrap_or_default().to_string(),
            assessment: assessment.clone(),
        })
        .collect()
}

/// Cells to fill: logical row `r` maps to sheet row `r + header_row + 2`
/// in the configured column.
pub(crate) fn plan_highlights(
    block: &DataBlock,
    classification: &Classification,
    options: &HighlightOptions,
) -> Result<Vec<HighlightedCell>> {
    let groups = [
        (RowVerdict::DensityAnomaly, classification.density_rows(), options.density_fill),
        (RowVerdict::MissingAnomaly, classification.missing_rows(), options.missing_fill),
    ];

    let mut cells = Vec::new();
    for (verdict, rows, color) in groups {
        for row in rows {
            let excel_row = u32::try_from(row + block.excel_row_offset())
                .map_err(|_| Error::other(format!("row {} is beyond the sheet", row)))?;
            let cell = CellAddress::from_excel(excel_row, options.column).ok_or_else(|| {
                Error::InvalidAddress(format!(
                    "row {}, column {} is outside the sheet",
                    excel_row, options.column
                ))
            })?;
            cells.push(HighlightedCell {
                row,
                cell,
                verdict,
                color,
            });
        }
    }
    Ok(cells)
}
