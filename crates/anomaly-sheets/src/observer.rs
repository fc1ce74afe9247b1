//! Run observation
//!
//! A [`PipelineObserver`] sees every stage transition and intermediate
//! result of a detection run. Observers only watch: nothing they do can
//! change the output of the run.

use anomaly_sheets_core::{DataBlock, SelectedPeriods};
use log::Level;

use crate::report::{AnomalyReport, HighlightedCell, RowReport};
use crate::stage::Stage;

/// Hooks called by [`Detector`](crate::Detector) while it runs.
///
/// Every hook has a no-op default, so implementors pick what they need.
pub trait PipelineObserver {
    /// The run entered `stage`
    fn on_stage(&mut self, _stage: &Stage) {}

    /// The data block was found on `sheet`
    fn on_located(&mut self, _sheet: &str, _block: &DataBlock) {}

    /// Period columns were selected; `periods` may be empty
    fn on_periods(&mut self, _periods: &SelectedPeriods) {}

    /// A row received its verdict
    fn on_row(&mut self, _row: &RowReport) {}

    /// A cell is about to be filled
    fn on_highlight(&mut self, _cell: &HighlightedCell) {}

    /// The run completed
    fn on_finished(&mut self, _report: &AnomalyReport) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// How much a [`LogObserver`] reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Diagnostics {
    /// Nothing but failures
    Quiet,
    /// Where the data was found and what was flagged
    #[default]
    Summary,
    /// Also every stage transition and every row's figures
    Verbose,
}

/// Forwards run events to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver {
    pub diagnostics: Diagnostics,
}

impl LogObserver {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    fn summary(&self) -> bool {
        self.diagnostics != Diagnostics::Quiet
    }

    fn verbose(&self) -> bool {
        self.diagnostics == Diagnostics::Verbose
    }
}

impl PipelineObserver for LogObserver {
    fn on_stage(&mut self, stage: &Stage) {
        match stage {
            Stage::Failed(reason) => log::error!("detection failed: {}", reason),
            _ if self.verbose() => log::info!("stage: {}", stage),
            _ => log::trace!("stage: {}", stage),
        }
    }

    fn on_located(&mut self, sheet: &str, block: &DataBlock) {
        if self.summary() {
            log::info!(
                "sheet '{}': sentinel in row {}, header in row {}",
                sheet,
                block.sentinel_row + 1,
                block.header_row + 1
            );
        }
    }

    fn on_periods(&mut self, periods: &SelectedPeriods) {
        if periods.is_empty() {
            if self.summary() {
                log::warn!("no period columns found; every row is normal");
            }
            return;
        }
        if self.summary() {
            let columns = periods.columns();
            log::info!(
                "{} period columns selected ({} .. {})",
                columns.len(),
                columns.first().map_or("", |c| c.label.as_str()),
                columns.last().map_or("", |c| c.label.as_str())
            );
        }
    }

    fn on_row(&mut self, row: &RowReport) {
        if !self.verbose() {
            return;
        }
        let level = if row.verdict().is_anomaly() {
            Level::Info
        } else {
            Level::Debug
        };
        let a = &row.assessment;
        log::log!(
            level,
            "row {} ({}): {:?}, missing {:.3}, {} points, outlier factor {}",
            row.index,
            row.entity,
            a.verdict,
            a.missing_fraction,
            a.valid_points,
            a.outlier_factor
                .map_or_else(|| "-".to_string(), |f| format!("{:.3}", f))
        );
    }

    fn on_highlight(&mut self, cell: &HighlightedCell) {
        if self.verbose() {
            log::debug!("fill {} with {} ({:?})", cell.cell, cell.color, cell.verdict);
        }
    }

    fn on_finished(&mut self, report: &AnomalyReport) {
        if self.summary() {
            log::info!("{}", report.summary());
        }
    }
}
