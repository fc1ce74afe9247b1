//! The detection pipeline

use anomaly_sheets_core::{
    classify_frame, locate_data_block, select_periods, DataFrame, DetectorOptions, Result,
};
use anomaly_sheets_xlsx::{CellFill, XlsxHighlighter, XlsxReader};

use crate::observer::{LogObserver, PipelineObserver};
use crate::report::{plan_highlights, row_reports, AnomalyReport};
use crate::stage::Stage;

/// Output of a successful run
#[derive(Debug, Clone)]
pub struct Detection {
    /// The highlighted workbook
    pub bytes: Vec<u8>,
    pub report: AnomalyReport,
}

/// Runs the locate → select → classify → highlight pipeline over workbook
/// bytes.
///
/// ```rust,no_run
/// use anomaly_sheets::{Detector, Diagnostics, LogObserver};
///
/// let input = std::fs::read("relatorio.xlsx")?;
/// let mut detector = Detector::new().with_observer(LogObserver::new(Diagnostics::Verbose));
/// let detection = detector.run(&input)?;
/// println!("{}", detection.report.summary());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Detector {
    options: DetectorOptions,
    observer: Box<dyn PipelineObserver>,
    stage: Stage,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("options", &self.options)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

impl Detector {
    /// Detector with default options, logging a summary through `log`
    pub fn new() -> Self {
        Self::with_options(DetectorOptions::default())
    }

    pub fn with_options(options: DetectorOptions) -> Self {
        Self {
            options,
            observer: Box::new(LogObserver::default()),
            stage: Stage::Start,
        }
    }

    /// Replace the observer
    pub fn with_observer<O: PipelineObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn options(&self) -> &DetectorOptions {
        &self.options
    }

    /// Stage reached by the last run
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Process one workbook.
    ///
    /// The first failing stage aborts the run; no partial output is
    /// produced.
    pub fn run(&mut self, input: &[u8]) -> Result<Detection> {
        self.stage = Stage::Start;
        self.observer.on_stage(&self.stage);

        match self.run_stages(input) {
            Ok(detection) => {
                self.advance();
                self.observer.on_finished(&detection.report);
                Ok(detection)
            }
            Err(err) => {
                self.stage = Stage::Failed(err.to_string());
                self.observer.on_stage(&self.stage);
                Err(err)
            }
        }
    }

    fn run_stages(&mut self, input: &[u8]) -> Result<Detection> {
        let sheet = XlsxReader::read_bytes(input, &self.options.sheet)?;
        let block = locate_data_block(&sheet.grid, &self.options.locator)?;
        self.observer.on_located(&sheet.sheet.name, &block);
        self.advance();

        let frame = DataFrame::from_grid(&sheet.grid, &block);
        let periods = select_periods(frame.headers(), &self.options.periods);
        self.observer.on_periods(&periods);
        self.advance();

        let classification = classify_frame(&frame, &periods, &self.options.classifier);
        let rows = row_reports(&frame, &classification);
        for row in &rows {
            self.observer.on_row(row);
        }
        self.advance();

        let highlights = plan_highlights(&block, &classification, &self.options.highlight)?;
        for cell in &highlights {
            self.observer.on_highlight(cell);
        }
        let fills: Vec<CellFill> = highlights
            .iter()
            .map(|h| CellFill::new(h.cell, h.color))
            .collect();
        let bytes = XlsxHighlighter::apply(input, &self.options.sheet, &fills)?;
        self.advance();

        Ok(Detection {
            bytes,
            report: AnomalyReport {
                sheet: sheet.sheet.name,
                block,
                periods: periods.columns().iter().map(|c| c.label.clone()).collect(),
                rows,
                highlights,
            },
        })
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            self.stage = next;
            self.observer.on_stage(&self.stage);
        }
    }
}
