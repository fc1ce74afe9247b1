//! Selecting and ordering the period columns

use chrono::{Datelike, NaiveDate};

use crate::cell::CellValue;
use crate::options::PeriodOptions;

/// One column considered as a calendar month
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodColumn {
    /// Header label as it appears in the sheet
    pub label: String,
    /// Position among the frame's columns
    pub column: usize,
    /// First day of the month the label names, if it parses
    pub month: Option<NaiveDate>,
}

impl PeriodColumn {
    /// Date used for ordering; unparseable labels sort as the oldest.
    pub fn sort_key(&self) -> NaiveDate {
        self.month.unwrap_or(NaiveDate::MIN)
    }
}

/// Period columns in ascending chronological order, capped to the most
/// recent window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectedPeriods {
    columns: Vec<PeriodColumn>,
}

impl SelectedPeriods {
    /// Ordered period columns, oldest first
    pub fn columns(&self) -> &[PeriodColumn] {
        &self.columns
    }

    /// Frame column positions, oldest first
    pub fn positions(&self) -> Vec<usize> {
        self.columns.iter().map(|c| c.column).collect()
    }

    /// The chronologically last period
    pub fn latest(&self) -> Option<&PeriodColumn> {
        self.columns.last()
    }

    /// Number of selected periods
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no period survived selection
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Parse a `YYYY-MM` label (month may be one or two digits).
///
/// Anything else, including surrounding whitespace, is rejected.
pub fn parse_year_month(label: &str) -> Option<NaiveDate> {
    let (year, month) = label.split_once('-')?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if month.is_empty() || month.len() > 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

/// A header that may name a calendar month
pub trait PeriodLabel {
    /// Text shown for the header
    fn label(&self) -> String;

    /// First day of the month the header names
    fn month(&self) -> Option<NaiveDate>;
}

impl PeriodLabel for String {
    fn label(&self) -> String {
        self.clone()
    }

    fn month(&self) -> Option<NaiveDate> {
        parse_year_month(self)
    }
}

impl PeriodLabel for CellValue {
    fn label(&self) -> String {
        self.to_string()
    }

    /// Date cells name the month they fall in; text goes through
    /// [`parse_year_month`].
    fn month(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(dt) => dt.date().with_day(1),
            CellValue::Text(s) => parse_year_month(s),
            _ => None,
        }
    }
}

/// Pick the period columns out of the frame headers.
///
/// Labels containing an excluded substring (case-insensitive) are dropped.
/// The rest are stably sorted by month with unparseable headers first,
/// and only the last `max_periods` are kept.
pub fn select_periods<L: PeriodLabel>(headers: &[L], options: &PeriodOptions) -> SelectedPeriods {
    let mut columns: Vec<PeriodColumn> = headers
        .iter()
        .enumerate()
        .map(|(column, header)| (column, header.label(), header))
        .filter(|(_, label, _)| {
            let lower = label.to_lowercase();
            !options
                .excluded_labels
                .iter()
                .any(|excluded| lower.contains(&excluded.to_lowercase()))
        })
        .map(|(column, label, header)| PeriodColumn {
            label,
            column,
            month: header.month(),
        })
        .collect();

    // Vec::sort_by_key is stable, so ties keep sheet order.
    columns.sort_by_key(PeriodColumn::sort_key);

    if columns.len() > options.max_periods {
        let excess = columns.len() - options.max_periods;
        columns.drain(..excess);
    }

    log::debug!(
        "selected {} period columns ({} .. {})",
        columns.len(),
        columns.first().map_or("-", |c| c.label.as_str()),
        columns.last().map_or("-", |c| c.label.as_str()),
    );

    SelectedPeriods { columns }
}
