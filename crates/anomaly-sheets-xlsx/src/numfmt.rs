//! Number formats: which cell formats show a date, and serial conversion

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};

/// Built-in format ids that render dates or times
fn is_builtin_date_format(id: u32) -> bool {
    matches!(id, 14..=22 | 45..=47)
}

/// Whether a custom format code renders a date or time.
///
/// Quoted literals, escaped characters, padding and bracketed sections
/// (colors, locales, conditions) are skipped before looking for date/time
/// placeholders.
pub(crate) fn is_date_format_code(code: &str) -> bool {
    let mut chars = code.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '[' => {
                // Elapsed time sections ([h], [mm], [ss]) are time placeholders
                let section: String = chars.by_ref().take_while(|&b| b != ']').collect();
                let lower = section.to_ascii_lowercase();
                if !lower.is_empty() && lower.chars().all(|b| matches!(b, 'h' | 'm' | 's')) {
                    return true;
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            _ => {
                if matches!(c.to_ascii_lowercase(), 'y' | 'm' | 'd' | 'h' | 's') {
                    return true;
                }
            }
        }
    }
    false
}

/// Date-formatted cell styles of a workbook and its date system
#[derive(Debug, Clone, Default)]
pub(crate) struct DateFormats {
    /// Indexed by cellXfs position
    date_xfs: Vec<bool>,
    /// Serials count from 1904-01-01
    date1904: bool,
}

impl DateFormats {
    /// Collect date styles from `styles.xml` and the date system from
    /// `workbook.xml`; either part may be absent.
    pub(crate) fn from_parts(styles: Option<&[u8]>, workbook: Option<&[u8]>) -> XlsxResult<Self> {
        let date_xfs = match styles {
            Some(xml) => read_date_xfs(xml)?,
            None => Vec::new(),
        };
        let date1904 = match workbook {
            Some(xml) => read_date1904(xml)?,
            None => false,
        };
        Ok(Self { date_xfs, date1904 })
    }

    /// Whether cells with style index `xf` show a date
    pub(crate) fn is_date_style(&self, xf: u32) -> bool {
        self.date_xfs.get(xf as usize).copied().unwrap_or(false)
    }

    /// Convert a serial to a date-time in this workbook's date system.
    ///
    /// Negative serials and the fictitious 1900-02-29 have no date.
    pub(crate) fn to_datetime(&self, serial: f64) -> Option<NaiveDateTime> {
        if !serial.is_finite() || serial < 0.0 {
            return None;
        }
        let days = serial.floor();
        let seconds = ((serial - days) * 86_400.0).round() as i64;
        let days = days as i64;

        let date = if self.date1904 {
            NaiveDate::from_ymd_opt(1904, 1, 1)?.checked_add_signed(Duration::days(days))?
        } else {
            // Serial 60 is Excel's 1900-02-29
            if days == 60 {
                return None;
            }
            let adjusted = if days > 60 { days - 1 } else { days };
            NaiveDate::from_ymd_opt(1899, 12, 31)?.checked_add_signed(Duration::days(adjusted))?
        };
        date.and_hms_opt(0, 0, 0)?
            .checked_add_signed(Duration::seconds(seconds))
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> XlsxResult<Option<String>> {
    for a in e.attributes().flatten() {
        if a.key.local_name().as_ref() == key {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn num_fmt_id(e: &BytesStart<'_>) -> XlsxResult<u32> {
    match attr(e, b"numFmtId")? {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| XlsxError::Parse(format!("invalid numFmtId '{}'", v))),
        None => Ok(0),
    }
}

/// One flag per `cellXfs` entry: does its number format show a date
fn read_date_xfs(xml: &[u8]) -> XlsxResult<Vec<bool>> {
    let mut reader = Reader::from_reader(xml);
    let mut custom: HashMap<u32, bool> = HashMap::new();
    let mut xf_formats: Vec<u32> = Vec::new();
    let mut in_num_fmts = false;
    let mut in_cell_xfs = false;

    loop {
        let (e, opens) = match reader.read_event()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"numFmts" => in_num_fmts = false,
                    b"cellXfs" => in_cell_xfs = false,
                    _ => {}
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };
        match e.local_name().as_ref() {
            b"numFmts" => in_num_fmts = opens,
            b"cellXfs" => in_cell_xfs = opens,
            b"numFmt" if in_num_fmts => {
                let code = attr(&e, b"formatCode")?.unwrap_or_default();
                custom.insert(num_fmt_id(&e)?, is_date_format_code(&code));
            }
            b"xf" if in_cell_xfs => xf_formats.push(num_fmt_id(&e)?),
            _ => {}
        }
    }

    Ok(xf_formats
        .into_iter()
        .map(|id| {
            custom
                .get(&id)
                .copied()
                .unwrap_or_else(|| is_builtin_date_format(id))
        })
        .collect())
}

/// `workbookPr/@date1904`
fn read_date1904(xml: &[u8]) -> XlsxResult<bool> {
    let mut reader = Reader::from_reader(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"workbookPr" => {
                let flag = attr(&e, b"date1904")?;
                return Ok(matches!(flag.as_deref().map(str::trim), Some("1" | "true")));
            }
            Event::Eof => return Ok(false),
            _ => {}
        }
    }
}
