//! Values-only worksheet reader
//!
//! Reads one worksheet into a [`RawGrid`] with no header interpretation.
//! Formula cells contribute their cached result; styles are ignored.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use anomaly_sheets_core::{CellAddress, CellValue, RawGrid, SheetSelector};
use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::numfmt::DateFormats;
use crate::package::{self, SheetEntry, SHARED_STRINGS_PART, STYLES_PART, WORKBOOK_PART};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("_x") {
        result.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push('_');
                rest = &candidate[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// ISO 8601 value of a `t="d"` cell
fn parse_iso_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A worksheet read as a headerless grid
#[derive(Debug, Clone)]
pub struct SheetGrid {
    /// Worksheet that was read
    pub sheet: SheetEntry,
    /// Cell values, 0-indexed
    pub grid: RawGrid,
}

/// XLSX worksheet reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a worksheet from a file path
    pub fn read_file<P: AsRef<Path>>(path: P, selector: &SheetSelector) -> XlsxResult<SheetGrid> {
        let file = File::open(path)?;
        Self::read(file, selector)
    }

    /// Read a worksheet from in-memory bytes
    pub fn read_bytes(bytes: &[u8], selector: &SheetSelector) -> XlsxResult<SheetGrid> {
        Self::read(Cursor::new(bytes), selector)
    }

    /// Read a worksheet from a reader
    pub fn read<R: Read + Seek>(reader: R, selector: &SheetSelector) -> XlsxResult<SheetGrid> {
        let mut archive = package::open_archive(reader)?;
        let sheet = package::find_sheet(&mut archive, selector)?;

        let shared_strings = match package::read_part(&mut archive, SHARED_STRINGS_PART)? {
            Some(xml) => Self::read_shared_strings(&xml)?,
            None => Vec::new(),
        };

        let styles = package::read_part(&mut archive, STYLES_PART)?;
        let workbook = package::read_part(&mut archive, WORKBOOK_PART)?;
        let formats = DateFormats::from_parts(styles.as_deref(), workbook.as_deref())?;

        let sheet_xml = package::require_part(&mut archive, &sheet.path)?;
        let grid = Self::read_worksheet(&sheet_xml, &shared_strings, &formats)?;

        log::debug!(
            "read sheet '{}' ({}): {} rows, {} columns",
            sheet.name,
            sheet.path,
            grid.row_count(),
            grid.width()
        );

        Ok(SheetGrid { sheet, grid })
    }

    /// Names of all worksheets, in workbook order
    pub fn sheet_names(bytes: &[u8]) -> XlsxResult<Vec<String>> {
        let mut archive = package::open_archive(Cursor::new(bytes))?;
        Ok(package::list_sheets(&mut archive)?
            .into_iter()
            .map(|s| s.name)
            .collect())
    }

    /// Read the shared strings table
    fn read_shared_strings(xml: &[u8]) -> XlsxResult<Vec<String>> {
        let mut xml_reader = Reader::from_reader(xml);

        let mut strings = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;
        // Phonetic runs repeat the text as a reading guide; skip them.
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event() {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current_string));
                        current_string.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current_string.push_str(&text);
                    }
                }
                Ok(Event::CData(e)) if in_t => {
                    current_string.push_str(&String::from_utf8_lossy(&e));
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
        }

        Ok(strings)
    }

    /// Read the cell values of a worksheet part
    fn read_worksheet(
        xml: &[u8],
        shared_strings: &[String],
        formats: &DateFormats,
    ) -> XlsxResult<RawGrid> {
        let mut xml_reader = Reader::from_reader(xml);

        let mut grid = RawGrid::new();

        // Row/column cursor for cells that omit their `r` attribute
        let mut row_idx: u32 = 0;
        let mut next_row: u32 = 0;
        let mut next_col: u16 = 0;

        let mut current_ref: Option<CellAddress> = None;
        let mut current_type: Option<String> = None;
        let mut current_style: u32 = 0;
        let mut current_value: Option<String> = None;
        let mut in_value = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;

        loop {
            match xml_reader.read_event() {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"row" => {
                        row_idx = Self::row_number(&e)?.unwrap_or(next_row);
                        next_row = row_idx + 1;
                        next_col = 0;
                    }
                    b"c" => {
                        let (addr, cell_type, style) = Self::cell_attrs(&e, row_idx, next_col)?;
                        next_col = addr.col.saturating_add(1);
                        current_ref = Some(addr);
                        current_type = cell_type;
                        current_style = style;
                        current_value = None;
                    }
                    b"v" if current_ref.is_some() => in_value = true,
                    b"is" if current_ref.is_some() => in_inline_str = true,
                    b"t" if in_inline_str => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"row" => {
                        row_idx = Self::row_number(&e)?.unwrap_or(next_row);
                        next_row = row_idx + 1;
                        next_col = 0;
                    }
                    b"c" => {
                        // Cell with style but no value
                        let (addr, _, _) = Self::cell_attrs(&e, row_idx, next_col)?;
                        next_col = addr.col.saturating_add(1);
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"c" => {
                        if let Some(addr) = current_ref.take() {
                            let value = Self::cell_value(
                                current_type.as_deref(),
                                current_value.take(),
                                shared_strings,
                            )?;
                            let value = match value {
                                CellValue::Number(n) if formats.is_date_style(current_style) => {
                                    formats.to_datetime(n).map_or(CellValue::Number(n), CellValue::Date)
                                }
                                other => other,
                            };
                            if !value.is_empty() {
                                grid.set(addr, value);
                            }
                        }
                    }
                    b"v" => in_value = false,
                    b"is" => in_inline_str = false,
                    b"t" if in_inline_str => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_value || in_inline_text => {
                    if let Ok(text) = e.unescape() {
                        current_value
                            .get_or_insert_with(String::new)
                            .push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
        }

        Ok(grid)
    }

    /// 0-based row index from a `row` element's `r` attribute
    fn row_number(e: &quick_xml::events::BytesStart<'_>) -> XlsxResult<Option<u32>> {
        for attr in e.attributes().flatten() {
            if attr.key.as_ref() == b"r" {
                let value = attr.unescape_value()?;
                let row: u32 = value
                    .trim()
                    .parse()
                    .map_err(|_| XlsxError::Parse(format!("invalid row number '{}'", value)))?;
                if row == 0 {
                    return Err(XlsxError::Parse("row number 0".into()));
                }
                return Ok(Some(row - 1));
            }
        }
        Ok(None)
    }

    /// Address, `t` and `s` attributes of a `c` element
    fn cell_attrs(
        e: &quick_xml::events::BytesStart<'_>,
        row_idx: u32,
        next_col: u16,
    ) -> XlsxResult<(CellAddress, Option<String>, u32)> {
        let mut addr = CellAddress::new(row_idx, next_col);
        let mut cell_type = None;
        let mut style = 0;
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => addr = CellAddress::parse(&attr.unescape_value()?)?,
                b"t" => cell_type = Some(attr.unescape_value()?.to_string()),
                b"s" => style = attr.unescape_value()?.trim().parse().unwrap_or(0),
                _ => {}
            }
        }
        Ok((addr, cell_type, style))
    }

    /// Interpret a cell's raw `v`/inline text according to its type
    fn cell_value(
        cell_type: Option<&str>,
        raw: Option<String>,
        shared_strings: &[String],
    ) -> XlsxResult<CellValue> {
        let Some(raw) = raw else {
            return Ok(CellValue::Empty);
        };

        let value = match cell_type {
            Some("s") => {
                let idx: usize = raw.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("invalid shared string index '{}'", raw))
                })?;
                let text = shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("shared string index {} out of range", idx))
                })?;
                CellValue::text(text.as_str())
            }
            Some("inlineStr") | Some("str") => CellValue::Text(decode_excel_escapes(&raw)),
            Some("b") => CellValue::text(if raw.trim() == "1" { "TRUE" } else { "FALSE" }),
            // Error cells (#N/A, #DIV/0!, ...) carry no usable value
            Some("e") => CellValue::Empty,
            Some("d") => parse_iso_date(&raw).map_or(CellValue::Text(raw), CellValue::Date),
            _ => match raw.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => {
                    log::warn!("non-numeric value '{}' in numeric cell", raw);
                    CellValue::Text(raw)
                }
            },
        };

        // Blank strings read as missing
        Ok(match value {
            CellValue::Text(s) if s.is_empty() => CellValue::Empty,
            other => other,
        })
    }
}
