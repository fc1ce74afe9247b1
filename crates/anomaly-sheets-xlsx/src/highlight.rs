//! In-place cell highlighting
//!
//! The output package is the input package with two parts rewritten: the
//! styles part gains the fill formats and the target worksheet points the
//! highlighted cells at them. Every other entry is copied raw, so
//! formulas, charts, defined names and the rest of the workbook are
//! untouched.

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Seek, Write};

use anomaly_sheets_core::{CellAddress, Color, SheetSelector};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::error::{XlsxError, XlsxResult};
use crate::package::{self, prefix_of, STYLES_PART};
use crate::splice::{apply_edits, attr_value, render_start_tag, Edit};
use crate::styles::add_fill_styles;

/// A solid fill to apply to one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellFill {
    pub cell: CellAddress,
    pub color: Color,
}

impl CellFill {
    pub fn new(cell: CellAddress, color: Color) -> Self {
        Self { cell, color }
    }
}

/// Applies solid fills to cells of an existing XLSX package
pub struct XlsxHighlighter;

impl XlsxHighlighter {
    /// Return `input` with `fills` applied to the selected worksheet.
    ///
    /// With no fills the input bytes come back unchanged. When a cell is
    /// listed more than once the last fill wins.
    pub fn apply(input: &[u8], selector: &SheetSelector, fills: &[CellFill]) -> XlsxResult<Vec<u8>> {
        if fills.is_empty() {
            // Still reject inputs that aren't a workbook with this sheet.
            let mut archive = package::open_archive(Cursor::new(input))?;
            package::find_sheet(&mut archive, selector)?;
            return Ok(input.to_vec());
        }

        let mut output = Cursor::new(Vec::with_capacity(input.len() + 1024));
        Self::apply_to(Cursor::new(input), &mut output, selector, fills)?;
        Ok(output.into_inner())
    }

    /// Stream a highlighted copy of the package in `reader` into `writer`.
    pub fn apply_to<R: Read + Seek, W: Write + Seek>(
        reader: R,
        writer: W,
        selector: &SheetSelector,
        fills: &[CellFill],
    ) -> XlsxResult<()> {
        let mut archive = package::open_archive(reader)?;
        let sheet = package::find_sheet(&mut archive, selector)?;

        // Row -> column -> color, 1-based Excel coordinates
        let mut targets: BTreeMap<u32, BTreeMap<u16, Color>> = BTreeMap::new();
        for fill in fills {
            targets
                .entry(fill.cell.excel_row())
                .or_default()
                .insert(fill.cell.excel_col(), fill.color);
        }

        let sheet_xml = package::require_part(&mut archive, &sheet.path)?;
        let styles_xml = package::require_part(&mut archive, STYLES_PART)?;

        let current = current_styles(&sheet_xml, &targets)?;
        let base_style = |row: u32, col: u16| current.get(&(row, col)).copied().unwrap_or(0);

        let mut requests = Vec::new();
        for (&row, cols) in &targets {
            for (&col, &color) in cols {
                requests.push((base_style(row, col), color));
            }
        }

        let styles = add_fill_styles(&styles_xml, &requests)?;

        let mut assigned: BTreeMap<u32, BTreeMap<u16, u32>> = BTreeMap::new();
        for (&row, cols) in &targets {
            for (&col, &color) in cols {
                let base = base_style(row, col);
                let xf = styles.xf_ids.get(&(base, color)).copied().ok_or_else(|| {
                    XlsxError::Parse(format!("no cell format for style {} with fill {}", base, color))
                })?;
                assigned.entry(row).or_default().insert(col, xf);
            }
        }

        let patched_sheet = restyle_cells(&sheet_xml, &assigned)?;

        let mut zip = zip::ZipWriter::new(writer);
        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            let name = file.name().to_string();

            let replacement = if name == sheet.path {
                Some(&patched_sheet)
            } else if name == STYLES_PART {
                Some(&styles.xml)
            } else {
                None
            };

            match replacement {
                Some(bytes) => {
                    let method = match file.compression() {
                        CompressionMethod::Stored => CompressionMethod::Stored,
                        _ => CompressionMethod::Deflated,
                    };
                    // Keep the entry's own timestamp so output depends on input only
                    let modified = file.last_modified().unwrap_or_default();
                    drop(file);
                    let options = SimpleFileOptions::default()
                        .compression_method(method)
                        .last_modified_time(modified);
                    zip.start_file(name.as_str(), options)?;
                    zip.write_all(bytes)?;
                }
                None => zip.raw_copy_file(file)?,
            }
        }
        zip.finish()?;

        log::debug!(
            "highlighted {} cell(s) on sheet '{}'",
            fills.len(),
            sheet.name
        );
        Ok(())
    }
}

/// Tracks row and column positions while walking `sheetData`, including
/// rows and cells that omit their `r` attribute.
#[derive(Debug, Default)]
struct SheetCursor {
    /// 1-based number of the current row, 0 before the first
    row: u32,
    /// 1-based column of the current cell, 0 at the start of a row
    col: u16,
}

impl SheetCursor {
    /// 1-based number of the row that `e` opens
    fn enter_row(&mut self, e: &BytesStart<'_>) -> XlsxResult<u32> {
        self.row = match attr_value(e, b"r")? {
            Some(r) => r
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|&r| r > 0)
                .ok_or_else(|| XlsxError::Parse(format!("invalid row number '{}'", r)))?,
            None => self.row + 1,
        };
        self.col = 0;
        Ok(self.row)
    }

    /// 1-based column of the cell that `e` opens
    fn enter_cell(&mut self, e: &BytesStart<'_>) -> XlsxResult<u16> {
        self.col = match attr_value(e, b"r")? {
            Some(r) => CellAddress::parse(&r)?.excel_col(),
            None => self.col + 1,
        };
        Ok(self.col)
    }
}

/// Current `s` of each targeted cell that exists in the sheet
fn current_styles(
    xml: &[u8],
    targets: &BTreeMap<u32, BTreeMap<u16, Color>>,
) -> XlsxResult<HashMap<(u32, u16), u32>> {
    let mut reader = Reader::from_reader(xml);
    let mut cursor = SheetCursor::default();
    let mut styles = HashMap::new();
    let mut in_target_row = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    let row = cursor.enter_row(&e)?;
                    in_target_row = targets.contains_key(&row);
                }
                b"c" => {
                    let col = cursor.enter_cell(&e)?;
                    let wanted = in_target_row
                        && targets
                            .get(&cursor.row)
                            .map_or(false, |cols| cols.contains_key(&col));
                    if wanted {
                        let style = match attr_value(&e, b"s")? {
                            Some(s) => s.trim().parse::<u32>().map_err(|_| {
                                XlsxError::Parse(format!("invalid style index '{}'", s))
                            })?,
                            None => 0,
                        };
                        styles.insert((cursor.row, col), style);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(styles)
}

fn new_cell(prefix: &str, row: u32, col: u16, style: u32) -> String {
    format!(
        "<{p}c r=\"{col}{row}\" s=\"{style}\"/>",
        p = prefix,
        col = CellAddress::column_to_letters(col - 1),
        row = row,
        style = style
    )
}

fn new_cells(prefix: &str, row: u32, cols: &BTreeMap<u16, u32>) -> String {
    cols.iter()
        .map(|(&col, &style)| new_cell(prefix, row, col, style))
        .collect()
}

fn new_row(prefix: &str, row: u32, cols: &BTreeMap<u16, u32>) -> String {
    format!(
        "<{p}row r=\"{row}\">{cells}</{p}row>",
        p = prefix,
        row = row,
        cells = new_cells(prefix, row, cols)
    )
}

/// Point every `(row, col)` in `assigned` at its new cell format, creating
/// cells and rows that don't exist yet.
fn restyle_cells(xml: &[u8], assigned: &BTreeMap<u32, BTreeMap<u16, u32>>) -> XlsxResult<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut cursor = SheetCursor::default();
    let mut edits = Vec::new();

    // Rows still to be written, in ascending order
    let mut pending_rows: BTreeMap<u32, BTreeMap<u16, u32>> = assigned.clone();
    // Cells still to be written in the current row
    let mut pending_cells: BTreeMap<u16, u32> = BTreeMap::new();
    let mut prefix = String::new();
    let mut seen_sheet_data = false;
    let mut in_sheet_data = false;

    loop {
        let start = reader.buffer_position();
        let event = reader.read_event()?;
        let end = reader.buffer_position();

        match &event {
            Event::Start(e) if e.local_name().as_ref() == b"sheetData" => {
                seen_sheet_data = true;
                in_sheet_data = true;
                prefix = prefix_of(e.name().as_ref());
            }
            Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => {
                seen_sheet_data = true;
                prefix = prefix_of(e.name().as_ref());
                let rows: String = std::mem::take(&mut pending_rows)
                    .iter()
                    .map(|(&row, cols)| new_row(&prefix, row, cols))
                    .collect();
                let mut bytes = render_start_tag(e, &[], &[], false)?;
                bytes.extend_from_slice(rows.as_bytes());
                bytes.extend_from_slice(format!("</{}sheetData>", prefix).as_bytes());
                edits.push(Edit::replace(start, end, bytes));
            }
            Event::End(e) if in_sheet_data && e.local_name().as_ref() == b"sheetData" => {
                in_sheet_data = false;
                let rows: String = std::mem::take(&mut pending_rows)
                    .iter()
                    .map(|(&row, cols)| new_row(&prefix, row, cols))
                    .collect();
                if !rows.is_empty() {
                    edits.push(Edit::insert(start, rows));
                }
            }
            Event::Start(e) | Event::Empty(e)
                if in_sheet_data && e.local_name().as_ref() == b"row" =>
            {
                let self_closing = matches!(event, Event::Empty(_));
                let row = cursor.enter_row(e)?;

                // Missing rows that sort before this one
                let later = pending_rows.split_off(&row);
                let earlier = std::mem::replace(&mut pending_rows, later);
                let inserted: String = earlier
                    .iter()
                    .map(|(&r, cols)| new_row(&prefix, r, cols))
                    .collect();
                if !inserted.is_empty() {
                    edits.push(Edit::insert(start, inserted));
                }

                pending_cells = pending_rows.remove(&row).unwrap_or_default();
                if !pending_cells.is_empty() {
                    // Column spans are an optional hint and may no longer hold
                    let mut bytes = render_start_tag(e, &[], &["spans"], false)?;
                    if self_closing {
                        let row_prefix = prefix_of(e.name().as_ref());
                        bytes.extend_from_slice(
                            new_cells(&row_prefix, row, &std::mem::take(&mut pending_cells))
                                .as_bytes(),
                        );
                        bytes.extend_from_slice(format!("</{}row>", row_prefix).as_bytes());
                    }
                    edits.push(Edit::replace(start, end, bytes));
                }
            }
            Event::End(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                if !pending_cells.is_empty() {
                    let row_prefix = prefix_of(e.name().as_ref());
                    let cells = new_cells(&row_prefix, cursor.row, &std::mem::take(&mut pending_cells));
                    edits.push(Edit::insert(start, cells));
                }
            }
            Event::Start(e) | Event::Empty(e)
                if in_sheet_data && e.local_name().as_ref() == b"c" =>
            {
                let col = cursor.enter_cell(e)?;
                if pending_cells.is_empty() {
                    continue;
                }
                let self_closing = matches!(event, Event::Empty(_));
                let cell_prefix = prefix_of(e.name().as_ref());

                let later = pending_cells.split_off(&col);
                let earlier = std::mem::replace(&mut pending_cells, later);
                if !earlier.is_empty() {
                    edits.push(Edit::insert(start, new_cells(&cell_prefix, cursor.row, &earlier)));
                }

                if let Some(style) = pending_cells.remove(&col) {
                    let tag = render_start_tag(e, &[("s", style.to_string())], &[], self_closing)?;
                    edits.push(Edit::replace(start, end, tag));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_sheet_data {
        return Err(XlsxError::InvalidFormat("worksheet has no <sheetData>".into()));
    }

    apply_edits(xml, edits)
}
