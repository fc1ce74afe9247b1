//! Fill styles for highlighted cells
//!
//! A highlighted cell keeps its number format, font, border and alignment:
//! its current cell format (`xf`) is cloned with a new solid fill, and the
//! clone is appended to `cellXfs`. Existing style indices never move.

use std::collections::HashMap;
use std::ops::Range;

use anomaly_sheets_core::Color;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::package::prefix_of;
use crate::splice::{apply_edits, render_start_tag, Edit};

/// A patched styles part and the cell format index for each requested
/// `(base format, fill color)` pair
#[derive(Debug, Clone)]
pub(crate) struct StylePatch {
    pub xml: Vec<u8>,
    pub xf_ids: HashMap<(u32, Color), u32>,
}

/// A container element (`fills`, `cellXfs`) located in the source
#[derive(Debug)]
struct Section {
    tag: BytesStart<'static>,
    span: Range<usize>,
    self_closing: bool,
    /// Byte offset of the closing tag
    close_at: Option<usize>,
}

impl Section {
    fn prefix(&self) -> String {
        prefix_of(self.tag.name().as_ref())
    }
}

/// One `xf` element of `cellXfs`
#[derive(Debug)]
struct XfSpan {
    tag: BytesStart<'static>,
    self_closing: bool,
    /// Children and closing tag
    body: Range<usize>,
}

#[derive(Debug, Default)]
struct StyleLayout {
    fills: Option<Section>,
    fill_count: u32,
    cell_xfs: Option<Section>,
    xfs: Vec<XfSpan>,
}

fn scan(xml: &[u8]) -> XlsxResult<StyleLayout> {
    let mut reader = Reader::from_reader(xml);
    let mut layout = StyleLayout::default();

    let mut in_fills = false;
    let mut in_cell_xfs = false;
    let mut open_xf: Option<(BytesStart<'static>, usize)> = None;

    loop {
        let start = reader.buffer_position();
        let event = reader.read_event()?;
        let end = reader.buffer_position();

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"fills" => {
                    in_fills = true;
                    layout.fills = Some(Section {
                        tag: e.into_owned(),
                        span: start..end,
                        self_closing: false,
                        close_at: None,
                    });
                }
                b"fill" if in_fills => layout.fill_count += 1,
                b"cellXfs" => {
                    in_cell_xfs = true;
                    layout.cell_xfs = Some(Section {
                        tag: e.into_owned(),
                        span: start..end,
                        self_closing: false,
                        close_at: None,
                    });
                }
                b"xf" if in_cell_xfs => open_xf = Some((e.into_owned(), end)),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"fills" => {
                    layout.fills = Some(Section {
                        tag: e.into_owned(),
                        span: start..end,
                        self_closing: true,
                        close_at: None,
                    });
                }
                b"fill" if in_fills => layout.fill_count += 1,
                b"cellXfs" => {
                    layout.cell_xfs = Some(Section {
                        tag: e.into_owned(),
                        span: start..end,
                        self_closing: true,
                        close_at: None,
                    });
                }
                b"xf" if in_cell_xfs => layout.xfs.push(XfSpan {
                    tag: e.into_owned(),
                    self_closing: true,
                    body: end..end,
                }),
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"fills" if in_fills => {
                    in_fills = false;
                    if let Some(section) = layout.fills.as_mut() {
                        section.close_at = Some(start);
                    }
                }
                b"cellXfs" if in_cell_xfs => {
                    in_cell_xfs = false;
                    if let Some(section) = layout.cell_xfs.as_mut() {
                        section.close_at = Some(start);
                    }
                }
                b"xf" if in_cell_xfs => {
                    if let Some((tag, body_start)) = open_xf.take() {
                        layout.xfs.push(XfSpan {
                            tag,
                            self_closing: false,
                            body: body_start..end,
                        });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(layout)
}

/// Wrap `children` into `section`, updating its `count` attribute.
fn extend_section(
    section: &Section,
    count: usize,
    children: Vec<u8>,
    edits: &mut Vec<Edit>,
) -> XlsxResult<()> {
    let open = render_start_tag(&section.tag, &[("count", count.to_string())], &[], false)?;

    match (section.self_closing, section.close_at) {
        (false, Some(close_at)) => {
            edits.push(Edit::replace(section.span.start, section.span.end, open));
            edits.push(Edit::insert(close_at, children));
        }
        (true, _) => {
            let mut bytes = open;
            bytes.extend_from_slice(&children);
            bytes.extend_from_slice(
                format!("</{}>", String::from_utf8_lossy(section.tag.name().as_ref())).as_bytes(),
            );
            edits.push(Edit::replace(section.span.start, section.span.end, bytes));
        }
        (false, None) => {
            return Err(XlsxError::InvalidFormat(format!(
                "unterminated <{}> in styles",
                String::from_utf8_lossy(section.tag.name().as_ref())
            )));
        }
    }
    Ok(())
}

fn solid_fill(prefix: &str, color: Color) -> String {
    let argb = color.to_argb_hex();
    format!(
        "<{p}fill><{p}patternFill patternType=\"solid\"><{p}fgColor rgb=\"{argb}\"/><{p}bgColor rgb=\"{argb}\"/></{p}patternFill></{p}fill>",
        p = prefix,
        argb = argb
    )
}

/// Append one solid fill per distinct color and one cloned cell format per
/// distinct `(base, color)` request.
pub(crate) fn add_fill_styles(xml: &[u8], requests: &[(u32, Color)]) -> XlsxResult<StylePatch> {
    let layout = scan(xml)?;

    let fills = layout
        .fills
        .as_ref()
        .ok_or_else(|| XlsxError::InvalidFormat("styles part has no <fills>".into()))?;
    let cell_xfs = layout
        .cell_xfs
        .as_ref()
        .ok_or_else(|| XlsxError::InvalidFormat("styles part has no <cellXfs>".into()))?;

    let mut fill_ids: HashMap<Color, u32> = HashMap::new();
    let mut new_fills = Vec::new();
    let mut xf_ids: HashMap<(u32, Color), u32> = HashMap::new();
    let mut new_xfs = Vec::new();

    let fill_prefix = fills.prefix();
    let xf_prefix = cell_xfs.prefix();
    let xf_base_count = layout.xfs.len() as u32;

    for &(base, color) in requests {
        if xf_ids.contains_key(&(base, color)) {
            continue;
        }

        let fill_id = match fill_ids.get(&color) {
            Some(&id) => id,
            None => {
                let id = layout.fill_count + fill_ids.len() as u32;
                fill_ids.insert(color, id);
                new_fills.extend_from_slice(solid_fill(&fill_prefix, color).as_bytes());
                id
            }
        };

        let fill_attrs = [("fillId", fill_id.to_string()), ("applyFill", "1".to_string())];
        match layout.xfs.get(base as usize) {
            Some(span) => {
                new_xfs.extend(render_start_tag(&span.tag, &fill_attrs, &[], span.self_closing)?);
                new_xfs.extend_from_slice(&xml[span.body.clone()]);
            }
            None => {
                log::warn!("cell format {} does not exist; highlighting over the default", base);
                new_xfs.extend_from_slice(
                    format!(
                        "<{p}xf numFmtId=\"0\" fontId=\"0\" fillId=\"{id}\" borderId=\"0\" xfId=\"0\" applyFill=\"1\"/>",
                        p = xf_prefix,
                        id = fill_id
                    )
                    .as_bytes(),
                );
            }
        }

        xf_ids.insert((base, color), xf_base_count + xf_ids.len() as u32);
    }

    let mut edits = Vec::new();
    extend_section(
        fills,
        (layout.fill_count as usize) + fill_ids.len(),
        new_fills,
        &mut edits,
    )?;
    extend_section(cell_xfs, layout.xfs.len() + xf_ids.len(), new_xfs, &mut edits)?;

    log::debug!(
        "added {} fill(s) and {} cell format(s) to styles",
        fill_ids.len(),
        xf_ids.len()
    );

    Ok(StylePatch {
        xml: apply_edits(xml, edits)?,
        xf_ids,
    })
}
