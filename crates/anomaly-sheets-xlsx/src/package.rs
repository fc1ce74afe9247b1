//! OOXML package navigation: workbook parts, sheet lookup, raw part access

use std::collections::HashMap;
use std::io::{Read, Seek};

use anomaly_sheets_core::SheetSelector;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};

pub(crate) const WORKBOOK_PART: &str = "xl/workbook.xml";
pub(crate) const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub(crate) const STYLES_PART: &str = "xl/styles.xml";
pub(crate) const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// A worksheet entry of the workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    /// Sheet name as shown on the tab
    pub name: String,
    /// Path of the worksheet part inside the package
    pub path: String,
}

/// Open the zip container and check it looks like a spreadsheet package.
pub(crate) fn open_archive<R: Read + Seek>(reader: R) -> XlsxResult<zip::ZipArchive<R>> {
    let mut archive = zip::ZipArchive::new(reader)?;
    if archive.by_name("[Content_Types].xml").is_err() {
        return Err(XlsxError::InvalidFormat(
            "Missing [Content_Types].xml".into(),
        ));
    }
    Ok(archive)
}

/// Read a whole part into memory; `None` if the package lacks it.
pub(crate) fn read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
) -> XlsxResult<Option<Vec<u8>>> {
    let mut file = match archive.by_name(path) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

/// Read a part that must exist.
pub(crate) fn require_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
) -> XlsxResult<Vec<u8>> {
    read_part(archive, path)?.ok_or_else(|| XlsxError::MissingPart(path.to_string()))
}

/// List the worksheets in workbook order.
pub(crate) fn list_sheets<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<Vec<SheetEntry>> {
    let workbook_xml = require_part(archive, WORKBOOK_PART)?;
    let rels_xml = require_part(archive, WORKBOOK_RELS_PART)?;

    let sheet_info = read_workbook_xml(&workbook_xml)?;
    let sheet_paths = read_workbook_rels(&rels_xml)?;

    Ok(sheet_info
        .into_iter()
        .filter_map(|(name, r_id)| {
            sheet_paths
                .get(&r_id)
                .map(|path| SheetEntry {
                    name,
                    path: path.clone(),
                })
        })
        .collect())
}

/// Resolve a selector to a worksheet entry.
pub(crate) fn find_sheet<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    selector: &SheetSelector,
) -> XlsxResult<SheetEntry> {
    let sheets = list_sheets(archive)?;
    let found = match selector {
        SheetSelector::Named(name) => sheets.into_iter().find(|s| &s.name == name),
        SheetSelector::First => sheets.into_iter().next(),
    };
    found.ok_or_else(|| match selector {
        SheetSelector::Named(name) => XlsxError::SheetNotFound(name.clone()),
        SheetSelector::First => XlsxError::SheetNotFound("<first sheet>".into()),
    })
}

/// Read workbook.xml to get sheet names and rIds
fn read_workbook_xml(xml: &[u8]) -> XlsxResult<Vec<(String, String)>> {
    let mut xml_reader = Reader::from_reader(xml);
    xml_reader.trim_text(true);

    let mut sheets = Vec::new();

    loop {
        match xml_reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut r_id = None;

                for attr in e.attributes().flatten() {
                    let key = attr.key;
                    if key.as_ref() == b"name" {
                        name = attr.unescape_value().ok().map(|s| s.to_string());
                    } else if key.local_name().as_ref() == b"id" && key.prefix().is_some() {
                        r_id = attr.unescape_value().ok().map(|s| s.to_string());
                    }
                }

                if let (Some(name), Some(r_id)) = (name, r_id) {
                    sheets.push((name, r_id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }

    Ok(sheets)
}

/// Read workbook.xml.rels to get worksheet part paths by relationship id
fn read_workbook_rels(xml: &[u8]) -> XlsxResult<HashMap<String, String>> {
    let mut xml_reader = Reader::from_reader(xml);
    xml_reader.trim_text(true);

    let mut rels = HashMap::new();

    loop {
        match xml_reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                let mut rel_type = None;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => {
                            id = attr.unescape_value().ok().map(|s| s.to_string());
                        }
                        b"Target" => {
                            target = attr.unescape_value().ok().map(|s| s.to_string());
                        }
                        b"Type" => {
                            rel_type = attr.unescape_value().ok().map(|s| s.to_string());
                        }
                        _ => {}
                    }
                }

                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    if rel_type.ends_with("/worksheet") {
                        rels.insert(id, resolve_target(&target));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }

    Ok(rels)
}

/// Resolve a relationship target relative to the `xl/` folder.
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = vec!["xl"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Namespace prefix of a qualified element name, including the colon
/// (`b"x:row"` -> `"x:"`), or empty.
pub(crate) fn prefix_of(qname: &[u8]) -> String {
    match qname.iter().position(|&b| b == b':') {
        Some(pos) => String::from_utf8_lossy(&qname[..=pos]).into_owned(),
        None => String::new(),
    }
}
