//! Shared fixtures: build report workbooks in memory and inspect the fills
//! of a processed one.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use anomaly_sheets::CellAddress;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use zip::write::SimpleFileOptions;

pub const TD_DADOS: &str = "TD Dados";

/// A fixture cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Num(f64),
    Text(String),
    /// Formula with its cached result
    Formula(String, f64),
    /// Date serial shown with the built-in `mmm-yy` format
    Date(f64),
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Num(v)
    }
}

impl From<i32> for Cell {
    fn from(v: i32) -> Self {
        Cell::Num(v as f64)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Cell::Empty, Cell::Num)
    }
}

pub const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/><xf numFmtId="17" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Worksheet XML for `rows`; row `i` lands on sheet row `i + 1`. Text in
/// column A is bold; dates use cell format 2.
pub fn sheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut data = String::new();
    for (i, row) in rows.iter().enumerate() {
        let r = i + 1;
        data.push_str(&format!(r#"<row r="{r}">"#));
        for (j, cell) in row.iter().enumerate() {
            let a1 = CellAddress::new(i as u32, j as u16).to_a1_string();
            let style = if j == 0 { r#" s="1""# } else { "" };
            match cell {
                Cell::Empty => {}
                Cell::Num(v) => data.push_str(&format!(r#"<c r="{a1}"{style}><v>{v}</v></c>"#)),
                Cell::Text(s) => data.push_str(&format!(
                    r#"<c r="{a1}"{style} t="inlineStr"><is><t>{}</t></is></c>"#,
                    escape(s)
                )),
                Cell::Date(serial) => {
                    data.push_str(&format!(r#"<c r="{a1}" s="2"><v>{serial}</v></c>"#))
                }
                Cell::Formula(f, v) => data.push_str(&format!(
                    r#"<c r="{a1}"{style}><f>{}</f><v>{v}</v></c>"#,
                    escape(f)
                )),
            }
        }
        data.push_str("</row>");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData></worksheet>"#
    )
}

/// A workbook with the given sheets, in order
pub fn workbook(sheets: &[(&str, &[Vec<Cell>])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let mut put = |name: &str, content: &str| {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    };

    let mut overrides = String::new();
    let mut entries = String::new();
    let mut rels = String::new();
    for (i, (name, _)) in sheets.iter().enumerate() {
        let n = i + 1;
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        entries.push_str(&format!(
            r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
            escape(name)
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheets.len() + 1
    ));

    put(
        "[Content_Types].xml",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>{overrides}</Types>"#
        ),
    );
    put(
        "_rels/.rels",
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
    );
    put(
        "xl/workbook.xml",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{entries}</sheets></workbook>"#
        ),
    );
    put(
        "xl/_rels/workbook.xml.rels",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
        ),
    );
    put("xl/styles.xml", STYLES);
    for (i, (_, rows)) in sheets.iter().enumerate() {
        put(&format!("xl/worksheets/sheet{}.xml", i + 1), &sheet_xml(rows));
    }

    zip.finish().unwrap().into_inner()
}

/// A workbook with a single "TD Dados" sheet
pub fn report(rows: &[Vec<Cell>]) -> Vec<u8> {
    workbook(&[(TD_DADOS, rows)])
}

/// Decompressed content of one package entry
pub fn read_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

fn attr(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| a.unescape_value().unwrap().into_owned())
}

/// Solid fill color (ARGB) of every filled cell on worksheet `n` (1-based)
pub fn solid_fills(bytes: &[u8], n: usize) -> BTreeMap<String, String> {
    let styles = read_entry(bytes, "xl/styles.xml");

    // Fill colors by fill id, then fill id by cell format
    let mut fill_colors: Vec<Option<String>> = Vec::new();
    let mut xf_fills: Vec<usize> = Vec::new();
    let mut reader = Reader::from_reader(styles.as_bytes());
    let (mut in_fills, mut in_xfs) = (false, false);
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"fills" => in_fills = true,
                b"cellXfs" => in_xfs = true,
                b"fill" if in_fills => fill_colors.push(None),
                b"fgColor" if in_fills => {
                    if let Some(last) = fill_colors.last_mut() {
                        *last = attr(&e, b"rgb");
                    }
                }
                b"xf" if in_xfs => {
                    xf_fills.push(attr(&e, b"fillId").map_or(0, |v| v.parse().unwrap()))
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"fills" => in_fills = false,
                b"cellXfs" => in_xfs = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let sheet = read_entry(bytes, &format!("xl/worksheets/sheet{n}.xml"));
    let mut fills = BTreeMap::new();
    let mut reader = Reader::from_reader(sheet.as_bytes());
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let (Some(r), Some(s)) = (attr(&e, b"r"), attr(&e, b"s")) else {
                    continue;
                };
                let xf: usize = s.parse().unwrap();
                if let Some(Some(color)) = xf_fills.get(xf).and_then(|&f| fill_colors.get(f)) {
                    fills.insert(r, color.clone());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    fills
}

pub fn expected_fills(cells: &[(&str, &str)]) -> BTreeMap<String, String> {
    cells
        .iter()
        .map(|(a1, argb)| (a1.to_string(), argb.to_string()))
        .collect()
}

pub const YELLOW: &str = "FFFFFF00";
pub const RED: &str = "FFFF0000";

/// Header label for month `m` (1-based) counted from January 2023
pub fn month(m: usize) -> String {
    let m0 = m - 1;
    format!("{}-{:02}", 2023 + m0 / 12, m0 % 12 + 1)
}

/// Header row `Unidade, labels..., Total Geral`
pub fn header(labels: &[String]) -> Vec<Cell> {
    let mut row: Vec<Cell> = vec!["Unidade".into()];
    row.extend(labels.iter().map(|l| Cell::from(l.as_str())));
    row.push("Total Geral".into());
    row
}

/// Data row `entity, values..., total`
pub fn data_row(entity: &str, values: &[Option<f64>]) -> Vec<Cell> {
    let mut row: Vec<Cell> = vec![entity.into()];
    row.extend(values.iter().map(|&v| Cell::from(v)));
    row.push(Cell::Num(values.iter().flatten().sum()));
    row
}
