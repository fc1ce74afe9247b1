//! Applying fills to an existing package

use anomaly_sheets_core::{CellAddress, Color, SheetSelector};
use anomaly_sheets_xlsx::{CellFill, XlsxError, XlsxHighlighter, XlsxReader};
use pretty_assertions::assert_eq;
use zip::CompressionMethod;

use crate::common::*;

fn fill(a1: &str, color: Color) -> CellFill {
    CellFill::new(CellAddress::parse(a1).unwrap(), color)
}

fn report_rows() -> String {
    [
        format!(r#"<row r="1" spans="1:3">{}{}</row>"#, text_cell("A1", "Unidade"), text_cell("B1", "2024-01")),
        format!(
            r#"<row r="2" spans="1:3">{}<c r="B2" s="2"><v>0.5</v></c><c r="C2" s="1"><f>B2*2</f><v>1</v></c></row>"#,
            text_cell("A2", "ABEL")
        ),
        format!(r#"<row r="3">{}{}</row>"#, text_cell("A3", "CAIO"), num_cell("C3", 7.0)),
    ]
    .concat()
}

fn report() -> Vec<u8> {
    PackageBuilder::new()
        .sheet("Resumo", &format!(r#"<row r="1">{}</row>"#, text_cell("A1", "capa")))
        .sheet("TD Dados", &report_rows())
        .build()
}

#[test]
fn test_no_fills_returns_input_unchanged() {
    let input = report();
    let output = XlsxHighlighter::apply(&input, &SheetSelector::default(), &[]).unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_no_fills_still_requires_the_sheet() {
    let input = report();
    let err = XlsxHighlighter::apply(&input, &SheetSelector::Named("Outra".into()), &[]).unwrap_err();
    assert!(matches!(err, XlsxError::SheetNotFound(_)));
}

#[test]
fn test_fills_existing_cell_and_keeps_its_format() {
    let input = report();
    let output = XlsxHighlighter::apply(
        &input,
        &SheetSelector::default(),
        &[fill("B2", Color::YELLOW)],
    )
    .unwrap();

    let styles = read_entry(&output, "xl/styles.xml");
    assert!(styles.contains(r#"<fills count="3">"#));
    assert!(styles.contains(
        r#"<fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor rgb="FFFFFF00"/></patternFill></fill></fills>"#
    ));
    assert!(styles.contains(r#"<cellXfs count="4">"#));
    // Clone of format 2: number format, bold font and border survive
    assert!(styles.contains(
        r#"<xf numFmtId="164" fontId="1" fillId="2" borderId="1" xfId="0" applyNumberFormat="1" applyFont="1" applyBorder="1" applyFill="1"/></cellXfs>"#
    ));

    let sheet = read_entry(&output, "xl/worksheets/sheet2.xml");
    assert!(sheet.contains(r#"<c r="B2" s="3"><v>0.5</v></c>"#));
    // Neighbouring formula untouched
    assert!(sheet.contains(r#"<c r="C2" s="1"><f>B2*2</f><v>1</v></c>"#));
}

#[test]
fn test_creates_missing_cells_and_rows() {
    let input = report();
    let output = XlsxHighlighter::apply(
        &input,
        &SheetSelector::default(),
        &[fill("B3", Color::RED), fill("B6", Color::YELLOW)],
    )
    .unwrap();

    let sheet = read_entry(&output, "xl/worksheets/sheet2.xml");
    assert!(sheet.contains(&format!(
        r#"<row r="3">{}<c r="B3" s="3"/>{}</row>"#,
        text_cell("A3", "CAIO"),
        num_cell("C3", 7.0)
    )));
    assert!(sheet.contains(r#"<row r="6"><c r="B6" s="4"/></row></sheetData>"#));

    let styles = read_entry(&output, "xl/styles.xml");
    assert!(styles.contains(r#"<fills count="4">"#));
    assert!(styles.contains(r#"rgb="FFFF0000""#));
    assert!(styles.contains(r#"rgb="FFFFFF00""#));
}

#[test]
fn test_values_survive_highlighting() {
    let input = report();
    let output = XlsxHighlighter::apply(
        &input,
        &SheetSelector::default(),
        &[fill("B2", Color::YELLOW), fill("B3", Color::RED)],
    )
    .unwrap();

    let before = XlsxReader::read_bytes(&input, &SheetSelector::default()).unwrap();
    let after = XlsxReader::read_bytes(&output, &SheetSelector::default()).unwrap();
    assert_eq!(after.grid, before.grid);
}

#[test]
fn test_other_parts_are_copied_verbatim() {
    let input = report();
    let output = XlsxHighlighter::apply(
        &input,
        &SheetSelector::default(),
        &[fill("B2", Color::YELLOW)],
    )
    .unwrap();

    assert_eq!(entry_names(&output), entry_names(&input));
    for name in [
        "xl/workbook.xml",
        "xl/worksheets/sheet1.xml",
        "xl/theme/theme1.xml",
        "[Content_Types].xml",
    ] {
        assert_eq!(read_entry(&output, name), read_entry(&input, name), "{}", name);
    }
}

#[test]
fn test_patched_entries_keep_their_timestamps() {
    let input = report();
    let apply = || {
        XlsxHighlighter::apply(&input, &SheetSelector::default(), &[fill("B2", Color::YELLOW)])
            .unwrap()
    };

    // Zip timestamps have two-second resolution
    std::thread::sleep(std::time::Duration::from_millis(2100));
    let first = apply();
    for name in ["xl/styles.xml", "xl/worksheets/sheet2.xml"] {
        assert_eq!(entry_modified(&first, name), entry_modified(&input, name), "{}", name);
    }

    std::thread::sleep(std::time::Duration::from_millis(2100));
    assert_eq!(apply(), first);
}

#[test]
fn test_stored_entries_stay_stored() {
    let input = PackageBuilder::new()
        .sheet("TD Dados", &report_rows())
        .stored()
        .build();
    let output = XlsxHighlighter::apply(
        &input,
        &SheetSelector::First,
        &[fill("B2", Color::RED)],
    )
    .unwrap();

    assert_eq!(
        entry_compression(&output, "xl/worksheets/sheet1.xml"),
        CompressionMethod::Stored
    );
    assert_eq!(entry_compression(&output, "xl/styles.xml"), CompressionMethod::Stored);
}

#[test]
fn test_same_format_and_color_share_one_style() {
    let rows = [
        format!(r#"<row r="2">{}</row>"#, num_cell("B2", 1.0)),
        format!(r#"<row r="3">{}</row>"#, num_cell("B3", 2.0)),
    ]
    .concat();
    let input = PackageBuilder::new().sheet("TD Dados", &rows).build();
    let output = XlsxHighlighter::apply(
        &input,
        &SheetSelector::default(),
        &[fill("B2", Color::RED), fill("B3", Color::RED)],
    )
    .unwrap();

    let styles = read_entry(&output, "xl/styles.xml");
    assert!(styles.contains(r#"<fills count="3">"#));
    assert!(styles.contains(r#"<cellXfs count="4">"#));

    let sheet = read_entry(&output, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(r#"<c r="B2" s="3">"#));
    assert!(sheet.contains(r#"<c r="B3" s="3">"#));
}

#[test]
fn test_missing_styles_part() {
    let input = PackageBuilder::new()
        .sheet("TD Dados", &report_rows())
        .without_styles()
        .build();
    let err = XlsxHighlighter::apply(&input, &SheetSelector::default(), &[fill("B2", Color::RED)])
        .unwrap_err();
    assert!(matches!(err, XlsxError::MissingPart(_)));
}

#[test]
fn test_apply_to_file() {
    let input = report();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relatorio_highlighted.xlsx");

    let file = std::fs::File::create(&path).unwrap();
    XlsxHighlighter::apply_to(
        std::io::Cursor::new(&input),
        file,
        &SheetSelector::default(),
        &[fill("B2", Color::YELLOW)],
    )
    .unwrap();

    let written = std::fs::read(&path).unwrap();
    assert!(read_entry(&written, "xl/worksheets/sheet2.xml").contains(r#"<c r="B2" s="3">"#));
}
