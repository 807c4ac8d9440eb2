//! End to end over a real archive: build a small xlsx in memory, parse
//! it, and run a scan pass against the built-in rules.

use sheet_sentry::alert::AlertSink;
use sheet_sentry::rules::{CellValue, RuleCatalog};
use sheet_sentry::watcher::scan_sheet;
use sheet_sentry::workbook::Workbook;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

#[derive(Default)]
struct RecordingAlert {
    notices: Vec<String>,
    alerts: u32,
}

impl AlertSink for RecordingAlert {
    fn notify(&mut self, label: &str) {
        self.notices.push(label.to_string());
    }

    fn play_alert(&mut self) {
        self.alerts += 1;
    }
}

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets><sheet name="1361 урок" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

// Shared strings: 0="финал" 1="на вшо" 2="7" 3="Олена" 4="12" 5="15"
const SHARED_STRINGS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="6" uniqueCount="6">
  <si><t>финал</t></si>
  <si><t>на вшо</t></si>
  <si><t>7</t></si>
  <si><t>Олена</t></si>
  <si><t>12</t></si>
  <si><t>15</t></si>
</sst>"#;

// Style index 1 resolves to a solid green fill.
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FF00FF00"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="0" fillId="2" borderId="0" xfId="0" applyFill="1"/>
  </cellXfs>
</styleSheet>"#;

// Row 2 matches the first trigger group; row 3 would match but is
// already assigned in column L.
const SHEET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" t="inlineStr"><is><t>Клас</t></is></c></row>
    <row r="2">
      <c r="A2" t="s"><v>2</v></c>
      <c r="F2" t="s"><v>4</v></c>
      <c r="H2" t="s" s="1"><v>0</v></c>
      <c r="I2" t="s" s="1"><v>0</v></c>
      <c r="Q2" t="s" s="1"><v>1</v></c>
    </row>
    <row r="3">
      <c r="A3" t="s"><v>2</v></c>
      <c r="F3" t="s"><v>5</v></c>
      <c r="H3" t="s" s="1"><v>0</v></c>
      <c r="I3" t="s" s="1"><v>0</v></c>
      <c r="L3" t="s"><v>3</v></c>
      <c r="Q3" t="s" s="1"><v>1</v></c>
    </row>
  </sheetData>
</worksheet>"#;

fn build_xlsx() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    let parts = [
        ("xl/workbook.xml", WORKBOOK_XML),
        ("xl/_rels/workbook.xml.rels", RELS_XML),
        ("xl/sharedStrings.xml", SHARED_STRINGS_XML),
        ("xl/styles.xml", STYLES_XML),
        ("xl/worksheets/sheet1.xml", SHEET_XML),
    ];
    for (name, content) in parts {
        writer.start_file(name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

#[test]
fn test_parse_snapshot() {
    let workbook = Workbook::from_bytes(&build_xlsx()).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["1361 урок"]);
    assert!(workbook.sheet("wrong name").is_none());

    let sheet = workbook.sheet("1361 урок").unwrap();
    assert_eq!(sheet.row_count(), 3);
    assert_eq!(sheet.cell(1, "A").text, "Клас");
    assert_eq!(sheet.cell(2, "A"), CellValue::text("7"));
    assert_eq!(sheet.cell(2, "H"), CellValue::styled("финал", "FF00FF00"));
    assert_eq!(sheet.cell(2, "Q"), CellValue::styled("на вшо", "FF00FF00"));
    assert_eq!(sheet.cell(3, "L").text, "Олена");
    // Absent cells read as empty and unstyled.
    assert_eq!(sheet.cell(2, "L"), CellValue::default());
}

#[test]
fn test_scan_parsed_snapshot() {
    let workbook = Workbook::from_bytes(&build_xlsx()).unwrap();
    let sheet = workbook.sheet("1361 урок").unwrap();
    let catalog = RuleCatalog::load(None).unwrap();

    let mut sink = RecordingAlert::default();
    let report = scan_sheet(sheet, &catalog, &mut sink);

    // Row 2 alerts with its lesson number; row 3 is skipped.
    assert_eq!(sink.notices, vec!["12".to_string()]);
    assert_eq!(sink.alerts, 1);
    assert_eq!(report.scanned_rows, 3);
    assert_eq!(report.skipped_rows, 1);
}

#[test]
fn test_missing_required_part_is_malformed() {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("xl/workbook.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(WORKBOOK_XML.as_bytes()).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let result = Workbook::from_bytes(&bytes);
    assert!(result.is_err());
}
