use crate::error::{Result, SheetSentryError};
use crate::rules::{CellValue, RowCells};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// One worksheet of a parsed snapshot: cell text plus resolved fill,
/// keyed by (row, column letter). Absent cells read as empty.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    row_count: u32,
    cells: HashMap<(u32, String), CellValue>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            row_count: 0,
            cells: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last populated row index (1-based). Zero for an empty sheet.
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    pub fn insert_cell(&mut self, row: u32, column: impl Into<String>, cell: CellValue) {
        self.row_count = self.row_count.max(row);
        self.cells.insert((row, column.into()), cell);
    }

    pub fn cell(&self, row: u32, column: &str) -> CellValue {
        self.cells
            .get(&(row, column.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn row(&self, row: u32) -> SheetRow<'_> {
        SheetRow { sheet: self, row }
    }
}

/// Read-only view of one row, as the rule engine consumes it.
#[derive(Clone, Copy)]
pub struct SheetRow<'a> {
    sheet: &'a Sheet,
    row: u32,
}

impl RowCells for SheetRow<'_> {
    fn cell(&self, column: &str) -> CellValue {
        self.sheet.cell(self.row, column)
    }
}

/// Parse one worksheet part. Shared strings and per-style fills come from
/// the workbook-level parts.
pub fn parse_sheet(
    name: &str,
    xml: &str,
    shared_strings: &[String],
    cell_fills: &[Option<String>],
) -> Result<Sheet> {
    let mut reader = Reader::from_str(xml);

    let mut sheet = Sheet::new(name);
    let mut buf = Vec::with_capacity(1024);

    // State of the cell currently being read.
    let mut cell_ref: Option<(String, u32)> = None;
    let mut cell_type = String::new();
    let mut style_index: Option<usize> = None;
    let mut value = String::new();
    let mut in_value = false;
    let mut in_inline_text = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    // Count declared rows even when all their cells are blank.
                    if let Some(row) = row_attr(&reader, &e) {
                        sheet.row_count = sheet.row_count.max(row);
                    }
                }
                b"c" => {
                    let attrs = cell_attrs(&reader, &e);
                    cell_ref = attrs.0;
                    cell_type = attrs.1;
                    style_index = attrs.2;
                    value.clear();
                }
                b"v" => in_value = true,
                b"t" => in_inline_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    if let Some(row) = row_attr(&reader, &e) {
                        sheet.row_count = sheet.row_count.max(row);
                    }
                }
                b"c" => {
                    // A self-closing cell carries no text, but may carry a fill.
                    let (reference, _, style) = cell_attrs(&reader, &e);
                    if let Some((column, row)) = reference {
                        let fill = style.and_then(|s| cell_fills.get(s).cloned()).flatten();
                        sheet.insert_cell(
                            row,
                            column,
                            CellValue {
                                text: String::new(),
                                fill,
                            },
                        );
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_value || in_inline_text {
                    let text = e.xml_content().map_err(|e| {
                        SheetSentryError::MalformedDocument(format!(
                            "worksheet \"{}\": {}",
                            name, e
                        ))
                    })?;
                    value.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"c" => {
                    if let Some((column, row)) = cell_ref.take() {
                        let text = resolve_text(&cell_type, &value, shared_strings);
                        let fill = style_index
                            .and_then(|s| cell_fills.get(s).cloned())
                            .flatten();
                        sheet.insert_cell(row, column, CellValue { text, fill });
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SheetSentryError::MalformedDocument(format!(
                    "worksheet \"{}\": {}",
                    name, e
                )))
            }
            _ => {}
        }
    }

    Ok(sheet)
}

fn row_attr(reader: &Reader<&[u8]>, e: &quick_xml::events::BytesStart) -> Option<u32> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"r" {
            if let Ok(v) = attr.decode_and_unescape_value(reader.decoder()) {
                return v.parse().ok();
            }
        }
    }
    None
}

type CellAttrs = (Option<(String, u32)>, String, Option<usize>);

/// The cell reference, type, and style index from a `<c>` element.
fn cell_attrs(reader: &Reader<&[u8]>, e: &quick_xml::events::BytesStart) -> CellAttrs {
    let mut reference = None;
    let mut cell_type = String::new();
    let mut style_index = None;
    for attr in e.attributes().flatten() {
        let Ok(v) = attr.decode_and_unescape_value(reader.decoder()) else {
            continue;
        };
        match attr.key.local_name().as_ref() {
            b"r" => reference = split_cell_ref(&v),
            b"t" => cell_type = v.into_owned(),
            b"s" => style_index = v.parse().ok(),
            _ => {}
        }
    }
    (reference, cell_type, style_index)
}

fn resolve_text(cell_type: &str, value: &str, shared_strings: &[String]) -> String {
    match cell_type {
        "s" => value
            .parse::<usize>()
            .ok()
            .and_then(|i| shared_strings.get(i).cloned())
            .unwrap_or_default(),
        // "inlineStr" accumulates through <is><t>, plain cells through <v>;
        // both end up in `value` already.
        _ => value.to_string(),
    }
}

/// Split "H7" into ("H", 7). Returns None for refs without both parts.
fn split_cell_ref(reference: &str) -> Option<(String, u32)> {
    let digits_at = reference.find(|c: char| c.is_ascii_digit())?;
    let (column, row) = reference.split_at(digits_at);
    if column.is_empty() || !column.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    Some((column.to_ascii_uppercase(), row.parse().ok()?))
}
