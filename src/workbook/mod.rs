//! Minimal xlsx snapshot reader.
//!
//! calamine cannot surface cell background fills, which the styled
//! triggers depend on, so the archive is read directly: workbook part and
//! relationships for sheet names, shared strings, the fill per style
//! index from styles.xml, then each worksheet part.

mod sheet;
mod styles;

pub use sheet::{Sheet, SheetRow};

use crate::error::{Result, SheetSentryError};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

/// A parsed, immutable snapshot of one downloaded document.
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| malformed(format!("not an xlsx archive: {}", e)))?;

        let shared = match read_part(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };
        let fills = match read_part(&mut archive, "xl/styles.xml")? {
            Some(xml) => styles::parse_cell_fills(&xml)?,
            None => Vec::new(),
        };

        let workbook_xml = require_part(&mut archive, "xl/workbook.xml")?;
        let rels_xml = require_part(&mut archive, "xl/_rels/workbook.xml.rels")?;
        let sheet_refs = parse_sheet_refs(&workbook_xml)?;
        let relationships = parse_relationships(&rels_xml)?;

        let mut sheets = Vec::with_capacity(sheet_refs.len());
        for (name, rel_id) in sheet_refs {
            let target = relationships.get(&rel_id).ok_or_else(|| {
                malformed(format!(
                    "no relationship {} for sheet \"{}\"",
                    rel_id, name
                ))
            })?;
            let path = match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{}", target),
            };
            let xml = require_part(&mut archive, &path)?;
            sheets.push(sheet::parse_sheet(&name, &xml, &shared, &fills)?);
        }

        Ok(Self { sheets })
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(malformed(format!("{}: {}", name, e))),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| malformed(format!("{}: {}", name, e)))?;
    Ok(Some(content))
}

fn require_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String> {
    read_part(archive, name)?.ok_or_else(|| malformed(format!("missing part {}", name)))
}

/// Shared strings in order. Rich-text runs inside one entry are
/// concatenated, matching the rendered cell text.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);

    let mut strings = Vec::new();
    let mut buf = Vec::with_capacity(1024);
    let mut current = String::new();
    let mut in_entry = false;
    let mut in_text = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_entry = true;
                    current.clear();
                }
                b"t" if in_entry => in_text = true,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .xml_content()
                    .map_err(|e| malformed(format!("sharedStrings.xml: {}", e)))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => {
                    in_entry = false;
                    strings.push(std::mem::take(&mut current));
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(format!("sharedStrings.xml: {}", e))),
            _ => {}
        }
    }

    Ok(strings)
}

/// Sheet (name, relationship id) pairs from xl/workbook.xml, in file order.
fn parse_sheet_refs(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut refs = Vec::new();
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"sheet" =>
            {
                let mut name = None;
                let mut rel_id = None;
                for attr in e.attributes().flatten() {
                    let Ok(v) = attr.decode_and_unescape_value(reader.decoder()) else {
                        continue;
                    };
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(v.into_owned()),
                        b"id" => rel_id = Some(v.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    refs.push((name, rel_id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(format!("workbook.xml: {}", e))),
            _ => {}
        }
    }

    if refs.is_empty() {
        return Err(malformed("workbook.xml declares no sheets".to_string()));
    }
    Ok(refs)
}

/// Relationship id → target path from xl/_rels/workbook.xml.rels.
fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut relationships = HashMap::new();
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    let Ok(v) = attr.decode_and_unescape_value(reader.decoder()) else {
                        continue;
                    };
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = Some(v.into_owned()),
                        b"Target" => target = Some(v.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    relationships.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(format!("workbook.xml.rels: {}", e))),
            _ => {}
        }
    }

    Ok(relationships)
}

fn malformed(message: impl Into<String>) -> SheetSentryError {
    SheetSentryError::MalformedDocument(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_strings_rich_text_runs_concatenated() {
        let xml = r#"<sst><si><t>финал</t></si><si><r><t>на </t></r><r><t>вшо</t></r></si></sst>"#;
        let strings = parse_shared_strings(xml).unwrap();
        assert_eq!(strings, vec!["финал".to_string(), "на вшо".to_string()]);
    }

    #[test]
    fn test_shared_strings_entities_unescaped() {
        let xml = r#"<sst><si><t>Історія &amp; Громадянська освіта</t></si></sst>"#;
        let strings = parse_shared_strings(xml).unwrap();
        assert_eq!(strings, vec!["Історія & Громадянська освіта".to_string()]);
    }

    #[test]
    fn test_sheet_refs_and_relationships() {
        let workbook = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets><sheet name="1361 урок" sheetId="1" r:id="rId1"/></sheets>
        </workbook>"#;
        let rels = r#"<Relationships>
            <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
        </Relationships>"#;

        let refs = parse_sheet_refs(workbook).unwrap();
        assert_eq!(refs, vec![("1361 урок".to_string(), "rId1".to_string())]);

        let map = parse_relationships(rels).unwrap();
        assert_eq!(map.get("rId1").unwrap(), "worksheets/sheet1.xml");
    }

    #[test]
    fn test_not_a_zip_is_malformed() {
        let result = Workbook::from_bytes(b"definitely not a zip");
        assert!(matches!(
            result,
            Err(SheetSentryError::MalformedDocument(_))
        ));
    }
}
