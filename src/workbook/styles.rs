//! Parser for xl/styles.xml, reduced to what the trigger engine needs:
//! the solid background fill per cell style index.

use crate::error::{Result, SheetSentryError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// For each cellXfs entry, the ARGB string of its solid fill, if any.
///
/// Only explicit `rgb` attributes produce a fill id; indexed and theme
/// colors come back as `None`, which the strict-equality trigger treats
/// the same as "no fill".
pub fn parse_cell_fills(xml: &str) -> Result<Vec<Option<String>>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut fills: Vec<Option<String>> = Vec::new();
    let mut fill_ids: Vec<usize> = Vec::new();
    let mut buf = Vec::with_capacity(512);

    let mut in_fills = false;
    let mut in_cell_xfs = false;
    let mut fill_depth = 0u32;
    let mut solid = false;
    let mut current: Option<String> = None;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"fills" => in_fills = true,
                b"cellXfs" => in_cell_xfs = true,
                b"fill" if in_fills => {
                    fill_depth += 1;
                    solid = false;
                    current = None;
                }
                b"patternFill" if fill_depth > 0 => {
                    solid = attr_value(&reader, &e, b"patternType").as_deref() == Some("solid");
                }
                b"fgColor" if fill_depth > 0 => {
                    if solid {
                        current = attr_value(&reader, &e, b"rgb");
                    }
                }
                b"xf" if in_cell_xfs => {
                    fill_ids.push(parse_fill_id(&reader, &e));
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"fill" if in_fills => fills.push(None),
                b"patternFill" if fill_depth > 0 => {
                    solid = attr_value(&reader, &e, b"patternType").as_deref() == Some("solid");
                }
                b"fgColor" if fill_depth > 0 => {
                    if solid {
                        current = attr_value(&reader, &e, b"rgb");
                    }
                }
                b"xf" if in_cell_xfs => {
                    fill_ids.push(parse_fill_id(&reader, &e));
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"fills" => in_fills = false,
                b"cellXfs" => in_cell_xfs = false,
                b"fill" if fill_depth > 0 => {
                    fills.push(current.take());
                    fill_depth -= 1;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SheetSentryError::MalformedDocument(format!(
                    "styles.xml: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(fill_ids
        .into_iter()
        .map(|id| fills.get(id).cloned().flatten())
        .collect())
}

fn parse_fill_id(reader: &Reader<&[u8]>, e: &BytesStart) -> usize {
    attr_value(reader, e, b"fillId")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn attr_value(reader: &Reader<&[u8]>, e: &BytesStart, name: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name {
            if let Ok(value) = attr.decode_and_unescape_value(reader.decoder()) {
                return Some(value.into_owned());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FF00FF00"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="0" fillId="2" borderId="0" xfId="0" applyFill="1"/>
    <xf numFmtId="0" fontId="0" fillId="1" borderId="0" xfId="0"/>
  </cellXfs>
</styleSheet>"#;

    #[test]
    fn test_cell_fills_resolved_by_style_index() {
        let fills = parse_cell_fills(STYLES).unwrap();
        assert_eq!(fills.len(), 3);
        assert_eq!(fills[0], None);
        assert_eq!(fills[1], Some("FF00FF00".to_string()));
        assert_eq!(fills[2], None);
    }

    #[test]
    fn test_theme_color_yields_no_fill() {
        let xml = r#"<styleSheet>
  <fills><fill><patternFill patternType="solid"><fgColor theme="4"/></patternFill></fill></fills>
  <cellXfs><xf fillId="0"/></cellXfs>
</styleSheet>"#;
        let fills = parse_cell_fills(xml).unwrap();
        assert_eq!(fills, vec![None]);
    }
}
