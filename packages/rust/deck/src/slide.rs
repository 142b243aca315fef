//! Event-based parsing of individual slide XML parts.
//!
//! Matching happens on local element names only, so the `p:`/`a:`/`r:`
//! namespace prefixes a producer picks do not matter.

use std::collections::HashMap;

use xml::reader::{EventReader, XmlEvent};

/// Raw content pulled from one slide part.
#[derive(Debug, Default)]
pub(crate) struct SlideContent {
    /// Text of each shape, paragraphs joined with `\n`, in document order.
    pub shape_texts: Vec<String>,
    /// Relationship id of the first embedded picture (`a:blip r:embed`).
    pub first_pic_rid: Option<String>,
}

/// Walk a slide part once, collecting per-shape text and the first picture
/// relationship. Pictures nested in group shapes count.
pub(crate) fn parse_slide_xml(xml_text: &str) -> Result<SlideContent, xml::reader::Error> {
    let parser = EventReader::from_str(xml_text);
    let mut content = SlideContent::default();

    let mut sp_depth = 0usize;
    let mut pic_depth = 0usize;
    let mut in_text_run = false;
    let mut paragraphs = 0usize;
    let mut current = String::new();

    for event in parser {
        match event? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => match name.local_name.as_str() {
                "sp" => {
                    sp_depth += 1;
                    if sp_depth == 1 {
                        current.clear();
                        paragraphs = 0;
                    }
                }
                "p" if sp_depth > 0 => {
                    if paragraphs > 0 {
                        current.push('\n');
                    }
                    paragraphs += 1;
                }
                "t" if sp_depth > 0 => in_text_run = true,
                "pic" => pic_depth += 1,
                "blip" if pic_depth > 0 && content.first_pic_rid.is_none() => {
                    content.first_pic_rid = attributes
                        .into_iter()
                        .find(|a| a.name.local_name == "embed")
                        .map(|a| a.value);
                }
                _ => {}
            },
            XmlEvent::Characters(s) => {
                if in_text_run {
                    current.push_str(&s);
                }
            }
            XmlEvent::EndElement { name } => match name.local_name.as_str() {
                "t" => in_text_run = false,
                "sp" => {
                    sp_depth = sp_depth.saturating_sub(1);
                    if sp_depth == 0 {
                        content.shape_texts.push(std::mem::take(&mut current));
                    }
                }
                "pic" => pic_depth = pic_depth.saturating_sub(1),
                _ => {}
            },
            _ => {}
        }
    }

    Ok(content)
}

/// Parse a `.rels` part into a relationship id to target map.
pub(crate) fn parse_rels_xml(
    xml_text: &str,
) -> Result<HashMap<String, String>, xml::reader::Error> {
    let parser = EventReader::from_str(xml_text);
    let mut rels = HashMap::new();

    for event in parser {
        if let XmlEvent::StartElement {
            name, attributes, ..
        } = event?
        {
            if name.local_name != "Relationship" {
                continue;
            }
            let mut id = None;
            let mut target = None;
            for attr in attributes {
                match attr.name.local_name.as_str() {
                    "Id" => id = Some(attr.value),
                    "Target" => target = Some(attr.value),
                    _ => {}
                }
            }
            if let (Some(id), Some(target)) = (id, target) {
                rels.insert(id, target);
            }
        }
    }

    Ok(rels)
}
