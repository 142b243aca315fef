//! Slide-deck extraction for Remix Studio.
//!
//! A `.pptx` file is a zip container of XML parts. This crate reads the
//! container directly: slide parts under `ppt/slides/`, their relationship
//! parts under `ppt/slides/_rels/`, and embedded picture blobs under
//! `ppt/media/`. No presentation library involved.
//!
//! Per slide the extractor picks one caption candidate (the longest shape
//! text over the minimum length) and the first embedded picture. Slides
//! without a picture are skipped.

mod slide;

use std::collections::HashMap;
use std::io::{Cursor, Read};

use tracing::{debug, info, instrument, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use remixstudio_shared::{RemixStudioError, Result};

type DeckArchive<'a> = ZipArchive<Cursor<&'a [u8]>>;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for deck extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Maximum number of slides scanned; the rest of the deck is ignored.
    pub max_slides: usize,
    /// Shape text must be strictly longer than this (in chars) to become
    /// the caption candidate.
    pub min_caption_chars: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_slides: 100,
            min_caption_chars: 10,
        }
    }
}

/// An embedded picture, byte-for-byte as stored in the deck.
#[derive(Debug, Clone)]
pub struct SlideImage {
    /// Raw blob (never re-encoded).
    pub bytes: Vec<u8>,
    /// Container path the blob came from (e.g. `ppt/media/image3.png`).
    pub media_path: String,
    /// Sniffed format short name (`png`, `jpg`, ...), `None` when unknown.
    pub format: Option<String>,
}

/// One extracted slide: position, caption candidate, and its picture.
#[derive(Debug, Clone)]
pub struct ExtractedSlide {
    /// 1-based position in the deck.
    pub index: usize,
    /// Chosen caption candidate; empty when no shape text qualified.
    pub caption: String,
    /// The first embedded picture of the slide.
    pub image: SlideImage,
}

/// Result of scanning a deck.
#[derive(Debug, Clone, Default)]
pub struct DeckExtraction {
    /// Slides carrying a picture, in deck order.
    pub slides: Vec<ExtractedSlide>,
    /// Number of slide parts examined (bounded by `max_slides`).
    pub slides_scanned: usize,
    /// Slides dropped for having no resolvable picture.
    pub slides_skipped: usize,
    /// True when the deck had more slides than the scan limit.
    pub truncated: bool,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract captions and pictures from raw `.pptx` bytes.
///
/// Slide parts are visited in numeric order (`slide10` after `slide9`),
/// which matches the deck order every mainstream producer writes.
#[instrument(skip_all, fields(size = bytes.len()))]
pub fn extract_slides(bytes: &[u8], opts: &ExtractOptions) -> Result<DeckExtraction> {
    let cursor = Cursor::new(bytes);
    let mut archive =
        ZipArchive::new(cursor).map_err(|_| RemixStudioError::deck("not a valid .pptx file"))?;

    let mut slide_parts: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    slide_parts.sort_by_key(|(n, _)| *n);

    debug!(parts = slide_parts.len(), "listing slide parts");

    let mut extraction = DeckExtraction::default();

    for (position, (_, part_name)) in slide_parts.iter().enumerate() {
        if position >= opts.max_slides {
            warn!(
                limit = opts.max_slides,
                remaining = slide_parts.len() - position,
                "slide limit reached, ignoring the rest of the deck"
            );
            extraction.truncated = true;
            break;
        }
        extraction.slides_scanned += 1;
        let index = position + 1;

        let xml_bytes = read_part(&mut archive, part_name)?
            .ok_or_else(|| RemixStudioError::deck(format!("missing slide part {part_name}")))?;
        let xml_text = String::from_utf8_lossy(&xml_bytes);
        let content = slide::parse_slide_xml(&xml_text)
            .map_err(|e| RemixStudioError::deck(format!("malformed xml in {part_name}: {e}")))?;

        let caption = pick_caption(&content.shape_texts, opts.min_caption_chars);

        let Some(rid) = content.first_pic_rid else {
            debug!(part = %part_name, "slide has no embedded picture");
            extraction.slides_skipped += 1;
            continue;
        };

        let rels_name = rels_part_name(part_name);
        let rels = match read_part(&mut archive, &rels_name)? {
            Some(rels_bytes) => {
                let rels_text = String::from_utf8_lossy(&rels_bytes);
                slide::parse_rels_xml(&rels_text).map_err(|e| {
                    RemixStudioError::deck(format!("malformed xml in {rels_name}: {e}"))
                })?
            }
            None => HashMap::new(),
        };

        let Some(target) = rels.get(&rid) else {
            warn!(part = %part_name, %rid, "picture relationship not found, skipping slide");
            extraction.slides_skipped += 1;
            continue;
        };

        let media_path = resolve_media_target(target);
        let Some(image_bytes) = read_part(&mut archive, &media_path)? else {
            warn!(part = %part_name, media = %media_path, "media part not found, skipping slide");
            extraction.slides_skipped += 1;
            continue;
        };

        let format = image::guess_format(&image_bytes)
            .ok()
            .and_then(|f| f.extensions_str().first().copied())
            .map(str::to_string);

        extraction.slides.push(ExtractedSlide {
            index,
            caption,
            image: SlideImage {
                bytes: image_bytes,
                media_path,
                format,
            },
        });
    }

    info!(
        slides = extraction.slides.len(),
        scanned = extraction.slides_scanned,
        skipped = extraction.slides_skipped,
        truncated = extraction.truncated,
        "deck extraction complete"
    );

    Ok(extraction)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Longest trimmed shape text strictly over the minimum length; ties keep
/// the earlier shape.
fn pick_caption(shape_texts: &[String], min_chars: usize) -> String {
    let mut caption = String::new();
    let mut caption_chars = 0usize;
    for text in shape_texts {
        let trimmed = text.trim();
        let chars = trimmed.chars().count();
        if chars > min_chars && chars > caption_chars {
            caption = trimmed.to_string();
            caption_chars = chars;
        }
    }
    caption
}

/// Parse `ppt/slides/slideN.xml` into `N`.
fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Relationship part for a slide part.
fn rels_part_name(part_name: &str) -> String {
    let file_name = part_name.rsplit('/').next().unwrap_or(part_name);
    format!("ppt/slides/_rels/{file_name}.rels")
}

/// Resolve a relationship target (relative to `ppt/slides/`) to a container
/// path. Leading `/` marks a package-absolute target.
fn resolve_media_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = vec!["ppt", "slides"];
    for segment in target.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            other => parts.push(other),
        }
    }
    parts.join("/")
}

fn read_part(archive: &mut DeckArchive<'_>, name: &str) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut part) => {
            let mut buf = Vec::with_capacity(part.size() as usize);
            part.read_to_end(&mut buf)
                .map_err(|e| RemixStudioError::deck(format!("failed to read {name}: {e}")))?;
            Ok(Some(buf))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(RemixStudioError::deck(format!("failed to open {name}: {e}"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];
    const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 5, 6];

    fn slide_xml(texts: &[&str], pic_rids: &[&str]) -> Vec<u8> {
        let mut body = String::new();
        for t in texts {
            body.push_str(&format!(
                "<p:sp><p:txBody><a:p><a:r><a:t>{t}</a:t></a:r></a:p></p:txBody></p:sp>"
            ));
        }
        for rid in pic_rids {
            body.push_str(&format!(
                "<p:pic><p:blipFill><a:blip r:embed=\"{rid}\"/></p:blipFill></p:pic>"
            ));
        }
        format!(
            "<p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
             xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
             <p:cSld><p:spTree>{body}</p:spTree></p:cSld></p:sld>"
        )
        .into_bytes()
    }

    fn rels_xml(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut body = String::new();
        for (id, target) in entries {
            body.push_str(&format!(
                "<Relationship Id=\"{id}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" Target=\"{target}\"/>"
            ));
        }
        format!(
            "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">{body}</Relationships>"
        )
        .into_bytes()
    }

    fn build_container(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in parts {
            writer
                .start_file(*name, zip::write::FileOptions::default())
                .expect("start part");
            writer.write_all(bytes).expect("write part");
        }
        writer.finish().expect("finish container").into_inner()
    }

    fn single_slide_deck(texts: &[&str], image: Option<&[u8]>) -> Vec<u8> {
        match image {
            Some(bytes) => {
                let slide = slide_xml(texts, &["rId1"]);
                let rels = rels_xml(&[("rId1", "../media/image1.png")]);
                build_container(&[
                    ("ppt/slides/slide1.xml", &slide),
                    ("ppt/slides/_rels/slide1.xml.rels", &rels),
                    ("ppt/media/image1.png", bytes),
                ])
            }
            None => {
                let slide = slide_xml(texts, &[]);
                build_container(&[("ppt/slides/slide1.xml", &slide)])
            }
        }
    }

    #[test]
    fn rejects_non_zip_input() {
        let err = extract_slides(b"plain text, definitely not a deck", &ExtractOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("not a valid .pptx file"));
    }

    #[test]
    fn container_without_slides_is_empty() {
        let deck = build_container(&[("docProps/app.xml", b"<Properties/>")]);
        let extraction = extract_slides(&deck, &ExtractOptions::default()).expect("extract");
        assert!(extraction.slides.is_empty());
        assert_eq!(extraction.slides_scanned, 0);
        assert!(!extraction.truncated);
    }

    #[test]
    fn extracts_caption_and_image() {
        let deck = single_slide_deck(&["A mountain lake at dawn, wide panorama"], Some(PNG_BYTES));
        let extraction = extract_slides(&deck, &ExtractOptions::default()).expect("extract");

        assert_eq!(extraction.slides.len(), 1);
        let slide = &extraction.slides[0];
        assert_eq!(slide.index, 1);
        assert_eq!(slide.caption, "A mountain lake at dawn, wide panorama");
        assert_eq!(slide.image.bytes, PNG_BYTES);
        assert_eq!(slide.image.media_path, "ppt/media/image1.png");
        assert_eq!(slide.image.format.as_deref(), Some("png"));
    }

    #[test]
    fn sniffs_non_png_formats() {
        let deck = single_slide_deck(&["Some long enough text"], Some(JPEG_BYTES));
        let extraction = extract_slides(&deck, &ExtractOptions::default()).expect("extract");
        assert_eq!(extraction.slides[0].image.format.as_deref(), Some("jpg"));
        assert_eq!(extraction.slides[0].image.bytes, JPEG_BYTES);
    }

    #[test]
    fn short_texts_never_become_captions() {
        // Exactly at the limit does not qualify; one over does.
        let deck = single_slide_deck(&["abcdefghij", "Hi"], Some(PNG_BYTES));
        let extraction = extract_slides(&deck, &ExtractOptions::default()).expect("extract");
        assert_eq!(extraction.slides[0].caption, "");

        let deck = single_slide_deck(&["abcdefghijk"], Some(PNG_BYTES));
        let extraction = extract_slides(&deck, &ExtractOptions::default()).expect("extract");
        assert_eq!(extraction.slides[0].caption, "abcdefghijk");
    }

    #[test]
    fn longest_text_wins_ties_keep_earlier() {
        let deck = single_slide_deck(
            &[
                "Quarterly revenue chart",
                "A detailed view of quarterly revenue by region and product line",
                "Q3 summary of results",
            ],
            Some(PNG_BYTES),
        );
        let extraction = extract_slides(&deck, &ExtractOptions::default()).expect("extract");
        assert_eq!(
            extraction.slides[0].caption,
            "A detailed view of quarterly revenue by region and product line"
        );

        // Equal length: the earlier shape keeps the caption.
        let deck = single_slide_deck(&["first long candidate", "other long candidate"], Some(PNG_BYTES));
        let extraction = extract_slides(&deck, &ExtractOptions::default()).expect("extract");
        assert_eq!(extraction.slides[0].caption, "first long candidate");
    }

    #[test]
    fn slides_without_pictures_are_skipped() {
        let slide1 = slide_xml(&["Text only slide without any image"], &[]);
        let slide2 = slide_xml(&["Slide two carries the picture"], &["rId1"]);
        let rels2 = rels_xml(&[("rId1", "../media/image7.png")]);
        let deck = build_container(&[
            ("ppt/slides/slide1.xml", &slide1),
            ("ppt/slides/slide2.xml", &slide2),
            ("ppt/slides/_rels/slide2.xml.rels", &rels2),
            ("ppt/media/image7.png", PNG_BYTES),
        ]);

        let extraction = extract_slides(&deck, &ExtractOptions::default()).expect("extract");
        assert_eq!(extraction.slides.len(), 1);
        assert_eq!(extraction.slides_skipped, 1);
        assert_eq!(extraction.slides_scanned, 2);
        // Deck position survives the skip.
        assert_eq!(extraction.slides[0].index, 2);
    }

    #[test]
    fn slide_parts_visit_in_numeric_order() {
        let mk = |text: &str| slide_xml(&[text], &["rId1"]);
        let s1 = mk("caption for slide one");
        let s2 = mk("caption for slide two");
        let s10 = mk("caption for slide ten");
        let rels = rels_xml(&[("rId1", "../media/image1.png")]);
        // String order would put slide10 between slide1 and slide2.
        let deck = build_container(&[
            ("ppt/slides/slide10.xml", &s10),
            ("ppt/slides/slide1.xml", &s1),
            ("ppt/slides/slide2.xml", &s2),
            ("ppt/slides/_rels/slide1.xml.rels", &rels),
            ("ppt/slides/_rels/slide2.xml.rels", &rels),
            ("ppt/slides/_rels/slide10.xml.rels", &rels),
            ("ppt/media/image1.png", PNG_BYTES),
        ]);

        let extraction = extract_slides(&deck, &ExtractOptions::default()).expect("extract");
        let captions: Vec<&str> = extraction.slides.iter().map(|s| s.caption.as_str()).collect();
        assert_eq!(
            captions,
            vec![
                "caption for slide one",
                "caption for slide two",
                "caption for slide ten"
            ]
        );
        assert_eq!(extraction.slides[2].index, 3);
    }

    #[test]
    fn scan_limit_truncates() {
        let slide = slide_xml(&["some elaborate slide text"], &["rId1"]);
        let rels = rels_xml(&[("rId1", "../media/image1.png")]);
        let deck = build_container(&[
            ("ppt/slides/slide1.xml", &slide),
            ("ppt/slides/slide2.xml", &slide),
            ("ppt/slides/slide3.xml", &slide),
            ("ppt/slides/_rels/slide1.xml.rels", &rels),
            ("ppt/slides/_rels/slide2.xml.rels", &rels),
            ("ppt/slides/_rels/slide3.xml.rels", &rels),
            ("ppt/media/image1.png", PNG_BYTES),
        ]);

        let opts = ExtractOptions {
            max_slides: 2,
            ..ExtractOptions::default()
        };
        let extraction = extract_slides(&deck, &opts).expect("extract");
        assert!(extraction.truncated);
        assert_eq!(extraction.slides_scanned, 2);
        assert_eq!(extraction.slides.len(), 2);
    }

    #[test]
    fn first_picture_wins() {
        let slide = slide_xml(&["two pictures on this slide"], &["rId1", "rId2"]);
        let rels = rels_xml(&[
            ("rId1", "../media/image1.png"),
            ("rId2", "../media/image2.jpeg"),
        ]);
        let deck = build_container(&[
            ("ppt/slides/slide1.xml", &slide),
            ("ppt/slides/_rels/slide1.xml.rels", &rels),
            ("ppt/media/image1.png", PNG_BYTES),
            ("ppt/media/image2.jpeg", JPEG_BYTES),
        ]);

        let extraction = extract_slides(&deck, &ExtractOptions::default()).expect("extract");
        assert_eq!(extraction.slides.len(), 1);
        assert_eq!(extraction.slides[0].image.bytes, PNG_BYTES);
    }

    #[test]
    fn dangling_relationship_skips_slide() {
        let slide = slide_xml(&["picture points nowhere"], &["rId9"]);
        let rels = rels_xml(&[("rId1", "../media/image1.png")]);
        let deck = build_container(&[
            ("ppt/slides/slide1.xml", &slide),
            ("ppt/slides/_rels/slide1.xml.rels", &rels),
            ("ppt/media/image1.png", PNG_BYTES),
        ]);

        let extraction = extract_slides(&deck, &ExtractOptions::default()).expect("extract");
        assert!(extraction.slides.is_empty());
        assert_eq!(extraction.slides_skipped, 1);
    }

    #[test]
    fn missing_media_part_skips_slide() {
        let slide = slide_xml(&["media blob is gone"], &["rId1"]);
        let rels = rels_xml(&[("rId1", "../media/image1.png")]);
        let deck = build_container(&[
            ("ppt/slides/slide1.xml", &slide),
            ("ppt/slides/_rels/slide1.xml.rels", &rels),
        ]);

        let extraction = extract_slides(&deck, &ExtractOptions::default()).expect("extract");
        assert!(extraction.slides.is_empty());
        assert_eq!(extraction.slides_skipped, 1);
    }

    #[test]
    fn resolves_relative_media_targets() {
        assert_eq!(
            resolve_media_target("../media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(
            resolve_media_target("/ppt/media/image2.png"),
            "ppt/media/image2.png"
        );
        assert_eq!(
            resolve_media_target("./../media/image3.gif"),
            "ppt/media/image3.gif"
        );
    }

    #[test]
    fn slide_number_parses_part_names() {
        assert_eq!(slide_number("ppt/slides/slide1.xml"), Some(1));
        assert_eq!(slide_number("ppt/slides/slide42.xml"), Some(42));
        assert_eq!(slide_number("ppt/slides/_rels/slide1.xml.rels"), None);
        assert_eq!(slide_number("ppt/slideLayouts/slideLayout1.xml"), None);
        assert_eq!(slide_number("ppt/media/image1.png"), None);
    }
}
