//! services/api/src/adapters/extractor.rs
//!
//! Turns uploaded file bytes into per-page text. Implements the
//! `DocumentExtractor` port from the `core` crate.
//!
//! - PDF: one page per PDF page
//! - PPTX: one page per slide, in presentation order
//! - DOCX: paragraphs packed into "virtual pages" of a fixed character budget
//! - JPG/PNG: a single empty page; the image itself is analysed by the vision model
//!
//! Embedded PDF images are read separately with `lopdf`.

use async_trait::async_trait;
use insighthub_core::domain::{DocType, EmbeddedImage, Page};
use insighthub_core::ports::{DocumentExtractor, PortError, PortResult};
use lopdf::{Dictionary, Object, ObjectId};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone, Debug)]
pub struct FileExtractor {
    docx_chunk_chars: usize,
}

impl FileExtractor {
    pub fn new(docx_chunk_chars: usize) -> Self {
        Self {
            docx_chunk_chars: docx_chunk_chars.max(1),
        }
    }
}

/// The lowercase extension of `filename`, or "" when there is none.
fn extension(filename: &str) -> String {
    let name = filename.trim().to_lowercase();
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_string(),
        None => String::new(),
    }
}

/// Collapses every run of whitespace to a single space.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn to_pages(texts: Vec<String>) -> Vec<Page> {
    texts
        .into_iter()
        .enumerate()
        .map(|(i, t)| Page::new(i, normalize_whitespace(&t)))
        .collect()
}

/// Dispatches on the file extension. Runs on a blocking thread.
fn extract_blocking(
    filename: &str,
    content: &[u8],
    docx_chunk_chars: usize,
) -> PortResult<(DocType, Vec<Page>)> {
    let ext = extension(filename);
    match ext.as_str() {
        "pdf" => Ok((DocType::Pdf, to_pages(extract_pdf_pages(content)?))),
        "pptx" => Ok((DocType::Pptx, to_pages(extract_pptx_slides(content)?))),
        "docx" => {
            let paragraphs = extract_docx_paragraphs(content)?;
            Ok((DocType::Docx, to_pages(chunk_paragraphs(&paragraphs, docx_chunk_chars))))
        }
        "jpg" | "jpeg" | "png" => Ok((DocType::Image, vec![Page::new(0, "")])),
        _ => Err(PortError::Extraction(format!(
            "Unsupported file type: .{}",
            if ext.is_empty() { "?" } else { ext.as_str() }
        ))),
    }
}

#[async_trait]
impl DocumentExtractor for FileExtractor {
    async fn extract(&self, filename: &str, content: &[u8]) -> PortResult<(DocType, Vec<Page>)> {
        let name = filename.to_string();
        let bytes = content.to_vec();
        let chunk_chars = self.docx_chunk_chars;
        let (doc_type, pages) =
            tokio::task::spawn_blocking(move || extract_blocking(&name, &bytes, chunk_chars))
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))??;
        debug!("Extracted {} page(s) from '{}' as {}.", pages.len(), filename, doc_type);
        Ok((doc_type, pages))
    }

    async fn extract_images(
        &self,
        filename: &str,
        content: &[u8],
    ) -> PortResult<Vec<EmbeddedImage>> {
        if extension(filename) != "pdf" {
            return Ok(Vec::new());
        }
        let bytes = content.to_vec();
        let images = tokio::task::spawn_blocking(move || extract_pdf_images(&bytes))
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))??;
        debug!("Found {} embedded image(s) in '{}'.", images.len(), filename);
        Ok(images)
    }
}

//=========================================================================================
// PDF
//=========================================================================================

fn extract_pdf_pages(content: &[u8]) -> PortResult<Vec<String>> {
    // pdf-extract panics on some malformed fonts; treat that like a parse error.
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(content));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(PortError::Extraction(format!(
            "Failed to extract PDF text: {}",
            e
        ))),
        Err(_) => Err(PortError::Extraction(
            "Failed to extract PDF text: the PDF could not be parsed".to_string(),
        )),
    }
}

//=========================================================================================
// Embedded PDF images
//=========================================================================================

/// Images at or below this many bytes are icons or decorations and are skipped.
pub const MIN_EMBEDDED_IMAGE_BYTES: usize = 5000;

/// Bound on the `Parent` chain walked when resources are inherited.
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// The resource dictionary of a page, inherited from its ancestors if needed.
fn page_resources(doc: &lopdf::Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return doc.dereference(resources).ok()?.1.as_dict().ok();
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_object(parent).ok()?.as_dict().ok()?;
    }
    None
}

/// True for streams already in a standalone image format (JPEG, JPEG 2000).
/// Other filters hold raw samples a vision model cannot read.
fn is_encoded_image(dict: &Dictionary) -> bool {
    let filters: Vec<&[u8]> = match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.as_slice()],
        Ok(Object::Array(items)) => items.iter().filter_map(|o| o.as_name().ok()).collect(),
        _ => Vec::new(),
    };
    filters
        .iter()
        .any(|f| *f == b"DCTDecode".as_slice() || *f == b"JPXDecode".as_slice())
}

fn extract_pdf_images(content: &[u8]) -> PortResult<Vec<EmbeddedImage>> {
    let doc = lopdf::Document::load_mem(content).map_err(|e| {
        PortError::Extraction(format!("Failed to read PDF images: {}", e))
    })?;

    let mut images = Vec::new();
    for (page_number, page_id) in doc.get_pages() {
        let Some(resources) = page_resources(&doc, page_id) else {
            continue;
        };
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|o| doc.dereference(o).ok())
            .and_then(|(_, o)| o.as_dict().ok())
        else {
            continue;
        };

        for (_, entry) in xobjects.iter() {
            let Ok((_, object)) = doc.dereference(entry) else {
                continue;
            };
            let Ok(stream) = object.as_stream() else {
                continue;
            };
            let is_image = stream
                .dict
                .get(b"Subtype")
                .and_then(|o| o.as_name())
                .map(|name| name == b"Image".as_slice())
                .unwrap_or(false);
            if is_image
                && is_encoded_image(&stream.dict)
                && stream.content.len() > MIN_EMBEDDED_IMAGE_BYTES
            {
                images.push(EmbeddedImage {
                    page_index: page_number.saturating_sub(1) as usize,
                    bytes: stream.content.clone(),
                });
            }
        }
    }
    Ok(images)
}

//=========================================================================================
// Office Open XML helpers
//=========================================================================================

fn local_name(q: &[u8]) -> &[u8] {
    match q.iter().position(|&b| b == b':') {
        Some(i) => &q[i + 1..],
        None => q,
    }
}

fn attr_val(e: &BytesStart<'_>, key: &[u8], qualified: bool) -> Option<String> {
    e.attributes().with_checks(false).flatten().find_map(|attr| {
        let k = attr.key.as_ref();
        let matches = if qualified { k == key } else { local_name(k) == key };
        matches.then(|| String::from_utf8_lossy(&attr.value).into_owned())
    })
}

fn open_zip<'a>(content: &'a [u8], kind: &str) -> PortResult<zip::ZipArchive<Cursor<&'a [u8]>>> {
    zip::ZipArchive::new(Cursor::new(content)).map_err(|e| {
        PortError::Extraction(format!("Failed to extract {} text: not a valid archive ({})", kind, e))
    })
}

fn read_entry(
    zip: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
    kind: &str,
) -> PortResult<String> {
    let mut entry = zip.by_name(name).map_err(|_| {
        PortError::Extraction(format!("Failed to extract {} text: missing {}", kind, name))
    })?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| PortError::Extraction(format!("Failed to extract {} text: {}", kind, e)))?;
    Ok(xml)
}

fn xml_error(kind: &str, e: quick_xml::Error) -> PortError {
    PortError::Extraction(format!("Failed to extract {} text: {}", kind, e))
}

/// Collects the text of every paragraph (`p`) whose runs are `t` elements.
fn paragraphs_from_xml(xml: &str, kind: &str) -> PortResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_t = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(|e| xml_error(kind, e))? {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"p" => current.clear(),
                b"t" => in_t = true,
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match local_name(e.name().as_ref()) {
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                _ => {}
            },
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"t" => in_t = false,
                b"p" => {
                    let text = current.trim();
                    if !text.is_empty() {
                        paragraphs.push(text.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Event::Text(t) if in_t => {
                let text = t.unescape().map_err(|e| xml_error(kind, e))?;
                current.push_str(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}

//=========================================================================================
// PPTX
//=========================================================================================

fn extract_pptx_slides(content: &[u8]) -> PortResult<Vec<String>> {
    const KIND: &str = "PPTX";
    let mut zip = open_zip(content, KIND)?;

    // Relationship id -> slide part path.
    let rels_xml = read_entry(&mut zip, "ppt/_rels/presentation.xml.rels", KIND)?;
    let mut rels: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(&rels_xml);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(|e| xml_error(KIND, e))? {
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"Relationship" => {
                if let (Some(id), Some(target)) =
                    (attr_val(&e, b"Id", false), attr_val(&e, b"Target", false))
                {
                    let target = target.trim_start_matches('/');
                    let path = if target.starts_with("ppt/") {
                        target.to_string()
                    } else {
                        format!("ppt/{}", target)
                    };
                    rels.insert(id, path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    // Slide order comes from presentation.xml.
    let pres_xml = read_entry(&mut zip, "ppt/presentation.xml", KIND)?;
    let mut slide_parts = Vec::new();
    let mut reader = Reader::from_str(&pres_xml);
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(|e| xml_error(KIND, e))? {
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"sldId" => {
                if let Some(part) = attr_val(&e, b"r:id", true).and_then(|rid| rels.get(&rid)) {
                    slide_parts.push(part.clone());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    slide_parts
        .iter()
        .map(|part| {
            let xml = read_entry(&mut zip, part, KIND)?;
            Ok(paragraphs_from_xml(&xml, KIND)?.join("\n"))
        })
        .collect()
}

//=========================================================================================
// DOCX
//=========================================================================================

fn extract_docx_paragraphs(content: &[u8]) -> PortResult<Vec<String>> {
    const KIND: &str = "DOCX";
    let mut zip = open_zip(content, KIND)?;
    let xml = read_entry(&mut zip, "word/document.xml", KIND)?;
    paragraphs_from_xml(&xml, KIND)
}

/// Greedily packs paragraphs into chunks of at most `budget` characters,
/// counting one separator character per paragraph. A paragraph longer than
/// the budget becomes a chunk of its own.
pub fn chunk_paragraphs(paragraphs: &[String], budget: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut size = 0usize;

    for p in paragraphs {
        let len = p.chars().count() + 1;
        if size + len > budget && !current.is_empty() {
            chunks.push(current.join("\n"));
            current.clear();
            size = 0;
        }
        current.push(p);
        size += len;
    }
    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, body) in entries {
                writer.start_file(*name, FileOptions::default()).unwrap();
                writer.write_all(body.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    const DOCX_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>First   paragraph</w:t></w:r><w:r><w:t xml:space="preserve"> continues.</w:t></w:r></w:p>
    <w:p><w:r><w:t></w:t></w:r></w:p>
    <w:p><w:r><w:t>Fish &amp; chips</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    fn slide_xml(texts: &[&str]) -> String {
        let paras: String = texts
            .iter()
            .map(|t| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", t))
            .collect();
        format!(
            r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree><p:sp><p:txBody>{}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            paras
        )
    }

    #[test]
    fn extension_is_lowercase_and_last_segment() {
        assert_eq!(extension("Report.Final.PDF"), "pdf");
        assert_eq!(extension("README"), "");
    }

    #[test]
    fn unsupported_types_are_rejected() {
        let err = extract_blocking("notes.txt", b"hello", 2500).unwrap_err();
        assert_eq!(err, PortError::Extraction("Unsupported file type: .txt".to_string()));
        let err = extract_blocking("noext", b"hello", 2500).unwrap_err();
        assert_eq!(err, PortError::Extraction("Unsupported file type: .?".to_string()));
    }

    #[test]
    fn images_become_one_empty_page() {
        let (doc_type, pages) = extract_blocking("shot.PNG", b"\x89PNG", 2500).unwrap();
        assert_eq!(doc_type, DocType::Image);
        assert_eq!(pages, vec![Page::new(0, "")]);
    }

    #[test]
    fn docx_paragraphs_are_extracted_and_normalized() {
        let bytes = zip_of(&[("word/document.xml", DOCX_XML)]);
        let (doc_type, pages) = extract_blocking("a.docx", &bytes, 2500).unwrap();
        assert_eq!(doc_type, DocType::Docx);
        assert_eq!(
            pages,
            vec![Page::new(0, "First paragraph continues. Fish & chips")]
        );
    }

    #[test]
    fn docx_respects_chunk_budget() {
        let bytes = zip_of(&[("word/document.xml", DOCX_XML)]);
        let (_, pages) = extract_blocking("a.docx", &bytes, 20).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1], Page::new(1, "Fish & chips"));
    }

    #[test]
    fn chunking_packs_greedily_and_keeps_oversized_paragraphs() {
        let paras: Vec<String> = ["aaaa", "bbbb", "cccccccccccc", "d"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            chunk_paragraphs(&paras, 10),
            vec!["aaaa\nbbbb", "cccccccccccc", "d"]
        );
        assert!(chunk_paragraphs(&[], 10).is_empty());
    }

    #[test]
    fn pptx_slides_follow_presentation_order() {
        let rels = r#"<Relationships>
            <Relationship Id="rId2" Target="slides/slide1.xml"/>
            <Relationship Id="rId3" Target="slides/slide2.xml"/>
        </Relationships>"#;
        let pres = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst>
            <p:sldId id="257" r:id="rId3"/>
            <p:sldId id="256" r:id="rId2"/>
        </p:sldIdLst></p:presentation>"#;
        let slide1 = slide_xml(&["Intro", "Welcome"]);
        let slide2 = slide_xml(&["Second slide"]);
        let bytes = zip_of(&[
            ("ppt/_rels/presentation.xml.rels", rels),
            ("ppt/presentation.xml", pres),
            ("ppt/slides/slide1.xml", slide1.as_str()),
            ("ppt/slides/slide2.xml", slide2.as_str()),
        ]);

        let (doc_type, pages) = extract_blocking("deck.pptx", &bytes, 2500).unwrap();
        assert_eq!(doc_type, DocType::Pptx);
        assert_eq!(
            pages,
            vec![Page::new(0, "Second slide"), Page::new(1, "Intro Welcome")]
        );
    }

    #[test]
    fn corrupt_archives_are_extraction_errors() {
        assert!(matches!(
            extract_blocking("a.docx", b"not a zip", 2500),
            Err(PortError::Extraction(_))
        ));
        assert!(matches!(
            extract_blocking("a.pdf", b"not a pdf", 2500),
            Err(PortError::Extraction(_))
        ));
    }

    #[tokio::test]
    async fn adapter_runs_extraction_off_the_async_thread() {
        let extractor = FileExtractor::new(2500);
        let (doc_type, pages) = extractor.extract("pic.jpeg", b"jpeg").await.unwrap();
        assert_eq!(doc_type, DocType::Image);
        assert_eq!(pages.len(), 1);
    }

    /// A one-page PDF whose page references the given image streams.
    fn pdf_with_images(images: &[(&str, usize)]) -> Vec<u8> {
        use lopdf::{dictionary, Stream};

        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut xobjects = lopdf::Dictionary::new();
        for (i, (filter, size)) in images.iter().enumerate() {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 10,
                    "Height" => 10,
                    "Filter" => *filter,
                },
                vec![0xAB; *size],
            ));
            xobjects.set(format!("Im{i}"), image_id);
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => dictionary! { "XObject" => xobjects },
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn pdf_images_keep_large_encoded_ones_only() {
        let bytes = pdf_with_images(&[
            ("DCTDecode", 6000),
            ("DCTDecode", 100),
            ("FlateDecode", 9000),
        ]);
        let images = extract_pdf_images(&bytes).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].page_index, 0);
        assert_eq!(images[0].bytes.len(), 6000);
    }

    #[tokio::test]
    async fn images_are_only_read_from_pdfs() {
        let extractor = FileExtractor::new(2500);
        let images = extractor.extract_images("photo.png", b"not a pdf").await.unwrap();
        assert!(images.is_empty());
        assert!(matches!(
            extractor.extract_images("broken.pdf", b"not a pdf").await,
            Err(PortError::Extraction(_))
        ));
    }
}
