//! DOCX text extraction
//!
//! A DOCX file is a zip archive; the body lives in `word/document.xml` as
//! `<w:p>` paragraphs made of `<w:t>` text runs.

use crate::extract::ExtractionError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts paragraph texts in document order, joined by newlines
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut xml = String::new();
    {
        let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| match e {
            ZipError::FileNotFound => ExtractionError::MissingDocumentPart,
            other => ExtractionError::Archive(other),
        })?;
        part.read_to_string(&mut xml)?;
    }

    let paragraphs = paragraphs_from_xml(&xml)?;
    Ok(paragraphs.join("\n").trim().to_string())
}

/// Walks `document.xml` and returns the text of each paragraph
///
/// Tabs and line breaks inside a paragraph are kept as `\t` and `\n`.
/// Paragraphs nested in text boxes are emitted before their container.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"t" => in_text_run = true,
                _ => {}
            },
            Event::Empty(e) => {
                let current = open.last_mut();
                match (e.local_name().as_ref(), current) {
                    (b"p", _) => paragraphs.push(String::new()),
                    (b"tab", Some(p)) => p.push('\t'),
                    (b"br" | b"cr", Some(p)) => p.push('\n'),
                    _ => {}
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(p) = open.pop() {
                        paragraphs.push(p);
                    }
                }
                b"t" => in_text_run = false,
                _ => {}
            },
            Event::Text(t) if in_text_run => {
                if let Some(p) = open.last_mut() {
                    p.push_str(&t.unescape()?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("[Content_Types].xml", FileOptions::default())
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer
            .start_file(DOCUMENT_PART, FileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn wrap_body(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
    }

    #[test]
    fn test_paragraphs_joined_in_order() {
        let xml = wrap_body(
            "<w:p><w:r><w:t>Rent rules</w:t></w:r></w:p>\
             <w:p><w:r><w:t xml:space=\"preserve\">Pay </w:t></w:r><w:r><w:t>monthly.</w:t></w:r></w:p>",
        );
        let text = extract_docx_text(&build_docx(&xml)).unwrap();
        assert_eq!(text, "Rent rules\nPay monthly.");
    }

    #[test]
    fn test_entities_tabs_and_breaks() {
        let xml = wrap_body(
            "<w:p><w:r><w:t>Tom &amp; Jerry</w:t><w:tab/><w:t>A</w:t><w:br/><w:t>B</w:t></w:r></w:p>",
        );
        let text = extract_docx_text(&build_docx(&xml)).unwrap();
        assert_eq!(text, "Tom & Jerry\tA\nB");
    }

    #[test]
    fn test_empty_paragraphs_keep_line_structure() {
        let xml = wrap_body(
            "<w:p><w:r><w:t>One</w:t></w:r></w:p><w:p/><w:p></w:p><w:p><w:r><w:t>Two</w:t></w:r></w:p>",
        );
        let text = extract_docx_text(&build_docx(&xml)).unwrap();
        assert_eq!(text, "One\n\n\nTwo");
    }

    #[test]
    fn test_text_outside_runs_is_ignored() {
        let xml = wrap_body(
            "<w:p><w:pPr><w:pStyle w:val=\"Heading1\"/></w:pPr><w:r><w:t>Title</w:t></w:r></w:p>",
        );
        let text = extract_docx_text(&build_docx(&xml)).unwrap();
        assert_eq!(text, "Title");
    }

    #[test]
    fn test_not_a_zip() {
        let result = extract_docx_text(b"plain bytes");
        assert!(matches!(result, Err(ExtractionError::Archive(_))));
    }

    #[test]
    fn test_zip_without_document_part() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("notes.txt", FileOptions::default())
            .unwrap();
        writer.write_all(b"hello").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let result = extract_docx_text(&bytes);
        assert!(matches!(result, Err(ExtractionError::MissingDocumentPart)));
    }

    #[test]
    fn test_malformed_xml() {
        let bytes = build_docx("<w:document><w:body><w:p></w:body>");
        let result = extract_docx_text(&bytes);
        assert!(matches!(result, Err(ExtractionError::Xml(_))));
    }
}
