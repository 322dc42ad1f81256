//! Content extraction
//!
//! Turns a fetched body into a `(title, text)` pair, with one strategy per
//! content kind:
//! - HTML: readability main-content extraction, falling back to all visible
//!   text when the summary is too short to be the real article
//! - PDF: full-document text extraction
//! - DOCX: paragraph texts in document order, newline-joined
//!
//! PDF and DOCX failures never abort a crawl. They are returned as a typed
//! `ExtractionError` and rendered into the record text as a failure marker.

mod docx;
mod html;
mod pdf;

pub use docx::extract_docx_text;
pub use html::{extract_html, visible_text};
pub use pdf::extract_pdf_text;

use crate::state::ContentKind;
use thiserror::Error;
use url::Url;

/// Errors raised while pulling text out of binary documents
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{0}")]
    Pdf(String),

    #[error("invalid DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("DOCX archive has no word/document.xml part")]
    MissingDocumentPart,

    #[error("malformed DOCX XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extractor panicked: {0}")]
    Panicked(String),
}

/// Tunables for the HTML strategy
#[derive(Debug, Clone, Copy)]
pub struct ExtractSettings {
    /// Readability output with fewer words than this is discarded
    pub min_article_words: usize,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            min_article_words: 50,
        }
    }
}

/// The result of running one extraction strategy
#[derive(Debug)]
pub struct Extraction {
    pub title: String,
    pub text: String,

    /// Set when a binary strategy failed; `text` then holds the failure marker
    pub failure: Option<ExtractionError>,
}

impl Extraction {
    /// An extraction that produced nothing
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            text: String::new(),
            failure: None,
        }
    }
}

/// Runs the strategy selected by `kind`
///
/// # Arguments
///
/// * `kind` - The classified content kind
/// * `body` - Raw response bytes
/// * `page_url` - The URL the body was served from
/// * `document_title` - Title used for PDF/DOCX (normally the asset filename)
/// * `settings` - HTML strategy tunables
pub fn extract_content(
    kind: ContentKind,
    body: &[u8],
    page_url: &Url,
    document_title: &str,
    settings: &ExtractSettings,
) -> Extraction {
    match kind {
        ContentKind::Html => {
            let html = String::from_utf8_lossy(body);
            let (title, text) = extract_html(&html, page_url, settings.min_article_words);
            Extraction {
                title,
                text,
                failure: None,
            }
        }
        ContentKind::Pdf => binary_extraction("PDF", extract_pdf_text(body), document_title),
        ContentKind::Docx => binary_extraction("DOCX", extract_docx_text(body), document_title),
        ContentKind::Other | ContentKind::Error => Extraction::empty(),
    }
}

fn binary_extraction(
    label: &str,
    result: Result<String, ExtractionError>,
    document_title: &str,
) -> Extraction {
    match result {
        Ok(text) => Extraction {
            title: document_title.to_string(),
            text,
            failure: None,
        },
        Err(e) => Extraction {
            title: document_title.to_string(),
            text: failure_marker(label, &e),
            failure: Some(e),
        },
    }
}

/// Renders the text stored for a failed extraction
pub fn failure_marker(label: &str, error: &ExtractionError) -> String {
    format!("[[{} extract failed: {}]]", label, error)
}

/// Describes a caught panic payload
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
