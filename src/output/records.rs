//! Record types written to the output streams
//!
//! Both streams are JSON Lines: one serialized record per line, appended and
//! never rewritten.

use crate::state::ContentKind;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// Appended to answers that were cut at the character limit
pub const TRUNCATION_MARKER: char = '…';

/// Filename used when neither the URL nor the response names the asset
const FALLBACK_FILENAME: &str = "download";

/// One record per visited URL, whatever the outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub content_type: ContentKind,
    pub title: String,
    pub text: String,

    /// HTTP status, or 0 when no response was received
    pub status: u16,

    /// RFC 3339 UTC timestamp
    pub fetched_at: String,

    /// SHA-256 of the extracted text in hex, empty when nothing was extracted
    pub content_hash: String,

    /// In-scope links found on the page, empty for non-HTML
    pub discovered_links: Vec<String>,
}

impl PageRecord {
    /// Builds a record for a fetched resource
    pub fn new(
        url: impl Into<String>,
        content_type: ContentKind,
        status: u16,
        title: impl Into<String>,
        text: impl Into<String>,
        discovered_links: Vec<String>,
    ) -> Self {
        let text = text.into();
        Self {
            url: url.into(),
            content_type,
            title: title.into(),
            content_hash: content_hash(&text),
            text,
            status,
            fetched_at: timestamp(),
            discovered_links,
        }
    }

    /// Record for a URL whose fetch failed below the HTTP level
    ///
    /// Nothing was extracted, so the content hash stays empty.
    pub fn transport_error(url: impl Into<String>, error: &impl std::fmt::Display) -> Self {
        Self::new(url, ContentKind::Error, 0, "", "", Vec::new())
            .with_placeholder_text(format!("[[FETCH ERROR: {}]]", error))
    }

    /// Record for a non-2xx response
    pub fn http_failure(url: impl Into<String>, content_type: ContentKind, status: u16) -> Self {
        Self::new(url, content_type, status, "", "", Vec::new())
            .with_placeholder_text(format!("HTTP {}", status))
    }

    /// Sets a status text that was not extracted from the resource
    fn with_placeholder_text(mut self, text: String) -> Self {
        self.text = text;
        self
    }

    /// A QA record is derived only from records with both a title and text
    pub fn qa_eligible(&self) -> bool {
        !self.title.is_empty() && !self.text.is_empty()
    }
}

/// A question/answer pair with its source attribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
    pub tags: Vec<String>,
    pub sources: Vec<String>,
}

impl QaRecord {
    /// Derives the QA record for a page, if it is eligible
    ///
    /// # Arguments
    ///
    /// * `page` - The page record
    /// * `site_tag` - First tag on every record
    /// * `max_chars` - Answer length limit before the truncation marker
    pub fn from_page(page: &PageRecord, site_tag: &str, max_chars: usize) -> Option<Self> {
        if !page.qa_eligible() {
            return None;
        }

        Some(Self {
            question: question_for(page.content_type, &page.title),
            answer: summarize(&page.text, max_chars),
            tags: vec![site_tag.to_string(), page.content_type.as_str().to_string()],
            sources: vec![page.url.clone()],
        })
    }
}

/// Collapses whitespace and truncates to `max_chars` characters
///
/// The marker is appended iff the collapsed text was longer than the limit.
///
/// # Examples
///
/// ```
/// use site_sieve::output::summarize;
///
/// assert_eq!(summarize("  a   b\n c ", 10), "a b c");
/// assert_eq!(summarize("abcdef", 3), "abc…");
/// ```
pub fn summarize(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    match collapsed.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut answer = collapsed[..cut].to_string();
            answer.push(TRUNCATION_MARKER);
            answer
        }
        None => collapsed,
    }
}

/// SHA-256 of the text as lowercase hex, or empty for empty text
pub fn content_hash(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// The question asked for a record of the given kind
///
/// HTML pages use their title. Binary documents use the asset filename with
/// its extension removed and underscores turned into spaces.
pub fn question_for(kind: ContentKind, title: &str) -> String {
    if !kind.is_binary_document() {
        return title.to_string();
    }

    let stem = match title.rfind('.') {
        Some(dot) if dot > 0 => &title[..dot],
        _ => title,
    };
    let question = stem.replace('_', " ").trim().to_string();

    if question.is_empty() {
        title.to_string()
    } else {
        question
    }
}

/// Derives the asset filename for a downloaded document
///
/// The basename of the URL path is used unless the response carries a
/// `Content-Disposition` filename. Runs of characters outside
/// `[A-Za-z0-9._-]` collapse to a single `_`.
pub fn asset_filename(url: &Url, headers: &HeaderMap) -> String {
    let from_path = url
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_FILENAME)
        .to_string();

    let name = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(disposition_filename)
        .unwrap_or(from_path);

    sanitize_filename(&name)
}

/// Extracts `filename=` from a Content-Disposition value
fn disposition_filename(value: &str) -> Option<String> {
    let start = value.find("filename=")? + "filename=".len();
    let rest = value[start..].trim_start();

    let name = match rest.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next().unwrap_or(""),
        None => rest.split(';').next().unwrap_or(""),
    };

    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Collapses disallowed character runs to `_`
///
/// Names that would escape the asset directory fall back to `download`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }

    if out.is_empty() || out == "." || out == ".." {
        FALLBACK_FILENAME.to_string()
    } else {
        out
    }
}

/// Current UTC time in RFC 3339
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
