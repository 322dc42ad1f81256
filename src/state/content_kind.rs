//! Content classification for fetched resources
//!
//! Every page record carries exactly one of these tags, and extraction is
//! selected from it.

use serde::{Deserialize, Serialize};
use std::fmt;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// What kind of resource a page record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// An HTML document
    Html,

    /// A PDF document
    Pdf,

    /// A Word (OOXML) document
    Docx,

    /// Anything else that was fetched successfully
    Other,

    /// The fetch never produced a response
    Error,
}

impl ContentKind {
    /// Classifies a response from its Content-Type header and URL
    ///
    /// The header decides when it names a known type; otherwise the URL's
    /// path extension decides; otherwise the resource is `Other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use site_sieve::state::ContentKind;
    ///
    /// assert_eq!(ContentKind::classify("text/html; charset=utf-8", "https://x.test/"), ContentKind::Html);
    /// assert_eq!(ContentKind::classify("application/octet-stream", "https://x.test/a.PDF"), ContentKind::Pdf);
    /// assert_eq!(ContentKind::classify("", "https://x.test/data.json"), ContentKind::Other);
    /// ```
    pub fn classify(content_type: &str, url: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "text/html" | "application/xhtml+xml" => return Self::Html,
            "application/pdf" => return Self::Pdf,
            DOCX_MIME => return Self::Docx,
            _ => {}
        }

        Self::from_extension(url).unwrap_or(Self::Other)
    }

    fn from_extension(url: &str) -> Option<Self> {
        let path = match url::Url::parse(url) {
            Ok(parsed) => parsed.path().to_ascii_lowercase(),
            Err(_) => url.to_ascii_lowercase(),
        };

        if path.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if path.ends_with(".docx") {
            Some(Self::Docx)
        } else if path.ends_with(".html") || path.ends_with(".htm") {
            Some(Self::Html)
        } else {
            None
        }
    }

    /// Returns true for documents persisted to the asset store
    pub fn is_binary_document(&self) -> bool {
        matches!(self, Self::Pdf | Self::Docx)
    }

    /// The lowercase tag used in the record streams
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Other => "other",
            Self::Error => "error",
        }
    }

    /// Returns all kinds
    pub fn all() -> [Self; 5] {
        [Self::Html, Self::Pdf, Self::Docx, Self::Other, Self::Error]
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
