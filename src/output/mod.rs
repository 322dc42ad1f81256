//! Output module for the crawl's record streams
//!
//! This module handles:
//! - The page and QA record types and their derivation rules
//! - Appending records to the JSON Lines streams and storing assets
//! - Reading the streams back and summarising them

pub mod reader;
mod records;
pub mod stats;
mod writer;

pub use reader::{read_page_records, read_qa_records, StreamContents};
pub use records::{
    asset_filename, content_hash, question_for, sanitize_filename, summarize, timestamp,
    PageRecord, QaRecord, TRUNCATION_MARKER,
};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use writer::RecordWriter;

use crate::config::OutputConfig;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Locations of the two streams and the asset store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub raw_pages: PathBuf,
    pub qa: PathBuf,
    pub assets: PathBuf,
}

impl OutputPaths {
    /// The standard layout inside a data directory
    pub fn in_dir(data_dir: PathBuf) -> Self {
        Self {
            raw_pages: data_dir.join("raw_pages.jsonl"),
            qa: data_dir.join("qa.jsonl"),
            assets: data_dir.join("assets"),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            raw_pages: config.raw_pages_path(),
            qa: config.qa_path(),
            assets: config.assets_dir(),
        }
    }
}
