//! Append-only record streams and the asset store
//!
//! The writer has a single owner (the crawl coordinator), so records are
//! written one at a time and every line holds exactly one JSON object.

use crate::output::{OutputError, OutputPaths, OutputResult, PageRecord, QaRecord};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Writes page records, QA records and assets under one data directory
pub struct RecordWriter {
    paths: OutputPaths,
    pages: File,
    qa: File,
}

impl RecordWriter {
    /// Creates the data and asset directories and opens both streams for append
    ///
    /// Existing stream contents are kept.
    pub async fn open(paths: OutputPaths) -> OutputResult<Self> {
        create_dir(&paths.assets).await?;
        if let Some(parent) = paths.raw_pages.parent() {
            create_dir(parent).await?;
        }
        if let Some(parent) = paths.qa.parent() {
            create_dir(parent).await?;
        }

        let pages = open_append(&paths.raw_pages).await?;
        let qa = open_append(&paths.qa).await?;

        tracing::debug!(
            "Writing records to {} and {}",
            paths.raw_pages.display(),
            paths.qa.display()
        );

        Ok(Self { paths, pages, qa })
    }

    pub async fn write_page(&mut self, record: &PageRecord) -> OutputResult<()> {
        append_line(&mut self.pages, record).await
    }

    pub async fn write_qa(&mut self, record: &QaRecord) -> OutputResult<()> {
        append_line(&mut self.qa, record).await
    }

    /// Stores a downloaded document under the asset directory
    ///
    /// `filename` must already be sanitized. An existing file with the same
    /// name is replaced.
    pub async fn save_asset(&self, filename: &str, bytes: &[u8]) -> OutputResult<PathBuf> {
        let path = self.paths.assets.join(filename);
        fs::write(&path, bytes).await.map_err(|source| OutputError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

async fn create_dir(path: &Path) -> OutputResult<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(path)
        .await
        .map_err(|source| OutputError::Create {
            path: path.to_path_buf(),
            source,
        })
}

async fn open_append(path: &Path) -> OutputResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|source| OutputError::Create {
            path: path.to_path_buf(),
            source,
        })
}

async fn append_line<T: Serialize>(file: &mut File, record: &T) -> OutputResult<()> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
