//! Reading the JSON Lines streams back
//!
//! Malformed lines are skipped and counted; a reader never fails on a bad
//! record.

use crate::output::{OutputResult, PageRecord, QaRecord};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Records parsed from one stream
#[derive(Debug, Clone)]
pub struct StreamContents<T> {
    pub records: Vec<T>,

    /// Non-empty lines that did not parse
    pub malformed: usize,
}

impl<T> Default for StreamContents<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            malformed: 0,
        }
    }
}

pub fn read_page_records(path: &Path) -> OutputResult<StreamContents<PageRecord>> {
    read_jsonl(path)
}

pub fn read_qa_records(path: &Path) -> OutputResult<StreamContents<QaRecord>> {
    read_jsonl(path)
}

fn read_jsonl<T: DeserializeOwned>(path: &Path) -> OutputResult<StreamContents<T>> {
    let reader = BufReader::new(File::open(path)?);
    let mut contents = StreamContents::default();

    // Split on raw bytes: a line that is not UTF-8 is one malformed record,
    // not the end of the stream.
    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let parsed = match std::str::from_utf8(&line) {
            Ok(text) if text.trim().is_empty() => continue,
            Ok(text) => serde_json::from_str(text).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(record) => contents.records.push(record),
            Err(e) => {
                tracing::warn!(
                    "Skipping malformed record at {}:{}: {}",
                    path.display(),
                    index + 1,
                    e
                );
                contents.malformed += 1;
            }
        }
    }

    Ok(contents)
}
