//! Statistics generation from the output streams
//!
//! This module provides functionality for summarising an existing data
//! directory and displaying the result.

use crate::output::reader::{read_page_records, read_qa_records, StreamContents};
use crate::output::{OutputPaths, OutputResult};
use crate::state::ContentKind;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Total number of page records
    pub total_pages: u64,

    /// Count of page records by content kind
    pub pages_by_kind: HashMap<ContentKind, u64>,

    /// Count of page records by status class (`2xx`, `4xx`, `no response`, ...)
    pub status_classes: BTreeMap<String, u64>,

    /// Number of distinct URLs with a page record
    pub unique_urls: u64,

    /// URLs with more than one page record (across runs)
    pub duplicate_urls: u64,

    /// Total number of discovered links over all pages
    pub total_links: u64,

    /// Number of QA records
    pub qa_records: u64,

    /// Number of files in the asset store
    pub assets: u64,

    /// Lines that failed to parse, over both streams
    pub malformed_lines: u64,
}

/// Loads statistics from an output directory
///
/// Missing streams count as empty.
pub fn load_statistics(paths: &OutputPaths) -> OutputResult<CrawlStatistics> {
    let pages = read_if_exists(&paths.raw_pages, read_page_records)?;
    let qa = read_if_exists(&paths.qa, read_qa_records)?;

    let mut stats = CrawlStatistics {
        total_pages: pages.records.len() as u64,
        qa_records: qa.records.len() as u64,
        malformed_lines: (pages.malformed + qa.malformed) as u64,
        ..Default::default()
    };

    let mut urls = HashSet::new();
    let mut duplicates = HashSet::new();

    for record in &pages.records {
        *stats.pages_by_kind.entry(record.content_type).or_insert(0) += 1;
        *stats
            .status_classes
            .entry(status_class(record.status))
            .or_insert(0) += 1;
        stats.total_links += record.discovered_links.len() as u64;

        if !urls.insert(record.url.as_str()) {
            duplicates.insert(record.url.as_str());
        }
    }

    stats.unique_urls = urls.len() as u64;
    stats.duplicate_urls = duplicates.len() as u64;
    stats.assets = count_files(&paths.assets)?;

    Ok(stats)
}

fn read_if_exists<T>(
    path: &Path,
    read: fn(&Path) -> OutputResult<StreamContents<T>>,
) -> OutputResult<StreamContents<T>> {
    if path.exists() {
        read(path)
    } else {
        tracing::debug!("{} does not exist; treating as empty", path.display());
        Ok(StreamContents::default())
    }
}

fn count_files(dir: &Path) -> OutputResult<u64> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        if entry?.file_type()?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

fn status_class(status: u16) -> String {
    match status {
        0 => "no response".to_string(),
        s => format!("{}xx", s / 100),
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Page records: {}", stats.total_pages);
    println!("  Unique URLs: {}", stats.unique_urls);
    println!("  QA records: {}", stats.qa_records);
    println!("  Assets stored: {}", stats.assets);
    println!("  Links discovered: {}", stats.total_links);
    println!();

    println!("Pages by Content Type:");
    for kind in ContentKind::all() {
        let count = stats.pages_by_kind.get(&kind).copied().unwrap_or(0);
        if count == 0 {
            continue;
        }
        let percentage = if stats.total_pages > 0 {
            (count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", kind, count, percentage);
    }
    println!();

    if !stats.status_classes.is_empty() {
        println!("Pages by Status:");
        for (class, count) in &stats.status_classes {
            println!("  {}: {}", class, count);
        }
        println!();
    }

    if stats.duplicate_urls > 0 {
        println!(
            "URLs recorded more than once (multiple runs appended): {}",
            stats.duplicate_urls
        );
    }
    if stats.malformed_lines > 0 {
        println!("Malformed lines skipped: {}", stats.malformed_lines);
    }

    let qa_rate = if stats.total_pages > 0 {
        (stats.qa_records as f64 / stats.total_pages as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "QA Yield: {:.1}% ({} / {} pages produced a QA record)",
        qa_rate, stats.qa_records, stats.total_pages
    );
}
