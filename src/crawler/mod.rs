//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with redirect handling and transport error classification
//! - Link discovery in HTML pages
//! - The frontier queue and per-host request pacing
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{plan_seeds, run_crawl, Coordinator, CrawlReport, SeedPlan};
pub use fetcher::{build_http_client, fetch, FetchError, FetchedResponse, MAX_REDIRECTS};
pub use parser::discover_links;
pub use scheduler::{effective_delay, Frontier, Pacer, MAX_ROBOTS_DELAY_SECS};
