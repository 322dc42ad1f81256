//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Creating the output streams and fetching robots.txt
//! - Seeding the frontier from sitemaps and start URLs
//! - Dispatching visits to a bounded pool of workers under per-site pacing
//! - Writing records and assets and feeding discovered links back
//!
//! The coordinator is the only owner of the frontier, the pacer and the
//! writer. Workers fetch and extract, then hand a `PageOutcome` back.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch, FetchedResponse};
use crate::crawler::parser::discover_links;
use crate::crawler::scheduler::{Frontier, Pacer};
use crate::extract::{extract_content, ExtractSettings};
use crate::output::{asset_filename, OutputPaths, PageRecord, QaRecord, RecordWriter};
use crate::robots::{fetch_robots, RobotsPolicy};
use crate::sitemap::collect_sitemap_urls;
use crate::state::ContentKind;
use crate::url::{pacing_key, ScopeFilter};
use crate::{ConfigError, SieveError};
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use url::Url;

/// Office extensions saved as assets when `include-docs` is set
const OFFICE_EXTENSIONS: &[&str] = &[".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx"];

/// Totals for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// URLs dispatched for a visit; counts against the page budget
    pub visited: u64,
    pub page_records: u64,
    pub qa_records: u64,
    pub assets_saved: u64,
    pub transport_errors: u64,
    pub extraction_failures: u64,
}

/// Robots policy and initial frontier for a run
#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub robots: RobotsPolicy,
    pub seeds: Vec<String>,
}

/// Everything a worker needs; shared read-only between workers
struct WorkerContext {
    client: Client,
    scope: ScopeFilter,
    settings: ExtractSettings,
    include_docs: bool,
}

/// What a worker reports back for one visited URL
struct PageOutcome {
    url: String,
    host: String,
    completed_at: Instant,
    final_url: Option<String>,
    record: PageRecord,
    asset: Option<(String, Vec<u8>)>,
    transport_failed: bool,
    extraction_failed: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    context: Arc<WorkerContext>,
    robots: RobotsPolicy,
    frontier: Frontier,
    pacer: Pacer,
    writer: RecordWriter,
    site_tag: String,
    report: CrawlReport,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Opens the output streams first: failing to create them aborts before
    /// any request is made. Then fetches robots.txt and seeds the frontier.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SieveError)` - Output paths or HTTP client could not be created
    pub async fn new(config: Config) -> Result<Self, SieveError> {
        let writer = RecordWriter::open(OutputPaths::from_config(&config.output)).await?;

        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        let scope = ScopeFilter::from_site(&config.site);

        let plan = plan_seeds(&client, &config, &scope).await?;

        let mut frontier = Frontier::new();
        for seed in &plan.seeds {
            frontier.push(seed.as_str());
        }

        let pacer = Pacer::new(config.crawler.delay(), plan.robots.crawl_delay());
        if pacer.delay() > config.crawler.delay() {
            tracing::info!(
                "robots.txt Crawl-delay raises the request delay to {:?}",
                pacer.delay()
            );
        }

        let context = Arc::new(WorkerContext {
            client,
            scope,
            settings: ExtractSettings {
                min_article_words: config.crawler.min_article_words,
            },
            include_docs: config.crawler.include_docs,
        });

        Ok(Self {
            site_tag: config.site.tag(),
            config: Arc::new(config),
            context,
            robots: plan.robots,
            frontier,
            pacer,
            writer,
            report: CrawlReport::default(),
        })
    }

    /// Runs the main crawl loop
    ///
    /// Dispatches URLs while the frontier is non-empty and the page budget
    /// allows. Once the budget is spent no further URL is dispatched or
    /// enqueued, but in-flight visits are completed and recorded.
    pub async fn run(&mut self) -> Result<CrawlReport, SieveError> {
        let max_pages = u64::from(self.config.crawler.max_pages);
        let max_in_flight = self.config.crawler.max_concurrent_fetches.max(1) as usize;
        let start_time = std::time::Instant::now();

        tracing::info!(
            "Starting crawl of {} with {} seed URLs (budget {}, delay {:?}, {} concurrent)",
            self.config.site.domain,
            self.frontier.len(),
            max_pages,
            self.pacer.delay(),
            max_in_flight
        );

        let mut tasks: JoinSet<PageOutcome> = JoinSet::new();

        loop {
            let can_dispatch = self.report.visited < max_pages
                && !self.frontier.is_empty()
                && tasks.len() < max_in_flight;

            if !can_dispatch {
                match tasks.join_next().await {
                    Some(Ok(outcome)) => {
                        self.absorb(outcome).await;
                        continue;
                    }
                    Some(Err(e)) => {
                        tracing::error!("Visit task failed: {}", e);
                        continue;
                    }
                    None => break,
                }
            }

            let Some(url) = self.frontier.pop_unseen() else {
                continue;
            };
            let Some(host) = Url::parse(&url).ok().and_then(|u| pacing_key(&u)) else {
                tracing::debug!("Dropping unparsable URL {}", url);
                continue;
            };

            self.report.visited += 1;
            self.pacer.wait_turn(&host).await;

            tracing::debug!("Visiting {}", url);
            let context = Arc::clone(&self.context);
            tasks.spawn(visit(context, url, host));
        }

        if self.report.visited >= max_pages && !self.frontier.is_empty() {
            tracing::info!(
                "Page budget of {} reached with {} URLs still queued",
                max_pages,
                self.frontier.len()
            );
        }

        tracing::info!(
            "Crawl completed: visited {} pages in {:?} ({} QA records, {} assets, {} transport errors, {} extraction failures)",
            self.report.visited,
            start_time.elapsed(),
            self.report.qa_records,
            self.report.assets_saved,
            self.report.transport_errors,
            self.report.extraction_failures
        );

        Ok(self.report.clone())
    }

    /// Records one finished visit and enqueues its links
    async fn absorb(&mut self, outcome: PageOutcome) {
        self.pacer
            .record_completion(&outcome.host, outcome.completed_at);

        if let Some(final_url) = &outcome.final_url {
            self.frontier.mark_seen(final_url.as_str());
        }
        if outcome.transport_failed {
            self.report.transport_errors += 1;
        }
        if outcome.extraction_failed {
            self.report.extraction_failures += 1;
        }

        if let Some((filename, bytes)) = &outcome.asset {
            match self.writer.save_asset(filename, bytes).await {
                Ok(path) => {
                    self.report.assets_saved += 1;
                    tracing::debug!("Saved asset {}", path.display());
                }
                Err(e) => tracing::warn!("Failed to save asset for {}: {}", outcome.url, e),
            }
        }

        let record = &outcome.record;
        match self.writer.write_page(record).await {
            Ok(()) => self.report.page_records += 1,
            Err(e) => tracing::warn!("Failed to write page record for {}: {}", outcome.url, e),
        }

        if let Some(qa) =
            QaRecord::from_page(record, &self.site_tag, self.config.output.answer_max_chars)
        {
            match self.writer.write_qa(&qa).await {
                Ok(()) => self.report.qa_records += 1,
                Err(e) => tracing::warn!("Failed to write QA record for {}: {}", outcome.url, e),
            }
        }

        if self.report.visited < u64::from(self.config.crawler.max_pages) {
            let added = self.enqueue_links(&record.discovered_links);
            if added > 0 {
                tracing::debug!("{} new URLs from {}", added, outcome.url);
            }
        }

        if self.report.page_records > 0 && self.report.page_records % 10 == 0 {
            tracing::info!(
                "Progress: {} pages visited, {} in frontier",
                self.report.page_records,
                self.frontier.len()
            );
        }
    }

    /// Enqueues unseen, robots-allowed links; returns how many were added
    fn enqueue_links(&mut self, links: &[String]) -> usize {
        let mut added = 0;
        for link in links {
            if self.frontier.is_seen(link) {
                continue;
            }
            if !self.robots.allowed(link) {
                tracing::debug!("robots.txt disallows {}", link);
                continue;
            }
            if self.frontier.push(link.as_str()) {
                added += 1;
            }
        }
        added
    }
}

/// Fetches robots.txt and collects the seed URLs
///
/// Seeds are the sitemap URLs followed by the configured start URLs, each
/// kept only when in scope and allowed by robots.txt. Duplicates are dropped
/// in order.
pub async fn plan_seeds(
    client: &Client,
    config: &Config,
    scope: &ScopeFilter,
) -> Result<SeedPlan, SieveError> {
    let robots_base = robots_base(config)?;
    let robots = fetch_robots(client, &robots_base, config.user_agent.robots_token()).await;

    let mut candidates = collect_sitemap_urls(client, &config.site.sitemaps, scope).await;
    candidates.extend(config.site.start_urls.iter().cloned());

    let mut seen = std::collections::HashSet::new();
    let seeds: Vec<String> = candidates
        .into_iter()
        .filter(|url| scope.accepts(url) && robots.allowed(url))
        .filter(|url| seen.insert(url.clone()))
        .collect();

    tracing::info!("Seeded {} URLs", seeds.len());
    Ok(SeedPlan { robots, seeds })
}

/// The URL whose origin serves robots.txt: the first start URL, else the first sitemap
fn robots_base(config: &Config) -> Result<Url, SieveError> {
    let first = config
        .site
        .start_urls
        .first()
        .or_else(|| config.site.sitemaps.first())
        .ok_or_else(|| {
            ConfigError::Validation("at least one start URL or sitemap is required".to_string())
        })?;

    Url::parse(first)
        .map_err(|e| SieveError::from(ConfigError::InvalidUrl(format!("{}: {}", first, e))))
}

/// Fetches one URL and turns the response into a record
async fn visit(context: Arc<WorkerContext>, url: String, host: String) -> PageOutcome {
    let result = fetch(&context.client, &url).await;
    let completed_at = Instant::now();

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Fetch failed for {}: {}", url, e);
            return PageOutcome {
                record: PageRecord::transport_error(url.as_str(), &e),
                url,
                host,
                completed_at,
                final_url: None,
                asset: None,
                transport_failed: true,
                extraction_failed: false,
            };
        }
    };

    let final_url = Some(response.final_url.to_string()).filter(|f| f != &url);

    // Extraction is CPU-bound, so it runs off the async workers.
    let task_url = url.clone();
    let processed =
        tokio::task::spawn_blocking(move || process_response(&context, &task_url, response))
            .await;

    let (record, asset, extraction_failed) = match processed {
        Ok(processed) => processed,
        Err(e) => {
            tracing::warn!("Processing {} failed: {}", url, e);
            let record = PageRecord::new(
                url.as_str(),
                ContentKind::Other,
                0,
                "",
                format!("[[extract failed: {}]]", e),
                Vec::new(),
            );
            (record, None, true)
        }
    };

    PageOutcome {
        url,
        host,
        completed_at,
        final_url,
        record,
        asset,
        transport_failed: false,
        extraction_failed,
    }
}

/// Classifies, extracts and discovers links for one response
fn process_response(
    context: &WorkerContext,
    url: &str,
    response: FetchedResponse,
) -> (PageRecord, Option<(String, Vec<u8>)>, bool) {
    let kind = ContentKind::classify(&response.content_type, response.final_url.as_str());

    if !response.is_success() {
        tracing::debug!("{} returned HTTP {}", url, response.status);
        return (
            PageRecord::http_failure(url, kind, response.status),
            None,
            false,
        );
    }

    match kind {
        ContentKind::Html => {
            let extraction = extract_content(
                kind,
                &response.body,
                &response.final_url,
                "",
                &context.settings,
            );
            let html = String::from_utf8_lossy(&response.body);
            let links = discover_links(&response.final_url, &html, &context.scope);
            let record = PageRecord::new(
                url,
                kind,
                response.status,
                extraction.title,
                extraction.text,
                links,
            );
            (record, None, false)
        }
        ContentKind::Pdf | ContentKind::Docx => {
            let filename = asset_filename(&response.final_url, &response.headers);
            let extraction = extract_content(
                kind,
                &response.body,
                &response.final_url,
                &filename,
                &context.settings,
            );
            if let Some(e) = &extraction.failure {
                tracing::warn!("{} extraction failed for {}: {}", kind, url, e);
            }
            let failed = extraction.failure.is_some();
            let record = PageRecord::new(
                url,
                kind,
                response.status,
                extraction.title,
                extraction.text,
                Vec::new(),
            );
            (record, Some((filename, response.body)), failed)
        }
        ContentKind::Other | ContentKind::Error => {
            let asset = if context.include_docs && is_office_document(&response.final_url) {
                Some((
                    asset_filename(&response.final_url, &response.headers),
                    response.body,
                ))
            } else {
                None
            };
            let record = PageRecord::new(
                url,
                ContentKind::Other,
                response.status,
                "",
                "",
                Vec::new(),
            );
            (record, asset, false)
        }
    }
}

fn is_office_document(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    OFFICE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Runs the main crawl operation
///
/// 1. Create the output streams
/// 2. Build the HTTP client and fetch robots.txt
/// 3. Seed the frontier from sitemaps and start URLs
/// 4. Visit URLs until the frontier empties or the budget is spent
///
/// # Example
///
/// ```no_run
/// use site_sieve::config::load_config;
/// use site_sieve::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("site-sieve.toml"))?;
/// let report = run_crawl(config).await?;
/// println!("visited {}", report.visited);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlReport, SieveError> {
    let mut coordinator = Coordinator::new(config).await?;
    coordinator.run().await
}
