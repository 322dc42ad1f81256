//! Site-Sieve main entry point
//!
//! This is the command-line interface for the Site-Sieve single-site harvester.

use anyhow::Context;
use clap::Parser;
use site_sieve::config::{load_config_with_hash, validate, Config};
use site_sieve::crawler::{build_http_client, plan_seeds, run_crawl};
use site_sieve::output::{load_statistics, print_statistics, OutputPaths};
use site_sieve::ScopeFilter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Sieve: a polite single-site harvester
///
/// Site-Sieve crawls one website while respecting robots.txt and a request
/// delay, extracts text from HTML, PDF and DOCX, and appends page and
/// question/answer records to JSON Lines files.
#[derive(Parser, Debug)]
#[command(name = "site-sieve")]
#[command(version)]
#[command(about = "A polite single-site harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Replace the configured start URLs
    #[arg(long, value_name = "URL", num_args = 1..)]
    start: Vec<String>,

    /// Override the page-visit budget
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Override the minimum delay between requests, in seconds
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,

    /// Also store .doc/.xls/.ppt (and x) files in the asset directory
    #[arg(long)]
    include_docs: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resolve configuration, robots.txt and seeds, then exit without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Summarise the existing output streams and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration after command-line overrides")?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config).await
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_sieve=info,warn"),
            1 => EnvFilter::new("site_sieve=debug,info"),
            2 => EnvFilter::new("site_sieve=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if !cli.start.is_empty() {
        config.site.start_urls = cli.start.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(delay) = cli.delay {
        config.crawler.delay_seconds = delay;
    }
    if cli.include_docs {
        config.crawler.include_docs = true;
    }
}

/// Handles the --dry-run mode: shows what would be crawled
async fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Site-Sieve Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Delay: {}s", config.crawler.delay_seconds);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Min article words: {}", config.crawler.min_article_words);
    println!("  Include office docs: {}", config.crawler.include_docs);

    println!("\nUser Agent:");
    println!("  Signature: {}", config.user_agent.signature());
    println!("  robots.txt token: {}", config.user_agent.robots_token());

    let paths = OutputPaths::from_config(&config.output);
    println!("\nOutput:");
    println!("  Pages: {}", paths.raw_pages.display());
    println!("  QA: {}", paths.qa.display());
    println!("  Assets: {}", paths.assets.display());
    println!("  Answer max chars: {}", config.output.answer_max_chars);

    let scope = ScopeFilter::from_site(&config.site);
    println!("\nScope (tag '{}'):", config.site.tag());
    for host in scope.hosts() {
        println!("  - {}", host);
    }

    let client = build_http_client(&config.user_agent, config.crawler.request_timeout())
        .context("Failed to build HTTP client")?;
    let plan = plan_seeds(&client, config, &scope).await?;

    if let Some(delay) = plan.robots.crawl_delay() {
        println!("\nrobots.txt Crawl-delay: {}s", delay);
    }

    println!("\nSeed URLs ({}):", plan.seeds.len());
    for seed in &plan.seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        plan.seeds.len()
    );

    Ok(())
}

/// Handles the --stats mode: summarises the existing output streams
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let paths = OutputPaths::from_config(&config.output);
    println!("Data directory: {}\n", config.output.data_dir.display());

    let stats = load_statistics(&paths).context("Failed to read output streams")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let paths = OutputPaths::from_config(&config.output);

    let report = match run_crawl(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    println!("Done. Visited {} pages.", report.visited);
    println!(
        "Outputs:\n - {}\n - {}\n - assets in {}",
        paths.raw_pages.display(),
        paths.qa.display(),
        paths.assets.display()
    );

    Ok(())
}
