//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, reading the written streams back.

use site_sieve::config::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use site_sieve::crawler::{run_crawl, Coordinator, CrawlReport};
use site_sieve::output::{read_page_records, read_qa_records, OutputPaths};
use site_sieve::{ContentKind, PageRecord, QaRecord};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANCY_RULES_PDF: &[u8] = include_bytes!("../fixtures/tenancy_rules.pdf");

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Creates a test configuration scoped to the mock server's host and port
fn create_test_config(server: &MockServer, start_paths: &[&str], data_dir: &Path) -> Config {
    let base_url = server.uri();
    let host = base_url.trim_start_matches("http://").to_string();

    Config {
        crawler: CrawlerConfig {
            max_pages: 50,
            delay_seconds: 0.0,
            request_timeout_secs: 5,
            max_concurrent_fetches: 1,
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: Some("https://example.com/contact".to_string()),
            contact_email: Some("test@example.com".to_string()),
        },
        site: SiteConfig {
            domain: host,
            extra_hosts: vec![],
            site_tag: Some("testsite".to_string()),
            start_urls: start_paths
                .iter()
                .map(|p| format!("{}{}", base_url, p))
                .collect(),
            sitemaps: vec![],
        },
        output: OutputConfig {
            data_dir: data_dir.to_path_buf(),
            ..OutputConfig::default()
        },
    }
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html")
}

async fn mount_page(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

fn article(words: usize) -> String {
    (0..words)
        .map(|i| format!("tenant{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

struct CrawlOutput {
    report: CrawlReport,
    pages: Vec<PageRecord>,
    qa: Vec<QaRecord>,
    paths: OutputPaths,
}

impl CrawlOutput {
    fn page(&self, url: &str) -> Option<&PageRecord> {
        self.pages.iter().find(|p| p.url == url)
    }

    fn qa_for(&self, url: &str) -> Option<&QaRecord> {
        self.qa.iter().find(|q| q.sources == [url])
    }
}

async fn crawl(config: Config) -> CrawlOutput {
    let paths = OutputPaths::from_config(&config.output);
    let report = run_crawl(config).await.expect("Crawl failed");
    let pages = read_page_records(&paths.raw_pages).unwrap();
    let qa = read_qa_records(&paths.qa).unwrap();
    assert_eq!(pages.malformed, 0);
    assert_eq!(qa.malformed, 0);

    CrawlOutput {
        report,
        pages: pages.records,
        qa: qa.records,
        paths,
    }
}

fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::FileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_article_page_with_internal_and_external_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(format!(
            r#"<html><head><title>Renting a home</title></head><body>
            <article><h1>Renting a home</h1><p>{}</p></article>
            <a href="/about">About</a>
            <a href="{}/news">News</a>
            <a href="https://external.example.org/page">Elsewhere</a>
            </body></html>"#,
            article(60),
            base
        )),
    )
    .await;
    mount_page(&server, "/about", html("<title>About us</title><p>Who we are.</p>")).await;
    mount_page(&server, "/news", html("<title>News</title><p>Latest updates.</p>")).await;

    let dir = TempDir::new().unwrap();
    let out = crawl(create_test_config(&server, &["/"], dir.path())).await;

    let home = out.page(&format!("{}/", base)).expect("home page record");
    assert_eq!(home.content_type, ContentKind::Html);
    assert_eq!(home.status, 200);
    assert_eq!(home.title, "Renting a home");
    assert!(home.text.contains("tenant0"));
    assert!(home.text.contains("tenant59"));
    assert_eq!(home.content_hash.len(), 64);
    assert_eq!(
        home.discovered_links,
        vec![format!("{}/about", base), format!("{}/news", base)]
    );

    let qa = out.qa_for(&format!("{}/", base)).expect("home QA record");
    assert_eq!(qa.question, "Renting a home");
    assert_eq!(qa.tags, vec!["testsite", "html"]);
    assert!(qa.answer.contains("tenant0"));

    // The external link is dropped; only the two internal links were visited.
    assert_eq!(out.pages.len(), 3);
    assert_eq!(out.report.visited, 3);
    assert!(out.page(&format!("{}/about", base)).is_some());
    assert!(out.page(&format!("{}/news", base)).is_some());
    assert!(out
        .pages
        .iter()
        .all(|p| !p.url.contains("external.example.org")));
}

#[tokio::test]
async fn test_not_found_page() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/missing",
        ResponseTemplate::new(404).set_body_raw(
            r#"<html><head><title>Not found</title></head><body><a href="/elsewhere">x</a></body></html>"#,
            "text/html",
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let out = crawl(create_test_config(&server, &["/missing"], dir.path())).await;

    assert_eq!(out.pages.len(), 1);
    let record = &out.pages[0];
    assert_eq!(record.url, format!("{}/missing", base));
    assert_eq!(record.status, 404);
    assert_eq!(record.content_type, ContentKind::Html);
    assert_eq!(record.text, "HTTP 404");
    assert!(record.content_hash.is_empty());
    assert!(record.title.is_empty());
    assert!(record.discovered_links.is_empty());
    assert!(out.qa.is_empty());
    assert_eq!(out.report.visited, 1);
}

#[tokio::test]
async fn test_broken_pdf_is_recorded_and_stored() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(r#"<title>Documents</title><a href="/docs/House_Rules_2024.pdf">Rules</a>"#),
    )
    .await;
    mount_page(
        &server,
        "/docs/House_Rules_2024.pdf",
        ResponseTemplate::new(200).set_body_raw(b"this is not a pdf".to_vec(), "application/pdf"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &["/"], dir.path());
    config.output.answer_max_chars = 20;
    let out = crawl(config).await;

    let pdf_url = format!("{}/docs/House_Rules_2024.pdf", base);
    let record = out.page(&pdf_url).expect("pdf record");
    assert_eq!(record.content_type, ContentKind::Pdf);
    assert_eq!(record.title, "House_Rules_2024.pdf");
    assert!(record.text.starts_with("[[PDF extract failed: "));
    assert!(record.discovered_links.is_empty());

    let asset = out.paths.assets.join("House_Rules_2024.pdf");
    assert_eq!(std::fs::read(asset).unwrap(), b"this is not a pdf");

    let qa = out.qa_for(&pdf_url).expect("pdf QA record");
    assert_eq!(qa.question, "House Rules 2024");
    assert_eq!(qa.tags, vec!["testsite", "pdf"]);
    assert!(qa.answer.starts_with("[[PDF extract"));
    assert!(qa.answer.ends_with('…'));
    assert_eq!(qa.answer.chars().count(), 21);

    assert_eq!(out.report.assets_saved, 1);
    assert_eq!(out.report.extraction_failures, 1);
}

#[tokio::test]
async fn test_pdf_text_extracted() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(r#"<title>Documents</title><a href="/docs/Tenancy_rules.pdf">Rules</a>"#),
    )
    .await;
    mount_page(
        &server,
        "/docs/Tenancy_rules.pdf",
        ResponseTemplate::new(200).set_body_raw(TENANCY_RULES_PDF.to_vec(), "application/pdf"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let out = crawl(create_test_config(&server, &["/"], dir.path())).await;

    let pdf_url = format!("{}/docs/Tenancy_rules.pdf", base);
    let record = out.page(&pdf_url).expect("pdf record");
    assert_eq!(record.content_type, ContentKind::Pdf);
    assert_eq!(record.status, 200);
    assert_eq!(record.title, "Tenancy_rules.pdf");
    assert!(record.text.contains("Tenancy"));
    assert!(!record.text.starts_with("[["));
    assert_eq!(record.content_hash.len(), 64);
    assert!(record.discovered_links.is_empty());

    let qa = out.qa_for(&pdf_url).expect("pdf QA record");
    assert_eq!(qa.question, "Tenancy rules");
    assert_eq!(qa.answer, "Tenancy rules apply to every resident");
    assert_eq!(qa.tags, vec!["testsite", "pdf"]);

    assert_eq!(
        std::fs::read(out.paths.assets.join("Tenancy_rules.pdf")).unwrap(),
        TENANCY_RULES_PDF
    );
    assert_eq!(out.report.extraction_failures, 0);
}

#[tokio::test]
async fn test_huge_robots_crawl_delay_does_not_abort_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nCrawl-delay: 99999999999999999999"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/", html("<title>Home</title><p>Welcome</p>")).await;

    let dir = TempDir::new().unwrap();
    let out = crawl(create_test_config(&server, &["/"], dir.path())).await;

    assert_eq!(out.pages.len(), 1);
    assert_eq!(out.pages[0].url, format!("{}/", base));
}

#[tokio::test]
async fn test_docx_text_extracted() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(r#"<title>Forms</title><a href="/forms/Repair_request.docx">Form</a>"#),
    )
    .await;
    mount_page(
        &server,
        "/forms/Repair_request.docx",
        ResponseTemplate::new(200).set_body_raw(
            build_docx(&["Repair request", "Describe the problem."]),
            DOCX_MIME,
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let out = crawl(create_test_config(&server, &["/"], dir.path())).await;

    let docx_url = format!("{}/forms/Repair_request.docx", base);
    let record = out.page(&docx_url).expect("docx record");
    assert_eq!(record.content_type, ContentKind::Docx);
    assert_eq!(record.text, "Repair request\nDescribe the problem.");

    let qa = out.qa_for(&docx_url).expect("docx QA record");
    assert_eq!(qa.question, "Repair request");
    assert_eq!(qa.answer, "Repair request Describe the problem.");
    assert!(out.paths.assets.join("Repair_request.docx").exists());
}

#[tokio::test]
async fn test_robots_disallowed_links_are_never_visited() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        html(r#"<title>Home</title><a href="/private/ledger">Secret</a><a href="/public">Open</a>"#),
    )
    .await;
    mount_page(&server, "/public", html("<title>Public</title><p>Hello</p>")).await;
    Mock::given(method("GET"))
        .and(path("/private/ledger"))
        .respond_with(html("<title>Ledger</title>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = crawl(create_test_config(&server, &["/"], dir.path())).await;

    let home = out.page(&format!("{}/", base)).unwrap();
    // Discovery only applies scope; robots applies when enqueueing.
    assert!(home
        .discovered_links
        .contains(&format!("{}/private/ledger", base)));
    assert!(out.page(&format!("{}/private/ledger", base)).is_none());
    assert!(out.page(&format!("{}/public", base)).is_some());
    assert_eq!(out.pages.len(), 2);
}

#[tokio::test]
async fn test_robots_forbidden_blocks_everything() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<title>Home</title>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = crawl(create_test_config(&server, &["/"], dir.path())).await;

    assert!(out.pages.is_empty());
    assert_eq!(out.report.visited, 0);
}

#[tokio::test]
async fn test_each_url_recorded_once() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html(r##"<title>Home</title><a href="/a">A</a><a href="/b">B</a><a href="/#top">Top</a>"##),
    )
    .await;
    mount_page(
        &server,
        "/a",
        html(r##"<title>A</title><a href="/">Home</a><a href="/b#x">B</a><a href="/a">Self</a>"##),
    )
    .await;
    mount_page(
        &server,
        "/b",
        html(r#"<title>B</title><a href="/a">A</a><a href="/">Home</a>"#),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &["/", "/"], dir.path());
    config.crawler.max_concurrent_fetches = 3;
    let out = crawl(config).await;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for page in &out.pages {
        *counts.entry(page.url.as_str()).or_insert(0) += 1;
    }
    assert_eq!(counts.len(), 3);
    assert!(counts.values().all(|&c| c == 1));
    assert_eq!(out.report.visited, 3);
}

#[tokio::test]
async fn test_sitemap_index_seeds_frontier() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/sitemap_index.xml",
        ResponseTemplate::new(200).set_body_raw(
            format!(
                r#"<?xml version="1.0"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <sitemap><loc>{base}/pages.xml</loc></sitemap>
                <sitemap><loc>{base}/broken.xml</loc></sitemap>
                </sitemapindex>"#
            ),
            "application/xml",
        ),
    )
    .await;
    mount_page(
        &server,
        "/pages.xml",
        ResponseTemplate::new(200).set_body_raw(
            format!(
                r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>{base}/from-sitemap</loc></url>
                <url><loc>{base}/logo.png</loc></url>
                <url><loc>https://external.example.org/x</loc></url>
                </urlset>"#
            ),
            "text/xml; charset=utf-8",
        ),
    )
    .await;
    mount_page(
        &server,
        "/broken.xml",
        ResponseTemplate::new(200).set_body_raw("<urlset><url><loc>x</url>", "application/xml"),
    )
    .await;
    mount_page(&server, "/from-sitemap", html("<title>Listed</title><p>In the sitemap.</p>")).await;
    mount_page(&server, "/", html("<title>Home</title>")).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &["/"], dir.path());
    config.site.sitemaps = vec![format!("{}/sitemap_index.xml", base)];
    let out = crawl(config).await;

    // Sitemap URLs come first, then start URLs.
    assert_eq!(out.pages.len(), 2);
    assert_eq!(out.pages[0].url, format!("{}/from-sitemap", base));
    assert_eq!(out.pages[1].url, format!("{}/", base));
}

#[tokio::test]
async fn test_non_xml_sitemap_is_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/sitemap.xml",
        ResponseTemplate::new(200).set_body_raw(
            format!("<urlset><url><loc>{base}/hidden</loc></url></urlset>"),
            "text/html",
        ),
    )
    .await;
    mount_page(&server, "/", html("<title>Home</title>")).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &["/"], dir.path());
    config.site.sitemaps = vec![format!("{}/sitemap.xml", base)];
    let out = crawl(config).await;

    assert_eq!(out.pages.len(), 1);
    assert_eq!(out.pages[0].url, format!("{}/", base));
}

#[tokio::test]
async fn test_page_budget_stops_crawl() {
    let server = MockServer::start().await;

    let links: String = (1..=6)
        .map(|i| format!(r#"<a href="/p{}">P{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", html(format!("<title>Home</title>{}", links))).await;
    for i in 1..=6 {
        mount_page(&server, &format!("/p{}", i), html(format!("<title>P{}</title>", i))).await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &["/"], dir.path());
    config.crawler.max_pages = 3;

    let mut coordinator = Coordinator::new(config).await.unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.visited, 3);
    assert_eq!(report.page_records, 3);
    let pages = read_page_records(&dir.path().join("raw_pages.jsonl")).unwrap();
    assert_eq!(pages.records.len(), 3);
}

#[tokio::test]
async fn test_transport_error_is_recorded_and_crawl_continues() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html("<title>Home</title><p>Up</p>")).await;
    mount_page(&server, "/after", html("<title>After</title><p>Still crawling</p>")).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &["/"], dir.path());
    // Port 9 (discard) is not listening on test machines.
    config.site.extra_hosts = vec!["127.0.0.1:9".to_string()];
    config.site.start_urls = vec![
        format!("{}/", base),
        "http://127.0.0.1:9/down".to_string(),
        format!("{}/after", base),
    ];
    let out = crawl(config).await;

    let failed = out.page("http://127.0.0.1:9/down").expect("error record");
    assert_eq!(failed.content_type, ContentKind::Error);
    assert_eq!(failed.status, 0);
    assert!(failed.text.starts_with("[[FETCH ERROR: "));
    assert!(failed.content_hash.is_empty());
    assert!(out.qa_for("http://127.0.0.1:9/down").is_none());

    assert!(out.page(&format!("{}/after", base)).is_some());
    assert_eq!(out.report.visited, 3);
    assert_eq!(out.report.transport_errors, 1);
}

#[tokio::test]
async fn test_redirect_target_not_refetched() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new/"))
        .respond_with(html(r#"<title>New</title><a href="child">Child</a><a href="/new/">Self</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/new/child", html("<title>Child</title>")).await;

    let dir = TempDir::new().unwrap();
    let out = crawl(create_test_config(&server, &["/old"], dir.path())).await;

    let old = out.page(&format!("{}/old", base)).unwrap();
    assert_eq!(old.status, 200);
    assert_eq!(old.title, "New");
    assert_eq!(
        old.discovered_links,
        vec![format!("{}/new/child", base), format!("{}/new/", base)]
    );
    assert!(out.page(&format!("{}/new/", base)).is_none());
    assert!(out.page(&format!("{}/new/child", base)).is_some());
}

#[tokio::test]
async fn test_runs_append_to_existing_streams() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html("<title>Home</title><p>Welcome</p>")).await;

    let dir = TempDir::new().unwrap();
    crawl(create_test_config(&server, &["/"], dir.path())).await;
    let second = crawl(create_test_config(&server, &["/"], dir.path())).await;

    assert_eq!(second.pages.len(), 2);
    assert_eq!(second.qa.len(), 2);
}

#[tokio::test]
async fn test_delay_spaces_requests() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html(r#"<title>Home</title><a href="/a">A</a><a href="/b">B</a>"#),
    )
    .await;
    mount_page(&server, "/a", html("<title>A</title>")).await;
    mount_page(&server, "/b", html("<title>B</title>")).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &["/"], dir.path());
    config.crawler.delay_seconds = 0.15;
    config.crawler.max_concurrent_fetches = 4;

    let start = std::time::Instant::now();
    let out = crawl(config).await;

    assert_eq!(out.report.visited, 3);
    assert!(start.elapsed() >= Duration::from_millis(290));
}

#[tokio::test]
async fn test_output_directory_failure_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let config = create_test_config(&server, &["/"], &blocker.join("data"));
    assert!(Coordinator::new(config).await.is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}
