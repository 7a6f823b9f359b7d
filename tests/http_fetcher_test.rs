//! Tests for the reqwest-backed fetcher against a local mock server

use athome_scrape::ScrapeConfig;
use athome_scrape::crawl_engine::crawl_listings;
use athome_scrape::extraction::{CsvRecordSink, extract_records};
use athome_scrape::fetcher::{FetchError, HttpFetcher, PageFetcher};
use athome_scrape::run_store::RunId;
use mockito::{Matcher, Server};
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

mod common;
use common::{card, detail_page, results_page, url};

fn http_config(output_dir: &Path, base: &str, timeout_secs: u64) -> ScrapeConfig {
    ScrapeConfig::builder()
        .output_dir(output_dir)
        .base_url(base)
        .crawl_rate_rps(0.0)
        .max_fetch_retries(0)
        .request_timeout_secs(timeout_secs)
        .user_agent("athome-test/1.0")
        .build()
        .expect("test config is valid")
}

#[tokio::test]
async fn sends_configured_user_agent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/en/buy")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .match_header("user-agent", "athome-test/1.0")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body("<html><body>ok</body></html>")
        .create_async()
        .await;

    let temp = TempDir::new().expect("tempdir");
    let config = http_config(temp.path(), &server.url(), 5);
    let fetcher = HttpFetcher::new(&config).expect("client builds");

    let page = fetcher
        .fetch(&url(&format!("{}/en/buy?page=1", server.url())))
        .await
        .expect("request succeeds");

    mock.assert_async().await;
    assert!(page.is_ok());
    assert!(page.body.contains("ok"));
}

#[tokio::test]
async fn error_status_is_a_page_not_an_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/en/buy/flat/gone/id-9.html")
        .with_status(404)
        .with_body("not here")
        .create_async()
        .await;

    let temp = TempDir::new().expect("tempdir");
    let config = http_config(temp.path(), &server.url(), 5);
    let fetcher = HttpFetcher::new(&config).expect("client builds");

    let page = fetcher
        .fetch(&url(&format!("{}/en/buy/flat/gone/id-9.html", server.url())))
        .await
        .expect("status codes are returned, not raised");
    assert_eq!(page.status, 404);
    assert!(!page.is_ok());
}

#[tokio::test]
async fn refused_connection_is_transient() {
    // Grab a free port, then close it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let base = format!("http://127.0.0.1:{port}");

    let temp = TempDir::new().expect("tempdir");
    let config = http_config(temp.path(), &base, 5);
    let fetcher = HttpFetcher::new(&config).expect("client builds");

    let err = fetcher
        .fetch(&url(&format!("{base}/en/buy?page=1")))
        .await
        .expect_err("nothing listens there");
    assert!(matches!(err, FetchError::Connection { .. }), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn silent_server_times_out() {
    // Accepts the connection through the backlog but never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("addr"));

    let temp = TempDir::new().expect("tempdir");
    let config = http_config(temp.path(), &base, 1);
    let fetcher = HttpFetcher::new(&config).expect("client builds");

    let err = fetcher
        .fetch(&url(&format!("{base}/en/buy?page=1")))
        .await
        .expect_err("no response within a second");
    assert!(matches!(err, FetchError::Timeout { secs: 1, .. }), "got {err:?}");
    drop(listener);
}

#[tokio::test]
async fn crawl_then_extract_over_http() {
    let mut server = Server::new_async().await;
    let cards = vec![
        card("Belair", "/en/buy/apartment/belair/id-11.html"),
        card("Mamer", "/en/buy/house/mamer/id-12.html"),
        card("Thionville (FR)", "/en/buy/house/thionville/id-13.html"),
    ];
    let _results = server
        .mock("GET", "/en/buy")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_body(results_page(3, 1, &cards))
        .create_async()
        .await;
    let _first = server
        .mock("GET", "/en/buy/apartment/belair/id-11.html")
        .with_status(200)
        .with_body(detail_page(
            "Apartment for sale in Belair",
            &[("Bedrooms", "3"), ("Bathroom", "2")],
        ))
        .create_async()
        .await;
    let _second = server
        .mock("GET", "/en/buy/house/mamer/id-12.html")
        .with_status(200)
        .with_body(detail_page("House for sale in Mamer", &[("Garden", "Yes")]))
        .create_async()
        .await;

    let temp = TempDir::new().expect("tempdir");
    let config = http_config(temp.path(), &server.url(), 5);
    let fetcher = HttpFetcher::new(&config).expect("client builds");
    let cancel = CancellationToken::new();

    let run_id = RunId::parse("20240510120000").expect("valid run id");
    let crawl = crawl_listings(&config, &fetcher, run_id.clone(), &cancel)
        .await
        .expect("crawl succeeds");
    assert_eq!(crawl.stats.urls_saved, 2);
    assert_eq!(crawl.stats.cards_foreign, 1);

    let mut sink = CsvRecordSink::for_config(&config);
    let extraction = extract_records(&config, &fetcher, None, &mut sink, &cancel)
        .await
        .expect("extraction succeeds");
    assert_eq!(extraction.run_id, run_id);
    assert_eq!(extraction.stats.records, 2);

    let csv = std::fs::read_to_string(&extraction.record_path).expect("table written");
    assert_eq!(
        csv,
        "Bedrooms,Bathroom,property_type,locality,Garden\n3,2,Apartment,Belair,\n,,House,Mamer,Yes\n"
    );
}
