//! Test utilities shared by the integration tests
//!
//! `StaticFetcher` serves canned pages from memory; the builders produce
//! the minimal markup the default selectors recognise.

use athome_scrape::ScrapeConfig;
use athome_scrape::fetcher::{FetchError, FetchedPage, PageFetcher};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const BASE: &str = "https://www.athome.lu";

enum Canned {
    Page { status: u16, body: String },
    Fail,
}

/// In-memory fetcher; unknown URLs answer 404
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Canned>,
    delays: HashMap<String, Duration>,
    requests: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(
            url.to_string(),
            Canned::Page {
                status: 200,
                body: body.into(),
            },
        );
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(
            url.to_string(),
            Canned::Page {
                status,
                body: String::new(),
            },
        );
        self
    }

    /// Answer `url` with a connection failure
    pub fn fail(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), Canned::Fail);
        self
    }

    /// Hold the answer for `url` back by `delay`
    pub fn delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|u| *u == url).count()
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().len()
    }
}

impl PageFetcher for StaticFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send {
        self.requests.lock().push(url.to_string());
        let result = match self.pages.get(url.as_str()) {
            Some(Canned::Page { status, body }) => Ok(FetchedPage {
                url: url.clone(),
                status: *status,
                body: body.clone(),
            }),
            Some(Canned::Fail) => Err(FetchError::Connection {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
            None => Ok(FetchedPage {
                url: url.clone(),
                status: 404,
                body: String::new(),
            }),
        };
        let delay = self.delays.get(url.as_str()).copied();
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}

/// Config for fake-fetcher runs: no retries, no rate limit
#[allow(dead_code)]
pub fn test_config(output_dir: &Path) -> ScrapeConfig {
    ScrapeConfig::builder()
        .output_dir(output_dir)
        .base_url(BASE)
        .crawl_rate_rps(0.0)
        .max_fetch_retries(0)
        .max_concurrent_requests(2)
        .progress_interval(5)
        .build()
        .expect("test config is valid")
}

#[allow(dead_code)]
pub fn results_url(page: u32) -> String {
    format!("{BASE}/en/buy?page={page}")
}

#[allow(dead_code)]
pub fn results_page(total: u64, last_page: u32, cards: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><body>
<header class="block-alert"><h2>{total} properties for sale</h2></header>
<section class="results">{}</section>
<nav class="paging"><a class="page" href="/en/buy?page=1">1</a><a class="page last" href="/en/buy?page={last_page}">{last_page}</a></nav>
</body></html>"#,
        cards.join("\n")
    )
}

#[allow(dead_code)]
pub fn card(locality: &str, href: &str) -> String {
    format!(
        r#"<article class="property-article">
  <span itemprop="addressLocality">{locality}</span>
  <link itemprop="url" href="{href}">
</article>"#
    )
}

#[allow(dead_code)]
pub fn collective_card(locality: &str, href: &str) -> String {
    format!(
        r#"<article class="property-article">
  <span itemprop="addressLocality">{locality}</span>
  <link itemprop="url" href="{href}">
  <p class="childrenInfos">Several units available</p>
</article>"#
    )
}

#[allow(dead_code)]
pub fn landing_page(member_hrefs: &[&str]) -> String {
    let blocks: Vec<String> = member_hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<div class="residence-informations-content"><a href="{href}">Lot</a></div>"#
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", blocks.join("\n"))
}

#[allow(dead_code)]
pub fn detail_page(title: &str, pairs: &[(&str, &str)]) -> String {
    let items: Vec<String> = pairs
        .iter()
        .map(|(label, value)| {
            format!(
                r#"<li class="feature-bloc-content-specification-content">
  <div class="feature-bloc-content-specification-content-name">{label}</div>
  <div class="feature-bloc-content-specification-content-response">{value}</div>
</li>"#
            )
        })
        .collect();
    format!(
        r#"<html><body>
<h1 class="KeyInfoBlockStyle__PdpTitle-sc-1o1h56e-2 ilPGib">{title}</h1>
<section class="feature sc-7vp35h-2-section-LayoutTheme__KeyGeneral-hbgJJa hVtovK">
  <div class="feature-bloc"><ul>{}</ul></div>
</section>
</body></html>"#,
        items.join("\n")
    )
}

/// Page without a characteristics block
#[allow(dead_code)]
pub fn bare_detail_page(title: &str) -> String {
    format!(
        r#"<html><body><h1 class="KeyInfoBlockStyle__PdpTitle-sc-1o1h56e-2">{title}</h1></body></html>"#
    )
}

#[allow(dead_code)]
pub fn url(s: &str) -> Url {
    Url::parse(s).expect("test URL should parse")
}
