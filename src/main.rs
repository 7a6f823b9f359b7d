//! athome-scrape: listing crawler and detail extractor
//!
//! `crawl` writes a URL artifact, `extract` turns the latest (or a named)
//! artifact into a record table, `run` does both. `sample` and `survey` are
//! helpers for trying changes on a small slice of a crawl.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use athome_scrape::crawl_engine::CrawlOutcome;
use athome_scrape::extraction::{ExtractionOutcome, load_url_set};
use athome_scrape::run_store::{latest_url_artifact, sample_url_artifact};
use athome_scrape::utils::{DEFAULT_BASE_URL, DEFAULT_SAMPLE_SIZE, DEFAULT_SURVEY_SIZE};
use athome_scrape::{
    CsvRecordSink, HttpFetcher, RunId, ScrapeConfig, SiteSelectors, crawl_listings,
    extract_records, survey_labels,
};

#[derive(Parser)]
#[command(name = "athome-scrape")]
#[command(version, about = "Crawl athome.lu listings and extract property characteristics")]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOpts {
    /// Directory holding extracted_urls/ and raw_datasets/
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Maximum requests in flight (1 = sequential)
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Requests per second against the site (0 = unlimited)
    #[arg(long, global = true)]
    rate: Option<f64>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Crawl at most this many result pages
    #[arg(long, global = true)]
    page_limit: Option<u32>,

    /// JSON file overriding the default CSS selectors
    #[arg(long, global = true)]
    selectors: Option<PathBuf>,

    /// Print run summaries as JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk every results page and write a URL artifact
    Crawl,

    /// Extract characteristics for a URL artifact
    Extract {
        /// Run id (YYYYMMDDHHMMSS); defaults to the latest artifact
        #[arg(long)]
        run: Option<RunId>,
    },

    /// Crawl, then extract the artifact just written
    Run,

    /// Write a random subset of an artifact as a new run
    Sample {
        #[arg(long)]
        run: Option<RunId>,

        #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
        size: usize,
    },

    /// List the characteristic labels found on the first URLs of an artifact
    Survey {
        #[arg(long)]
        run: Option<RunId>,

        #[arg(long, default_value_t = DEFAULT_SURVEY_SIZE)]
        limit: usize,
    },
}

fn build_config(opts: &GlobalOpts) -> Result<ScrapeConfig> {
    let mut builder = ScrapeConfig::builder()
        .output_dir(&opts.output_dir)
        .base_url(opts.base_url.as_str())
        .page_limit(opts.page_limit);

    if let Some(n) = opts.concurrency {
        builder = builder.max_concurrent_requests(n);
    }
    if let Some(rps) = opts.rate {
        builder = builder.crawl_rate_rps(rps);
    }
    if let Some(secs) = opts.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(path) = &opts.selectors {
        builder = builder.selectors(SiteSelectors::from_json_file(path)?);
    }

    builder.build().context("Invalid configuration")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_crawl(outcome: &CrawlOutcome, json: bool) -> Result<()> {
    if json {
        return print_json(&serde_json::json!({
            "run_id": outcome.run_id.as_str(),
            "advertised_results": outcome.advertised_results,
            "last_page": outcome.last_page,
            "stats": outcome.stats,
            "skipped": outcome.stats.skipped(),
            "artifact": outcome.artifact_path,
            "elapsed_secs": outcome.elapsed.as_secs_f64(),
            "cancelled": outcome.cancelled,
        }));
    }

    let s = &outcome.stats;
    println!("Crawl run {}", outcome.run_id);
    println!("  advertised results : {}", outcome.advertised_results);
    println!("  pages              : {} ok / {} planned", s.pages_ok, s.pages_total);
    println!("  pages failed       : {}", s.pages_failed);
    println!("  pages drifted      : {}", s.pages_drifted);
    println!("  cards parsed       : {}", s.cards_parsed);
    println!("  cards foreign      : {}", s.cards_foreign);
    println!("  cards duplicate    : {}", s.cards_duplicate);
    println!("  cards unidentified : {}", s.cards_unidentified);
    println!(
        "  collectives        : {} resolved / {} failed",
        s.collectives_resolved, s.collectives_failed
    );
    println!("  skipped on failure : {}", s.skipped());
    println!("  URLs saved         : {}", s.urls_saved);
    println!("  artifact           : {}", outcome.artifact_path.display());
    println!("  elapsed            : {:.1}s", outcome.elapsed.as_secs_f64());
    if outcome.cancelled {
        println!("  CANCELLED: artifact holds a partial crawl");
    }
    Ok(())
}

fn report_extraction(outcome: &ExtractionOutcome, json: bool) -> Result<()> {
    if json {
        return print_json(&serde_json::json!({
            "run_id": outcome.run_id.as_str(),
            "urls_total": outcome.urls_total,
            "columns": outcome.columns,
            "stats": outcome.stats,
            "skipped": outcome.stats.skipped(),
            "table": outcome.record_path,
            "elapsed_secs": outcome.elapsed.as_secs_f64(),
            "cancelled": outcome.cancelled,
        }));
    }

    let s = &outcome.stats;
    println!("Extraction of run {}", outcome.run_id);
    println!("  URLs processed          : {} / {}", s.urls_processed, outcome.urls_total);
    println!("  records                 : {} ({} columns)", s.records, outcome.columns);
    println!("  non-200 skipped         : {}", s.non_200);
    println!("  fetch failures skipped  : {}", s.fetch_failed);
    println!("  no characteristics      : {}", s.missing_characteristics);
    println!("  titles without locality : {}", s.title_unparsed);
    println!("  table                   : {}", outcome.record_path.display());
    println!("  elapsed                 : {:.1}s", outcome.elapsed.as_secs_f64());
    if outcome.cancelled {
        println!("  CANCELLED: table holds a partial extraction");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = build_config(&cli.global)?;
    let json = cli.global.json;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after in-flight requests");
            ctrl_c_token.cancel();
        }
    });

    match cli.command {
        Commands::Crawl => {
            let fetcher = HttpFetcher::new(&config)?;
            let outcome = crawl_listings(&config, &fetcher, RunId::now(), &cancel).await?;
            report_crawl(&outcome, json)?;
        }
        Commands::Extract { run } => {
            let fetcher = HttpFetcher::new(&config)?;
            let mut sink = CsvRecordSink::for_config(&config);
            let outcome = extract_records(&config, &fetcher, run, &mut sink, &cancel).await?;
            report_extraction(&outcome, json)?;
        }
        Commands::Run => {
            let fetcher = HttpFetcher::new(&config)?;
            let crawl = crawl_listings(&config, &fetcher, RunId::now(), &cancel).await?;
            report_crawl(&crawl, json)?;
            if crawl.cancelled {
                return Ok(());
            }
            let mut sink = CsvRecordSink::for_config(&config);
            let outcome =
                extract_records(&config, &fetcher, Some(crawl.run_id), &mut sink, &cancel).await?;
            report_extraction(&outcome, json)?;
        }
        Commands::Sample { run, size } => {
            let urls_dir = config.urls_dir();
            let source = match run {
                Some(run) => run,
                None => latest_url_artifact(&urls_dir).await?,
            };
            let sample = sample_url_artifact(&urls_dir, &source, &RunId::now(), size).await?;
            println!(
                "Sampled {} of {} URLs from run {source} into run {} ({})",
                sample.sampled,
                sample.source_urls,
                sample.run_id,
                sample.path.display()
            );
        }
        Commands::Survey { run, limit } => {
            let fetcher = HttpFetcher::new(&config)?;
            let (run_id, urls) = load_url_set(&config, run).await?;
            let report = survey_labels(&config, &fetcher, &urls, limit, &cancel).await;
            if json {
                print_json(&serde_json::json!({ "run_id": run_id.as_str(), "survey": report }))?;
                return Ok(());
            }
            println!(
                "Run {run_id}: {} distinct labels across {} URLs ({} with records)",
                report.labels.len(),
                report.urls_surveyed,
                report.stats.records
            );
            for label in &report.labels {
                println!("  {label}");
            }
        }
    }

    Ok(())
}
