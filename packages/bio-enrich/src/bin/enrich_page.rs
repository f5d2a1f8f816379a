//! Enrich link-in-bio pages from a JSON file and write one record per line.
//!
//! ```text
//! enrich-page --page pages.json --output records.jsonl --flat
//! ```
//!
//! The page file holds either one page object or an array of them.

use anyhow::{Context, Result};
use apify_client::ApifyClient;
use bio_enrich::{
    apify_registry, Enricher, EnrichmentConfig, HttpShortLinkResolver, JsonLinesSink,
    PageContent, RecordLayout, RecordSink,
};
use clap::Parser;
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "enrich-page", about = "Enrich link-in-bio pages with social profile data")]
struct Args {
    /// JSON file with one page or an array of pages
    #[arg(long)]
    page: PathBuf,

    /// Platform config file (overrides ENRICH_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write flat rows instead of structured records
    #[arg(long)]
    flat: bool,
}

/// Settings read from the environment.
#[derive(Debug, Clone)]
struct AppConfig {
    apify_token: String,
    config_path: Option<PathBuf>,
    dispatch_timeout: Option<Duration>,
}

impl AppConfig {
    fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let dispatch_timeout = match env::var("ENRICH_DISPATCH_TIMEOUT_SECS") {
            Ok(raw) => Some(Duration::from_secs(
                raw.parse()
                    .context("ENRICH_DISPATCH_TIMEOUT_SECS must be a number of seconds")?,
            )),
            Err(_) => None,
        };

        Ok(Self {
            apify_token: env::var("APIFY_TOKEN").context("APIFY_TOKEN must be set")?,
            config_path: env::var("ENRICH_CONFIG").ok().map(PathBuf::from),
            dispatch_timeout,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bio_enrich=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let args = Args::parse();
    let app = AppConfig::from_env()?;

    let mut config = match args.config.as_ref().or(app.config_path.as_ref()) {
        Some(path) => EnrichmentConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EnrichmentConfig::default(),
    };
    if let Some(timeout) = app.dispatch_timeout {
        config = config.with_dispatch_timeout(timeout);
    }

    let pages = read_pages(&args.page)?;
    tracing::info!(pages = pages.len(), "Loaded bio pages");

    let client = Arc::new(ApifyClient::new(app.apify_token.clone()));
    let registry = apify_registry(client, &config);
    let resolver = HttpShortLinkResolver::new().context("Failed to build HTTP client")?;
    let enricher = Enricher::new(config, registry)
        .context("Invalid enrichment config")?
        .with_resolver(Arc::new(resolver));

    let writer: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout()),
    };
    let layout = if args.flat {
        RecordLayout::Flat
    } else {
        RecordLayout::Structured
    };
    let sink = JsonLinesSink::new(writer).with_layout(layout);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling outstanding lookups");
            on_signal.cancel();
        }
    });

    let mut degraded = 0;
    for page in &pages {
        if cancel.is_cancelled() {
            tracing::warn!(url = %page.url, "Skipping page after interrupt");
            continue;
        }

        let record = enricher.enrich_with_cancel(page, cancel.clone()).await;
        if record.is_degraded() {
            degraded += 1;
        }
        sink.emit(&record)
            .await
            .with_context(|| format!("Failed to write record for {}", record.url))?;
    }

    tracing::info!(pages = pages.len(), degraded, "Enrichment finished");
    Ok(())
}

fn read_pages(path: &Path) -> Result<Vec<PageContent>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("Page file is not valid JSON")?;

    let pages = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(pages)
}
