//! # AP Hub Scraper
//!
//! Renders an AP News section hub in headless Chrome, extracts the article
//! cards it lists and writes them to a static HTML report.
//!
//! ## Features
//!
//! - Scrolls the rendered page until lazily loaded content has appeared
//! - Extracts title, link, image, authors and timestamps from every card,
//!   falling back to defaults for whatever a card is missing
//! - Writes `output/<section>_articles.html`, plus an optional JSON dump
//! - Optional full-page screenshot for debugging selectors
//!
//! ## Usage
//!
//! ```sh
//! ap_hub_scraper health -o ./output --screenshot screen.png
//! ```
//!
//! ## Architecture
//!
//! The application follows a one-way pipeline:
//! 1. **Rendering**: Load the hub in Chrome and scroll until stable
//! 2. **Extraction**: Turn each `FeedCard` into an `ArticleRecord`
//! 3. **Output**: Render the records to HTML (and JSON if requested)

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod browser;
mod cli;
mod config;
mod dom;
mod error;
mod models;
mod outputs;
mod scrapers;
mod utils;

use browser::{RenderHook, ScreenshotHook};
use cli::Cli;
use config::ScrapeConfig;
use models::SectionReport;
use outputs::{html, json};
use scrapers::apnews;
use utils::{ensure_writable_dir, section_slug};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ap_hub_scraper starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = match ScrapeConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    config.apply_cli(&args);
    if let Err(e) = config.validate(args.config.as_deref().unwrap_or("<defaults>")) {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }
    debug!(?config, "Effective configuration");

    let section = section_slug(&args.section);
    if section.is_empty() {
        error!(section = %args.section, "Section name has no usable characters");
        return Err(format!("invalid section name {:?}", args.section).into());
    }

    // Early check: ensure the report dir is writable before starting Chrome
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Render and extract ----
    let url = apnews::section_url(&config.base_url, &section);
    let extracted = match &args.html_file {
        Some(path) => {
            info!(path = %path.display(), "Extracting from saved page");
            apnews::index_saved_page(path, &config).await
        }
        None => {
            let mut hooks: Vec<Box<dyn RenderHook + Send>> = Vec::new();
            if let Some(path) = &args.screenshot {
                hooks.push(Box::new(ScreenshotHook { path: path.clone() }));
            }
            info!(%url, %section, "Scraping section hub");
            apnews::index_articles(&url, &config, hooks).await
        }
    };
    let articles = match extracted {
        Ok(articles) => articles,
        Err(e) => {
            error!(%url, error = %e, "Failed to scrape section");
            return Err(e.into());
        }
    };

    let report = SectionReport {
        section: section.clone(),
        source_url: url,
        scraped_at: Utc::now(),
        articles,
    };

    // ---- HTML report ----
    let report_html = html::render_report(&report, config.stylesheet.as_deref());
    let report_path = html::report_path(&config.output_dir, &section);
    if let Err(e) = html::write_report_file(&report_path, &report_html).await {
        error!(path = %report_path.display(), error = %e, "Failed writing HTML report");
        return Err(e.into());
    }

    // ---- JSON dump ----
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = json::write_section_report(&report, dir).await {
            error!(error = %e, "Failed to write JSON dump");
            return Err(e.into());
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = report.articles.len(),
        path = %report_path.display(),
        "Execution complete"
    );

    Ok(())
}
