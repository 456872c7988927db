//! AP News section hub scraper.
//!
//! This module scrapes the article listing of an [AP News](http://www.apnews.com)
//! section hub such as `/hub/health`. Hub pages load card images lazily while
//! the viewport moves, so the page is rendered in headless Chrome and scrolled
//! to the bottom before extraction (see [`crate::browser`]).
//!
//! # Card Layout
//!
//! Each listing entry is a `div` whose class contains `FeedCard`:
//!
//! ```text
//! div.FeedCard
//! ├── a[href]               relative article path
//! ├── img[src]              card image (missing on logo-less stories)
//! ├── h3                    headline
//! ├── span.Component-bylines   "By A, B and C"
//! └── span.Timestamp[data-source]   absolute time + "3 hours ago"
//! ```
//!
//! Every field except the card itself is optional. Missing fields fall back
//! to documented defaults so one malformed card never sinks the batch.

use crate::browser::{self, BrowserOptions, RenderHook};
use crate::config::ScrapeConfig;
use crate::dom::{Document, Node};
use crate::error::ScrapeError;
use crate::models::{ArticleRecord, NO_AUTHOR};
use crate::utils::{normalize_whitespace, truncate_for_log};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use scraper::Selector;
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use url::Url;

static FEED_CARD: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[class*='FeedCard']").unwrap());
static BYLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span[class*='Component-bylines']").unwrap());
static TIMESTAMP: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span[class*='Timestamp']").unwrap());
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Site-dependent inputs to card extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Origin every article link is resolved against.
    pub base: Url,
    /// Image used for cards that have none.
    pub default_image: String,
}

impl ExtractOptions {
    /// Parse `base_url` once for every card of a page.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Config`] if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, default_image: &str) -> Result<Self, ScrapeError> {
        let base = Url::parse(base_url.trim()).map_err(|e| ScrapeError::Config {
            path: "base_url".to_string(),
            reason: format!("{base_url:?}: {e}"),
        })?;
        Ok(ExtractOptions {
            base,
            default_image: default_image.to_string(),
        })
    }

    /// The base origin as text, without a trailing slash.
    pub fn origin(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }
}

impl TryFrom<&ScrapeConfig> for ExtractOptions {
    type Error = ScrapeError;

    fn try_from(config: &ScrapeConfig) -> Result<Self, Self::Error> {
        ExtractOptions::new(&config.base_url, &config.default_image)
    }
}

/// Hub URL for a section slug.
///
/// # Arguments
///
/// * `base_url` - Site origin, with or without a trailing slash
/// * `section` - Section slug, percent-encoded into the path
///
/// # Returns
///
/// The hub URL with AP's navigation tracking parameters appended.
pub fn section_url(base_url: &str, section: &str) -> String {
    format!(
        "{}/hub/{}?utm_source=apnewsnav&utm_medium=sections",
        base_url.trim_end_matches('/'),
        urlencoding::encode(section)
    )
}

/// Render a section hub in Chrome and extract its article cards.
///
/// The browser session is blocking, so it runs on tokio's blocking pool.
///
/// # Arguments
///
/// * `url` - Hub URL, usually from [`section_url`]
/// * `config` - Browser, scroll and extraction settings
/// * `hooks` - Diagnostics run on the settled page before extraction
///
/// # Returns
///
/// One [`ArticleRecord`] per `FeedCard`, in document order.
///
/// # Errors
///
/// Navigation, browser, timeout and task failures are returned as
/// [`ScrapeError`]. Card-level gaps never are.
#[instrument(level = "info", skip(config, hooks))]
pub async fn index_articles(
    url: &str,
    config: &ScrapeConfig,
    hooks: Vec<Box<dyn RenderHook + Send>>,
) -> Result<Vec<ArticleRecord>, ScrapeError> {
    let options = BrowserOptions::from(config);
    let target = url.to_string();
    let page = tokio::task::spawn_blocking(move || browser::render_page(&target, &options, &hooks))
        .await
        .map_err(|e| ScrapeError::Task(e.to_string()))??;

    info!(
        bytes = page.html.len(),
        scroll_steps = page.scroll.steps,
        capped = page.scroll.capped,
        "Rendered hub page"
    );
    debug!(preview = %truncate_for_log(&page.html, 300), "Rendered HTML");

    let document = Document::parse(&page.html);
    Ok(extract_articles(&document, &ExtractOptions::try_from(config)?))
}

/// Extract article cards from a rendered page saved to disk.
///
/// # Errors
///
/// Returns [`ScrapeError::Input`] if the file cannot be read.
#[instrument(level = "info", skip(path, config), fields(path = %path.display()))]
pub async fn index_saved_page(
    path: &Path,
    config: &ScrapeConfig,
) -> Result<Vec<ArticleRecord>, ScrapeError> {
    let html = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ScrapeError::input(path, e))?;
    let document = Document::parse(&html);
    Ok(extract_articles(&document, &ExtractOptions::try_from(config)?))
}

/// Build one record per `FeedCard`, in document order.
pub fn extract_articles(document: &Document, options: &ExtractOptions) -> Vec<ArticleRecord> {
    let cards = document.find(&FEED_CARD);
    if cards.is_empty() {
        warn!("No FeedCard elements found; the page layout may have changed");
    }
    info!(count = cards.len(), "Articles found");

    let records: Vec<ArticleRecord> = cards.iter().map(|card| parse_article(card, options)).collect();
    info!(count = records.len(), "Total article records generated");
    records
}

/// Turn a single `FeedCard` into an [`ArticleRecord`].
///
/// Never fails: absent headline, image, byline or timestamp resolve to their
/// defaults. A card without an anchor links to the base origin itself.
pub fn parse_article(card: Node<'_>, options: &ExtractOptions) -> ArticleRecord {
    let title = card
        .find(&HEADLINE)
        .first()
        .map(|h| normalize_whitespace(&h.text()))
        .unwrap_or_default();

    let link = match card.find(&ANCHOR).attr("href").map(str::trim) {
        Some(href) if !href.is_empty() => join_link(&options.base, href),
        _ => {
            warn!(%title, "FeedCard has no link; linking to base origin");
            options.origin().to_string()
        }
    };

    let image = card
        .find(&IMAGE)
        .attr("src")
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| options.default_image.clone());

    let authors = parse_authors(&card.find(&BYLINE).text());

    let timestamp = card.find(&TIMESTAMP);
    let source = timestamp.attr("data-source");
    let datetime = parse_timestamp(source);
    if datetime.is_none() && source.is_some() {
        debug!(raw = ?source, "Unparseable timestamp");
    }

    ArticleRecord {
        title,
        link,
        image,
        authors,
        datetime,
        datetime_relative: timestamp.text(),
    }
}

/// Split byline text into author names.
///
/// `"By A, B and C"` becomes `["A", "B", "C"]`. Parts are trimmed and empty
/// parts dropped, so `"By A, B, and C"` yields the same list.
///
/// # Returns
///
/// At least one entry. Text that does not start with "by " (any case), or
/// names nothing after it, yields `[NO_AUTHOR]`.
pub fn parse_authors(byline: &str) -> Vec<String> {
    let byline = byline.trim();
    let names = match byline.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("by ") => &byline[3..],
        _ => return vec![NO_AUTHOR.to_string()],
    };

    let authors: Vec<String> = names
        .split(',')
        .flat_map(|segment| segment.split(" and "))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    if authors.is_empty() {
        vec![NO_AUTHOR.to_string()]
    } else {
        authors
    }
}

/// Parse a `data-source` timestamp attribute.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS` with
/// optional fractional seconds (read as UTC), a bare date, or epoch
/// milliseconds.
///
/// # Returns
///
/// `None` for a missing, empty or unrecognised value.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

/// Resolve a scraped href against the base origin.
///
/// Relative, dot-relative, protocol-relative and absolute hrefs are resolved
/// with [`Url::join`]. A link to the same site (`www.` ignored, either
/// scheme) is re-rooted on the base origin so every link starts with it.
///
/// # Arguments
///
/// * `base` - Site origin
/// * `href` - Raw `href` attribute value
///
/// # Returns
///
/// The absolute article link. Hrefs that do not resolve, or that point at
/// another site, fall back to the base origin itself.
pub fn join_link(base: &Url, href: &str) -> String {
    let origin = base.as_str().trim_end_matches('/');
    let joined = match base.join(href.trim()) {
        Ok(joined) => joined,
        Err(e) => {
            warn!(href, error = %e, "Unresolvable href; linking to base origin");
            return origin.to_string();
        }
    };
    if !same_site(base, &joined) {
        warn!(href, "Off-site href; linking to base origin");
        return origin.to_string();
    }

    let mut link = base.clone();
    link.set_path(joined.path());
    link.set_query(joined.query());
    link.set_fragment(joined.fragment());
    if link.path() == "/" && link.query().is_none() && link.fragment().is_none() {
        return origin.to_string();
    }
    link.into()
}

fn same_site(base: &Url, other: &Url) -> bool {
    let bare = |url: &Url| {
        url.host_str()
            .map(|h| h.trim_start_matches("www.").to_string())
    };
    matches!(other.scheme(), "http" | "https") && bare(base).is_some() && bare(base) == bare(other)
}
