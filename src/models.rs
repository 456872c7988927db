//! Data models for scraped article cards and the per-section report.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ArticleRecord`]: One article summary extracted from a `FeedCard`
//! - [`SectionReport`]: All records scraped from one section hub, in page order

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author list used when a card carries no byline.
pub const NO_AUTHOR: &str = "no author cited";

/// A single article summary as listed on a section hub.
///
/// Records are built once per `FeedCard` and never mutated afterwards.
/// Optional markup is resolved to defaults at construction time, so every
/// field is always populated.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Headline text, empty when the card has no `h3`.
    pub title: String,
    /// Absolute article URL. Always starts with the configured base origin.
    pub link: String,
    /// Image `src`, or the placeholder asset when the card has no image.
    pub image: String,
    /// Cited authors in byline order; never empty.
    pub authors: Vec<String>,
    /// Publication time, `None` when the attribute is absent or unparseable.
    pub datetime: Option<DateTime<Utc>>,
    /// Recency text such as "3 hours ago", as scraped.
    pub datetime_relative: String,
}

impl ArticleRecord {
    /// Whether the byline named nobody.
    pub fn is_uncredited(&self) -> bool {
        self.authors.len() == 1 && self.authors[0] == NO_AUTHOR
    }
}

/// The records scraped from one section hub during a single run.
///
/// Each execution produces one `SectionReport`, which is rendered to HTML
/// and optionally dumped as JSON.
#[derive(Debug, Deserialize, Serialize)]
pub struct SectionReport {
    /// Section name, e.g. `"health"`.
    pub section: String,
    /// The hub URL that was rendered.
    pub source_url: String,
    /// When the page was scraped.
    pub scraped_at: DateTime<Utc>,
    /// Extracted records in document order.
    pub articles: Vec<ArticleRecord>,
}
