//! Error type shared by the scraping pipeline.
//!
//! Only page-level and file-level failures live here. A missing image, byline
//! or timestamp on a single card is never an error: the extractors resolve
//! those locally to a documented default.

use std::path::PathBuf;
use std::time::Duration;

/// Failures that terminate a scraping run.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The section page could not be reached or did not finish loading.
    #[error("failed to navigate to {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// Navigation plus scrolling exceeded the configured budget.
    #[error("page did not stabilise within {after:?}")]
    Timeout { after: Duration },

    /// The browser could not be launched or a page-level call failed.
    #[error("browser error: {0}")]
    Browser(String),

    /// The YAML configuration file could not be read or parsed.
    #[error("invalid config {path}: {reason}")]
    Config { path: String, reason: String },

    /// A saved page given as input could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating, writing or flushing an output file failed.
    #[error("failed to write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The blocking browser task panicked or was cancelled.
    #[error("render task failed: {0}")]
    Task(String),
}

impl ScrapeError {
    pub(crate) fn input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScrapeError::Input {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScrapeError::OutputWrite {
            path: path.into(),
            source,
        }
    }
}
