//! Runtime configuration loaded from an optional YAML file.
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change. Command-line flags are applied on top via [`ScrapeConfig::apply_cli`].
//!
//! ```yaml
//! base_url: "http://www.apnews.com"
//! timeout_secs: 90
//! scroll:
//!   step_px: 200
//!   interval_ms: 100
//!   max_steps: 500
//! ```

use crate::cli::Cli;
use crate::error::ScrapeError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://www.apnews.com";
pub const DEFAULT_IMAGE: &str = "resources/ap_logo.bmp";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Origin prepended to every scraped article link.
    pub base_url: String,
    /// Placeholder used for cards without an image.
    pub default_image: String,
    /// Budget for navigation plus scrolling.
    pub timeout_secs: u64,
    /// Directory receiving `<section>_articles.html`.
    pub output_dir: String,
    pub headless: bool,
    /// Optional stylesheet href referenced from the report head.
    pub stylesheet: Option<String>,
    pub scroll: ScrollConfig,
}

/// Tuning for the scroll-until-stable loop.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Pixels scrolled per tick. 200 reliably triggers lazy image loads.
    pub step_px: u64,
    pub interval_ms: u64,
    /// Hard cap on ticks for pages that keep growing.
    pub max_steps: u32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_image: DEFAULT_IMAGE.to_string(),
            timeout_secs: 60,
            output_dir: "output".to_string(),
            headless: true,
            stylesheet: None,
            scroll: ScrollConfig::default(),
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        ScrollConfig {
            step_px: 200,
            interval_ms: 100,
            max_steps: 500,
        }
    }
}

impl ScrapeConfig {
    /// Load configuration from `path`, or defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ScrapeError> {
        let Some(path) = path else {
            return Ok(ScrapeConfig::default());
        };
        let raw = std::fs::read_to_string(Path::new(path)).map_err(|e| ScrapeError::Config {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_yaml(&raw).map_err(|e| ScrapeError::Config {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(ScrapeConfig::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Overlay explicitly passed command-line flags.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(secs) = cli.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(steps) = cli.max_scroll_steps {
            self.scroll.max_steps = steps;
        }
        if cli.headful {
            self.headless = false;
        }
        if let Some(href) = &cli.stylesheet {
            self.stylesheet = Some(href.clone());
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
    }

    /// Reject configurations that cannot produce absolute article links.
    pub fn validate(&self, source: &str) -> Result<(), ScrapeError> {
        let invalid = |reason: String| ScrapeError::Config {
            path: source.to_string(),
            reason,
        };
        let base = Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("base_url {:?}: {e}", self.base_url)))?;
        if !matches!(base.scheme(), "http" | "https")
            || base.host_str().is_none()
            || base.path() != "/"
            || base.query().is_some()
        {
            return Err(invalid(format!(
                "base_url {:?} must be a bare http(s) origin",
                self.base_url
            )));
        }
        if self.output_dir.trim().is_empty() {
            return Err(invalid("output_dir is empty".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.base_url, "http://www.apnews.com");
        assert_eq!(config.default_image, "resources/ap_logo.bmp");
        assert_eq!(config.scroll.step_px, 200);
        assert_eq!(config.scroll.interval_ms, 100);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ScrapeConfig::from_yaml("timeout_secs: 5\nscroll:\n  step_px: 400\n").unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.scroll.step_px, 400);
        assert_eq!(config.scroll.interval_ms, 100);
        assert_eq!(config.output_dir, "output");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ScrapeConfig::from_yaml("").unwrap(), ScrapeConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(ScrapeConfig::from_yaml("timeout_secs: [not, a, number]").is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = ScrapeConfig::load(Some("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ScrapeError::Config { .. }));
    }

    #[test]
    fn test_validate() {
        assert!(ScrapeConfig::default().validate("<defaults>").is_ok());

        let mut config = ScrapeConfig::default();
        config.base_url = "apnews.com".to_string();
        assert!(matches!(
            config.validate("<defaults>"),
            Err(ScrapeError::Config { .. })
        ));

        config.base_url = "ftp://apnews.com".to_string();
        assert!(config.validate("<defaults>").is_err());

        config.base_url = "http://www.apnews.com/hub".to_string();
        assert!(config.validate("<defaults>").is_err());

        let mut config = ScrapeConfig::default();
        config.output_dir = "  ".to_string();
        assert!(config.validate("<defaults>").is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "ap_hub_scraper",
            "politics",
            "--output-dir",
            "/tmp/reports",
            "--timeout-secs",
            "15",
            "--max-scroll-steps",
            "20",
            "--headful",
        ]);
        let mut config = ScrapeConfig::from_yaml("base_url: \"https://apnews.com/\"").unwrap();
        config.apply_cli(&cli);

        assert_eq!(config.output_dir, "/tmp/reports");
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.scroll.max_steps, 20);
        assert!(!config.headless);
        assert_eq!(config.base_url, "https://apnews.com");
    }
}
