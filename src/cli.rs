//! Command-line interface definitions for the AP hub scraper.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most options can also be provided via environment variables or the YAML
//! config file; flags given here win.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the AP hub scraper.
///
/// # Examples
///
/// ```sh
/// # Scrape the default (health) section into ./output
/// ap_hub_scraper
///
/// # Scrape politics, keep a debug screenshot and a JSON dump
/// ap_hub_scraper politics --screenshot screen.png --json-output-dir ./json
///
/// # Re-run extraction against a page saved earlier
/// ap_hub_scraper health --html-file saved/health.html
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// News section to scrape, e.g. health, politics, sports
    #[arg(default_value = "health")]
    pub section: String,

    /// Output directory for the HTML report
    #[arg(short, long, env = "AP_SCRAPER_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "AP_SCRAPER_CONFIG")]
    pub config: Option<String>,

    /// Also write the extracted records as JSON into this directory
    #[arg(long)]
    pub json_output_dir: Option<String>,

    /// Save a full-page screenshot of the rendered hub (debugging aid)
    #[arg(long)]
    pub screenshot: Option<PathBuf>,

    /// Seconds allowed for navigation and scrolling
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Upper bound on scroll steps before giving up on a growing page
    #[arg(long)]
    pub max_scroll_steps: Option<u32>,

    /// Run Chrome with a visible window
    #[arg(long)]
    pub headful: bool,

    /// Stylesheet href referenced from the report
    #[arg(long)]
    pub stylesheet: Option<String>,

    /// Extract from a previously saved rendered page instead of launching Chrome
    #[arg(long, conflicts_with = "screenshot")]
    pub html_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_section() {
        let cli = Cli::parse_from(["ap_hub_scraper"]);
        assert_eq!(cli.section, "health");
        assert!(cli.output_dir.is_none());
        assert!(!cli.headful);
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "ap_hub_scraper",
            "politics",
            "--output-dir",
            "./reports",
            "--json-output-dir",
            "./json",
            "--screenshot",
            "screen.png",
        ]);

        assert_eq!(cli.section, "politics");
        assert_eq!(cli.output_dir.as_deref(), Some("./reports"));
        assert_eq!(cli.json_output_dir.as_deref(), Some("./json"));
        assert_eq!(cli.screenshot, Some(PathBuf::from("screen.png")));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["ap_hub_scraper", "-o", "/tmp/out", "-c", "/tmp/c.yaml"]);

        assert_eq!(cli.output_dir.as_deref(), Some("/tmp/out"));
        assert_eq!(cli.config.as_deref(), Some("/tmp/c.yaml"));
    }

    #[test]
    fn test_html_file_conflicts_with_screenshot() {
        let res = Cli::try_parse_from([
            "ap_hub_scraper",
            "--html-file",
            "page.html",
            "--screenshot",
            "s.png",
        ]);
        assert!(res.is_err());
    }
}
