//! Utility functions for string cleanup and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Section slugs for URLs and output file names
//! - Whitespace normalisation for scraped text nodes
//! - String truncation for logging
//! - File system validation for output directories

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a character boundary at or below `max` bytes,
/// with an ellipsis and byte count indicator appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of bytes to keep
///
/// # Returns
///
/// The original string if it fits, otherwise the kept prefix with
/// `"…(+N bytes)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Convert a section name to the slug used in hub URLs and file names.
///
/// Lowercases the text, removes special characters, and replaces runs of
/// spaces with a single hyphen.
///
/// # Arguments
///
/// * `section` - Section name as typed on the command line
///
/// # Returns
///
/// The slug, which is empty when `section` has no alphanumeric characters.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(section_slug("Health"), "health");
/// assert_eq!(section_slug("World News"), "world-news");
/// ```
pub fn section_slug(section: &str) -> String {
    section
        .trim()
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Collapse every run of whitespace into one space and trim the ends.
///
/// Text nodes on the hub page carry indentation and line breaks from the
/// markup; headlines are compared and rendered in this normalised form.
pub fn normalize_whitespace(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").into_owned()
}

/// Capitalize the first character of a string.
///
/// Used for report titles (e.g., "health" -> "Health").
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file. Run before launching the
/// browser so a bad output path fails fast.
///
/// # Arguments
///
/// * `path` - Directory path to check/create
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_boundary() {
        // 'é' is two bytes; a cut at byte 1 must back off to 0
        let result = truncate_for_log("éé", 1);
        assert_eq!(result, "…(+4 bytes)");
    }

    #[test]
    fn test_section_slug() {
        assert_eq!(section_slug("health"), "health");
        assert_eq!(section_slug("Health"), "health");
        assert_eq!(section_slug("  World   News "), "world-news");
        assert_eq!(section_slug("us-news"), "us-news");
        assert_eq!(section_slug("Sports!"), "sports");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("\n   Vaccine rollout\n    slows  \t"),
            "Vaccine rollout slows"
        );
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_upcase() {
        assert_eq!(upcase("health"), "Health");
        assert_eq!(upcase(""), "");
        assert_eq!(upcase("a"), "A");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b/c");
        let nested = nested.to_str().unwrap();
        ensure_writable_dir(nested).await.unwrap();
        assert!(std::path::Path::new(nested).is_dir());
    }
}
