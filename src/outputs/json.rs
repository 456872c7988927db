//! JSON dump of the extracted records.
//!
//! Serializes the whole [`SectionReport`] so the raw records can be diffed
//! between runs or fed to other tools.
//!
//! # Output Path
//!
//! ```text
//! json_output_dir/
//! └── health_articles.json
//! ```

use crate::error::ScrapeError;
use crate::models::SectionReport;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of the JSON dump for `section` inside `json_output_dir`.
pub fn json_path(json_output_dir: &str, section: &str) -> PathBuf {
    Path::new(json_output_dir).join(format!("{section}_articles.json"))
}

/// Write a [`SectionReport`] as pretty-printed JSON.
///
/// Creates `json_output_dir` if needed.
///
/// # Arguments
///
/// * `report` - The extracted section to serialize
/// * `json_output_dir` - Directory receiving `<section>_articles.json`
///
/// # Returns
///
/// The path of the written file.
///
/// # Errors
///
/// [`ScrapeError::Serialize`] if the report cannot be encoded, or
/// [`ScrapeError::OutputWrite`] if the directory or file cannot be written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_section_report(
    report: &SectionReport,
    json_output_dir: &str,
) -> Result<PathBuf, ScrapeError> {
    let json = serde_json::to_string_pretty(report)?;

    info!(%json_output_dir, "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(%json_output_dir, error = %e, "Failed to create JSON dir");
        return Err(ScrapeError::output(json_output_dir, e));
    }

    let path = json_path(json_output_dir, &report.section);
    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json)
        .await
        .map_err(|e| ScrapeError::output(&path, e))?;
    info!(path = %path.display(), count = report.articles.len(), "Wrote JSON dump");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleRecord;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_write_section_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("json");
        let report = SectionReport {
            section: "health".to_string(),
            source_url: "http://www.apnews.com/hub/health".to_string(),
            scraped_at: Utc.with_ymd_and_hms(2021, 5, 4, 18, 0, 0).unwrap(),
            articles: vec![ArticleRecord {
                title: "Vaccines".to_string(),
                link: "http://www.apnews.com/article/v".to_string(),
                image: "resources/ap_logo.bmp".to_string(),
                authors: vec!["no author cited".to_string()],
                datetime: None,
                datetime_relative: String::new(),
            }],
        };

        let path = write_section_report(&report, out.to_str().unwrap()).await.unwrap();
        assert_eq!(path, out.join("health_articles.json"));

        let back: SectionReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.articles, report.articles);
        assert_eq!(back.section, "health");
    }
}
