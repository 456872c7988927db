//! Static HTML report generation.
//!
//! Renders a [`SectionReport`] into a self-contained page:
//!
//! ```text
//! <!DOCTYPE html>
//! <html> <head> title, optional stylesheet </head>
//! <body>
//!   <h1>Health</h1>
//!   <div class="article"> image, linked headline, authors, timestamps </div>
//!   ...
//! </body> </html>
//! ```
//!
//! Output depends only on the report's contents, so identical records always
//! produce byte-identical files.

use crate::error::ScrapeError;
use crate::models::{ArticleRecord, SectionReport};
use crate::utils::upcase;
use itertools::Itertools;
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Absolute timestamp text for records whose time could not be parsed.
pub const INVALID_DATE: &str = "Invalid date";

/// Path of the report for `section` inside `output_dir`.
pub fn report_path(output_dir: &str, section: &str) -> PathBuf {
    Path::new(output_dir).join(format!("{section}_articles.html"))
}

/// Render the whole report document.
pub fn render_report(report: &SectionReport, stylesheet: Option<&str>) -> String {
    let mut html = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut html, report, stylesheet);
    html
}

fn write_report(out: &mut String, report: &SectionReport, stylesheet: Option<&str>) -> fmt::Result {
    let heading = escape_html(&upcase(&report.section));

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>AP News: {heading} Articles</title>")?;
    if let Some(href) = stylesheet {
        writeln!(out, "<link rel=\"stylesheet\" href=\"{}\">", escape_html(href))?;
    }
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<h1>{heading}</h1>")?;
    for article in &report.articles {
        write_article(out, article)?;
    }
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

fn write_article(out: &mut String, article: &ArticleRecord) -> fmt::Result {
    let absolute = article
        .datetime
        .map(|dt| dt.format("%a %b %d %Y %H:%M UTC").to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string());
    let authors_class = if article.is_uncredited() {
        "authors uncredited"
    } else {
        "authors"
    };

    writeln!(out, "<div class=\"article\">")?;
    writeln!(
        out,
        "  <img src=\"{}\" alt=\"{}\">",
        escape_html(&article.image),
        escape_html(&article.title)
    )?;
    writeln!(
        out,
        "  <h3><a href=\"{}\">{}</a></h3>",
        escape_html(&article.link),
        escape_html(&article.title)
    )?;
    writeln!(
        out,
        "  <p class=\"{authors_class}\">{}</p>",
        article.authors.iter().map(|a| escape_html(a)).join(" | ")
    )?;
    writeln!(
        out,
        "  <p class=\"timestamp\">{} ({})</p>",
        escape_html(article.datetime_relative.trim()),
        absolute
    )?;
    writeln!(out, "</div>")
}

/// Write a rendered report, creating the output directory if needed.
///
/// The file is flushed and closed before this returns `Ok`.
#[instrument(level = "info", skip(path, html), fields(path = %path.display()))]
pub async fn write_report_file(path: &Path, html: &str) -> Result<(), ScrapeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ScrapeError::output(parent, e))?;
    }
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| ScrapeError::output(path, e))?;
    file.write_all(html.as_bytes())
        .await
        .map_err(|e| ScrapeError::output(path, e))?;
    file.flush().await.map_err(|e| ScrapeError::output(path, e))?;
    file.sync_all().await.map_err(|e| ScrapeError::output(path, e))?;
    info!(bytes = html.len(), "Wrote HTML report");
    Ok(())
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
