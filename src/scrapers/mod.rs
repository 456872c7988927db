//! News source scrapers.
//!
//! Each scraper renders a listing page and turns its entries into
//! [`ArticleRecord`](crate::models::ArticleRecord)s:
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | AP News hubs | [`apnews`] | Headless Chrome + HTML scraping | Scrolls to load lazy card images |
//!
//! Scrapers export:
//! - `index_articles(url, ...)`: Render the live page and extract records
//! - `index_saved_page(path, ...)`: Extract records from a saved render

pub mod apnews;
