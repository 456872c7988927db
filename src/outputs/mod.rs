//! Output generation for the scraped section.
//!
//! # Submodules
//!
//! - [`html`]: Renders a `SectionReport` as the static HTML report
//! - [`json`]: Optional JSON dump of the same records
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── health_articles.html
//!
//! json_output_dir/
//! └── health_articles.json
//! ```

pub mod html;
pub mod json;
