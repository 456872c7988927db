//! Headless Chrome driver that renders a page until its lazy content is in.
//!
//! Hub pages only request card images once they scroll into view, so the
//! HTML is read after a scroll-until-stable pass:
//!
//! 1. read the document's scroll height
//! 2. scroll the viewport down by a fixed step
//! 3. stop once the accumulated offset reaches the (re-read) height
//!
//! The height is re-read on every tick, so content appended while scrolling
//! extends the pass. An infinite feed would never satisfy the condition, so
//! the pass is also capped at `max_steps` (best effort, extraction proceeds)
//! and bounded by the run's timeout (hard failure).
//!
//! The Chrome process is owned by the [`headless_chrome::Browser`] value for
//! the duration of [`render_page`]; dropping it kills the process, so the
//! browser is released on success, error and timeout alike.

use crate::config::{ScrapeConfig, ScrollConfig};
use crate::error::ScrapeError;
use headless_chrome::protocol::cdp::Page::{CaptureScreenshotFormatOption, Viewport};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Options for one rendering session.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Shared budget for navigation and scrolling.
    pub timeout: Duration,
    pub scroll: ScrollOptions,
}

#[derive(Debug, Clone)]
pub struct ScrollOptions {
    pub step_px: u64,
    pub interval: Duration,
    pub max_steps: u32,
}

impl From<&ScrollConfig> for ScrollOptions {
    fn from(config: &ScrollConfig) -> Self {
        ScrollOptions {
            step_px: config.step_px.max(1),
            interval: Duration::from_millis(config.interval_ms),
            max_steps: config.max_steps.max(1),
        }
    }
}

impl From<&ScrapeConfig> for BrowserOptions {
    fn from(config: &ScrapeConfig) -> Self {
        BrowserOptions {
            headless: config.headless,
            timeout: config.timeout(),
            scroll: ScrollOptions::from(&config.scroll),
        }
    }
}

/// How a scroll-until-stable pass ended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollOutcome {
    pub steps: u32,
    pub scrolled_px: u64,
    /// Scroll height observed on the last tick.
    pub final_height: u64,
    /// The pass hit `max_steps` before reaching the bottom.
    pub capped: bool,
}

/// Final HTML of a rendered page.
#[derive(Debug)]
pub struct RenderedPage {
    pub html: String,
    pub scroll: ScrollOutcome,
}

/// A page whose viewport can be scrolled.
pub trait ScrollPage {
    /// Current total scrollable height of the document, in pixels.
    fn scroll_height(&self) -> Result<u64, ScrapeError>;
    fn scroll_by(&self, px: u64) -> Result<(), ScrapeError>;
}

/// A live, navigated page.
pub trait LivePage: ScrollPage {
    /// Full-page PNG of the current render.
    fn screenshot_png(&self) -> Result<Vec<u8>, ScrapeError>;
    /// Serialized DOM of the current render.
    fn content(&self) -> Result<String, ScrapeError>;
}

/// Diagnostic step run once the page has stabilised.
///
/// Hooks observe the page but cannot fail the run: errors are logged.
pub trait RenderHook {
    fn name(&self) -> &'static str;
    fn after_render(&self, page: &dyn LivePage) -> Result<(), ScrapeError>;
}

/// Saves a full-page screenshot for debugging selectors.
pub struct ScreenshotHook {
    pub path: PathBuf,
}

impl RenderHook for ScreenshotHook {
    fn name(&self) -> &'static str {
        "screenshot"
    }

    fn after_render(&self, page: &dyn LivePage) -> Result<(), ScrapeError> {
        let png = page.screenshot_png()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ScrapeError::output(parent, e))?;
        }
        std::fs::write(&self.path, &png).map_err(|e| ScrapeError::output(&self.path, e))?;
        info!(path = %self.path.display(), bytes = png.len(), "Saved screenshot");
        Ok(())
    }
}

/// Wall-clock budget for one session.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    started: Instant,
    limit: Duration,
}

impl Budget {
    pub fn start(limit: Duration) -> Self {
        Budget {
            started: Instant::now(),
            limit,
        }
    }

    fn check(&self) -> Result<(), ScrapeError> {
        if self.started.elapsed() >= self.limit {
            Err(ScrapeError::Timeout { after: self.limit })
        } else {
            Ok(())
        }
    }
}

/// Scroll `page` down until the accumulated offset reaches its height.
///
/// For a fixed height `H > 0` and step `S` this takes exactly `ceil(H / S)`
/// steps; a page without overflow takes one.
pub fn scroll_until_stable<P: ScrollPage + ?Sized>(
    page: &P,
    options: &ScrollOptions,
    budget: &Budget,
) -> Result<ScrollOutcome, ScrapeError> {
    let mut outcome = ScrollOutcome::default();
    loop {
        budget.check()?;
        let height = page.scroll_height()?;
        page.scroll_by(options.step_px)?;
        outcome.steps += 1;
        outcome.scrolled_px += options.step_px;
        outcome.final_height = height;

        if outcome.scrolled_px >= height {
            debug!(steps = outcome.steps, height, "Reached bottom of page");
            return Ok(outcome);
        }
        if outcome.steps >= options.max_steps {
            warn!(
                steps = outcome.steps,
                height,
                scrolled = outcome.scrolled_px,
                "Page still growing at scroll cap; extracting what has loaded"
            );
            outcome.capped = true;
            return Ok(outcome);
        }
        std::thread::sleep(options.interval);
    }
}

/// Scroll to stability, run diagnostic hooks, then read the HTML.
pub fn settle_page(
    page: &dyn LivePage,
    options: &ScrollOptions,
    budget: &Budget,
    hooks: &[Box<dyn RenderHook + Send>],
) -> Result<RenderedPage, ScrapeError> {
    let scroll = scroll_until_stable(page, options, budget)?;
    for hook in hooks {
        if let Err(e) = hook.after_render(page) {
            warn!(hook = hook.name(), error = %e, "Diagnostic hook failed; continuing");
        }
    }
    let html = page.content()?;
    Ok(RenderedPage { html, scroll })
}

/// Launch Chrome, load `url` and return its fully rendered HTML.
#[instrument(level = "info", skip(options, hooks))]
pub fn render_page(
    url: &str,
    options: &BrowserOptions,
    hooks: &[Box<dyn RenderHook + Send>],
) -> Result<RenderedPage, ScrapeError> {
    let budget = Budget::start(options.timeout);

    let launch = LaunchOptions::default_builder()
        .headless(options.headless)
        .window_size(Some((1280, 1024)))
        .idle_browser_timeout(options.timeout + Duration::from_secs(30))
        .build()
        .map_err(|e| ScrapeError::Browser(e.to_string()))?;

    let browser = Browser::new(launch).map_err(|e| ScrapeError::Browser(e.to_string()))?;
    let tab = browser
        .new_tab()
        .map_err(|e| ScrapeError::Browser(e.to_string()))?;
    tab.set_default_timeout(options.timeout);

    info!("Navigating");
    tab.navigate_to(url)
        .and_then(|t| t.wait_until_navigated())
        .map_err(|e| ScrapeError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let page = ChromePage { tab: &tab };
    let rendered = settle_page(&page, &options.scroll, &budget, hooks)?;
    info!(
        steps = rendered.scroll.steps,
        height = rendered.scroll.final_height,
        "Page stabilised; closing browser"
    );
    Ok(rendered)
}

/// A navigated Chrome tab.
struct ChromePage<'a> {
    tab: &'a Tab,
}

impl ChromePage<'_> {
    fn eval_number(&self, expression: &str) -> Result<f64, ScrapeError> {
        let object = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        object
            .value
            .as_ref()
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ScrapeError::Browser(format!("`{expression}` did not return a number")))
    }
}

impl ScrollPage for ChromePage<'_> {
    fn scroll_height(&self) -> Result<u64, ScrapeError> {
        Ok(self.eval_number("document.body.scrollHeight")?.max(0.0) as u64)
    }

    fn scroll_by(&self, px: u64) -> Result<(), ScrapeError> {
        self.tab
            .evaluate(&format!("window.scrollBy(0, {px})"), false)
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        Ok(())
    }
}

impl LivePage for ChromePage<'_> {
    fn screenshot_png(&self) -> Result<Vec<u8>, ScrapeError> {
        let width = self.eval_number("document.documentElement.scrollWidth")?;
        let height = self.eval_number("document.documentElement.scrollHeight")?;
        let clip = Viewport {
            x: 0.0,
            y: 0.0,
            width,
            height,
            scale: 1.0,
        };
        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, Some(clip), true)
            .map_err(|e| ScrapeError::Browser(e.to_string()))
    }

    fn content(&self) -> Result<String, ScrapeError> {
        self.tab
            .get_content()
            .map_err(|e| ScrapeError::Browser(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Page whose height follows a script: one entry per tick, last one repeats.
    struct MockPage {
        heights: Vec<u64>,
        reads: Cell<usize>,
        scrolled: Cell<u64>,
        html: String,
        screenshots: RefCell<u32>,
        fail_screenshot: bool,
    }

    impl MockPage {
        fn fixed(height: u64) -> Self {
            Self::growing(vec![height])
        }

        fn growing(heights: Vec<u64>) -> Self {
            MockPage {
                heights,
                reads: Cell::new(0),
                scrolled: Cell::new(0),
                html: "<html><body>done</body></html>".to_string(),
                screenshots: RefCell::new(0),
                fail_screenshot: false,
            }
        }
    }

    impl ScrollPage for MockPage {
        fn scroll_height(&self) -> Result<u64, ScrapeError> {
            let i = self.reads.get();
            self.reads.set(i + 1);
            Ok(self.heights[i.min(self.heights.len() - 1)])
        }

        fn scroll_by(&self, px: u64) -> Result<(), ScrapeError> {
            self.scrolled.set(self.scrolled.get() + px);
            Ok(())
        }
    }

    impl LivePage for MockPage {
        fn screenshot_png(&self) -> Result<Vec<u8>, ScrapeError> {
            *self.screenshots.borrow_mut() += 1;
            if self.fail_screenshot {
                Err(ScrapeError::Browser("capture failed".to_string()))
            } else {
                Ok(vec![0x89, b'P', b'N', b'G'])
            }
        }

        fn content(&self) -> Result<String, ScrapeError> {
            Ok(self.html.clone())
        }
    }

    fn options(step_px: u64, max_steps: u32) -> ScrollOptions {
        ScrollOptions {
            step_px,
            interval: Duration::ZERO,
            max_steps,
        }
    }

    fn budget() -> Budget {
        Budget::start(Duration::from_secs(60))
    }

    #[test]
    fn test_fixed_height_takes_ceil_steps() {
        for (height, step, expected) in [(1000, 200, 5), (1001, 200, 6), (199, 200, 1), (4000, 300, 14)] {
            let page = MockPage::fixed(height);
            let outcome = scroll_until_stable(&page, &options(step, 10_000), &budget()).unwrap();
            assert_eq!(outcome.steps, expected, "H={height} S={step}");
            assert!(!outcome.capped);
            assert_eq!(page.scrolled.get(), expected as u64 * step);
        }
    }

    #[test]
    fn test_no_overflow_terminates_after_one_step() {
        let page = MockPage::fixed(0);
        let outcome = scroll_until_stable(&page, &options(200, 10), &budget()).unwrap();
        assert_eq!(outcome.steps, 1);
    }

    #[test]
    fn test_growing_page_extends_pass() {
        // Lazy content appends 400px after the second tick.
        let page = MockPage::growing(vec![600, 600, 1000]);
        let outcome = scroll_until_stable(&page, &options(200, 100), &budget()).unwrap();
        assert_eq!(outcome.steps, 5);
        assert_eq!(outcome.final_height, 1000);
    }

    #[test]
    fn test_infinite_page_is_capped() {
        let page = MockPage::fixed(u64::MAX);
        let outcome = scroll_until_stable(&page, &options(200, 25), &budget()).unwrap();
        assert_eq!(outcome.steps, 25);
        assert!(outcome.capped);
    }

    #[test]
    fn test_expired_budget_is_timeout() {
        let page = MockPage::fixed(1000);
        let err = scroll_until_stable(&page, &options(200, 100), &Budget::start(Duration::ZERO))
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Timeout { .. }));
        assert_eq!(page.scrolled.get(), 0);
    }

    #[test]
    fn test_settle_runs_hooks_and_returns_html() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shots/screen.png");
        let hooks: Vec<Box<dyn RenderHook + Send>> = vec![Box::new(ScreenshotHook { path: path.clone() })];

        let page = MockPage::fixed(400);
        let rendered = settle_page(&page, &options(200, 10), &budget(), &hooks).unwrap();

        assert_eq!(rendered.html, "<html><body>done</body></html>");
        assert_eq!(rendered.scroll.steps, 2);
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_failing_hook_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let hooks: Vec<Box<dyn RenderHook + Send>> = vec![Box::new(ScreenshotHook {
            path: dir.path().join("screen.png"),
        })];

        let mut page = MockPage::fixed(200);
        page.fail_screenshot = true;
        let rendered = settle_page(&page, &options(200, 10), &budget(), &hooks).unwrap();

        assert_eq!(*page.screenshots.borrow(), 1);
        assert!(rendered.html.contains("done"));
        assert!(!dir.path().join("screen.png").exists());
    }

    #[test]
    fn test_scroll_options_guard_zero_values() {
        let opts = ScrollOptions::from(&ScrollConfig {
            step_px: 0,
            interval_ms: 100,
            max_steps: 0,
        });
        assert_eq!(opts.step_px, 1);
        assert_eq!(opts.max_steps, 1);
        assert_eq!(opts.interval, Duration::from_millis(100));
    }
}
