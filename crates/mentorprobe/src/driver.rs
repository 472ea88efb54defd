//! PageDriver - the browser seam.
//!
//! Everything above this trait (resolver, readiness detector, page facade,
//! scenarios) talks to the browser only through [`PageDriver`]. The
//! `chromium` module implements it over CDP; the `fake` module implements it
//! in memory for tests.
//!
//! Driver calls are instantaneous probes: they report the state of the page
//! *now* and never wait. All waiting and timeout policy lives above the seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::Viewport;
use crate::locator::Strategy;
use crate::result::{DriverError, DriverResult};

/// `document.readyState` of the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentState {
    /// Document still loading
    Loading,
    /// DOM parsed, subresources may be pending
    Interactive,
    /// Load event fired
    Complete,
}

impl DocumentState {
    /// Parse a `document.readyState` string
    ///
    /// # Errors
    ///
    /// Returns an evaluation error for unknown states
    pub fn parse(state: &str) -> DriverResult<Self> {
        match state {
            "loading" => Ok(Self::Loading),
            "interactive" => Ok(Self::Interactive),
            "complete" => Ok(Self::Complete),
            other => Err(DriverError::evaluation(format!(
                "unknown document.readyState {other:?}"
            ))),
        }
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Loading => "loading",
            Self::Interactive => "interactive",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Layout measurements used by responsive checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayoutMetrics {
    /// `window.innerWidth`
    pub viewport_width: u32,
    /// `window.innerHeight`
    pub viewport_height: u32,
    /// `document.documentElement.scrollWidth`
    pub scroll_width: u32,
}

impl LayoutMetrics {
    /// Whether content overflows the viewport horizontally
    #[must_use]
    pub const fn has_horizontal_overflow(&self) -> bool {
        self.scroll_width > self.viewport_width
    }
}

/// Abstract driver trait for browser automation
///
/// # Implementations
///
/// - `ChromiumDriver` - uses chromiumoxide (feature `browser`)
/// - `FakeDriver` - scripted in-memory page for tests
#[async_trait]
pub trait PageDriver: Send + Sync + fmt::Debug {
    /// Navigate to an absolute URL
    async fn goto(&self, url: &str) -> DriverResult<()>;

    /// Current page URL
    async fn current_url(&self) -> DriverResult<String>;

    /// Current document title
    async fn title(&self) -> DriverResult<String>;

    /// Current `document.readyState`
    async fn document_state(&self) -> DriverResult<DocumentState>;

    /// Number of resource timing entries recorded so far
    async fn resource_count(&self) -> DriverResult<usize>;

    /// Whether the first match of `strategy` is rendered and visible
    async fn is_visible(&self, strategy: &Strategy) -> DriverResult<bool>;

    /// Number of elements matching `strategy`
    async fn count(&self, strategy: &Strategy) -> DriverResult<usize>;

    /// Text content of the first match, `None` when the node has no text
    async fn text_content(&self, strategy: &Strategy) -> DriverResult<Option<String>>;

    /// Text content of every match, in document order
    async fn all_text_contents(&self, strategy: &Strategy) -> DriverResult<Vec<String>>;

    /// Current `value` of the first matching form control
    async fn input_value(&self, strategy: &Strategy) -> DriverResult<String>;

    /// Attribute of the first match
    async fn attribute(&self, strategy: &Strategy, name: &str) -> DriverResult<Option<String>>;

    /// Click the first match
    async fn click(&self, strategy: &Strategy) -> DriverResult<()>;

    /// Replace the value of the first matching form control
    async fn fill(&self, strategy: &Strategy, text: &str) -> DriverResult<()>;

    /// Press a key (e.g. "Enter") with focus on the first match
    async fn press(&self, strategy: &Strategy, key: &str) -> DriverResult<()>;

    /// Select an option by value or label in the first matching `<select>`
    async fn select_option(&self, strategy: &Strategy, option: &str) -> DriverResult<()>;

    /// Visible text of the document body
    async fn body_text(&self) -> DriverResult<String>;

    /// Resize the viewport
    async fn set_viewport(&self, viewport: Viewport) -> DriverResult<()>;

    /// Layout measurements of the current page
    async fn layout_metrics(&self) -> DriverResult<LayoutMetrics>;

    /// PNG screenshot of the current viewport
    async fn screenshot(&self) -> DriverResult<Vec<u8>>;

    /// Close the page
    async fn close(&self) -> DriverResult<()>;
}

/// Opens one isolated page per scenario
#[async_trait]
pub trait PageLauncher: Send + Sync + fmt::Debug {
    /// Engine name for reports
    fn engine(&self) -> &str;

    /// Open a fresh page sized to `viewport`
    async fn new_page(&self, viewport: Viewport) -> DriverResult<Arc<dyn PageDriver>>;

    /// Shut the browser down
    async fn shutdown(&self) -> DriverResult<()>;
}
