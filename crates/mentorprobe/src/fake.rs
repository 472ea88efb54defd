//! Scripted in-memory page for tests.
//!
//! [`FakeDriver`] implements [`PageDriver`] without a browser. Element
//! visibility, document state and resource counts are scheduled against a
//! shared [`FakeClock`], so waits that would take seconds in a real browser
//! resolve instantly and deterministically. Every driver call is recorded in
//! a call history for verification.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::clock::FakeClock;
use crate::config::Viewport;
use crate::driver::{DocumentState, LayoutMetrics, PageDriver, PageLauncher};
use crate::locator::Strategy;
use crate::result::{DriverError, DriverResult};

/// Smallest valid PNG signature, returned by default screenshots
pub const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Driver methods that change page state
pub const MUTATING_CALLS: &[&str] = &[
    "goto",
    "click",
    "fill",
    "press",
    "select_option",
    "set_viewport",
    "close",
];

/// One scripted element (or group of matching elements)
#[derive(Debug, Clone)]
pub struct FakeElement {
    texts: Vec<String>,
    matches: usize,
    appears_at_ms: u64,
    hides_at_ms: Option<u64>,
    count_samples: VecDeque<usize>,
    value: String,
    max_length: Option<usize>,
    attributes: HashMap<String, String>,
    navigates_to: Option<String>,
    options: Vec<String>,
}

impl Default for FakeElement {
    fn default() -> Self {
        Self {
            texts: Vec::new(),
            matches: 1,
            appears_at_ms: 0,
            hides_at_ms: None,
            count_samples: VecDeque::new(),
            value: String::new(),
            max_length: None,
            attributes: HashMap::new(),
            navigates_to: None,
            options: Vec::new(),
        }
    }
}

impl FakeElement {
    /// A single visible element
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text of a single match
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.texts = vec![text.into()];
        self
    }

    /// One match per text, in document order
    #[must_use]
    pub fn with_texts<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.texts = texts.into_iter().map(Into::into).collect();
        self.matches = self.texts.len();
        self
    }

    /// Number of matching elements
    #[must_use]
    pub fn with_matches(mut self, matches: usize) -> Self {
        self.matches = matches;
        self
    }

    /// Absent from the DOM until virtual time `ms`
    #[must_use]
    pub fn appearing_at(mut self, ms: u64) -> Self {
        self.appears_at_ms = ms;
        self
    }

    /// Hidden from virtual time `ms` on
    #[must_use]
    pub fn hiding_at(mut self, ms: u64) -> Self {
        self.hides_at_ms = Some(ms);
        self
    }

    /// Successive results of `count`; the last one sticks
    #[must_use]
    pub fn with_count_samples(mut self, samples: impl IntoIterator<Item = usize>) -> Self {
        self.count_samples = samples.into_iter().collect();
        self
    }

    /// `maxlength` of a form control; `fill` truncates to it
    #[must_use]
    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Clicking navigates to `url`
    #[must_use]
    pub fn navigating_to(mut self, url: impl Into<String>) -> Self {
        self.navigates_to = Some(url.into());
        self
    }

    /// Options of a `<select>`
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    fn present(&self, now_ms: u64) -> bool {
        self.matches > 0 && now_ms >= self.appears_at_ms
    }

    fn visible(&self, now_ms: u64) -> bool {
        self.present(now_ms) && self.hides_at_ms.map_or(true, |hide| now_ms < hide)
    }
}

/// Title and body overrides for URLs ending with a path
#[derive(Debug, Clone, Default)]
pub struct FakeRoute {
    /// Title after navigating here
    pub title: Option<String>,
    /// Body text after navigating here
    pub body_text: Option<String>,
}

#[derive(Debug)]
struct FakeState {
    url: String,
    title: String,
    body_text: String,
    routes: Vec<(String, FakeRoute)>,
    elements: HashMap<Strategy, FakeElement>,
    loaded_at_ms: u64,
    document_schedule: Vec<(u64, DocumentState)>,
    resource_schedule: Vec<(u64, usize)>,
    goto_error: Option<DriverError>,
    screenshot_error: Option<DriverError>,
    injected: HashMap<String, DriverError>,
    layout: LayoutMetrics,
    content_min_width: u32,
    history: Vec<String>,
    closed: bool,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            title: String::new(),
            body_text: String::new(),
            routes: Vec::new(),
            elements: HashMap::new(),
            loaded_at_ms: 0,
            document_schedule: vec![(0, DocumentState::Complete)],
            resource_schedule: vec![(0, 0)],
            goto_error: None,
            screenshot_error: None,
            injected: HashMap::new(),
            layout: LayoutMetrics {
                viewport_width: 1920,
                viewport_height: 1080,
                scroll_width: 1920,
            },
            content_min_width: 0,
            history: Vec::new(),
            closed: false,
        }
    }
}

impl FakeState {
    fn load(&mut self, url: &str, now_ms: u64) {
        self.url = url.to_string();
        self.loaded_at_ms = now_ms;
        let route = self
            .routes
            .iter()
            .filter(|(suffix, _)| url.ends_with(suffix.as_str()))
            .max_by_key(|(suffix, _)| suffix.len())
            .map(|(_, route)| route.clone());
        if let Some(route) = route {
            if let Some(title) = route.title {
                self.title = title;
            }
            if let Some(body) = route.body_text {
                self.body_text = body;
            }
        }
    }

    fn scheduled<T: Copy>(schedule: &[(u64, T)], since_load: u64, fallback: T) -> T {
        schedule
            .iter()
            .rev()
            .find(|(offset, _)| *offset <= since_load)
            .map_or(fallback, |(_, value)| *value)
    }

    fn element(&self, strategy: &Strategy, now_ms: u64) -> DriverResult<&FakeElement> {
        self.elements
            .get(strategy)
            .filter(|el| el.present(now_ms))
            .ok_or_else(|| DriverError::NoMatch {
                strategy: strategy.to_string(),
            })
    }

    fn element_mut(&mut self, strategy: &Strategy, now_ms: u64) -> DriverResult<&mut FakeElement> {
        self.elements
            .get_mut(strategy)
            .filter(|el| el.present(now_ms))
            .ok_or_else(|| DriverError::NoMatch {
                strategy: strategy.to_string(),
            })
    }
}

/// In-memory [`PageDriver`]
#[derive(Debug)]
pub struct FakeDriver {
    clock: Arc<FakeClock>,
    state: Mutex<FakeState>,
}

impl FakeDriver {
    /// Create an empty page on `clock`
    #[must_use]
    pub fn new(clock: Arc<FakeClock>) -> Self {
        Self {
            clock,
            state: Mutex::new(FakeState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: String) {
        self.state().history.push(call);
    }

    fn injected(&self, method: &str) -> DriverResult<()> {
        match self.state().injected.get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Shared clock
    #[must_use]
    pub fn clock(&self) -> &Arc<FakeClock> {
        &self.clock
    }

    /// Set the current title
    pub fn set_title(&self, title: impl Into<String>) {
        self.state().title = title.into();
    }

    /// Set the current body text
    pub fn set_body_text(&self, text: impl Into<String>) {
        self.state().body_text = text.into();
    }

    /// Override title and body for URLs ending with `suffix`
    pub fn set_route(&self, suffix: impl Into<String>, route: FakeRoute) {
        self.state().routes.push((suffix.into(), route));
    }

    /// Add or replace an element
    pub fn add_element(&self, strategy: Strategy, element: FakeElement) {
        let _ = self.state().elements.insert(strategy, element);
    }

    /// `document.readyState` over time, as offsets from the last `goto`
    pub fn set_document_schedule(&self, schedule: Vec<(u64, DocumentState)>) {
        self.state().document_schedule = schedule;
    }

    /// Resource entry counts over time, as offsets from the last `goto`
    pub fn set_resource_schedule(&self, schedule: Vec<(u64, usize)>) {
        self.state().resource_schedule = schedule;
    }

    /// Make the next and all later `goto` calls fail
    pub fn fail_navigation(&self, error: DriverError) {
        self.state().goto_error = Some(error);
    }

    /// Make `screenshot` fail
    pub fn fail_screenshot(&self, error: DriverError) {
        self.state().screenshot_error = Some(error);
    }

    /// Make every call of an element action (`click`, `fill`, `press`, ...) fail
    pub fn fail_on(&self, method: impl Into<String>, error: DriverError) {
        let _ = self.state().injected.insert(method.into(), error);
    }

    /// Minimum content width; narrower viewports overflow horizontally
    pub fn set_content_min_width(&self, width: u32) {
        let mut state = self.state();
        state.content_min_width = width;
        state.layout.scroll_width = state.layout.viewport_width.max(width);
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state().history.iter().any(|c| c.starts_with(method))
    }

    /// Recorded calls that change page state
    #[must_use]
    pub fn mutations(&self) -> Vec<String> {
        self.state()
            .history
            .iter()
            .filter(|call| {
                let method = call.split(':').next().unwrap_or_default();
                MUTATING_CALLS.contains(&method)
            })
            .cloned()
            .collect()
    }

    /// Number of recorded calls
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.state().history.len()
    }

    /// Forget recorded calls
    pub fn clear_history(&self) {
        self.state().history.clear();
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn goto(&self, url: &str) -> DriverResult<()> {
        self.record(format!("goto:{url}"));
        let now = self.clock.now_ms();
        let mut state = self.state();
        if let Some(err) = state.goto_error.clone() {
            return Err(err);
        }
        state.load(url, now);
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.record("current_url".to_string());
        Ok(self.state().url.clone())
    }

    async fn title(&self) -> DriverResult<String> {
        self.record("title".to_string());
        Ok(self.state().title.clone())
    }

    async fn document_state(&self) -> DriverResult<DocumentState> {
        self.record("document_state".to_string());
        let now = self.clock.now_ms();
        let state = self.state();
        let since = now.saturating_sub(state.loaded_at_ms);
        Ok(FakeState::scheduled(
            &state.document_schedule,
            since,
            DocumentState::Loading,
        ))
    }

    async fn resource_count(&self) -> DriverResult<usize> {
        self.record("resource_count".to_string());
        let now = self.clock.now_ms();
        let state = self.state();
        let since = now.saturating_sub(state.loaded_at_ms);
        Ok(FakeState::scheduled(&state.resource_schedule, since, 0))
    }

    async fn is_visible(&self, strategy: &Strategy) -> DriverResult<bool> {
        self.record(format!("is_visible:{strategy}"));
        let now = self.clock.now_ms();
        let state = self.state();
        Ok(state
            .elements
            .get(strategy)
            .is_some_and(|el| el.visible(now)))
    }

    async fn count(&self, strategy: &Strategy) -> DriverResult<usize> {
        self.record(format!("count:{strategy}"));
        let now = self.clock.now_ms();
        let mut state = self.state();
        let Some(el) = state.elements.get_mut(strategy) else {
            return Ok(0);
        };
        if !el.present(now) {
            return Ok(0);
        }
        let sample = if el.count_samples.len() > 1 {
            el.count_samples.pop_front()
        } else {
            el.count_samples.front().copied()
        };
        Ok(sample.unwrap_or(el.matches))
    }

    async fn text_content(&self, strategy: &Strategy) -> DriverResult<Option<String>> {
        self.record(format!("text_content:{strategy}"));
        self.injected("text_content")?;
        let now = self.clock.now_ms();
        let state = self.state();
        let el = state.element(strategy, now)?;
        Ok(el.texts.first().cloned())
    }

    async fn all_text_contents(&self, strategy: &Strategy) -> DriverResult<Vec<String>> {
        self.record(format!("all_text_contents:{strategy}"));
        self.injected("all_text_contents")?;
        let now = self.clock.now_ms();
        let state = self.state();
        Ok(state
            .elements
            .get(strategy)
            .filter(|el| el.present(now))
            .map(|el| el.texts.clone())
            .unwrap_or_default())
    }

    async fn input_value(&self, strategy: &Strategy) -> DriverResult<String> {
        self.record(format!("input_value:{strategy}"));
        self.injected("input_value")?;
        let now = self.clock.now_ms();
        let state = self.state();
        Ok(state.element(strategy, now)?.value.clone())
    }

    async fn attribute(&self, strategy: &Strategy, name: &str) -> DriverResult<Option<String>> {
        self.record(format!("attribute:{strategy}:{name}"));
        self.injected("attribute")?;
        let now = self.clock.now_ms();
        let state = self.state();
        Ok(state.element(strategy, now)?.attributes.get(name).cloned())
    }

    async fn click(&self, strategy: &Strategy) -> DriverResult<()> {
        self.record(format!("click:{strategy}"));
        self.injected("click")?;
        let now = self.clock.now_ms();
        let mut state = self.state();
        let el = state.element(strategy, now)?;
        if !el.visible(now) {
            return Err(DriverError::page(format!("{strategy} is not visible")));
        }
        if let Some(url) = el.navigates_to.clone() {
            state.load(&url, now);
        }
        Ok(())
    }

    async fn fill(&self, strategy: &Strategy, text: &str) -> DriverResult<()> {
        self.record(format!("fill:{strategy}:{text}"));
        self.injected("fill")?;
        let now = self.clock.now_ms();
        let mut state = self.state();
        let el = state.element_mut(strategy, now)?;
        el.value = match el.max_length {
            Some(max) => text.chars().take(max).collect(),
            None => text.to_string(),
        };
        Ok(())
    }

    async fn press(&self, strategy: &Strategy, key: &str) -> DriverResult<()> {
        self.record(format!("press:{strategy}:{key}"));
        self.injected("press")?;
        let now = self.clock.now_ms();
        let _ = self.state().element(strategy, now)?;
        Ok(())
    }

    async fn select_option(&self, strategy: &Strategy, option: &str) -> DriverResult<()> {
        self.record(format!("select_option:{strategy}:{option}"));
        self.injected("select_option")?;
        let now = self.clock.now_ms();
        let mut state = self.state();
        let el = state.element_mut(strategy, now)?;
        if !el.options.is_empty() && !el.options.iter().any(|o| o == option) {
            return Err(DriverError::NoSuchOption {
                strategy: strategy.to_string(),
                option: option.to_string(),
            });
        }
        el.value = option.to_string();
        Ok(())
    }

    async fn body_text(&self) -> DriverResult<String> {
        self.record("body_text".to_string());
        Ok(self.state().body_text.clone())
    }

    async fn set_viewport(&self, viewport: Viewport) -> DriverResult<()> {
        self.record(format!("set_viewport:{viewport}"));
        let mut state = self.state();
        state.layout.viewport_width = viewport.width;
        state.layout.viewport_height = viewport.height;
        state.layout.scroll_width = viewport.width.max(state.content_min_width);
        Ok(())
    }

    async fn layout_metrics(&self) -> DriverResult<LayoutMetrics> {
        self.record("layout_metrics".to_string());
        Ok(self.state().layout)
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        self.record("screenshot".to_string());
        match self.state().screenshot_error.clone() {
            Some(err) => Err(err),
            None => Ok(FAKE_PNG.to_vec()),
        }
    }

    async fn close(&self) -> DriverResult<()> {
        self.record("close".to_string());
        self.state().closed = true;
        Ok(())
    }
}

type PageFactory = dyn Fn(Arc<FakeClock>) -> FakeDriver + Send + Sync;

/// Launcher handing out fresh [`FakeDriver`] pages built by a factory
pub struct FakeLauncher {
    clock: Arc<FakeClock>,
    factory: Box<PageFactory>,
    pages: Mutex<Vec<Arc<FakeDriver>>>,
    fail_launch: Option<DriverError>,
}

impl std::fmt::Debug for FakeLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeLauncher")
            .field("clock", &self.clock)
            .field("pages", &self.pages_opened())
            .finish_non_exhaustive()
    }
}

impl FakeLauncher {
    /// Create a launcher whose pages are built by `factory`
    pub fn new<F>(clock: Arc<FakeClock>, factory: F) -> Self
    where
        F: Fn(Arc<FakeClock>) -> FakeDriver + Send + Sync + 'static,
    {
        Self {
            clock,
            factory: Box::new(factory),
            pages: Mutex::new(Vec::new()),
            fail_launch: None,
        }
    }

    /// Make every `new_page` call fail
    #[must_use]
    pub fn failing(mut self, error: DriverError) -> Self {
        self.fail_launch = Some(error);
        self
    }

    /// Number of pages opened so far
    #[must_use]
    pub fn pages_opened(&self) -> usize {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Pages opened so far, oldest first
    #[must_use]
    pub fn pages(&self) -> Vec<Arc<FakeDriver>> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PageLauncher for FakeLauncher {
    fn engine(&self) -> &str {
        "fake"
    }

    async fn new_page(&self, viewport: Viewport) -> DriverResult<Arc<dyn PageDriver>> {
        if let Some(err) = self.fail_launch.clone() {
            return Err(err);
        }
        let page = Arc::new((self.factory)(Arc::clone(&self.clock)));
        page.set_viewport(viewport).await?;
        page.clear_history();
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&page));
        let page: Arc<dyn PageDriver> = page;
        Ok(page)
    }

    async fn shutdown(&self) -> DriverResult<()> {
        Ok(())
    }
}
