//! Chromium driver over CDP.
//!
//! Element strategies are compiled to JavaScript queries (see
//! [`Strategy::to_query`]) and evaluated in the page, so every locator kind
//! behaves the same here as in the in-memory fake.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{BrowserEngine, SuiteConfig, Viewport};
use crate::driver::{DocumentState, LayoutMetrics, PageDriver, PageLauncher};
use crate::locator::Strategy;
use crate::result::{DriverError, DriverResult};

/// Environment variable naming a Chromium executable
pub const CHROMIUM_PATH_ENV: &str = "CHROMIUM_PATH";

/// Browser launch options
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a window
    pub headless: bool,
    /// Keep the Chromium sandbox (disable in containers)
    pub sandbox: bool,
    /// Explicit executable
    pub chromium_path: Option<PathBuf>,
    /// Initial window size
    pub window: Viewport,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
            window: Viewport::new(1920, 1080),
        }
    }
}

impl LaunchOptions {
    /// Options for a suite configuration; sandbox is disabled on CI
    #[must_use]
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self {
            headless: true,
            sandbox: !SuiteConfig::on_ci_with(|key| std::env::var(key).ok()),
            chromium_path: std::env::var_os(CHROMIUM_PATH_ENV).map(PathBuf::from),
            window: config.viewports.desktop,
        }
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}

/// Launches Chromium and hands out one page per scenario
#[derive(Debug)]
pub struct ChromiumLauncher {
    browser: Mutex<CdpBrowser>,
    handler: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl ChromiumLauncher {
    /// Launch a browser
    ///
    /// # Errors
    ///
    /// - `BrowserNotFound` when no executable can be located
    /// - `Launch` for any other startup failure, or a non-Chromium engine
    pub async fn launch(engine: BrowserEngine, options: LaunchOptions) -> DriverResult<Self> {
        if engine != BrowserEngine::Chromium {
            return Err(DriverError::Launch {
                message: format!("engine {} is not supported; only chromium is", engine.as_str()),
            });
        }

        let mut builder = CdpConfig::builder().window_size(options.window.width, options.window.height);
        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        let explicit_path = options.chromium_path.is_some();
        if let Some(ref path) = options.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(|message| {
            if explicit_path {
                DriverError::Launch { message }
            } else {
                DriverError::BrowserNotFound
            }
        })?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(|e| DriverError::Launch {
                message: e.to_string(),
            })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        info!(headless = options.headless, "chromium launched");

        Ok(Self {
            browser: Mutex::new(browser),
            handler: Mutex::new(Some(handle)),
        })
    }
}

#[async_trait]
impl PageLauncher for ChromiumLauncher {
    fn engine(&self) -> &str {
        BrowserEngine::Chromium.as_str()
    }

    async fn new_page(&self, viewport: Viewport) -> DriverResult<Arc<dyn PageDriver>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::page(e.to_string()))?;
        let driver = ChromiumDriver::new(page);
        driver.set_viewport(viewport).await?;
        let driver: Arc<dyn PageDriver> = Arc::new(driver);
        Ok(driver)
    }

    async fn shutdown(&self) -> DriverResult<()> {
        let mut browser = self.browser.lock().await;
        let closed = browser.close().await.map(|_| ());
        if let Err(ref e) = closed {
            warn!(error = %e, "browser close failed");
        }
        if let Some(handle) = self.handler.lock().await.take() {
            handle.abort();
        }
        closed.map_err(|e| DriverError::Launch {
            message: e.to_string(),
        })
    }
}

/// A single Chromium tab
#[derive(Debug)]
pub struct ChromiumDriver {
    page: Mutex<Option<CdpPage>>,
}

impl ChromiumDriver {
    /// Wrap a CDP page
    #[must_use]
    pub fn new(page: CdpPage) -> Self {
        Self {
            page: Mutex::new(Some(page)),
        }
    }

    async fn handle(&self) -> DriverResult<CdpPage> {
        self.page
            .lock()
            .await
            .clone()
            .ok_or_else(|| DriverError::page("page is closed"))
    }

    /// Evaluate `expr` and decode its JSON value
    async fn eval<T: DeserializeOwned>(&self, expr: &str) -> DriverResult<T> {
        let page = self.handle().await?;
        let wrapped = format!("JSON.stringify(({expr}))");
        let result = page
            .evaluate(wrapped.as_str())
            .await
            .map_err(|e| DriverError::evaluation(e.to_string()))?;
        let json: String = result
            .into_value()
            .map_err(|e| DriverError::evaluation(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| DriverError::evaluation(e.to_string()))
    }

    /// Run `body` with `el` bound to the first match; `false` means no match
    async fn with_element(&self, strategy: &Strategy, body: &str) -> DriverResult<()> {
        let expr = format!(
            "(() => {{ const el = {}; if (!el) return false; {body}; return true; }})()",
            strategy.to_query()
        );
        if self.eval::<bool>(&expr).await? {
            Ok(())
        } else {
            Err(DriverError::NoMatch {
                strategy: strategy.to_string(),
            })
        }
    }

    async fn dispatch_key(&self, kind: DispatchKeyEventType, key: &str) -> DriverResult<()> {
        let page = self.handle().await?;
        let key_down = matches!(kind, DispatchKeyEventType::KeyDown);
        let mut builder = DispatchKeyEventParams::builder().r#type(kind).key(key).code(key);
        if key == "Enter" {
            builder = builder.windows_virtual_key_code(13).native_virtual_key_code(13);
            if key_down {
                builder = builder.text("\r");
            }
        }
        let params = builder.build().map_err(DriverError::page)?;
        page.execute(params)
            .await
            .map_err(|e| DriverError::page(e.to_string()))?;
        Ok(())
    }
}

const VISIBLE: &str = "(el => { if (!el) return false; \
     const s = getComputedStyle(el); const r = el.getBoundingClientRect(); \
     return s.visibility !== 'hidden' && s.display !== 'none' && r.width > 0 && r.height > 0; })";

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str) -> DriverResult<()> {
        let page = self.handle().await?;
        page.goto(url)
            .await
            .map_err(|e| DriverError::page(e.to_string()))?;
        debug!(url, "navigated");
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.eval("location.href").await
    }

    async fn title(&self) -> DriverResult<String> {
        self.eval("document.title").await
    }

    async fn document_state(&self) -> DriverResult<DocumentState> {
        let state: String = self.eval("document.readyState").await?;
        DocumentState::parse(&state)
    }

    async fn resource_count(&self) -> DriverResult<usize> {
        self.eval("performance.getEntriesByType('resource').length").await
    }

    async fn is_visible(&self, strategy: &Strategy) -> DriverResult<bool> {
        self.eval(&format!("{VISIBLE}({})", strategy.to_query())).await
    }

    async fn count(&self, strategy: &Strategy) -> DriverResult<usize> {
        self.eval(&strategy.to_count_query()).await
    }

    async fn text_content(&self, strategy: &Strategy) -> DriverResult<Option<String>> {
        let expr = format!(
            "(() => {{ const el = {}; return el ? [el.textContent] : null; }})()",
            strategy.to_query()
        );
        let text: Option<[Option<String>; 1]> = self.eval(&expr).await?;
        match text {
            Some([text]) => Ok(text),
            None => Err(DriverError::NoMatch {
                strategy: strategy.to_string(),
            }),
        }
    }

    async fn all_text_contents(&self, strategy: &Strategy) -> DriverResult<Vec<String>> {
        self.eval(&format!(
            "{}.map(el => el.textContent || '')",
            strategy.to_all_query()
        ))
        .await
    }

    async fn input_value(&self, strategy: &Strategy) -> DriverResult<String> {
        let expr = format!(
            "(() => {{ const el = {}; return el ? String(el.value ?? '') : null; }})()",
            strategy.to_query()
        );
        let value: Option<String> = self.eval(&expr).await?;
        value.ok_or_else(|| DriverError::NoMatch {
            strategy: strategy.to_string(),
        })
    }

    async fn attribute(&self, strategy: &Strategy, name: &str) -> DriverResult<Option<String>> {
        let name = serde_json::to_string(name).map_err(|e| DriverError::evaluation(e.to_string()))?;
        let expr = format!(
            "(() => {{ const el = {}; return el ? [el.getAttribute({name})] : null; }})()",
            strategy.to_query()
        );
        let value: Option<[Option<String>; 1]> = self.eval(&expr).await?;
        match value {
            Some([attr]) => Ok(attr),
            None => Err(DriverError::NoMatch {
                strategy: strategy.to_string(),
            }),
        }
    }

    async fn click(&self, strategy: &Strategy) -> DriverResult<()> {
        self.with_element(strategy, "el.scrollIntoView({block: 'center'}); el.click()")
            .await
    }

    async fn fill(&self, strategy: &Strategy, text: &str) -> DriverResult<()> {
        let text = serde_json::to_string(text).map_err(|e| DriverError::evaluation(e.to_string()))?;
        let body = format!(
            "el.focus(); \
             const proto = Object.getPrototypeOf(el); \
             const setter = Object.getOwnPropertyDescriptor(proto, 'value'); \
             if (setter && setter.set) {{ setter.set.call(el, {text}); }} else {{ el.value = {text}; }} \
             el.dispatchEvent(new Event('input', {{bubbles: true}})); \
             el.dispatchEvent(new Event('change', {{bubbles: true}}))"
        );
        self.with_element(strategy, &body).await
    }

    async fn press(&self, strategy: &Strategy, key: &str) -> DriverResult<()> {
        self.with_element(strategy, "el.focus()").await?;
        self.dispatch_key(DispatchKeyEventType::KeyDown, key).await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, key).await
    }

    async fn select_option(&self, strategy: &Strategy, option: &str) -> DriverResult<()> {
        let literal =
            serde_json::to_string(option).map_err(|e| DriverError::evaluation(e.to_string()))?;
        let expr = format!(
            "(() => {{ const el = {}; if (!el || !el.options) return 'no-select'; \
             const opt = Array.from(el.options).find(o => o.value === {literal} || o.label.trim() === {literal}); \
             if (!opt) return 'no-option'; \
             el.value = opt.value; \
             el.dispatchEvent(new Event('input', {{bubbles: true}})); \
             el.dispatchEvent(new Event('change', {{bubbles: true}})); \
             return 'ok'; }})()",
            strategy.to_query()
        );
        match self.eval::<String>(&expr).await?.as_str() {
            "ok" => Ok(()),
            "no-option" => Err(DriverError::NoSuchOption {
                strategy: strategy.to_string(),
                option: option.to_string(),
            }),
            _ => Err(DriverError::NoMatch {
                strategy: strategy.to_string(),
            }),
        }
    }

    async fn body_text(&self) -> DriverResult<String> {
        self.eval("document.body ? document.body.innerText : ''").await
    }

    async fn set_viewport(&self, viewport: Viewport) -> DriverResult<()> {
        let page = self.handle().await?;
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(viewport.width),
            i64::from(viewport.height),
            1.0,
            viewport.mobile,
        );
        page.execute(params)
            .await
            .map_err(|e| DriverError::page(e.to_string()))?;
        debug!(viewport = %viewport, "viewport set");
        Ok(())
    }

    async fn layout_metrics(&self) -> DriverResult<LayoutMetrics> {
        self.eval(
            "({viewport_width: window.innerWidth, viewport_height: window.innerHeight, \
              scroll_width: document.documentElement.scrollWidth})",
        )
        .await
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        let page = self.handle().await?;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let screenshot = page
            .execute(params)
            .await
            .map_err(|e| DriverError::page(e.to_string()))?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| DriverError::page(e.to_string()))
    }

    async fn close(&self) -> DriverResult<()> {
        let page = self.page.lock().await.take();
        match page {
            Some(page) => page
                .close()
                .await
                .map_err(|e| DriverError::page(e.to_string())),
            None => Ok(()),
        }
    }
}
