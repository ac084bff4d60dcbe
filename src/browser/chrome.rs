use crate::core::{
    ClickKind, ElementHandle, HarnessConfig, PageSession, QueryKind, QueryResult, ReadyState,
    ResolvedLocator,
};
use crate::errors::{HarnessError, Result};
use crate::utils::javascript;
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// `PageSession` over a single Chrome tab driven through the DevTools protocol.
pub struct ChromeSession {
    // keeps the browser process alive for as long as the tab is in use
    _browser: Browser,
    tab: Arc<Tab>,
    epoch: AtomicU64,
}

impl ChromeSession {
    pub fn launch(config: &HarnessConfig) -> Result<Self> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if !config.headless {
            args.push(OsStr::new("--start-fullscreen"));
            args.push(OsStr::new("--disable-gpu"));
        }

        for arg in &config.chrome_args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| HarnessError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| HarnessError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| HarnessError::LaunchFailed(e.to_string()))?;
        tab.set_default_timeout(config.implicit_wait());

        info!(
            headless = config.headless,
            driver = %config.current_driver,
            "chrome session started"
        );

        Ok(Self {
            _browser: browser,
            tab,
            epoch: AtomicU64::new(0),
        })
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn element(&self, handle: &ElementHandle) -> Result<Element<'_>> {
        handle.ensure_current(self.current_epoch())?;
        Element::new(&self.tab, handle.node() as _).map_err(|e| {
            HarnessError::ElementNotFound(format!(
                "node {} is no longer attached: {}",
                handle.node(),
                e
            ))
        })
    }

    fn count(&self, kind: QueryKind, selector: &str) -> Result<i64> {
        let result = self
            .tab
            .evaluate(&javascript::count_matches(kind, selector), false)
            .map_err(HarnessError::session)?;

        result
            .value
            .and_then(|v| v.as_i64())
            .ok_or_else(|| HarnessError::Session("match count was not a number".to_string()))
    }

    fn find(&self, kind: QueryKind, selector: &str) -> anyhow::Result<Vec<Element<'_>>> {
        match kind {
            QueryKind::Css => self.tab.find_elements(selector),
            QueryKind::Xpath => self.tab.find_elements_by_xpath(selector),
        }
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        info!(url, "navigating");
        self.tab.navigate_to(url).map_err(HarnessError::session)?;
        self.tab
            .wait_until_navigated()
            .map_err(HarnessError::session)?;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query(&self, locator: &ResolvedLocator, multiple: bool) -> Result<QueryResult> {
        let (kind, selector) = locator.query();

        // Counting first keeps "no match" apart from driver failures; the
        // find calls report both as errors.
        let count = self.count(kind, &selector)?;
        if count < 0 {
            return Err(HarnessError::Configuration(format!(
                "invalid selector {}",
                locator
            )));
        }
        if count == 0 {
            return Ok(QueryResult::from_matches(vec![], multiple));
        }

        let epoch = self.current_epoch();
        match self.find(kind, &selector) {
            Ok(elements) => {
                let handles = elements
                    .iter()
                    .map(|element| ElementHandle::new(element.node_id as u64, epoch))
                    .collect();
                Ok(QueryResult::from_matches(handles, multiple))
            }
            Err(e) => {
                // the matches may have gone away between the two calls
                if self.count(kind, &selector)? == 0 {
                    debug!(locator = %locator, "matches disappeared during lookup");
                    return Ok(QueryResult::from_matches(vec![], multiple));
                }
                Err(HarnessError::session(e))
            }
        }
    }

    async fn execute_script(&self, script: &str) -> Result<Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(HarnessError::session)?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    async fn call_on_element(
        &self,
        element: &ElementHandle,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Value> {
        let element = self.element(element)?;
        let result = element
            .call_js_fn(function, args, false)
            .map_err(HarnessError::session)?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    async fn pointer_click(&self, element: &ElementHandle, kind: ClickKind) -> Result<()> {
        let target = self.element(element)?;
        target.move_mouse_over().map_err(HarnessError::session)?;
        target.click().map_err(HarnessError::session)?;

        if kind == ClickKind::Double {
            target.click().map_err(HarnessError::session)?;
            target
                .call_js_fn(javascript::DISPATCH_DOUBLE_CLICK, vec![], false)
                .map_err(HarnessError::session)?;
        }
        Ok(())
    }

    async fn ready_state(&self) -> Result<ReadyState> {
        let value = self.execute_script(javascript::READY_STATE).await?;
        ReadyState::parse(value.as_str().unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    async fn title(&self) -> Result<String> {
        self.tab.get_title().map_err(HarnessError::session)
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>> {
        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(HarnessError::session)
    }

    async fn close(&self) -> Result<()> {
        self.tab.close(false).map_err(HarnessError::session)?;
        info!("chrome session closed");
        Ok(())
    }
}
