//! In-memory `PageSession` for exercising the harness without a browser.
//!
//! Elements are bound to exact locators, or found through an HTML snapshot
//! for CSS queries. Appearance and readiness are timed against the tokio
//! clock, so tests can run on a paused runtime.

use crate::core::{
    ClickKind, ElementHandle, PageSession, QueryKind, QueryResult, ReadyState, ResolvedLocator,
};
use crate::errors::{HarnessError, Result};
use crate::utils::javascript;
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-screenshot";

#[derive(Debug, Clone, PartialEq)]
pub struct FakeElement {
    pub text: String,
    pub appears_after: Duration,
    pub interactable_after: Duration,
    pub enabled: bool,
    pub offset_y: i64,
    pub in_view: bool,
}

impl FakeElement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            appears_after: Duration::ZERO,
            interactable_after: Duration::ZERO,
            enabled: true,
            offset_y: 0,
            in_view: true,
        }
    }

    /// Element is absent from queries until `delay` after page load.
    pub fn appearing_after(mut self, delay: Duration) -> Self {
        self.appears_after = delay;
        self.interactable_after = self.interactable_after.max(delay);
        self
    }

    /// Element is present but not actionable until `delay` after page load.
    pub fn interactable_after(mut self, delay: Duration) -> Self {
        self.interactable_after = delay;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Element sits outside the viewport at vertical offset `offset_y`.
    pub fn below_fold(mut self, offset_y: i64) -> Self {
        self.offset_y = offset_y;
        self.in_view = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedClick {
    pub node: u64,
    pub text: String,
    pub kind: ClickKind,
}

#[derive(Debug, Clone)]
struct FakePage {
    url: String,
    title: String,
    ready_after: Duration,
    elements: Vec<FakeElement>,
    bindings: Vec<(ResolvedLocator, Vec<usize>)>,
    html: Option<(String, Vec<usize>)>,
}

impl FakePage {
    fn blank(url: &str, title: &str) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            ready_after: Duration::ZERO,
            elements: Vec::new(),
            bindings: Vec::new(),
            html: None,
        }
    }

    fn bind(&mut self, locator: ResolvedLocator, elements: Vec<FakeElement>) {
        let start = self.elements.len();
        self.elements.extend(elements);
        let nodes: Vec<usize> = (start..self.elements.len()).collect();
        match self.bindings.iter_mut().find(|(bound, _)| *bound == locator) {
            Some((_, existing)) => existing.extend(nodes),
            None => self.bindings.push((locator, nodes)),
        }
    }

    fn load_html(&mut self, html: &str) -> Result<()> {
        let document = Html::parse_document(html);
        let all = parse_selector("*")?;
        let mut nodes = Vec::new();
        for element in document.select(&all) {
            let value = element.value();
            let mut fake = FakeElement::new(element.text().collect::<String>());
            fake.enabled = value.attr("disabled").is_none();
            if value.attr("hidden").is_some() {
                fake.interactable_after = Duration::MAX;
            }
            nodes.push(self.elements.len());
            self.elements.push(fake);
        }
        self.html = Some((html.to_string(), nodes));
        Ok(())
    }

    fn matching(&self, locator: &ResolvedLocator) -> Result<Vec<usize>> {
        if let Some((_, nodes)) = self.bindings.iter().find(|(bound, _)| bound == locator) {
            return Ok(nodes.clone());
        }
        match (&self.html, locator.query()) {
            (Some((html, nodes)), (QueryKind::Css, selector)) => css_matches(html, &selector, nodes),
            _ => Ok(Vec::new()),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| {
        HarnessError::Configuration(format!("invalid css selector '{}': {:?}", selector, e))
    })
}

fn css_matches(html: &str, selector: &str, nodes: &[usize]) -> Result<Vec<usize>> {
    let document = Html::parse_document(html);
    let all = parse_selector("*")?;
    let wanted = parse_selector(selector)?;
    let order: Vec<_> = document.select(&all).map(|e| e.id()).collect();
    Ok(document
        .select(&wanted)
        .filter_map(|e| order.iter().position(|id| *id == e.id()))
        .filter_map(|position| nodes.get(position).copied())
        .collect())
}

struct FakeState {
    page: FakePage,
    routes: HashMap<String, FakePage>,
    loaded_at: Instant,
    epoch: u64,
    scroll_y: i64,
    scroll_mutations: usize,
    clicks: Vec<RecordedClick>,
    navigations: Vec<String>,
    session_lost: bool,
}

impl FakeState {
    fn check_alive(&self) -> Result<()> {
        if self.session_lost {
            return Err(HarnessError::Session(
                "browser session disconnected".to_string(),
            ));
        }
        Ok(())
    }

    fn element(&self, handle: &ElementHandle) -> Result<&FakeElement> {
        handle.ensure_current(self.epoch)?;
        let node = handle.node() as usize;
        self.page
            .elements
            .get(node)
            .filter(|e| e.appears_after <= self.loaded_at.elapsed())
            .ok_or_else(|| HarnessError::ElementNotFound(format!("node {} is detached", node)))
    }
}

pub struct FakeSession {
    state: Mutex<FakeState>,
}

impl FakeSession {
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            state: Mutex::new(FakeState {
                page: FakePage::blank(url, title),
                routes: HashMap::new(),
                loaded_at: Instant::now(),
                epoch: 0,
                scroll_y: 0,
                scroll_mutations: 0,
                clicks: Vec::new(),
                navigations: Vec::new(),
                session_lost: false,
            }),
        }
    }

    /// Page reports `loading` until `delay` after load.
    pub fn with_ready_after(mut self, delay: Duration) -> Self {
        self.state.get_mut().page.ready_after = delay;
        self
    }

    pub fn with_element(self, locator: &ResolvedLocator, element: FakeElement) -> Self {
        self.with_elements(locator, vec![element])
    }

    pub fn with_elements(mut self, locator: &ResolvedLocator, elements: Vec<FakeElement>) -> Self {
        self.state.get_mut().page.bind(locator.clone(), elements);
        self
    }

    /// Serves CSS queries that have no explicit binding from `html`.
    pub fn with_html(mut self, html: &str) -> Result<Self> {
        self.state.get_mut().page.load_html(html)?;
        Ok(self)
    }

    /// Content served after navigating to `url`.
    pub fn with_route(
        mut self,
        url: &str,
        title: &str,
        bindings: Vec<(ResolvedLocator, Vec<FakeElement>)>,
    ) -> Self {
        let mut page = FakePage::blank(url, title);
        for (locator, elements) in bindings {
            page.bind(locator, elements);
        }
        self.state.get_mut().routes.insert(url.to_string(), page);
        self
    }

    pub async fn add_elements(&self, locator: &ResolvedLocator, elements: Vec<FakeElement>) {
        self.state.lock().await.page.bind(locator.clone(), elements);
    }

    /// Every later call fails as if the browser had crashed.
    pub async fn lose_session(&self) {
        self.state.lock().await.session_lost = true;
    }

    pub async fn clicks(&self) -> Vec<RecordedClick> {
        self.state.lock().await.clicks.clone()
    }

    pub async fn scroll_y(&self) -> i64 {
        self.state.lock().await.scroll_y
    }

    pub async fn scroll_mutations(&self) -> usize {
        self.state.lock().await.scroll_mutations
    }

    pub async fn navigations(&self) -> Vec<String> {
        self.state.lock().await.navigations.clone()
    }

    pub async fn epoch(&self) -> u64 {
        self.state.lock().await.epoch
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.check_alive()?;
        let page = state
            .routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| FakePage::blank(url, ""));
        state.page = page;
        state.epoch += 1;
        state.loaded_at = Instant::now();
        state.scroll_y = 0;
        state.navigations.push(url.to_string());
        Ok(())
    }

    async fn query(&self, locator: &ResolvedLocator, multiple: bool) -> Result<QueryResult> {
        let state = self.state.lock().await;
        state.check_alive()?;
        let elapsed = state.loaded_at.elapsed();
        let handles = state
            .page
            .matching(locator)?
            .into_iter()
            .filter(|&node| state.page.elements[node].appears_after <= elapsed)
            .map(|node| ElementHandle::new(node as u64, state.epoch))
            .collect();
        Ok(QueryResult::from_matches(handles, multiple))
    }

    async fn execute_script(&self, script: &str) -> Result<Value> {
        let state = self.state.lock().await;
        state.check_alive()?;
        match script {
            javascript::READY_STATE => {
                let ready = state.loaded_at.elapsed() >= state.page.ready_after;
                Ok(Value::from(if ready { "complete" } else { "loading" }))
            }
            "window.scrollY" => Ok(Value::from(state.scroll_y)),
            _ => Ok(Value::Null),
        }
    }

    async fn call_on_element(
        &self,
        element: &ElementHandle,
        function: &str,
        _args: Vec<Value>,
    ) -> Result<Value> {
        let mut state = self.state.lock().await;
        state.check_alive()?;
        let elapsed = state.loaded_at.elapsed();
        let fake = state.element(element)?.clone();

        match function {
            javascript::IS_INTERACTABLE => {
                Ok(Value::Bool(fake.enabled && fake.interactable_after <= elapsed))
            }
            javascript::INNER_TEXT => Ok(Value::String(fake.text)),
            javascript::SCROLL_INTO_VIEW_CENTER => {
                if fake.in_view {
                    return Ok(Value::Bool(false));
                }
                state.page.elements[element.node() as usize].in_view = true;
                state.scroll_y = fake.offset_y;
                state.scroll_mutations += 1;
                Ok(Value::Bool(true))
            }
            _ => Err(HarnessError::Session(
                "FakeSession cannot evaluate this element function".to_string(),
            )),
        }
    }

    async fn pointer_click(&self, element: &ElementHandle, kind: ClickKind) -> Result<()> {
        let mut state = self.state.lock().await;
        state.check_alive()?;
        let text = state.element(element)?.text.clone();
        state.clicks.push(RecordedClick {
            node: element.node(),
            text,
            kind,
        });
        Ok(())
    }

    async fn ready_state(&self) -> Result<ReadyState> {
        let value = self.execute_script(javascript::READY_STATE).await?;
        ReadyState::parse(value.as_str().unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String> {
        let state = self.state.lock().await;
        state.check_alive()?;
        Ok(state.page.url.clone())
    }

    async fn title(&self) -> Result<String> {
        let state = self.state.lock().await;
        state.check_alive()?;
        Ok(state.page.title.clone())
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>> {
        self.state.lock().await.check_alive()?;
        Ok(FAKE_PNG.to_vec())
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().await.session_lost = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LocatorDescriptor;

    const PRODUCTS_HTML: &str = r#"
        <html><body>
          <h2 id="heading">There are several types of Product Supported:</h2>
          <ul class="products">
            <li>Cue Sheet / AV Work</li>
            <li>Recording</li>
            <li disabled>Bundle</li>
          </ul>
        </body></html>
    "#;

    #[tokio::test]
    async fn css_queries_follow_document_order() {
        let session = FakeSession::new("https://app.test/", "Home")
            .with_html(PRODUCTS_HTML)
            .unwrap();
        let items = LocatorDescriptor::css("ul.products > li").resolve().unwrap();

        let handles = session.query(&items, true).await.unwrap().into_vec();
        assert_eq!(handles.len(), 3);

        let mut texts = Vec::new();
        for handle in &handles {
            let text = session
                .call_on_element(handle, javascript::INNER_TEXT, vec![])
                .await
                .unwrap();
            texts.push(text.as_str().unwrap().to_string());
        }
        assert_eq!(texts, ["Cue Sheet / AV Work", "Recording", "Bundle"]);
    }

    #[tokio::test]
    async fn invalid_css_is_a_configuration_error() {
        let session = FakeSession::new("https://app.test/", "Home")
            .with_html(PRODUCTS_HTML)
            .unwrap();
        let broken = LocatorDescriptor::css("ul > li[").resolve().unwrap();
        assert!(matches!(
            session.query(&broken, true).await,
            Err(HarnessError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn navigation_invalidates_handles() {
        let heading = LocatorDescriptor::xpath("//h1").resolve().unwrap();
        let session = FakeSession::new("https://app.test/", "Home")
            .with_element(&heading, FakeElement::new("Welcome"));

        let handle = session.query(&heading, false).await.unwrap().first().unwrap();
        session.navigate("https://app.test/other").await.unwrap();

        assert!(matches!(
            session.pointer_click(&handle, ClickKind::Single).await,
            Err(HarnessError::ElementNotFound(_))
        ));
        assert_eq!(session.epoch().await, 1);
    }

    #[tokio::test]
    async fn lost_sessions_fail_every_call() {
        let session = FakeSession::new("https://app.test/", "Home");
        session.lose_session().await;
        assert!(matches!(
            session.title().await,
            Err(HarnessError::Session(_))
        ));
    }
}
