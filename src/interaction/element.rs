use crate::core::{ClickKind, ElementHandle, PageSession, ResolvedLocator, WaitPolicy};
use crate::errors::{HarnessError, Result};
use crate::interaction::resolver::{ElementResolver, ResolveOptions};
use crate::interaction::wait::WaitCoordinator;
use crate::types::InteractionPhase;
use crate::utils::javascript;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOptions {
    pub double: bool,
    pub scroll_first: bool,
    pub wait: bool,
    /// Click the n-th of all matches instead of the first.
    pub nth: Option<usize>,
    pub timeout: Option<Duration>,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            double: false,
            scroll_first: false,
            wait: true,
            nth: None,
            timeout: None,
        }
    }
}

impl ClickOptions {
    pub fn double() -> Self {
        Self {
            double: true,
            ..Self::default()
        }
    }

    pub fn scrolled(mut self) -> Self {
        self.scroll_first = true;
        self
    }

    pub fn nth(mut self, index: usize) -> Self {
        self.nth = Some(index);
        self
    }

    pub fn without_wait(mut self) -> Self {
        self.wait = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceOptions {
    /// Check for presence (`true`) or absence (`false`).
    pub present: bool,
    /// Accept more than one match.
    pub multiple: bool,
    pub wait: bool,
    pub timeout: Option<Duration>,
}

impl Default for PresenceOptions {
    fn default() -> Self {
        Self {
            present: true,
            multiple: false,
            wait: true,
            timeout: None,
        }
    }
}

impl PresenceOptions {
    pub fn absent() -> Self {
        Self {
            present: false,
            wait: false,
            ..Self::default()
        }
    }
}

/// What `scroll_into_view` acts on.
#[derive(Debug, Clone, Copy)]
pub enum ScrollTarget<'a> {
    Locator(&'a ResolvedLocator),
    Handle(&'a ElementHandle),
}

impl<'a> From<&'a ResolvedLocator> for ScrollTarget<'a> {
    fn from(locator: &'a ResolvedLocator) -> Self {
        ScrollTarget::Locator(locator)
    }
}

impl<'a> From<&'a ElementHandle> for ScrollTarget<'a> {
    fn from(handle: &'a ElementHandle) -> Self {
        ScrollTarget::Handle(handle)
    }
}

fn phase(locator: &dyn std::fmt::Display, phase: InteractionPhase) {
    debug!(locator = %locator, phase = %phase, "interaction");
}

/// User-level element operations over one page session.
pub struct Interactions<S: PageSession> {
    session: Arc<S>,
    resolver: ElementResolver<S>,
}

impl<S: PageSession> Clone for Interactions<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            resolver: self.resolver.clone(),
        }
    }
}

impl<S: PageSession> Interactions<S> {
    pub fn new(session: Arc<S>, policy: WaitPolicy) -> Self {
        let resolver = ElementResolver::new(Arc::clone(&session), policy);
        Self { session, resolver }
    }

    pub fn resolver(&self) -> &ElementResolver<S> {
        &self.resolver
    }

    pub fn waiter(&self) -> &WaitCoordinator<S> {
        self.resolver.waiter()
    }

    pub async fn click(&self, locator: &ResolvedLocator, options: ClickOptions) -> Result<()> {
        phase(locator, InteractionPhase::Pending);
        let resolve = ResolveOptions {
            wait: options.wait,
            multiple: options.nth.is_some(),
            timeout: options.timeout,
        };
        let result = self.resolver.resolve(locator, resolve).await?;
        let element = match options.nth {
            Some(index) => result.into_vec().into_iter().nth(index),
            None => result.first(),
        };
        let Some(element) = element else {
            phase(locator, InteractionPhase::Absent);
            let detail = match options.nth {
                Some(index) => format!("{} has no match at index {}", locator, index),
                None => format!("{} matched no element", locator),
            };
            return Err(HarnessError::ElementNotInteractable(detail));
        };

        if options.scroll_first {
            self.scroll_handle(&element).await?;
        }

        let kind = if options.double {
            ClickKind::Double
        } else {
            ClickKind::Single
        };
        phase(locator, InteractionPhase::Acting);
        self.session.pointer_click(&element, kind).await?;
        debug!(locator = %locator, phase = %InteractionPhase::Done, ?kind, "clicked");
        Ok(())
    }

    pub async fn double_click(&self, locator: &ResolvedLocator) -> Result<()> {
        self.click(locator, ClickOptions::double()).await
    }

    /// Centers the target vertically unless it is already fully visible.
    /// Missing elements are logged and ignored.
    pub async fn scroll_into_view<'a>(&self, target: impl Into<ScrollTarget<'a>>) -> Result<()> {
        let handle = match target.into() {
            ScrollTarget::Handle(handle) => handle.clone(),
            ScrollTarget::Locator(locator) => {
                match self
                    .resolver
                    .resolve(locator, ResolveOptions::default())
                    .await
                {
                    Ok(result) => match result.first() {
                        Some(handle) => handle,
                        None => {
                            warn!(locator = %locator, "nothing to scroll to");
                            return Ok(());
                        }
                    },
                    Err(e) if e.is_timeout() => {
                        warn!(locator = %locator, error = %e, "skipping scroll");
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                }
            }
        };
        self.scroll_handle(&handle).await
    }

    async fn scroll_handle(&self, handle: &ElementHandle) -> Result<()> {
        match self
            .session
            .call_on_element(handle, javascript::SCROLL_INTO_VIEW_CENTER, vec![])
            .await
        {
            Ok(scrolled) => {
                debug!(node = handle.node(), scrolled = scrolled.as_bool().unwrap_or(false), "scroll into view");
                Ok(())
            }
            Err(HarnessError::ElementNotFound(detail)) => {
                warn!(node = handle.node(), %detail, "element went away before scrolling");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Rendered text of the first match, or `None` when nothing matched.
    pub async fn element_text(&self, locator: &ResolvedLocator, wait: bool) -> Result<Option<String>> {
        let options = ResolveOptions {
            wait,
            ..ResolveOptions::default()
        };
        let element = match self.resolver.resolve(locator, options).await {
            Ok(result) => result.first(),
            Err(e) if e.is_element_timeout() => {
                phase(locator, InteractionPhase::TimedOut);
                None
            }
            Err(e) => return Err(e),
        };
        let Some(element) = element else {
            return Ok(None);
        };
        match self.text_of(&element).await {
            Ok(text) => Ok(Some(text)),
            Err(HarnessError::ElementNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Trimmed text of every match, in document order.
    pub async fn element_texts(
        &self,
        locator: &ResolvedLocator,
        options: ResolveOptions,
    ) -> Result<Vec<String>> {
        let options = ResolveOptions {
            multiple: true,
            ..options
        };
        let handles = self.resolver.resolve(locator, options).await?.into_vec();
        let mut texts = Vec::with_capacity(handles.len());
        for handle in &handles {
            texts.push(self.text_of(handle).await?.trim().to_string());
        }
        Ok(texts)
    }

    pub async fn verify_text_contains(
        &self,
        locator: &ResolvedLocator,
        expected: &str,
        wait: bool,
    ) -> Result<bool> {
        let found = match self.element_text(locator, wait).await? {
            Some(text) => text.contains(expected),
            None => false,
        };
        debug!(locator = %locator, expected, found, "verify text");
        Ok(found)
    }

    /// Compares the trimmed texts of all matches with `expected`, ignoring
    /// order and duplicates.
    pub async fn assert_set_equals<T: AsRef<str>>(
        &self,
        locator: &ResolvedLocator,
        expected: &[T],
    ) -> Result<()> {
        let texts = match self.element_texts(locator, ResolveOptions::all()).await {
            Ok(texts) => texts,
            // present-but-hidden lists still have text worth comparing
            Err(e) if e.is_element_timeout() => {
                self.element_texts(locator, ResolveOptions::all().without_wait())
                    .await?
            }
            Err(e) => return Err(e),
        };
        if texts.is_empty() {
            return Err(HarnessError::ElementNotFound(format!(
                "{} matched no elements to compare",
                locator
            )));
        }

        let actual: BTreeSet<String> = texts.into_iter().collect();
        let expected: BTreeSet<String> = expected
            .iter()
            .map(|value| value.as_ref().trim().to_string())
            .collect();
        let missing: Vec<String> = expected.difference(&actual).cloned().collect();
        let extra: Vec<String> = actual.difference(&expected).cloned().collect();
        if missing.is_empty() && extra.is_empty() {
            return Ok(());
        }
        Err(HarnessError::Assertion {
            locator: locator.to_string(),
            missing,
            extra,
        })
    }

    /// Checks presence (or absence, with `present: false`) of `locator`.
    /// Finding several matches only passes when `multiple` is set.
    pub async fn verify_element_present(
        &self,
        locator: &ResolvedLocator,
        options: PresenceOptions,
    ) -> Result<bool> {
        if options.present && options.wait {
            match self
                .resolver
                .waiter()
                .wait_until_ready(locator, options.timeout)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_element_timeout() => return Ok(false),
                Err(e) => return Err(e),
            }
        }

        let count = self
            .resolver
            .resolve(locator, ResolveOptions::all().without_wait())
            .await?
            .len();
        let verdict = match (options.present, count) {
            (false, count) => count == 0,
            (true, 0) => false,
            (true, 1) => true,
            (true, _) => options.multiple,
        };
        debug!(locator = %locator, count, present = options.present, verdict, "verify presence");
        Ok(verdict)
    }

    async fn text_of(&self, handle: &ElementHandle) -> Result<String> {
        let value = self
            .session
            .call_on_element(handle, javascript::INNER_TEXT, vec![])
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}
