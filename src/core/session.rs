use crate::core::locator::ResolvedLocator;
use crate::errors::{HarnessError, Result};
use async_trait::async_trait;
use serde_json::Value;

/// The narrow contract the harness needs from a live browser page.
///
/// Implementations own their element handles; a handle produced before a
/// navigation must fail with [`HarnessError::ElementNotFound`] afterwards.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate the page to `url`.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Query the live page. Zero matches is `NotFound` / an empty `Many`,
    /// never an error.
    async fn query(&self, locator: &ResolvedLocator, multiple: bool) -> Result<QueryResult>;

    /// Evaluate a script in the page and return its JSON value.
    async fn execute_script(&self, script: &str) -> Result<Value>;

    /// Call a function declaration with `this` bound to `element`.
    async fn call_on_element(
        &self,
        element: &ElementHandle,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Value>;

    /// Move the pointer to the element and click it.
    async fn pointer_click(&self, element: &ElementHandle, kind: ClickKind) -> Result<()>;

    async fn ready_state(&self) -> Result<ReadyState>;

    async fn current_url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    /// PNG bytes of the current viewport.
    async fn capture_screenshot(&self) -> Result<Vec<u8>>;

    async fn close(&self) -> Result<()>;
}

/// Opaque reference to an element, valid for one navigation epoch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    node: u64,
    epoch: u64,
}

impl ElementHandle {
    pub fn new(node: u64, epoch: u64) -> Self {
        Self { node, epoch }
    }

    pub fn node(&self) -> u64 {
        self.node
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Fails with `ElementNotFound` when the handle predates `current_epoch`.
    pub fn ensure_current(&self, current_epoch: u64) -> Result<()> {
        if self.epoch != current_epoch {
            return Err(HarnessError::ElementNotFound(format!(
                "stale element handle (node {}) from an earlier page",
                self.node
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    One(ElementHandle),
    /// All matches in document order; may be empty.
    Many(Vec<ElementHandle>),
    NotFound,
}

impl QueryResult {
    pub fn from_matches(mut handles: Vec<ElementHandle>, multiple: bool) -> Self {
        if multiple {
            QueryResult::Many(handles)
        } else if handles.is_empty() {
            QueryResult::NotFound
        } else {
            QueryResult::One(handles.swap_remove(0))
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            QueryResult::One(_) => false,
            QueryResult::Many(handles) => handles.is_empty(),
            QueryResult::NotFound => true,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QueryResult::One(_) => 1,
            QueryResult::Many(handles) => handles.len(),
            QueryResult::NotFound => 0,
        }
    }

    pub fn first(self) -> Option<ElementHandle> {
        match self {
            QueryResult::One(handle) => Some(handle),
            QueryResult::Many(handles) => handles.into_iter().next(),
            QueryResult::NotFound => None,
        }
    }

    pub fn into_vec(self) -> Vec<ElementHandle> {
        match self {
            QueryResult::One(handle) => vec![handle],
            QueryResult::Many(handles) => handles,
            QueryResult::NotFound => vec![],
        }
    }
}

/// `document.readyState` of the hosting page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "loading" => Ok(ReadyState::Loading),
            "interactive" => Ok(ReadyState::Interactive),
            "complete" => Ok(ReadyState::Complete),
            other => Err(HarnessError::Session(format!(
                "unexpected document.readyState '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Double,
}
