use crate::types::WaitStage;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timed out after {elapsed:?} waiting for {stage} of {locator}")]
    Timeout {
        locator: String,
        stage: WaitStage,
        elapsed: Duration,
    },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element not interactable: {0}")]
    ElementNotInteractable(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Content mismatch for {locator}: missing {missing:?}, extra {extra:?}")]
    Assertion {
        locator: String,
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    /// Wraps a driver-level failure as an unusable session.
    pub fn session<E: std::fmt::Display>(err: E) -> Self {
        HarnessError::Session(err.to_string())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, HarnessError::Timeout { .. })
    }

    /// True for a timeout that expired while waiting on the element itself,
    /// as opposed to the hosting page.
    pub fn is_element_timeout(&self) -> bool {
        matches!(
            self,
            HarnessError::Timeout {
                stage: WaitStage::ElementReady,
                ..
            }
        )
    }
}
