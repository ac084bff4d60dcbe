pub mod allure;
pub mod environment;

use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use allure::AllureResultsSink;
pub use environment::{patch_environment, write_environment_file, EnvironmentValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentType {
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "text/plain")]
    Text,
    #[serde(rename = "application/json")]
    Json,
    #[serde(rename = "text/html")]
    Html,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Png => "image/png",
            ContentType::Text => "text/plain",
            ContentType::Json => "application/json",
            ContentType::Html => "text/html",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ContentType::Png => "png",
            ContentType::Text => "txt",
            ContentType::Json => "json",
            ContentType::Html => "html",
        }
    }
}

/// A stored attachment as the report refers to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub name: String,
    pub source: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub captured_at: DateTime<Utc>,
}

/// Destination for screenshots and other evidence produced during a test.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn attach(&self, bytes: &[u8], name: &str, content_type: ContentType)
        -> Result<Attachment>;
}
