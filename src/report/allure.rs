use crate::errors::Result;
use crate::report::{Attachment, ContentType, ReportSink};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Writes attachments into an Allure results directory using Allure's
/// `<uuid>-attachment.<ext>` naming.
pub struct AllureResultsSink {
    dir: PathBuf,
    attachments: Mutex<Vec<Attachment>>,
}

impl AllureResultsSink {
    /// Opens `dir`, creating it if needed.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            attachments: Mutex::new(Vec::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Attachments written so far, oldest first.
    pub async fn attachments(&self) -> Vec<Attachment> {
        self.attachments.lock().await.clone()
    }
}

#[async_trait]
impl ReportSink for AllureResultsSink {
    async fn attach(
        &self,
        bytes: &[u8],
        name: &str,
        content_type: ContentType,
    ) -> Result<Attachment> {
        let source = format!("{}-attachment.{}", Uuid::new_v4(), content_type.extension());
        tokio::fs::write(self.dir.join(&source), bytes).await?;

        let attachment = Attachment {
            name: name.to_string(),
            source,
            content_type,
            captured_at: Utc::now(),
        };
        debug!(name, source = %attachment.source, bytes = bytes.len(), "attachment written");
        self.attachments.lock().await.push(attachment.clone());
        Ok(attachment)
    }
}
