use crate::core::PageSession;
use crate::errors::Result;
use crate::report::{Attachment, ContentType, ReportSink};
use std::path::Path;

pub struct ScreenshotManager;

impl ScreenshotManager {
    /// Captures the viewport and hands it to `sink` as a PNG attachment.
    pub async fn capture_and_attach<S: PageSession + ?Sized>(
        session: &S,
        sink: &dyn ReportSink,
        name: &str,
    ) -> Result<Attachment> {
        let screenshot_bytes = session.capture_screenshot().await?;
        sink.attach(&screenshot_bytes, name, ContentType::Png).await
    }

    pub async fn save_to_file<S: PageSession + ?Sized>(
        session: &S,
        file_path: impl AsRef<Path>,
    ) -> Result<()> {
        let screenshot_bytes = session.capture_screenshot().await?;
        tokio::fs::write(file_path, screenshot_bytes).await?;
        Ok(())
    }
}
