use crate::browser::ChromeSession;
use crate::core::{HarnessConfig, PageSession};
use crate::errors::{HarnessError, Result};
use crate::interaction::Interactions;
use crate::report::{Attachment, ReportSink};
use crate::utils::ScreenshotManager;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A page session bundled with its configuration and interaction layer.
///
/// Cloning is cheap; clones share the session.
pub struct Harness<S: PageSession> {
    session: Arc<S>,
    config: Arc<HarnessConfig>,
    interactions: Interactions<S>,
}

impl<S: PageSession> Clone for Harness<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            config: Arc::clone(&self.config),
            interactions: self.interactions.clone(),
        }
    }
}

impl Harness<ChromeSession> {
    /// Launches Chrome as configured.
    pub fn open_browser(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        let session = ChromeSession::launch(&config)?;
        Ok(Self::new(session, config))
    }
}

impl<S: PageSession> Harness<S> {
    pub fn new(session: S, config: HarnessConfig) -> Self {
        Self::from_shared(Arc::new(session), Arc::new(config))
    }

    pub fn from_shared(session: Arc<S>, config: Arc<HarnessConfig>) -> Self {
        let interactions = Interactions::new(Arc::clone(&session), config.wait_policy());
        Self {
            session,
            config,
            interactions,
        }
    }

    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn interactions(&self) -> &Interactions<S> {
        &self.interactions
    }

    /// Opens the configured application URL.
    pub async fn go_to_page(&self) -> Result<()> {
        let url = self.config.url.clone();
        self.navigate(&url).await
    }

    /// Navigates and waits until the document has finished loading.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        info!(url, env = %self.config.current_env, "opening page");
        self.session.navigate(url).await?;
        self.interactions.waiter().wait_for_page_ready(None).await
    }

    pub async fn verify_page_title(&self, expected: &str) -> Result<bool> {
        let title = self.session.title().await?;
        debug!(%title, expected, "verify title");
        Ok(title == expected)
    }

    /// Exact comparison, falling back to comparing normalized URLs so that
    /// `https://host` and `https://host/` are the same page.
    pub async fn verify_page_url(&self, expected: &str) -> Result<bool> {
        let current = self.session.current_url().await?;
        if current == expected {
            return Ok(true);
        }
        let same = match (url::Url::parse(&current), url::Url::parse(expected)) {
            (Ok(current), Ok(expected)) => current == expected,
            _ => false,
        };
        debug!(%current, expected, same, "verify url");
        Ok(same)
    }

    pub async fn attach_screenshot(
        &self,
        sink: &dyn ReportSink,
        name: Option<&str>,
    ) -> Result<Attachment> {
        let name = name.unwrap_or("screenshot");
        ScreenshotManager::capture_and_attach(self.session.as_ref(), sink, name).await
    }

    pub async fn close(&self) -> Result<()> {
        self.session.close().await
    }

    /// Attaches a final screenshot named after the scenario and closes the
    /// session, then hands back `outcome`. Screenshot failures are logged
    /// only; a close failure is returned when the scenario itself passed.
    pub async fn finish<E>(
        &self,
        sink: &dyn ReportSink,
        scenario: &str,
        outcome: std::result::Result<(), E>,
    ) -> std::result::Result<(), E>
    where
        E: From<HarnessError> + std::fmt::Display,
    {
        if let Err(e) = &outcome {
            error!(scenario, error = %e, "scenario failed");
        }
        if let Err(e) = self.attach_screenshot(sink, Some(scenario)).await {
            warn!(scenario, error = %e, "final screenshot not captured");
        }
        let closed = self.close().await;
        if let (Err(e), Err(_)) = (&closed, &outcome) {
            warn!(scenario, error = %e, "session did not close cleanly");
        }
        outcome?;
        closed.map_err(E::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::AllureResultsSink;
    use crate::testing::FakeSession;
    use std::time::Duration;
    use tokio_test::assert_ok;

    fn config() -> HarnessConfig {
        HarnessConfig {
            url: "https://matching-engine.example.com".to_string(),
            configured_wait: 2.0,
            ..HarnessConfig::default()
        }
    }

    fn harness() -> Harness<FakeSession> {
        let session = FakeSession::new("about:blank", "").with_route(
            "https://matching-engine.example.com",
            "Matching Engine",
            vec![],
        );
        Harness::new(session, config())
    }

    #[tokio::test(start_paused = true)]
    async fn go_to_page_opens_the_configured_url() {
        let harness = harness();
        assert_ok!(harness.go_to_page().await);

        assert_eq!(
            harness.session().navigations().await,
            ["https://matching-engine.example.com"]
        );
        assert!(harness.verify_page_title("Matching Engine").await.unwrap());
        assert!(!harness.verify_page_title("Other").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn urls_compare_after_normalization() {
        let harness = harness();
        harness.go_to_page().await.unwrap();

        assert!(harness
            .verify_page_url("https://matching-engine.example.com/")
            .await
            .unwrap());
        assert!(!harness
            .verify_page_url("https://matching-engine.example.com/other")
            .await
            .unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_waits_for_the_document() {
        let session = FakeSession::new("about:blank", "")
            .with_ready_after(Duration::from_secs(1))
            .with_route("https://app.test/slow", "Slow", vec![]);
        let harness = Harness::new(session, config());

        // routes load instantly; the initial page is the slow one
        assert!(harness
            .interactions()
            .waiter()
            .wait_for_page_ready(Some(Duration::from_millis(500)))
            .await
            .unwrap_err()
            .is_timeout());
        assert_ok!(harness.navigate("https://app.test/slow").await);
    }

    #[tokio::test(start_paused = true)]
    async fn screenshots_are_attached_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AllureResultsSink::create(dir.path()).await.unwrap();
        let harness = harness();

        let attachment = harness.attach_screenshot(&sink, None).await.unwrap();
        assert_eq!(attachment.name, "screenshot");
        let named = harness
            .attach_screenshot(&sink, Some("after login"))
            .await
            .unwrap();
        assert_eq!(named.name, "after login");
        assert_eq!(sink.attachments().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn finish_attaches_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AllureResultsSink::create(dir.path()).await.unwrap();
        let harness = harness();
        harness.go_to_page().await.unwrap();

        assert_ok!(
            harness
                .finish(&sink, "products supported", Ok::<(), HarnessError>(()))
                .await
        );

        let attachments = sink.attachments().await;
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "products supported");
        assert!(harness.verify_page_title("Matching Engine").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_errors_outlive_a_failed_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AllureResultsSink::create(dir.path()).await.unwrap();
        let harness = harness();
        harness.session().lose_session().await;

        let failed: Result<()> = Err(HarnessError::Configuration("heading mismatch".into()));
        let err = harness
            .finish(&sink, "products supported", failed)
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(ref m) if m == "heading mismatch"));
        assert!(sink.attachments().await.is_empty());

        let passed = harness
            .finish(&sink, "products supported", Ok::<(), anyhow::Error>(()))
            .await;
        assert!(passed.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn clones_share_the_session() {
        let harness = harness();
        let clone = harness.clone();
        clone.go_to_page().await.unwrap();
        assert_eq!(harness.session().navigations().await.len(), 1);

        harness.close().await.unwrap();
        assert!(clone.verify_page_title("Matching Engine").await.is_err());
    }
}
