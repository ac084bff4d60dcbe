use crate::core::{PageSession, ReadyState, ResolvedLocator, WaitPolicy};
use crate::errors::{HarnessError, Result};
use crate::types::{InteractionPhase, WaitStage};
use crate::utils::javascript;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Stand-in deadline for budgets too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(start: Instant, budget: Duration) -> Instant {
    start
        .checked_add(budget)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

/// Blocks until the page is loaded and an element is actionable, within a
/// bounded timeout.
pub struct WaitCoordinator<S: PageSession> {
    session: Arc<S>,
    policy: WaitPolicy,
}

impl<S: PageSession> Clone for WaitCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            policy: self.policy,
        }
    }
}

impl<S: PageSession> WaitCoordinator<S> {
    pub fn new(session: Arc<S>, policy: WaitPolicy) -> Self {
        Self { session, policy }
    }

    pub fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// Waits for `document.readyState == "complete"`.
    pub async fn wait_for_page_ready(&self, timeout: Option<Duration>) -> Result<()> {
        let started = Instant::now();
        let deadline = deadline_after(started, timeout.unwrap_or(self.policy.timeout));
        self.page_ready_by(deadline, started, "document").await
    }

    /// Waits for page readiness, then (after the settle delay) for the
    /// element behind `locator` to become interactable.
    ///
    /// The settle delay is not charged against `timeout`.
    pub async fn wait_until_ready(
        &self,
        locator: &ResolvedLocator,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let timeout = timeout.unwrap_or(self.policy.timeout);
        let started = Instant::now();
        let subject = locator.to_string();
        debug!(locator = %subject, phase = %InteractionPhase::Waiting, ?timeout, "waiting for element");

        self.page_ready_by(deadline_after(started, timeout), started, &subject)
            .await?;

        sleep(self.policy.settle_delay).await;
        let deadline = deadline_after(
            started,
            timeout.saturating_add(self.policy.settle_delay),
        );

        loop {
            if self.is_interactable(locator).await? {
                debug!(locator = %subject, elapsed = ?started.elapsed(), "element ready");
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                debug!(locator = %subject, phase = %InteractionPhase::TimedOut, "element wait expired");
                return Err(HarnessError::Timeout {
                    locator: subject,
                    stage: WaitStage::ElementReady,
                    elapsed: started.elapsed(),
                });
            }
            sleep(self.policy.poll_interval.min(deadline - now)).await;
        }
    }

    async fn page_ready_by(&self, deadline: Instant, started: Instant, subject: &str) -> Result<()> {
        loop {
            if self.session.ready_state().await? == ReadyState::Complete {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(HarnessError::Timeout {
                    locator: subject.to_string(),
                    stage: WaitStage::PageReady,
                    elapsed: started.elapsed(),
                });
            }
            sleep(self.policy.poll_interval.min(deadline - now)).await;
        }
    }

    async fn is_interactable(&self, locator: &ResolvedLocator) -> Result<bool> {
        let Some(element) = self.session.query(locator, false).await?.first() else {
            return Ok(false);
        };
        match self
            .session
            .call_on_element(&element, javascript::IS_INTERACTABLE, vec![])
            .await
        {
            Ok(value) => Ok(value.as_bool().unwrap_or(false)),
            // detached between the query and the check; poll again
            Err(HarnessError::ElementNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
