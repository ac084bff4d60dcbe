use crate::core::{PageSession, QueryResult, ResolvedLocator, WaitPolicy};
use crate::errors::Result;
use crate::interaction::wait::WaitCoordinator;
use crate::types::InteractionPhase;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Wait for page and element readiness before querying.
    pub wait: bool,
    pub multiple: bool,
    pub timeout: Option<Duration>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            wait: true,
            multiple: false,
            timeout: None,
        }
    }
}

impl ResolveOptions {
    /// Every match, waiting first.
    pub fn all() -> Self {
        Self {
            multiple: true,
            ..Self::default()
        }
    }

    pub fn without_wait(mut self) -> Self {
        self.wait = false;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Turns a resolved locator into element handles on the live page.
pub struct ElementResolver<S: PageSession> {
    session: Arc<S>,
    waiter: WaitCoordinator<S>,
}

impl<S: PageSession> Clone for ElementResolver<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            waiter: self.waiter.clone(),
        }
    }
}

impl<S: PageSession> ElementResolver<S> {
    pub fn new(session: Arc<S>, policy: WaitPolicy) -> Self {
        let waiter = WaitCoordinator::new(Arc::clone(&session), policy);
        Self { session, waiter }
    }

    pub fn waiter(&self) -> &WaitCoordinator<S> {
        &self.waiter
    }

    /// Absence is not an error here: a single lookup yields
    /// [`QueryResult::NotFound`] and a multiple lookup an empty list.
    /// Timeouts and session failures from the wait surface unchanged.
    pub async fn resolve(
        &self,
        locator: &ResolvedLocator,
        options: ResolveOptions,
    ) -> Result<QueryResult> {
        if options.wait {
            self.waiter.wait_until_ready(locator, options.timeout).await?;
        }
        let result = self.session.query(locator, options.multiple).await?;
        let phase = if result.is_empty() {
            InteractionPhase::Absent
        } else {
            InteractionPhase::Resolved
        };
        debug!(locator = %locator, phase = %phase, matches = result.len(), "resolved");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ElementHandle, LocatorDescriptor};
    use crate::errors::HarnessError;
    use crate::testing::{FakeElement, FakeSession};
    use tokio_test::assert_err;

    fn rows() -> ResolvedLocator {
        LocatorDescriptor::css("table#works tr").resolve().unwrap()
    }

    fn resolver(session: FakeSession) -> ElementResolver<FakeSession> {
        ElementResolver::new(Arc::new(session), WaitPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn multiple_returns_every_match_in_order() {
        let session = FakeSession::new("https://app.test/", "Works").with_elements(
            &rows(),
            vec![
                FakeElement::new("first"),
                FakeElement::new("second"),
                FakeElement::new("third"),
            ],
        );
        let resolver = resolver(session);

        let handles = resolver
            .resolve(&rows(), ResolveOptions::all())
            .await
            .unwrap()
            .into_vec();
        let nodes: Vec<u64> = handles.iter().map(ElementHandle::node).collect();
        assert_eq!(nodes, [0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn single_returns_the_first_match() {
        let session = FakeSession::new("https://app.test/", "Works").with_elements(
            &rows(),
            vec![FakeElement::new("first"), FakeElement::new("second")],
        );
        let resolver = resolver(session);

        let result = resolver
            .resolve(&rows(), ResolveOptions::default())
            .await
            .unwrap();
        assert_eq!(result, QueryResult::One(ElementHandle::new(0, 0)));
    }

    #[tokio::test(start_paused = true)]
    async fn absence_without_wait_is_empty_not_an_error() {
        let resolver = resolver(FakeSession::new("https://app.test/", "Works"));

        let many = resolver
            .resolve(&rows(), ResolveOptions::all().without_wait())
            .await
            .unwrap();
        assert_eq!(many, QueryResult::Many(vec![]));

        let one = resolver
            .resolve(&rows(), ResolveOptions::default().without_wait())
            .await
            .unwrap();
        assert_eq!(one, QueryResult::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_for_an_absent_element_times_out() {
        let resolver = resolver(FakeSession::new("https://app.test/", "Works"));

        let err = assert_err!(
            resolver
                .resolve(
                    &rows(),
                    ResolveOptions::all().with_timeout(Duration::from_secs(1))
                )
                .await
        );
        assert!(err.is_element_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn late_elements_are_found_after_waiting() {
        let session = FakeSession::new("https://app.test/", "Works").with_element(
            &rows(),
            FakeElement::new("late").appearing_after(Duration::from_millis(1500)),
        );
        let resolver = resolver(session);

        let result = resolver
            .resolve(&rows(), ResolveOptions::default())
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn session_failures_propagate() {
        let session = Arc::new(FakeSession::new("https://app.test/", "Works"));
        session.lose_session().await;
        let resolver = ElementResolver::new(Arc::clone(&session), WaitPolicy::default());

        let err = assert_err!(
            resolver
                .resolve(&rows(), ResolveOptions::all().without_wait())
                .await
        );
        assert!(matches!(err, HarnessError::Session(_)));
    }
}
