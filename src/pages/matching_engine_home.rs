use crate::core::{LocatorArgs, PageSession};
use crate::errors::{HarnessError, Result};
use crate::harness::Harness;
use crate::interaction::ClickOptions;
use crate::pages::data::MatchingEngineHomeData;
use std::sync::Arc;
use tracing::{info, warn};

/// Landing page of the matching engine application.
pub struct MatchingEngineHome<S: PageSession> {
    harness: Harness<S>,
    data: Arc<MatchingEngineHomeData>,
}

impl<S: PageSession> MatchingEngineHome<S> {
    pub fn new(harness: Harness<S>, data: MatchingEngineHomeData) -> Self {
        Self {
            harness,
            data: Arc::new(data),
        }
    }

    pub fn harness(&self) -> &Harness<S> {
        &self.harness
    }

    pub fn data(&self) -> &MatchingEngineHomeData {
        &self.data
    }

    /// Opens the configured URL. Landing somewhere unexpected is logged,
    /// not raised; the following interactions will fail loudly enough.
    pub async fn navigate_to_home(&self) -> Result<()> {
        self.harness.go_to_page().await?;

        let url = &self.harness.config().url;
        if !self.harness.verify_page_url(url).await? {
            warn!(expected = %url, "home page url differs");
        }
        if !self.harness.verify_page_title(&self.data.page_title).await? {
            warn!(expected = %self.data.page_title, "home page title differs");
        }
        info!(url = %url, "on matching engine home");
        Ok(())
    }

    pub async fn click_header_option(&self, option: &str) -> Result<()> {
        let locator = self
            .data
            .header_options
            .format(&LocatorArgs::named([("value", option)]))?;
        info!(option, "header option");
        self.harness
            .interactions()
            .click(&locator, ClickOptions::default())
            .await
    }

    /// Scrolls to the additional features section, opens `af_option` and
    /// checks the products heading contains `heading_text`.
    pub async fn click_products_supported(&self, af_option: &str, heading_text: &str) -> Result<()> {
        let features = &self.data.additional_features;
        let interactions = self.harness.interactions();

        interactions
            .scroll_into_view(&features.title.resolve()?)
            .await?;
        let option = features
            .options
            .format(&LocatorArgs::named([("value", af_option)]))?;
        interactions
            .click(&option, ClickOptions::default().scrolled())
            .await?;

        let heading = features.products_supported.heading.resolve()?;
        if interactions
            .verify_text_contains(&heading, heading_text, true)
            .await?
        {
            return Ok(());
        }

        let actual = interactions.element_text(&heading, false).await?;
        Err(HarnessError::Assertion {
            locator: heading.to_string(),
            missing: vec![heading_text.to_string()],
            extra: actual.map(|text| text.trim().to_string()).into_iter().collect(),
        })
    }

    pub async fn assert_products_supported<T: AsRef<str>>(&self, expected: &[T]) -> Result<()> {
        let products = self
            .data
            .additional_features
            .products_supported
            .products_list
            .resolve()?;
        self.harness
            .interactions()
            .assert_set_equals(&products, expected)
            .await
    }
}
