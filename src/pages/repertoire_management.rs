use crate::core::{LocatorArgs, PageSession};
use crate::errors::Result;
use crate::harness::Harness;
use crate::interaction::ClickOptions;
use crate::pages::data::RepertoireManagementData;
use tracing::info;

pub struct RepertoireManagement<S: PageSession> {
    harness: Harness<S>,
    data: RepertoireManagementData,
}

impl<S: PageSession> RepertoireManagement<S> {
    pub fn new(harness: Harness<S>, data: RepertoireManagementData) -> Self {
        Self { harness, data }
    }

    pub fn data(&self) -> &RepertoireManagementData {
        &self.data
    }

    /// Brings the additional features list into view and opens `option`.
    pub async fn click_additional_features_option(&self, option: &str) -> Result<()> {
        let features = &self.data.additional_features;
        let interactions = self.harness.interactions();

        interactions
            .scroll_into_view(&features.title.resolve()?)
            .await?;
        let entry = features
            .sub_list
            .format(&LocatorArgs::named([("value", option)]))?;
        info!(option, "additional features option");
        interactions
            .click(&entry, ClickOptions::default().scrolled())
            .await
    }
}
