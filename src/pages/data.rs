//! Typed locator data for the page objects, one YAML document per page.

use crate::core::LocatorDescriptor;
use crate::errors::{HarnessError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

/// Page data stored under a single root key in its own file.
pub trait PageData: DeserializeOwned {
    const ROOT_KEY: &'static str;
    const FILE_NAME: &'static str;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingEngineHomeData {
    pub page_title: String,
    /// Header entry, formatted with the option label.
    pub header_options: LocatorDescriptor,
    pub additional_features: HomeAdditionalFeatures,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HomeAdditionalFeatures {
    pub title: LocatorDescriptor,
    pub options: LocatorDescriptor,
    pub products_supported: ProductsSupported,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductsSupported {
    pub heading: LocatorDescriptor,
    pub products_list: LocatorDescriptor,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepertoireManagementData {
    pub additional_features: RepertoireAdditionalFeatures,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepertoireAdditionalFeatures {
    pub title: LocatorDescriptor,
    pub sub_list: LocatorDescriptor,
}

impl PageData for MatchingEngineHomeData {
    const ROOT_KEY: &'static str = "matching_engine_home_data";
    const FILE_NAME: &'static str = "matching_engine_home_data.yaml";
}

impl PageData for RepertoireManagementData {
    const ROOT_KEY: &'static str = "repertoire_management_data";
    const FILE_NAME: &'static str = "repertoire_management_data.yaml";
}

/// Parses the `T::ROOT_KEY` section of a YAML document.
pub fn page_data_from_str<T: PageData>(yaml: &str) -> Result<T> {
    let mut document: serde_yaml::Mapping = serde_yaml::from_str(yaml).map_err(|e| {
        HarnessError::Configuration(format!("{}: not a YAML mapping: {}", T::ROOT_KEY, e))
    })?;
    let section = document.remove(T::ROOT_KEY).ok_or_else(|| {
        HarnessError::Configuration(format!("missing root key '{}'", T::ROOT_KEY))
    })?;
    serde_yaml::from_value(section)
        .map_err(|e| HarnessError::Configuration(format!("{}: {}", T::ROOT_KEY, e)))
}

/// Loads `T::FILE_NAME` from `data_dir`.
pub fn load_page_data<T: PageData>(data_dir: impl AsRef<Path>) -> Result<T> {
    let path = data_dir.as_ref().join(T::FILE_NAME);
    let yaml = std::fs::read_to_string(&path).map_err(|e| {
        HarnessError::Configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    page_data_from_str(&yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LocatorArgs, Strategy};

    const REPERTOIRE: &str = r#"
repertoire_management_data:
  additional_features:
    title: "//h2[normalize-space()='Additional Features']"
    sub_list:
      strategy: xpath
      template: "//ul[@id='features']//a[normalize-space()='{value}']"
"#;

    #[test]
    fn reads_the_root_section() {
        let data: RepertoireManagementData = page_data_from_str(REPERTOIRE).unwrap();
        let sub_list = &data.additional_features.sub_list;
        assert_eq!(sub_list.strategy(), Strategy::Xpath);

        let link = sub_list
            .format(&LocatorArgs::named([("value", "Products Supported")]))
            .unwrap();
        assert_eq!(
            link.selector(),
            "//ul[@id='features']//a[normalize-space()='Products Supported']"
        );
    }

    #[test]
    fn missing_root_key_is_a_configuration_error() {
        let err = page_data_from_str::<MatchingEngineHomeData>(REPERTOIRE).unwrap_err();
        assert!(err.to_string().contains("matching_engine_home_data"), "{err}");
    }

    #[test]
    fn missing_locators_fail_at_load() {
        let yaml = REPERTOIRE.replace("    title: \"//h2[normalize-space()='Additional Features']\"\n", "");
        let err = page_data_from_str::<RepertoireManagementData>(&yaml).unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)));
        assert!(err.to_string().contains("title"), "{err}");
    }

    #[test]
    fn malformed_templates_fail_at_load() {
        let yaml = REPERTOIRE.replace("'{value}'", "'{value'");
        assert!(page_data_from_str::<RepertoireManagementData>(&yaml).is_err());
    }
}
