use frontend_harness::core::LocatorArgs;
use frontend_harness::pages::{load_page_data, MatchingEngineHomeData, RepertoireManagementData};
use frontend_harness::{HarnessConfig, Strategy};
use std::path::PathBuf;
use std::time::Duration;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

#[test]
fn sample_config_loads() {
    let config = HarnessConfig::load(data_dir().join("config_sample.yaml")).unwrap();
    assert_eq!(config.current_driver, "chrome");
    assert_eq!(config.configured_wait(), Duration::from_secs(2));
    assert_eq!(config.implicit_wait(), Duration::from_secs(10));
}

#[test]
fn home_data_formats_header_options() {
    let data: MatchingEngineHomeData = load_page_data(data_dir()).unwrap();
    assert_eq!(data.page_title, "Matching Engine");

    let modules = data
        .header_options
        .format(&LocatorArgs::named([("value", "Modules")]))
        .unwrap();
    assert_eq!(modules.strategy(), Strategy::Xpath);
    assert!(modules.selector().ends_with("[normalize-space()='Modules']"));
    assert!(data.header_options.needs_substitution().unwrap());
}

#[test]
fn product_list_is_a_css_locator() {
    let data: MatchingEngineHomeData = load_page_data(data_dir()).unwrap();
    let products = data
        .additional_features
        .products_supported
        .products_list
        .resolve()
        .unwrap();
    assert_eq!(products.strategy(), Strategy::Css);
    assert_eq!(products.to_string(), "css=section#products-supported ul > li");
}

#[test]
fn repertoire_data_loads() {
    let data: RepertoireManagementData = load_page_data(data_dir()).unwrap();
    let features = &data.additional_features;
    assert!(!features.title.needs_substitution().unwrap());
    assert!(features.sub_list.needs_substitution().unwrap());
}

#[test]
fn missing_data_files_are_configuration_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_page_data::<RepertoireManagementData>(dir.path()).unwrap_err();
    assert!(err.to_string().contains("repertoire_management_data.yaml"), "{err}");
}
