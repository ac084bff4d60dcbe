pub mod data;
pub mod matching_engine_home;
pub mod repertoire_management;

pub use data::{load_page_data, page_data_from_str, MatchingEngineHomeData, PageData, RepertoireManagementData};
pub use matching_engine_home::MatchingEngineHome;
pub use repertoire_management::RepertoireManagement;
