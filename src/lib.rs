pub mod browser;
pub mod core;
pub mod errors;
pub mod harness;
pub mod interaction;
pub mod pages;
pub mod report;
pub mod testing;
pub mod types;
pub mod utils;

pub use browser::ChromeSession;
pub use crate::core::{
    HarnessConfig, LocatorArgs, LocatorDescriptor, PageSession, ResolvedLocator, Strategy,
    WaitPolicy,
};
pub use errors::{HarnessError, Result};
pub use harness::Harness;
pub use interaction::{ClickOptions, Interactions, PresenceOptions, ResolveOptions};
pub use report::{AllureResultsSink, ReportSink};
pub use types::*;
