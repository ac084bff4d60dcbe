pub mod config;
pub mod locator;
pub mod session;

pub use config::{HarnessConfig, WaitPolicy};
pub use locator::{LocatorArgs, LocatorDescriptor, QueryKind, ResolvedLocator, Strategy};
pub use session::{ClickKind, ElementHandle, PageSession, QueryResult, ReadyState};
