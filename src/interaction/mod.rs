pub mod element;
pub mod resolver;
pub mod wait;

pub use element::{ClickOptions, Interactions, PresenceOptions, ScrollTarget};
pub use resolver::{ElementResolver, ResolveOptions};
pub use wait::WaitCoordinator;
