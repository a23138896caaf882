pub mod error;
pub mod hub;
pub mod metrics;
pub mod queue;
pub mod settings;

pub use error::{ConfigError, HubError};
pub use hub::{ErrorHub, LoadErrorHub, null::NullErrorHub};
pub use settings::{HubConfig, HubSettings};
