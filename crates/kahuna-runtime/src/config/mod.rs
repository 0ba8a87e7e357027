//! Driver configuration: schema, layered loading, validation.

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{KahunaConfig, RecordConfig, MIN_POLL_INTERVAL_MS};
