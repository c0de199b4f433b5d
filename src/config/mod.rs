//! Runtime configuration: undo window, page size, notification timing.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::Config;
