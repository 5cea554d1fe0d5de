//! Configuration loading and schema

mod loader;
mod schema;

pub use loader::load_config;
pub use schema::{ApplicationConfig, IdentityConfig, LoggingConfig, RegsimConfig};
