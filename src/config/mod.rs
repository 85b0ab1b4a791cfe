//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/wikigate/config.toml)
//! 3. Project config (.wikigate/config.toml)
//! 4. Environment variables (WIKIGATE_CONFLUENCE__*)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
