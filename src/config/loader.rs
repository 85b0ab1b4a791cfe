//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/wikigate/config.toml)
//! 3. Project config (.wikigate/config.toml)
//! 4. Environment variables (`WIKIGATE_` prefix, `__` between nesting
//!    levels: `WIKIGATE_CONFLUENCE__API_TOKEN`)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::Config;
use crate::types::{GateError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // Double underscore separates nesting levels, since the leaf
        // keys themselves contain underscores:
        // WIKIGATE_CONFLUENCE__API_TOKEN -> confluence.api_token
        figment = figment.merge(Env::prefixed("WIKIGATE_").split("__").lowercase(true));

        let mut config: Config = figment
            .extract()
            .map_err(|e| GateError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| GateError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/wikigate/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("wikigate"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".wikigate/config.toml")
    }

    /// Write a starter config file to `path`.
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn init(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(GateError::Config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        // api_token is never serialized; add it as a commented line so
        // the template documents the full shape.
        let mut template = toml::to_string_pretty(&Config::default())
            .map_err(|e| GateError::Config(format!("Failed to render config template: {}", e)))?;
        template.push_str("# api_token = \"your-api-token\"\n");

        std::fs::write(path, template)?;
        Ok(())
    }

    /// Print resolved config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        if let Some(global) = Self::global_config_path() {
            println!("  global:  {}", global.display());
        }
        println!("  project: {}", Self::project_config_path().display());
    }
}
