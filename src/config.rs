//! Project configuration helpers.
//!
//! `configurator.json` is optional; without it the default layout applies.
//! When present it is validated so every derived path stays inside the root.
use crate::paths::CONFIG_FILE_NAME;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current schema version for `configurator.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_MASTER_REL: &str = "app/etc/master.yaml";
pub const DEFAULT_STATE_REL: &str = "var/configurator";
pub const DEFAULT_MEDIA_REL: &str = "pub/media";

/// Project-level settings, all paths relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub schema_version: u32,
    #[serde(default = "default_master")]
    pub master: String,
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
}

fn default_master() -> String {
    DEFAULT_MASTER_REL.to_string()
}

fn default_state_dir() -> String {
    DEFAULT_STATE_REL.to_string()
}

fn default_media_dir() -> String {
    DEFAULT_MEDIA_REL.to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            master: default_master(),
            state_dir: default_state_dir(),
            media_dir: default_media_dir(),
        }
    }
}

/// Render a pretty JSON config stub for new projects.
pub fn config_stub() -> Result<String> {
    let text = serde_json::to_string_pretty(&ProjectConfig::default())
        .context("serialize config stub")?;
    Ok(format!("{text}\n"))
}

/// Load `configurator.json` from `root`, falling back to defaults when absent.
pub fn load_config(root: &Path) -> Result<ProjectConfig> {
    let path = root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: ProjectConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate schema version and that paths stay inside the project.
pub fn validate_config(config: &ProjectConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported configurator.json schema_version {}",
            config.schema_version
        ));
    }
    validate_relative_path(&config.master, "master")?;
    validate_relative_path(&config.state_dir, "state_dir")?;
    validate_relative_path(&config.media_dir, "media_dir")?;
    Ok(())
}

fn validate_relative_path(rel: &str, label: &str) -> Result<()> {
    if rel.trim().is_empty() {
        return Err(anyhow!("{label} must be non-empty"));
    }
    let path = Path::new(rel);
    if path.is_absolute() || has_parent_components(path) {
        return Err(anyhow!(
            "{label} must be a relative path without '..' (got {rel:?})"
        ));
    }
    Ok(())
}

fn has_parent_components(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, std::path::Component::ParentDir))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
