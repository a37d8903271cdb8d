//! Typed paths into a project layout.
//!
//! Centralizing path construction keeps file access consistent across
//! commands and lets `configurator.json` relocate the master file and state.
use crate::config::{ProjectConfig, DEFAULT_MASTER_REL, DEFAULT_MEDIA_REL, DEFAULT_STATE_REL};
use std::path::{Path, PathBuf};

/// File name of the optional project config at the root.
pub const CONFIG_FILE_NAME: &str = "configurator.json";

/// Convenience wrapper for locating project artifacts.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
    master_rel: String,
    state_rel: String,
    media_rel: String,
}

impl ProjectPaths {
    /// Paths as relocated by a loaded config.
    pub fn new(root: PathBuf, config: &ProjectConfig) -> Self {
        Self {
            root,
            master_rel: config.master.clone(),
            state_rel: config.state_dir.clone(),
            media_rel: config.media_dir.clone(),
        }
    }

    /// Paths for the default layout.
    pub fn with_defaults(root: PathBuf) -> Self {
        Self {
            root,
            master_rel: DEFAULT_MASTER_REL.to_string(),
            state_rel: DEFAULT_STATE_REL.to_string(),
            media_rel: DEFAULT_MEDIA_REL.to_string(),
        }
    }

    /// Return the project root sources are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `configurator.json` path.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Return the master definition path.
    pub fn master_path(&self) -> PathBuf {
        self.root.join(&self.master_rel)
    }

    /// Return the state directory holding the ledger, history, and store.
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(&self.state_rel)
    }

    /// Return the `versions.json` ledger path.
    pub fn ledger_path(&self) -> PathBuf {
        self.state_dir().join("versions.json")
    }

    /// Return the `runs.jsonl` history path.
    pub fn history_path(&self) -> PathBuf {
        self.state_dir().join("runs.jsonl")
    }

    /// Return the entity store directory.
    pub fn store_dir(&self) -> PathBuf {
        self.state_dir().join("store")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.root.join(&self.media_rel)
    }
}
