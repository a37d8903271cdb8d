//! Master definition: the versioned manifest of components to apply.
//!
//! A definition is loaded and validated once per run and stays immutable
//! afterwards. Version order and per-version component order are execution
//! order.
mod load;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Ordered version key of the master definition and the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionNumber(u32);

impl VersionNumber {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[cfg(test)]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VersionNumber {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Self)
    }
}

/// Opaque locator handed to a component (file path or URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Sources that only apply when running against one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    pub sources: Vec<SourceRef>,
}

/// One component entry within a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentConfig {
    pub enabled: bool,
    pub sources: Vec<SourceRef>,
    pub env: IndexMap<String, EnvOverlay>,
}

impl ComponentConfig {
    /// Count of generic sources plus every environment overlay's sources.
    pub fn total_sources(&self) -> usize {
        self.sources.len()
            + self
                .env
                .values()
                .map(|overlay| overlay.sources.len())
                .sum::<usize>()
    }

    /// Overlay sources for `environment`, if the entry has that branch.
    pub fn overlay(&self, environment: &str) -> Option<&EnvOverlay> {
        self.env.get(environment)
    }

    /// Generic sources followed by the environment overlay, in run order.
    pub fn sources_for<'a>(&'a self, environment: &str) -> impl Iterator<Item = &'a SourceRef> {
        let overlay = self
            .overlay(environment)
            .map(|overlay| overlay.sources.as_slice())
            .unwrap_or_default();
        self.sources.iter().chain(overlay.iter())
    }
}

/// Component entries of one version, keyed by alias in declared order.
pub type ComponentSet = IndexMap<String, ComponentConfig>;

/// Validated master definition.
#[derive(Debug, Clone)]
pub struct MasterDefinition {
    path: PathBuf,
    versions: BTreeMap<VersionNumber, ComponentSet>,
}

impl MasterDefinition {
    /// Path the definition was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Versions in ascending order.
    pub fn versions(&self) -> impl Iterator<Item = VersionNumber> + '_ {
        self.versions.keys().copied()
    }

    pub fn components(&self, version: VersionNumber) -> Option<&ComponentSet> {
        self.versions.get(&version)
    }

    pub fn version_count(&self) -> usize {
        self.versions.len()
    }
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
