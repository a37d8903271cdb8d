use crate::config::load_config;
use crate::error::DefinitionError;
use crate::ledger::JsonLedger;
use crate::master::MasterDefinition;
use crate::paths::ProjectPaths;
use crate::registry::ComponentRegistry;
use anyhow::Result;
use std::path::Path;

/// Everything a command needs about one project.
pub struct ProjectContext {
    pub paths: ProjectPaths,
    pub registry: ComponentRegistry,
}

impl ProjectContext {
    /// Read `configurator.json` under `root` and register built-in components.
    pub fn load(root: &Path) -> Result<Self> {
        let config = load_config(root)?;
        Ok(Self {
            paths: ProjectPaths::new(root.to_path_buf(), &config),
            registry: ComponentRegistry::with_builtin(),
        })
    }

    pub fn load_master(&self) -> Result<MasterDefinition, DefinitionError> {
        MasterDefinition::load(&self.paths.master_path(), &self.registry)
    }

    pub fn open_ledger(&self) -> JsonLedger {
        JsonLedger::open(self.paths.ledger_path())
    }
}
