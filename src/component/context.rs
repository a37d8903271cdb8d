use super::ResolvedSource;
use crate::error::ComponentError;
use crate::master::SourceRef;
use crate::paths::ProjectPaths;
use crate::store::EntityStore;
use std::fs;
use std::path::{Path, PathBuf};

/// Capability handed to every component call: project root, target store,
/// and media directory. Components never reach for global state.
#[derive(Debug)]
pub struct AdminContext {
    root: PathBuf,
    store: EntityStore,
    media_dir: PathBuf,
}

impl AdminContext {
    pub fn new(paths: &ProjectPaths) -> Self {
        Self {
            root: paths.root().to_path_buf(),
            store: EntityStore::open(paths.store_dir()),
            media_dir: paths.media_dir(),
        }
    }

    /// Context using the default project layout under `root`.
    #[cfg(test)]
    pub fn for_root(root: &Path) -> Self {
        Self::new(&ProjectPaths::with_defaults(root.to_path_buf()))
    }

    pub fn store(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Interpret a source locator relative to the project root.
    pub fn resolve_source(&self, source: &SourceRef) -> ResolvedSource {
        ResolvedSource::resolve(source, &self.root)
    }

    /// Resolve a file referenced from inside a record.
    pub fn resolve_path(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Read a file referenced from inside a record.
    pub fn read_resource(&self, key: &str, reference: &str) -> Result<String, ComponentError> {
        let path = self.resolve_path(reference);
        fs::read_to_string(&path).map_err(|source| ComponentError::Resource {
            key: key.to_string(),
            path,
            source,
        })
    }
}
