//! File-backed entity store standing in for the target system.
//!
//! Each table is one JSON document of `key -> entity`. Every save rewrites the
//! table atomically, so a crash leaves each record either applied or not.
use crate::error::StoreError;
use crate::util::{read_optional, write_json_atomic};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A stored entity: numeric id plus attribute map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(skip)]
    changed: bool,
}

impl Entity {
    /// Not yet saved.
    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Set an attribute, returning whether the stored value differed.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        if self.data.get(key) == Some(&value) {
            return false;
        }
        self.data.insert(key.to_string(), value);
        self.changed = true;
        true
    }

    /// Whether any attribute changed since load, or the entity is new.
    pub fn has_changes(&self) -> bool {
        self.changed || self.is_new()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Table {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    rows: BTreeMap<String, Entity>,
}

/// Lazily loaded collection of entity tables under one directory.
#[derive(Debug)]
pub struct EntityStore {
    dir: PathBuf,
    tables: BTreeMap<String, Table>,
}

impl EntityStore {
    pub fn open(dir: PathBuf) -> Self {
        Self {
            dir,
            tables: BTreeMap::new(),
        }
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.json"))
    }

    fn table(&mut self, table: &str) -> Result<&mut Table, StoreError> {
        if !self.tables.contains_key(table) {
            let path = self.table_path(table);
            let loaded = match read_optional(&path)
                .map_err(|source| StoreError::Read { path: path.clone(), source })?
            {
                Some(bytes) => serde_json::from_slice(&bytes)
                    .map_err(|source| StoreError::Parse { path, source })?,
                None => Table::default(),
            };
            self.tables.insert(table.to_string(), loaded);
        }
        Ok(self.tables.entry(table.to_string()).or_default())
    }

    /// Look up an entity by natural key.
    pub fn get(&mut self, table: &str, key: &str) -> Result<Option<Entity>, StoreError> {
        Ok(self.table(table)?.rows.get(key).cloned())
    }

    /// Existing entity for `key`, or a fresh unsaved one.
    pub fn get_or_new(&mut self, table: &str, key: &str) -> Result<Entity, StoreError> {
        Ok(self.get(table, key)?.unwrap_or_default())
    }

    /// Persist `entity` under `key`, assigning an id on first save.
    ///
    /// A failed write leaves the cached table as it was before the call.
    pub fn save(&mut self, table: &str, key: &str, mut entity: Entity) -> Result<u64, StoreError> {
        let path = self.table_path(table);
        let loaded = self.table(table)?;
        let next_id = loaded.next_id;
        if entity.is_new() {
            loaded.next_id += 1;
            entity.id = loaded.next_id;
        }
        entity.changed = false;
        let id = entity.id;
        let previous = loaded.rows.insert(key.to_string(), entity);
        if let Err(source) = write_json_atomic(&path, &*loaded) {
            loaded.next_id = next_id;
            match previous {
                Some(previous) => loaded.rows.insert(key.to_string(), previous),
                None => loaded.rows.remove(key),
            };
            return Err(StoreError::Write { path, source });
        }
        Ok(id)
    }

    /// Keys of every entity in `table`, in key order.
    #[cfg(test)]
    pub fn keys(&mut self, table: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.table(table)?.rows.keys().cloned().collect())
    }

    #[cfg(test)]
    pub fn count(&mut self, table: &str) -> Result<usize, StoreError> {
        Ok(self.table(table)?.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_assigns_ids_and_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = EntityStore::open(dir.path().to_path_buf());

        let mut page = Entity::default();
        page.set("title", json!("Home"));
        let first = store.save("pages", "home", page).expect("save home");
        let second = store
            .save("pages", "about", Entity::default())
            .expect("save about");
        assert_eq!((first, second), (1, 2));

        let mut reopened = EntityStore::open(dir.path().to_path_buf());
        let home = reopened.get("pages", "home").expect("get").expect("home exists");
        assert_eq!(home.id, 1);
        assert_eq!(home.get("title"), Some(&json!("Home")));
        assert!(!home.has_changes());
        assert_eq!(reopened.keys("pages").expect("keys"), vec!["about", "home"]);
    }

    #[test]
    fn failed_write_leaves_cached_table_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let table_path = dir.path().join("pages.json");
        let mut store = EntityStore::open(dir.path().to_path_buf());
        let mut home = Entity::default();
        home.set("title", json!("Home"));
        store.save("pages", "home", home).expect("save home");

        // A directory in place of the table file makes the rename fail.
        std::fs::remove_file(&table_path).expect("remove table");
        std::fs::create_dir(&table_path).expect("block table path");

        let mut renamed = store.get_or_new("pages", "home").expect("get home");
        renamed.set("title", json!("Start"));
        let err = store.save("pages", "home", renamed).expect_err("update fails");
        assert!(matches!(err, StoreError::Write { .. }));
        let err = store
            .save("pages", "about", Entity::default())
            .expect_err("insert fails");
        assert!(matches!(err, StoreError::Write { .. }));

        assert!(store.get("pages", "about").expect("get about").is_none());
        let home = store.get("pages", "home").expect("get").expect("home kept");
        assert_eq!(home.id, 1);
        assert_eq!(home.get("title"), Some(&json!("Home")));

        std::fs::remove_dir(&table_path).expect("unblock table path");
        let about = store
            .save("pages", "about", Entity::default())
            .expect("save about");
        assert_eq!(about, 2);
        let mut reopened = EntityStore::open(dir.path().to_path_buf());
        assert_eq!(reopened.keys("pages").expect("keys"), vec!["about", "home"]);
    }

    #[test]
    fn set_reports_only_real_differences() {
        let mut entity = Entity {
            id: 7,
            ..Entity::default()
        };
        assert!(entity.set("name", json!("Shoes")));
        entity.changed = false;
        assert!(!entity.set("name", json!("Shoes")));
        assert!(!entity.has_changes());
        assert!(entity.set("name", json!("Boots")));
        assert!(entity.has_changes());
    }

    #[test]
    fn corrupt_table_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("pages.json"), "{not json").expect("write");
        let mut store = EntityStore::open(dir.path().to_path_buf());
        let err = store.get("pages", "home").expect_err("corrupt");
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
