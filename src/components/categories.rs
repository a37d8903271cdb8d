//! Category trees under a store group's root category.
//!
//! Source layout:
//!
//! ```yaml
//! categories:
//!   - store_group: Main Website Store
//!     new_root: true
//!     categories:
//!       - name: Shoes
//!         categories:
//!           - name: Boots
//! ```
//!
//! A category is keyed by its parent's key plus its name, so the same name may
//! appear under different parents.
use super::{read_document, save_if_changed};
use crate::component::{AdminContext, Component, Record, RecordOutcome, ResolvedSource};
use crate::error::ComponentError;
use crate::master::SourceRef;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::fs;

pub(super) const ALIAS: &str = "categories";
const TABLE: &str = "catalog_category";
const MEDIA_SUBDIR: &str = "catalog/category";

pub struct Categories {
    non_slug: Regex,
    spaces: Regex,
}

impl Categories {
    pub fn new() -> Result<Self, ComponentError> {
        Ok(Self {
            non_slug: compile(r"[^a-z0-9 ]")?,
            spaces: compile(r" +")?,
        })
    }

    /// Lowercase, strip everything but letters, digits, and spaces, then
    /// hyphenate runs of spaces.
    fn url_key(&self, name: &str) -> String {
        let lower = name.to_lowercase();
        let stripped = self.non_slug.replace_all(&lower, "");
        self.spaces.replace_all(stripped.trim(), "-").into_owned()
    }

    fn upsert_root(
        &self,
        admin: &mut AdminContext,
        store_group: &str,
        record: &Record,
        tally: &mut Tally,
    ) -> Result<(), ComponentError> {
        let store = admin.store();
        let mut root = store.get_or_new(TABLE, store_group)?;
        root.set("name", json!(store_group));
        root.set("is_active", json!(true));
        root.set("url_key", json!(self.url_key(store_group)));
        root.set("level", json!(1));
        root.set("path", json!(store_group));
        if let Some(store_id) = record.get("root_store_id") {
            root.set("store_id", store_id.clone());
        }
        let (outcome, id) = save_if_changed(store, TABLE, store_group, root)?;
        if outcome == RecordOutcome::Created {
            tracing::info!("Created root category {store_group} ({id})");
        }
        tally.note(outcome);
        Ok(())
    }

    fn upsert_children(
        &self,
        admin: &mut AdminContext,
        parent_key: &str,
        level: u64,
        children: &Value,
        tally: &mut Tally,
    ) -> Result<(), ComponentError> {
        let children = children.as_array().ok_or_else(|| {
            ComponentError::record(parent_key, "`categories` must be a list")
        })?;
        for child in children {
            let fields = child.as_object().ok_or_else(|| {
                ComponentError::record(parent_key, "category entries must be mappings")
            })?;
            let name = fields
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| ComponentError::MissingField {
                    key: parent_key.to_string(),
                    field: "name".to_string(),
                })?;
            let key = format!("{parent_key}/{name}");
            let attributes = self.attributes(admin, &key, name, fields, level);

            let store = admin.store();
            let mut category = store.get_or_new(TABLE, &key)?;
            for (attribute, value) in attributes {
                category.set(&attribute, value);
            }
            category.set("parent", json!(parent_key));
            category.set("level", json!(level + 1));
            category.set("path", json!(key));
            let (outcome, id) = save_if_changed(store, TABLE, &key, category)?;
            match outcome {
                RecordOutcome::Unchanged => {
                    tracing::debug!(depth = level, "Category {name} ({id}) is up to date")
                }
                _ => tracing::info!(depth = level, "Updated category {name} ({id})"),
            }
            tally.note(outcome);

            if let Some(grandchildren) = fields.get("categories") {
                self.upsert_children(admin, &key, level + 1, grandchildren, tally)?;
            }
        }
        Ok(())
    }

    /// Attributes to write for one category, with defaults and the image copied.
    fn attributes(
        &self,
        admin: &AdminContext,
        key: &str,
        name: &str,
        fields: &Map<String, Value>,
        level: u64,
    ) -> Map<String, Value> {
        let mut attributes = Map::new();
        for (attribute, value) in fields {
            match attribute.as_str() {
                "categories" => {}
                "image" => {
                    if let Some(image) = copy_image(admin, key, value, level) {
                        attributes.insert("image".to_string(), json!(image));
                    }
                }
                _ => {
                    attributes.insert(attribute.clone(), value.clone());
                }
            }
        }
        if !attributes.contains_key("is_active") {
            attributes.insert("is_active".to_string(), json!(true));
        }
        if !attributes.contains_key("url_key") {
            attributes.insert("url_key".to_string(), json!(self.url_key(name)));
        }
        attributes
    }
}

impl Component for Categories {
    fn alias(&self) -> &'static str {
        ALIAS
    }

    fn name(&self) -> &'static str {
        "Categories"
    }

    fn description(&self) -> &'static str {
        "Component to import categories."
    }

    fn required_fields(&self) -> &[&'static str] {
        &["store_group"]
    }

    fn parse_data(
        &mut self,
        _admin: &AdminContext,
        source: &ResolvedSource,
    ) -> Result<Vec<Record>, ComponentError> {
        let source_ref = source.reference().as_str();
        let document = read_document(source)?;
        let groups = match document.get("categories") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(groups)) => groups,
            Some(_) => {
                return Err(ComponentError::parse(
                    source_ref,
                    "`categories` must be a list of store groups",
                ))
            }
        };
        groups
            .iter()
            .enumerate()
            .map(|(index, group)| {
                let Value::Object(fields) = group else {
                    return Err(ComponentError::parse(
                        source_ref,
                        format!("store group entry {} is not a mapping", index + 1),
                    ));
                };
                let key = fields
                    .get("store_group")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("store group entry {}", index + 1));
                Ok(Record::new(key, fields.clone()))
            })
            .collect()
    }

    fn process_record(
        &mut self,
        admin: &mut AdminContext,
        record: Record,
    ) -> Result<RecordOutcome, ComponentError> {
        let store_group = record
            .get_str("store_group")
            .ok_or_else(|| ComponentError::record(&record.key, "`store_group` must be a name"))?
            .to_string();
        let new_root = record
            .get("new_root")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let mut tally = Tally::default();
        if new_root {
            self.upsert_root(admin, &store_group, &record, &mut tally)?;
        } else if admin.store().get(TABLE, &store_group)?.is_none() {
            return Err(ComponentError::record(
                &store_group,
                format!("no root category was found for the store group \"{store_group}\""),
            ));
        }

        if let Some(children) = record.get("categories") {
            tracing::info!("Updating categories for \"{store_group}\"");
            self.upsert_children(admin, &store_group, 1, children, &mut tally)?;
        }
        Ok(tally.outcome())
    }
}

fn compile(pattern: &str) -> Result<Regex, ComponentError> {
    Regex::new(pattern).map_err(|err| ComponentError::Construction(err.to_string()))
}

/// Copy a category image into the media directory, returning its file name.
fn copy_image(admin: &AdminContext, key: &str, value: &Value, depth: u64) -> Option<String> {
    let Some(reference) = value.as_str() else {
        tracing::error!(depth, category = key, "image must be a path or URL");
        return None;
    };
    let trimmed = reference.split(['?', '#']).next().unwrap_or(reference);
    let file_name = trimmed.rsplit('/').next().filter(|name| !name.is_empty())?;

    let source = admin.resolve_source(&SourceRef::new(reference));
    let target_dir = admin.media_dir().join(MEDIA_SUBDIR);
    let copied = source.read_bytes().and_then(|bytes| {
        fs::create_dir_all(&target_dir)
            .and_then(|()| fs::write(target_dir.join(file_name), bytes))
            .map_err(|source| ComponentError::Resource {
                key: key.to_string(),
                path: target_dir.join(file_name),
                source,
            })
    });
    match copied {
        Ok(()) => Some(file_name.to_string()),
        Err(err) => {
            tracing::error!(depth, category = key, "Failed to find image: {reference} ({err})");
            None
        }
    }
}

/// Aggregates the outcomes of every category touched by one store group.
#[derive(Debug, Default)]
struct Tally {
    created: usize,
    updated: usize,
}

impl Tally {
    fn note(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Unchanged => {}
        }
    }

    fn outcome(&self) -> RecordOutcome {
        if self.created > 0 {
            RecordOutcome::Created
        } else if self.updated > 0 {
            RecordOutcome::Updated
        } else {
            RecordOutcome::Unchanged
        }
    }
}
