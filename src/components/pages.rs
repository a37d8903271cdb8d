//! CMS pages keyed by identifier and store scope.
//!
//! Source layout: `identifier: { page: [ {title, content | source, stores, ...} ] }`.
//! A `source` field names a file whose contents become the page `content`.
use super::{display_value, read_document, save_if_changed};
use crate::component::{AdminContext, Component, Record, RecordOutcome, ResolvedSource};
use crate::error::ComponentError;
use serde_json::{json, Map, Value};

pub(super) const ALIAS: &str = "pages";
const TABLE: &str = "cms_page";
const ALL_STORES: &str = "all";

#[derive(Debug, Default)]
pub struct Pages;

impl Pages {
    pub fn new() -> Self {
        Self
    }
}

impl Component for Pages {
    fn alias(&self) -> &'static str {
        ALIAS
    }

    fn name(&self) -> &'static str {
        "Pages"
    }

    fn description(&self) -> &'static str {
        "Component to create/maintain pages."
    }

    fn required_fields(&self) -> &[&'static str] {
        &["title"]
    }

    fn default_values(&self) -> Vec<(&'static str, Value)> {
        vec![("page_layout", json!("empty")), ("is_active", json!(true))]
    }

    fn parse_data(
        &mut self,
        _admin: &AdminContext,
        source: &ResolvedSource,
    ) -> Result<Vec<Record>, ComponentError> {
        let source_ref = source.reference().as_str();
        let document = read_document(source)?;
        let identifiers = match document {
            Value::Null => return Ok(Vec::new()),
            Value::Object(identifiers) => identifiers,
            _ => {
                return Err(ComponentError::parse(
                    source_ref,
                    "expected a mapping of page identifiers",
                ))
            }
        };

        let mut records = Vec::new();
        for (identifier, entry) in identifiers {
            let Some(pages) = entry.get("page").and_then(Value::as_array) else {
                return Err(ComponentError::parse(
                    source_ref,
                    format!("page '{identifier}' has no `page` list"),
                ));
            };
            for page in pages {
                let Value::Object(fields) = page else {
                    return Err(ComponentError::parse(
                        source_ref,
                        format!("page '{identifier}' entries must be mappings"),
                    ));
                };
                records.push(Record::new(identifier.clone(), fields.clone()));
            }
        }
        Ok(records)
    }

    fn process_record(
        &mut self,
        admin: &mut AdminContext,
        record: Record,
    ) -> Result<RecordOutcome, ComponentError> {
        let identifier = record.key;
        let stores = store_codes(&identifier, record.fields.get("stores"))?;
        let key = if stores.is_empty() {
            format!("{identifier}@{ALL_STORES}")
        } else {
            format!("{identifier}@{}", stores.join(","))
        };

        let mut attributes = Map::new();
        attributes.insert("identifier".to_string(), json!(identifier));
        for (field, value) in record.fields {
            match field.as_str() {
                "stores" => continue,
                "source" => {
                    let reference = value.as_str().ok_or_else(|| {
                        ComponentError::record(&identifier, "`source` must be a file path")
                    })?;
                    let content = admin.read_resource(&identifier, reference)?;
                    attributes.insert("content".to_string(), Value::String(content));
                }
                _ => {
                    attributes.insert(field, value);
                }
            }
        }
        let scopes = if stores.is_empty() {
            vec![ALL_STORES.to_string()]
        } else {
            stores
        };
        attributes.insert("stores".to_string(), json!(scopes));

        let store = admin.store();
        let mut page = store.get_or_new(TABLE, &key)?;
        let label = format!("{identifier} ({})", page.id);
        for (field, value) in attributes {
            tracing::debug!(
                depth = 1,
                "Checking page {label}, key {field} => {}",
                display_value(page.get(&field))
            );
            let rendered = display_value(Some(&value));
            if page.set(&field, value) {
                tracing::info!(depth = 1, "Set page {label}, key {field} => {rendered}");
            }
        }

        let (outcome, id) = save_if_changed(store, TABLE, &key, page)?;
        if outcome != RecordOutcome::Unchanged {
            tracing::info!("Save page {identifier} ({id})");
        }
        Ok(outcome)
    }
}

/// Sorted, de-duplicated store codes; a single string is one code.
fn store_codes(identifier: &str, stores: Option<&Value>) -> Result<Vec<String>, ComponentError> {
    let mut codes = match stores {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(code)) => vec![code.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(code) => Ok(code.clone()),
                Value::Number(number) => Ok(number.to_string()),
                _ => Err(ComponentError::record(
                    identifier,
                    "`stores` entries must be store codes",
                )),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(ComponentError::record(
                identifier,
                "`stores` must be a list of store codes",
            ))
        }
    };
    codes.sort();
    codes.dedup();
    Ok(codes)
}
