//! Built-in component implementations.
//!
//! Each component stores its entities in one table of the [`EntityStore`]
//! keyed by a natural key, and only writes attributes whose value differs.
mod categories;
mod customer_groups;
mod customers;
mod pages;
mod webforms;

pub use categories::Categories;
pub use customer_groups::CustomerGroups;
pub use customers::Customers;
pub use pages::Pages;
pub use webforms::Webforms;

use crate::component::{
    parse_json, parse_yaml, AdminContext, RecordOutcome, ResolvedSource, SourceFormat,
};
use crate::error::ComponentError;
use crate::registry::ComponentRegistry;
use crate::store::{Entity, EntityStore};
use serde_json::Value;

/// Register every built-in component in display order.
pub fn register_builtin(registry: &mut ComponentRegistry) {
    registry
        .register(pages::ALIAS, || Ok(Box::new(Pages::new())))
        .register(categories::ALIAS, || Ok(Box::new(Categories::new()?)))
        .register(customer_groups::ALIAS, || Ok(Box::new(CustomerGroups::new())))
        .register(customers::ALIAS, || Ok(Box::new(Customers::new())))
        .register(webforms::ALIAS, || Ok(Box::new(Webforms::new())));
}

/// Read a YAML or JSON source into a value tree.
fn read_document(source: &ResolvedSource) -> Result<Value, ComponentError> {
    let format = source.expect_format(&[SourceFormat::Yaml, SourceFormat::Json], "yaml or json")?;
    let text = source.read_to_string()?;
    match format {
        SourceFormat::Json => parse_json(source, &text),
        _ => parse_yaml(source, &text),
    }
}

/// Persist `entity` if anything differs and report what happened.
fn save_if_changed(
    store: &mut EntityStore,
    table: &str,
    key: &str,
    entity: Entity,
) -> Result<(RecordOutcome, u64), ComponentError> {
    if !entity.has_changes() {
        return Ok((RecordOutcome::Unchanged, entity.id));
    }
    let outcome = if entity.is_new() {
        RecordOutcome::Created
    } else {
        RecordOutcome::Updated
    };
    let id = store.save(table, key, entity)?;
    Ok((outcome, id))
}

/// Save a flat record where every field maps straight onto an attribute.
fn upsert_flat(
    admin: &mut AdminContext,
    table: &str,
    key: &str,
    fields: serde_json::Map<String, Value>,
) -> Result<(RecordOutcome, u64), ComponentError> {
    let store = admin.store();
    let mut entity = store.get_or_new(table, key)?;
    for (field, value) in fields {
        entity.set(&field, value);
    }
    save_if_changed(store, table, key, entity)
}

/// Render a scalar for log lines without JSON quoting.
fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
