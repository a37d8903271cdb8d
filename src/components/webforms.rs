//! Web forms imported from exported JSON form definitions.
//!
//! Source layout: `identifier: [ {source: path/to/form.json, is_active: bool} ]`.
use super::{read_document, save_if_changed};
use crate::component::{
    parse_json, AdminContext, Component, Record, RecordOutcome, ResolvedSource,
};
use crate::error::ComponentError;
use crate::master::SourceRef;
use serde_json::{json, Value};

pub(super) const ALIAS: &str = "webforms";
const TABLE: &str = "webform";

#[derive(Debug, Default)]
pub struct Webforms;

impl Webforms {
    pub fn new() -> Self {
        Self
    }
}

impl Component for Webforms {
    fn alias(&self) -> &'static str {
        ALIAS
    }

    fn name(&self) -> &'static str {
        "Webforms"
    }

    fn description(&self) -> &'static str {
        "Component to create webforms."
    }

    fn required_fields(&self) -> &[&'static str] {
        &["source"]
    }

    fn default_values(&self) -> Vec<(&'static str, Value)> {
        vec![("is_active", json!(true))]
    }

    fn parse_data(
        &mut self,
        _admin: &AdminContext,
        source: &ResolvedSource,
    ) -> Result<Vec<Record>, ComponentError> {
        let source_ref = source.reference().as_str();
        let identifiers = match read_document(source)? {
            Value::Null => return Ok(Vec::new()),
            Value::Object(identifiers) => identifiers,
            _ => {
                return Err(ComponentError::parse(
                    source_ref,
                    "expected a mapping of form identifiers",
                ))
            }
        };
        let mut records = Vec::new();
        for (identifier, forms) in identifiers {
            let Value::Array(forms) = forms else {
                return Err(ComponentError::parse(
                    source_ref,
                    format!("form '{identifier}' must be a list"),
                ));
            };
            for form in forms {
                let Value::Object(fields) = form else {
                    return Err(ComponentError::parse(
                        source_ref,
                        format!("form '{identifier}' entries must be mappings"),
                    ));
                };
                records.push(Record::new(identifier.clone(), fields));
            }
        }
        Ok(records)
    }

    fn process_record(
        &mut self,
        admin: &mut AdminContext,
        record: Record,
    ) -> Result<RecordOutcome, ComponentError> {
        let identifier = record.key.as_str();
        let reference = record
            .get_str("source")
            .ok_or_else(|| ComponentError::record(identifier, "`source` must be a path or URL"))?;
        let form_source = admin.resolve_source(&SourceRef::new(reference));
        let definition = parse_json(&form_source, &form_source.read_to_string()?)?;
        let name = definition
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ComponentError::record(identifier, format!("form definition {reference} has no name"))
            })?
            .to_string();
        let is_active = record.get("is_active").cloned().unwrap_or(json!(true));

        let store = admin.store();
        let mut form = store.get_or_new(TABLE, identifier)?;
        form.set("name", json!(name));
        form.set("is_active", is_active);
        form.set("definition", definition);
        let (outcome, id) = save_if_changed(store, TABLE, identifier, form)?;
        if outcome != RecordOutcome::Unchanged {
            tracing::debug!("Form \"{name}\" ({id}) successfully imported.");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Importer;
    use std::fs;

    #[test]
    fn imports_form_definition_and_reports_bad_ones() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("contact.json"),
            r#"{"name": "Contact us", "fields": [{"code": "email"}]}"#,
        )
        .expect("write form");
        fs::write(dir.path().join("broken.json"), "{not json").expect("write form");
        fs::write(dir.path().join("nameless.json"), r#"{"fields": []}"#).expect("write form");
        fs::write(
            dir.path().join("webforms.yaml"),
            "contact:\n  - source: contact.json\nbroken:\n  - source: broken.json\nnameless:\n  - source: nameless.json\n    is_active: false\n",
        )
        .expect("write source");
        let mut admin = AdminContext::for_root(dir.path());

        let mut importer = Importer::new(Box::new(Webforms::new()));
        let summary = importer
            .set_source(SourceRef::from("webforms.yaml"))
            .process(&mut admin)
            .expect("process webforms");

        assert_eq!(summary.created, 1);
        assert_eq!(summary.failures.len(), 2);
        assert!(matches!(
            summary.failures[0].error,
            ComponentError::Parse { .. }
        ));
        assert!(summary.failures[1].error.to_string().contains("has no name"));

        let contact = admin
            .store()
            .get(TABLE, "contact")
            .expect("get")
            .expect("contact form");
        assert_eq!(contact.get("name"), Some(&json!("Contact us")));
        assert_eq!(contact.get("is_active"), Some(&json!(true)));
    }
}
