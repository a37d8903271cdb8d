use super::{read_document, upsert_flat};
use crate::component::{AdminContext, Component, Record, RecordOutcome, ResolvedSource};
use crate::error::ComponentError;
use serde_json::Value;

pub(super) const ALIAS: &str = "customer_groups";
const TABLE: &str = "customer_group";

/// Customer groups from a YAML `customer_groups` list, keyed by `code`.
#[derive(Debug, Default)]
pub struct CustomerGroups;

impl CustomerGroups {
    pub fn new() -> Self {
        Self
    }
}

impl Component for CustomerGroups {
    fn alias(&self) -> &'static str {
        ALIAS
    }

    fn name(&self) -> &'static str {
        "Customer Groups"
    }

    fn description(&self) -> &'static str {
        "Component to import customer groups."
    }

    fn required_fields(&self) -> &[&'static str] {
        &["code"]
    }

    fn parse_data(
        &mut self,
        _admin: &AdminContext,
        source: &ResolvedSource,
    ) -> Result<Vec<Record>, ComponentError> {
        let source_ref = source.reference().as_str();
        let document = read_document(source)?;
        let Some(groups) = document.get("customer_groups") else {
            return Ok(Vec::new());
        };
        let groups = groups.as_array().ok_or_else(|| {
            ComponentError::parse(source_ref, "`customer_groups` must be a list")
        })?;
        let mut records = Vec::with_capacity(groups.len());
        for (index, group) in groups.iter().enumerate() {
            let Value::Object(fields) = group else {
                return Err(ComponentError::parse(
                    source_ref,
                    format!("customer group entry {} is not a mapping", index + 1),
                ));
            };
            let key = fields
                .get("code")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("customer group entry {}", index + 1));
            records.push(Record::new(key, fields.clone()));
        }
        Ok(records)
    }

    fn process_record(
        &mut self,
        admin: &mut AdminContext,
        record: Record,
    ) -> Result<RecordOutcome, ComponentError> {
        let code = record
            .get_str("code")
            .ok_or_else(|| ComponentError::record(&record.key, "`code` must be a string"))?
            .to_string();
        let (outcome, id) = upsert_flat(admin, TABLE, &code, record.fields)?;
        if outcome != RecordOutcome::Unchanged {
            tracing::info!("{code} ({id})");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Importer;
    use crate::master::SourceRef;
    use serde_json::json;
    use std::fs;

    #[test]
    fn groups_are_keyed_by_code_and_missing_code_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("groups.yaml"),
            "customer_groups:\n  - code: Trade\n    tax_class_id: 3\n  - tax_class_id: 4\n  - code: Retail\n",
        )
        .expect("write fixture");
        let mut admin = AdminContext::for_root(dir.path());
        let mut importer = Importer::new(Box::new(CustomerGroups::new()));
        let summary = importer
            .set_source(SourceRef::from("groups.yaml"))
            .process(&mut admin)
            .expect("process");

        assert_eq!(summary.created, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(
            summary.failures[0].error.to_string(),
            "required data missing for 'customer group entry 2': code"
        );
        let trade = admin
            .store()
            .get(TABLE, "Trade")
            .expect("get")
            .expect("trade");
        assert_eq!(trade.get("tax_class_id"), Some(&json!(3)));
    }

    #[test]
    fn csv_sources_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("groups.csv"), "code\nTrade\n").expect("write fixture");
        let mut admin = AdminContext::for_root(dir.path());
        let mut importer = Importer::new(Box::new(CustomerGroups::new()));
        let err = importer
            .set_source(SourceRef::from("groups.csv"))
            .process(&mut admin)
            .expect_err("csv rejected");
        assert!(matches!(err, ComponentError::UnsupportedFormat { .. }));
    }
}
