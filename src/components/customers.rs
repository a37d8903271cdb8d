use super::upsert_flat;
use crate::component::{
    parse_csv, AdminContext, Component, Record, RecordOutcome, ResolvedSource, SourceFormat,
};
use crate::error::ComponentError;

pub(super) const ALIAS: &str = "customers";
const TABLE: &str = "customer";

/// Customers from a CSV whose header row names the attribute codes, keyed by
/// `email`.
#[derive(Debug, Default)]
pub struct Customers;

impl Customers {
    pub fn new() -> Self {
        Self
    }
}

impl Component for Customers {
    fn alias(&self) -> &'static str {
        ALIAS
    }

    fn name(&self) -> &'static str {
        "Customers"
    }

    fn description(&self) -> &'static str {
        "Component to import customers using a CSV file."
    }

    fn required_fields(&self) -> &[&'static str] {
        &["email"]
    }

    fn parse_data(
        &mut self,
        _admin: &AdminContext,
        source: &ResolvedSource,
    ) -> Result<Vec<Record>, ComponentError> {
        source.expect_format(&[SourceFormat::Csv], "csv")?;
        let text = source.read_to_string()?;
        let rows = parse_csv(source, &text)?;
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(index, mut fields)| {
                fields.retain(|_, value| value.as_str().is_some_and(|text| !text.is_empty()));
                let key = fields
                    .get("email")
                    .and_then(|value| value.as_str())
                    .map(str::to_string)
                    // header row is line 1
                    .unwrap_or_else(|| format!("row {}", index + 2));
                Record::new(key, fields)
            })
            .collect())
    }

    fn process_record(
        &mut self,
        admin: &mut AdminContext,
        record: Record,
    ) -> Result<RecordOutcome, ComponentError> {
        let email = record.key.to_ascii_lowercase();
        let name = [record.get_str("firstname"), record.get_str("lastname")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let (outcome, id) = upsert_flat(admin, TABLE, &email, record.fields)?;
        if outcome != RecordOutcome::Unchanged {
            tracing::info!("{name} {email} ({id})");
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

    fn import(admin: &mut AdminContext) -> crate::component::ProcessSummary {
        let mut importer = Importer::new(Box::new(Customers::new()));
        importer
            .set_source(SourceRef::from("customers.csv"))
            .process(admin)
            .expect("process customers")
    }

    #[test]
    fn rows_without_email_fail_and_others_import() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("customers.csv"),
            "email,firstname,lastname,group_id\nAnn@Example.com,Ann,Lee,1\n,Nobody,,1\nbob@example.com,Bob,,2\n",
        )
        .expect("write fixture");
        let mut admin = AdminContext::for_root(dir.path());

        let summary = import(&mut admin);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].key, "row 3");

        let ann = admin
            .store()
            .get(TABLE, "ann@example.com")
            .expect("get")
            .expect("ann");
        assert_eq!(ann.get("group_id"), Some(&json!("1")));
        assert_eq!(ann.get("firstname"), Some(&json!("Ann")));
    }

    #[test]
    fn reimport_only_updates_changed_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("customers.csv");
        fs::write(&path, "email,firstname\nann@example.com,Ann\nbob@example.com,Bob\n")
            .expect("write fixture");
        let mut admin = AdminContext::for_root(dir.path());
        import(&mut admin);

        fs::write(&path, "email,firstname\nann@example.com,Anne\nbob@example.com,Bob\n")
            .expect("rewrite fixture");
        let summary = import(&mut admin);
        assert_eq!((summary.created, summary.updated, summary.unchanged), (0, 1, 1));
    }
}
