//! Component contract and the fixed parse → validate → apply lifecycle.
//!
//! Components only describe how to read a source into records and how to
//! apply one record; [`Importer`] drives the lifecycle so every component
//! gets the same required-field checks, defaults, and per-record containment.
mod context;
mod source;

pub use context::AdminContext;
pub use source::{parse_csv, parse_json, parse_yaml, ResolvedSource, SourceFormat};

use crate::error::ComponentError;
use crate::master::SourceRef;
use serde_json::{Map, Value};

/// One unit of input data, keyed by its natural identifier for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: String,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(key: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// What applying a record did to the target store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Created,
    Updated,
    Unchanged,
}

/// A record that failed and was skipped.
#[derive(Debug)]
pub struct RecordFailure {
    pub key: String,
    pub error: ComponentError,
}

/// Counters for one processed source.
#[derive(Debug, Default)]
pub struct ProcessSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failures: Vec<RecordFailure>,
}

impl ProcessSummary {
    fn note(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn records(&self) -> usize {
        self.created + self.updated + self.unchanged + self.failures.len()
    }
}

/// A pluggable importer for one kind of target entity.
///
/// `process_record` must look entities up by a natural key and only write
/// attributes that differ, so re-applying a version converges.
pub trait Component {
    /// Alias used in the master definition.
    fn alias(&self) -> &'static str;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Fields every record must carry before it is applied.
    fn required_fields(&self) -> &[&'static str] {
        &[]
    }

    /// Values filled in for fields a record does not carry.
    fn default_values(&self) -> Vec<(&'static str, Value)> {
        Vec::new()
    }

    /// Precondition check before parsing, by default that a file source exists.
    fn can_parse_and_process(
        &self,
        _admin: &AdminContext,
        source: &ResolvedSource,
    ) -> Result<(), ComponentError> {
        source.ensure_reachable()
    }

    /// Turn the source into records.
    fn parse_data(
        &mut self,
        admin: &AdminContext,
        source: &ResolvedSource,
    ) -> Result<Vec<Record>, ComponentError>;

    /// Create or update the entity behind one record.
    fn process_record(
        &mut self,
        admin: &mut AdminContext,
        record: Record,
    ) -> Result<RecordOutcome, ComponentError>;
}

/// Fail with the first required field `record` does not carry.
pub fn check_required_fields(required: &[&str], record: &Record) -> Result<(), ComponentError> {
    for field in required {
        if !record.fields.contains_key(*field) {
            return Err(ComponentError::MissingField {
                key: record.key.clone(),
                field: (*field).to_string(),
            });
        }
    }
    Ok(())
}

/// Fill declared defaults for absent fields; present values are kept.
pub fn set_default_fields(defaults: &[(&str, Value)], record: &mut Record) {
    for (field, value) in defaults {
        if !record.fields.contains_key(*field) {
            record.fields.insert((*field).to_string(), value.clone());
        }
    }
}

/// Drives one component instance through its sources.
pub struct Importer {
    component: Box<dyn Component>,
    source: Option<SourceRef>,
}

impl Importer {
    pub fn new(component: Box<dyn Component>) -> Self {
        Self {
            component,
            source: None,
        }
    }

    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    /// Assign the next source; no I/O happens until [`Importer::process`].
    pub fn set_source(&mut self, source: SourceRef) -> &mut Self {
        self.source = Some(source);
        self
    }

    /// Run the lifecycle for the current source.
    ///
    /// Source-level failures are returned; record-level failures are logged
    /// and collected in the summary while the remaining records continue.
    pub fn process(&mut self, admin: &mut AdminContext) -> Result<ProcessSummary, ComponentError> {
        let alias = self.component.alias();
        let source_ref = self.source.clone().ok_or_else(|| ComponentError::NoSource {
            alias: alias.to_string(),
        })?;
        let source = admin.resolve_source(&source_ref);
        tracing::debug!(component = alias, source = %source_ref, "processing source");

        self.component.can_parse_and_process(admin, &source)?;
        let records = self.component.parse_data(admin, &source)?;

        let mut summary = ProcessSummary::default();
        for record in records {
            let key = record.key.clone();
            match self.apply(admin, record) {
                Ok(outcome) => summary.note(outcome),
                Err(error) => {
                    tracing::error!(component = alias, record = %key, "{error}");
                    summary.failures.push(RecordFailure { key, error });
                }
            }
        }
        tracing::info!(
            component = alias,
            source = %source_ref,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            failed = summary.failures.len(),
            records = summary.records(),
            "source processed"
        );
        Ok(summary)
    }

    fn apply(
        &mut self,
        admin: &mut AdminContext,
        mut record: Record,
    ) -> Result<RecordOutcome, ComponentError> {
        check_required_fields(self.component.required_fields(), &record)?;
        set_default_fields(&self.component.default_values(), &mut record);
        self.component.process_record(admin, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Scripted {
        records: Vec<Record>,
        applied: Rc<RefCell<Vec<Record>>>,
    }

    impl Component for Scripted {
        fn alias(&self) -> &'static str {
            "scripted"
        }

        fn name(&self) -> &'static str {
            "Scripted"
        }

        fn description(&self) -> &'static str {
            "records what it applies"
        }

        fn required_fields(&self) -> &[&'static str] {
            &["title"]
        }

        fn default_values(&self) -> Vec<(&'static str, Value)> {
            vec![("is_active", json!(true)), ("page_layout", json!("empty"))]
        }

        fn can_parse_and_process(
            &self,
            _admin: &AdminContext,
            _source: &ResolvedSource,
        ) -> Result<(), ComponentError> {
            Ok(())
        }

        fn parse_data(
            &mut self,
            _admin: &AdminContext,
            _source: &ResolvedSource,
        ) -> Result<Vec<Record>, ComponentError> {
            Ok(self.records.clone())
        }

        fn process_record(
            &mut self,
            _admin: &mut AdminContext,
            record: Record,
        ) -> Result<RecordOutcome, ComponentError> {
            if record.key == "broken" {
                return Err(ComponentError::record(&record.key, "store rejected record"));
            }
            self.applied.borrow_mut().push(record);
            Ok(RecordOutcome::Created)
        }
    }

    fn record(key: &str, fields: Value) -> Record {
        let Value::Object(fields) = fields else {
            panic!("fields must be an object");
        };
        Record::new(key, fields)
    }

    fn scripted_importer(records: Vec<Record>) -> (Importer, Rc<RefCell<Vec<Record>>>) {
        let applied = Rc::new(RefCell::new(Vec::new()));
        let scripted = Scripted {
            records,
            applied: Rc::clone(&applied),
        };
        (Importer::new(Box::new(scripted)), applied)
    }

    #[test]
    fn missing_required_field_is_reported_and_not_applied() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut admin = AdminContext::for_root(dir.path());
        let (mut importer, applied) = scripted_importer(vec![record("home", json!({}))]);

        let summary = importer
            .set_source(SourceRef::from("pages.yaml"))
            .process(&mut admin)
            .expect("process");

        assert!(applied.borrow().is_empty());
        assert_eq!(summary.failures.len(), 1);
        match &summary.failures[0].error {
            ComponentError::MissingField { key, field } => {
                assert_eq!(key, "home");
                assert_eq!(field, "title");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn defaults_fill_absent_fields_without_overwriting() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut admin = AdminContext::for_root(dir.path());
        let (mut importer, applied) = scripted_importer(vec![record(
            "home",
            json!({"title": "Home", "page_layout": "1column"}),
        )]);

        importer
            .set_source(SourceRef::from("pages.yaml"))
            .process(&mut admin)
            .expect("process");

        let applied = applied.borrow();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].get_str("page_layout"), Some("1column"));
        assert_eq!(applied[0].get("is_active"), Some(&json!(true)));
    }

    #[test]
    fn one_failing_record_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut admin = AdminContext::for_root(dir.path());
        let (mut importer, applied) = scripted_importer(vec![
            record("broken", json!({"title": "Broken"})),
            record("about", json!({"title": "About"})),
        ]);

        let summary = importer
            .set_source(SourceRef::from("pages.yaml"))
            .process(&mut admin)
            .expect("process");

        assert_eq!(summary.created, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].key, "broken");
        assert_eq!(applied.borrow()[0].key, "about");
    }

    #[test]
    fn processing_without_a_source_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut admin = AdminContext::for_root(dir.path());
        let (mut importer, _) = scripted_importer(Vec::new());
        let err = importer.process(&mut admin).expect_err("no source");
        assert!(matches!(err, ComponentError::NoSource { .. }));
    }

    #[test]
    fn check_required_fields_names_first_missing_field() {
        let rec = record("contact", json!({"title": "Contact"}));
        assert!(check_required_fields(&["title"], &rec).is_ok());
        let err = check_required_fields(&["title", "content"], &rec).expect_err("missing");
        assert_eq!(err.to_string(), "required data missing for 'contact': content");
    }
}
