//! Error taxonomy for definition, component, ledger, and store failures.
//!
//! Definition and persistence errors end a run; component errors are logged
//! and contained at the record or source that raised them.
use crate::master::VersionNumber;
use std::fmt;
use std::path::PathBuf;

/// Fatal problems with the master definition or the requested selection.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("master definition not found at {path}; create one or set `master` in configurator.json")]
    NotFound { path: PathBuf },

    #[error("read master definition {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed master definition {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("master definition {path} has no `versions` node")]
    NoVersions { path: PathBuf },

    #[error("master definition {path} is invalid ({} problem(s)): {}", .issues.len(), join_issues(.issues))]
    Invalid {
        path: PathBuf,
        issues: Vec<DefinitionIssue>,
    },

    #[error("no definition for component '{alias}' in version {version}")]
    ComponentNotInVersion {
        alias: String,
        version: VersionNumber,
    },

    #[error("component '{alias}' is not registered")]
    UnknownComponent { alias: String },

    #[error("component '{alias}' could not be constructed: {source}")]
    Construction {
        alias: String,
        #[source]
        source: ComponentError,
    },
}

impl DefinitionError {
    /// Issues collected during validation, empty for every other variant.
    pub fn issues(&self) -> &[DefinitionIssue] {
        match self {
            DefinitionError::Invalid { issues, .. } => issues,
            _ => &[],
        }
    }
}

fn join_issues(issues: &[DefinitionIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One validation finding, located by version and component where known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionIssue {
    pub version: Option<VersionNumber>,
    pub alias: Option<String>,
    pub kind: IssueKind,
}

/// What is wrong with a version or component entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Version keys must be non-negative integers.
    InvalidVersionKey(String),
    /// Versions must be declared in strictly increasing order.
    VersionOutOfOrder { previous: VersionNumber },
    /// A version or component entry is not a mapping.
    NotAMapping,
    /// The component entry failed to deserialize.
    MalformedComponent(String),
    MissingEnabled,
    NoSources,
    UnknownComponent,
    Construction(String),
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.version, &self.alias) {
            (Some(version), Some(alias)) => write!(f, "version {version}, component '{alias}': ")?,
            (Some(version), None) => write!(f, "version {version}: ")?,
            (None, Some(alias)) => write!(f, "component '{alias}': ")?,
            (None, None) => {}
        }
        match &self.kind {
            IssueKind::InvalidVersionKey(key) => {
                write!(f, "version key {key:?} is not a non-negative integer")
            }
            IssueKind::VersionOutOfOrder { previous } => {
                write!(f, "declared after version {previous}; versions must increase")
            }
            IssueKind::NotAMapping => f.write_str("expected a mapping"),
            IssueKind::MalformedComponent(message) => write!(f, "malformed entry: {message}"),
            IssueKind::MissingEnabled => f.write_str("missing required `enabled` node"),
            IssueKind::NoSources => f.write_str("no data sources (generic or environment)"),
            IssueKind::UnknownComponent => f.write_str("not a registered component"),
            IssueKind::Construction(message) => write!(f, "construction failed: {message}"),
        }
    }
}

/// Recoverable failures raised while a component handles a source or record.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    #[error("no source set for component '{alias}'")]
    NoSource { alias: String },

    #[error("source {source_ref} not found at {path}")]
    SourceNotFound { source_ref: String, path: PathBuf },

    #[error("read {source_ref}: {source}")]
    Read {
        source_ref: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fetch {source_ref}: {source}")]
    Fetch {
        source_ref: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("parse {source_ref}: {message}")]
    Parse { source_ref: String, message: String },

    #[error("unsupported source format for {source_ref} (expected {expected})")]
    UnsupportedFormat {
        source_ref: String,
        expected: &'static str,
    },

    #[error("required data missing for '{key}': {field}")]
    MissingField { key: String, field: String },

    #[error("record '{key}': {message}")]
    Record { key: String, message: String },

    #[error("resource {path} for '{key}': {source}")]
    Resource {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Construction(String),
}

impl ComponentError {
    pub fn record(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Record {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn parse(source_ref: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            source_ref: source_ref.into(),
            message: message.to_string(),
        }
    }
}

/// Version ledger read/write failures.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("version {version} is already recorded in the ledger")]
    Duplicate { version: VersionNumber },

    #[error("read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse ledger {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported ledger schema_version {found} in {path}")]
    Schema { path: PathBuf, found: u32 },

    #[error("write ledger {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Entity store read/write failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("read store table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse store table {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("write store table {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a run stopped before finishing every pending version.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
