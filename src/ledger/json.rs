//! Ledger persisted as a single JSON document.
//!
//! The file is re-read on every call so concurrent inspection (`history`,
//! `status`) always sees what was last committed, and rewritten atomically
//! on append.
use super::{VersionLedger, VersionRecord, LEDGER_SCHEMA_VERSION};
use crate::error::PersistenceError;
use crate::master::VersionNumber;
use crate::util::{read_optional, write_json_atomic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    schema_version: u32,
    #[serde(default)]
    records: Vec<VersionRecord>,
}

impl Default for LedgerFile {
    fn default() -> Self {
        Self {
            schema_version: LEDGER_SCHEMA_VERSION,
            records: Vec::new(),
        }
    }
}

/// File-backed [`VersionLedger`].
#[derive(Debug, Clone)]
pub struct JsonLedger {
    path: PathBuf,
}

impl JsonLedger {
    pub fn open(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<LedgerFile, PersistenceError> {
        let bytes = read_optional(&self.path).map_err(|source| PersistenceError::Read {
            path: self.path.clone(),
            source,
        })?;
        let Some(bytes) = bytes else {
            return Ok(LedgerFile::default());
        };
        let file: LedgerFile =
            serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Parse {
                path: self.path.clone(),
                source,
            })?;
        if file.schema_version != LEDGER_SCHEMA_VERSION {
            return Err(PersistenceError::Schema {
                path: self.path.clone(),
                found: file.schema_version,
            });
        }
        Ok(file)
    }
}

impl VersionLedger for JsonLedger {
    fn records(&self) -> Result<Vec<VersionRecord>, PersistenceError> {
        Ok(self.load()?.records)
    }

    fn record_applied(
        &mut self,
        version: VersionNumber,
        applied_at: DateTime<Utc>,
    ) -> Result<VersionRecord, PersistenceError> {
        let mut file = self.load()?;
        if file.records.iter().any(|record| record.version == version) {
            return Err(PersistenceError::Duplicate { version });
        }
        let record = VersionRecord {
            version,
            applied_at,
        };
        file.records.push(record.clone());
        write_json_atomic(&self.path, &file).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(record)
    }
}
