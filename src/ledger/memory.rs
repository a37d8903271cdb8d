use super::{VersionLedger, VersionRecord};
use crate::error::PersistenceError;
use crate::master::VersionNumber;
use chrono::{DateTime, Utc};
use std::io;
use std::path::PathBuf;

/// In-memory ledger with an optional write failure for tests.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: Vec<VersionRecord>,
    fail_writes_at: Option<VersionNumber>,
}

impl MemoryLedger {
    /// Ledger pre-populated with `versions`, all applied at `applied_at`.
    pub fn with_applied(versions: &[u32], applied_at: DateTime<Utc>) -> Self {
        Self {
            records: versions
                .iter()
                .map(|version| VersionRecord {
                    version: VersionNumber::new(*version),
                    applied_at,
                })
                .collect(),
            fail_writes_at: None,
        }
    }

    /// Make `record_applied` fail with a storage error for `version`.
    pub fn fail_writes_at(mut self, version: u32) -> Self {
        self.fail_writes_at = Some(VersionNumber::new(version));
        self
    }

    pub fn versions(&self) -> Vec<u32> {
        self.records.iter().map(|record| record.version.get()).collect()
    }
}

impl VersionLedger for MemoryLedger {
    fn records(&self) -> Result<Vec<VersionRecord>, PersistenceError> {
        Ok(self.records.clone())
    }

    fn record_applied(
        &mut self,
        version: VersionNumber,
        applied_at: DateTime<Utc>,
    ) -> Result<VersionRecord, PersistenceError> {
        if self.records.iter().any(|record| record.version == version) {
            return Err(PersistenceError::Duplicate { version });
        }
        if self.fail_writes_at == Some(version) {
            return Err(PersistenceError::Write {
                path: PathBuf::from("memory"),
                source: io::Error::other(format!("simulated failure writing version {version}")),
            });
        }
        let record = VersionRecord {
            version,
            applied_at,
        };
        self.records.push(record.clone());
        Ok(record)
    }
}
