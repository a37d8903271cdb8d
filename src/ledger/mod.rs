//! Version ledger: the append-only record of applied versions.
//!
//! The ledger exposes reads, a generic search, and a single append. There is
//! no update or delete; a version is recorded at most once.
mod json;
#[cfg(test)]
mod memory;
mod search;

pub use json::JsonLedger;
#[cfg(test)]
pub use memory::MemoryLedger;
pub use search::{
    search_records, Condition, Filter, SearchCriteria, SearchResults, SortDirection, SortField,
};

use crate::error::PersistenceError;
use crate::master::VersionNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Current schema version for `versions.json`.
pub const LEDGER_SCHEMA_VERSION: u32 = 1;

/// One applied version and when it was committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: VersionNumber,
    pub applied_at: DateTime<Utc>,
}

/// Persistent store of applied versions.
pub trait VersionLedger {
    /// Every record, in storage order.
    fn records(&self) -> Result<Vec<VersionRecord>, PersistenceError>;

    /// Append `version`; fails with [`PersistenceError::Duplicate`] if present.
    fn record_applied(
        &mut self,
        version: VersionNumber,
        applied_at: DateTime<Utc>,
    ) -> Result<VersionRecord, PersistenceError>;

    fn list_applied_versions(&self) -> Result<BTreeSet<VersionNumber>, PersistenceError> {
        Ok(self.records()?.into_iter().map(|record| record.version).collect())
    }

    fn search(&self, criteria: &SearchCriteria) -> Result<SearchResults, PersistenceError> {
        Ok(search_records(self.records()?, criteria))
    }
}
