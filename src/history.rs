//! Run history persistence.
//!
//! One JSON line per `run` invocation, appended and never rewritten, so the
//! file doubles as an audit trail next to the version ledger.
use crate::master::VersionNumber;
use crate::processor::{ExecutionContext, FailedRecord, RunOutcome, RunSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

pub const RUN_HISTORY_SCHEMA_VERSION: u32 = 1;

/// How a recorded run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    NothingPending,
    Blocked,
    Completed,
    Aborted,
}

impl RunStatus {
    /// Process exit code for a `run` that ended this way.
    pub fn exit_code(self) -> u8 {
        match self {
            RunStatus::NothingPending | RunStatus::Completed => 0,
            RunStatus::Blocked => 2,
            RunStatus::Aborted => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHistoryEntry {
    pub schema_version: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub environment: String,
    #[serde(default)]
    pub components: Vec<String>,
    pub force: bool,
    pub outcome: RunStatus,
    #[serde(default)]
    pub applied: Vec<VersionNumber>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<VersionNumber>,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub record_failures: usize,
    pub source_failures: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_records: Vec<FailedRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunHistoryEntry {
    pub fn from_outcome(
        ctx: &ExecutionContext,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        outcome: &RunOutcome,
    ) -> Self {
        let empty = RunSummary::default();
        let (status, summary, missing, message) = match outcome {
            RunOutcome::NothingPending => (RunStatus::NothingPending, &empty, Vec::new(), None),
            RunOutcome::Blocked { missing } => {
                (RunStatus::Blocked, &empty, missing.clone(), None)
            }
            RunOutcome::Completed(summary) => (RunStatus::Completed, summary, Vec::new(), None),
            RunOutcome::Aborted { summary, error } => (
                RunStatus::Aborted,
                summary,
                Vec::new(),
                Some(error.to_string()),
            ),
        };
        Self {
            schema_version: RUN_HISTORY_SCHEMA_VERSION,
            started_at,
            finished_at,
            environment: ctx.environment.clone(),
            components: ctx.components.clone(),
            force: ctx.force,
            outcome: status,
            applied: summary.applied.clone(),
            missing,
            created: summary.created,
            updated: summary.updated,
            unchanged: summary.unchanged,
            record_failures: summary.record_failures,
            source_failures: summary.source_failures,
            failed_records: summary.failed_records.clone(),
            message,
        }
    }
}

/// Append a history entry as JSONL.
pub fn append_run_history(path: &Path, entry: &RunHistoryEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create state dir")?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    let line = serde_json::to_string(entry).context("serialize run history entry")?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
