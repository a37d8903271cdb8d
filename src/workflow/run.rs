//! Run command.
//!
//! Loads the master definition, applies pending versions, and appends one
//! entry to the run history whatever the outcome.
use super::ProjectContext;
use crate::cli::RunArgs;
use crate::component::AdminContext;
use crate::error::RunError;
use crate::history::{append_run_history, RunHistoryEntry, RunStatus};
use crate::processor::{ExecutionContext, Processor, RunOutcome, RunSummary};
use anyhow::Result;
use chrono::Utc;
use std::path::Path;
use tracing::level_filters::LevelFilter;

/// Apply pending versions and report how the run ended.
pub fn run_run(root: &Path, args: &RunArgs, log_level: LevelFilter) -> Result<RunStatus> {
    let project = ProjectContext::load(root)?;
    let ctx = ExecutionContext {
        components: args.components.clone(),
        force: args.force,
        log_level,
        ..ExecutionContext::new(args.env.clone())
    };

    let started_at = Utc::now();
    let outcome = match project.load_master() {
        Ok(master) => {
            let mut ledger = project.open_ledger();
            tracing::debug!(
                master = %master.path().display(),
                versions = master.version_count(),
                ledger = %ledger.path().display(),
                "loaded master definition"
            );
            let mut admin = AdminContext::new(&project.paths);
            Processor::new(&master, &project.registry, &mut ledger, &mut admin).run(&ctx)
        }
        Err(error) => {
            tracing::error!("{error}");
            RunOutcome::Aborted {
                summary: RunSummary::default(),
                error: error.into(),
            }
        }
    };

    let entry = RunHistoryEntry::from_outcome(&ctx, started_at, Utc::now(), &outcome);
    if let Err(err) = append_run_history(&project.paths.history_path(), &entry) {
        tracing::warn!("failed to record run history: {err:#}");
    }
    print_outcome(&outcome);
    Ok(entry.outcome)
}

fn print_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::NothingPending => println!("nothing pending"),
        RunOutcome::Blocked { missing } => {
            println!("blocked: missing versions {}", join(missing));
        }
        RunOutcome::Completed(summary) => {
            println!("completed: {}", describe(summary));
            print_failed_records(summary);
        }
        RunOutcome::Aborted { summary, error } => {
            match error {
                RunError::Definition(definition) if !definition.issues().is_empty() => {
                    println!("aborted: invalid master definition");
                    for issue in definition.issues() {
                        println!("  {issue}");
                    }
                }
                _ => println!("aborted: {error}"),
            }
            if !summary.applied.is_empty() {
                println!("committed before abort: {}", describe(summary));
            }
            print_failed_records(summary);
        }
    }
}

fn print_failed_records(summary: &RunSummary) {
    for failed in &summary.failed_records {
        println!(
            "  skipped {} record '{}' from {}: {}",
            failed.component, failed.key, failed.source, failed.message
        );
    }
}

fn describe(summary: &RunSummary) -> String {
    format!(
        "applied [{}] (created {}, updated {}, unchanged {}, failures {})",
        join(&summary.applied),
        summary.created,
        summary.updated,
        summary.unchanged,
        summary.failures()
    )
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
