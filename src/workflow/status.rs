//! Status command.
//!
//! Read-only: the ledger and the master definition are loaded and diffed, and
//! nothing is written.
use super::ProjectContext;
use crate::cli::StatusArgs;
use crate::ledger::VersionLedger;
use crate::master::{MasterDefinition, VersionNumber};
use crate::processor::{plan_versions, VersionPlan};
use crate::util::display_path;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

pub const STATUS_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub schema_version: u32,
    pub master: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    pub applied: Vec<VersionNumber>,
    pub plan: VersionPlan,
    pub pending_components: Vec<PendingVersion>,
    pub next_action: String,
}

#[derive(Debug, Serialize)]
pub struct PendingVersion {
    pub version: VersionNumber,
    pub components: Vec<PendingComponent>,
}

#[derive(Debug, Serialize)]
pub struct PendingComponent {
    pub alias: String,
    pub enabled: bool,
    /// Sources a run would read: generic ones, plus the overlay when an
    /// environment was given.
    pub sources: Vec<String>,
}

/// Print applied, pending, and missing versions.
pub fn run_status(root: &Path, args: &StatusArgs) -> Result<()> {
    let project = ProjectContext::load(root)?;
    let master = project.load_master()?;
    let ledger = project.open_ledger();
    let applied = ledger
        .list_applied_versions()
        .context("read version ledger")?;
    let report = build_report(&master, &applied, args.env.as_deref(), project.paths.root());

    if args.json {
        let text = serde_json::to_string_pretty(&report).context("serialize status")?;
        println!("{text}");
        return Ok(());
    }
    println!("master: {}", report.master);
    println!("applied: {}", list(&report.applied));
    println!("pending: {}", list(&report.plan.pending));
    if !report.plan.missing.is_empty() {
        println!("missing: {}", list(&report.plan.missing));
    }
    for pending in &report.pending_components {
        println!("version {}:", pending.version);
        for component in &pending.components {
            let state = if component.enabled { "" } else { " (disabled)" };
            println!(
                "  {}{state}: {}",
                component.alias,
                if component.sources.is_empty() {
                    "no sources".to_string()
                } else {
                    component.sources.join(", ")
                }
            );
        }
    }
    println!("next: {}", report.next_action);
    Ok(())
}

fn build_report(
    master: &MasterDefinition,
    applied: &BTreeSet<VersionNumber>,
    environment: Option<&str>,
    root: &Path,
) -> StatusReport {
    let plan = plan_versions(master.versions(), applied);
    let pending_components = plan
        .pending
        .iter()
        .filter_map(|version| {
            let components = master.components(*version)?;
            Some(PendingVersion {
                version: *version,
                components: components
                    .iter()
                    .map(|(alias, config)| PendingComponent {
                        alias: alias.clone(),
                        enabled: config.enabled,
                        sources: match environment {
                            Some(environment) => config
                                .sources_for(environment)
                                .map(ToString::to_string)
                                .collect(),
                            None => config.sources.iter().map(ToString::to_string).collect(),
                        },
                    })
                    .collect(),
            })
        })
        .collect();
    let next_action = if plan.is_nothing_pending() {
        "nothing to do".to_string()
    } else if plan.is_blocked(false) {
        "older versions were never applied; rerun with --force to apply them".to_string()
    } else {
        "configurator run --env <ENV>".to_string()
    };
    StatusReport {
        schema_version: STATUS_SCHEMA_VERSION,
        master: display_path(master.path(), Some(root)),
        environment: environment.map(str::to_string),
        applied: applied.iter().copied().collect(),
        plan,
        pending_components,
        next_action,
    }
}

fn list(versions: &[VersionNumber]) -> String {
    if versions.is_empty() {
        return "none".to_string();
    }
    versions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
