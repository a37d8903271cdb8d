//! Run orchestration: diff, gate, dispatch, commit.
//!
//! Versions are applied strictly in ascending order, components in declared
//! order, sources in declared order with the environment overlay last. A
//! version is committed to the ledger only after all of its components ran;
//! definition and ledger errors stop the whole run while component errors are
//! logged and contained.
mod plan;

pub use plan::{plan_versions, VersionPlan};

use crate::component::{AdminContext, Importer};
use crate::error::{DefinitionError, RunError};
use crate::ledger::VersionLedger;
use crate::master::{ComponentConfig, MasterDefinition, SourceRef, VersionNumber};
use crate::registry::ComponentRegistry;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Per-run inputs; nothing here is persisted.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Selects the `env` overlay branch.
    pub environment: String,
    /// Aliases to run; empty runs every component.
    pub components: Vec<String>,
    /// Apply pending versions even when older ones are missing.
    pub force: bool,
    pub log_level: LevelFilter,
}

impl ExecutionContext {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            components: Vec::new(),
            force: false,
            log_level: LevelFilter::INFO,
        }
    }

    fn selects(&self, alias: &str) -> bool {
        self.components.is_empty() || self.components.iter().any(|wanted| wanted == alias)
    }
}

/// Totals across every version a run dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub applied: Vec<VersionNumber>,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub record_failures: usize,
    pub source_failures: usize,
    /// One entry per record that failed and was skipped.
    pub failed_records: Vec<FailedRecord>,
}

/// A skipped record, located by component, source, and natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRecord {
    pub component: String,
    pub source: String,
    pub key: String,
    pub message: String,
}

impl RunSummary {
    pub fn failures(&self) -> usize {
        self.record_failures + self.source_failures
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    NothingPending,
    Blocked {
        missing: Vec<VersionNumber>,
    },
    Completed(RunSummary),
    /// Earlier versions in `summary.applied` stay committed.
    Aborted {
        summary: RunSummary,
        error: RunError,
    },
}

/// Result of dispatching one version.
enum Dispatch {
    Continue,
    AbortRun(RunError),
}

/// Applies pending versions of one master definition.
pub struct Processor<'a, L: ?Sized> {
    master: &'a MasterDefinition,
    registry: &'a ComponentRegistry,
    ledger: &'a mut L,
    admin: &'a mut AdminContext,
}

impl<'a, L: VersionLedger + ?Sized> Processor<'a, L> {
    pub fn new(
        master: &'a MasterDefinition,
        registry: &'a ComponentRegistry,
        ledger: &'a mut L,
        admin: &'a mut AdminContext,
    ) -> Self {
        Self {
            master,
            registry,
            ledger,
            admin,
        }
    }

    /// Plan against the current ledger without applying anything.
    pub fn plan(&self) -> Result<VersionPlan, RunError> {
        let applied = self.ledger.list_applied_versions()?;
        Ok(plan_versions(self.master.versions(), &applied))
    }

    pub fn run(&mut self, ctx: &ExecutionContext) -> RunOutcome {
        tracing::debug!(
            environment = %ctx.environment,
            components = ?ctx.components,
            force = ctx.force,
            log_level = %ctx.log_level,
            "starting run"
        );
        let plan = match self.plan() {
            Ok(plan) => plan,
            Err(error) => {
                tracing::error!("{error}");
                return RunOutcome::Aborted {
                    summary: RunSummary::default(),
                    error,
                };
            }
        };

        if plan.is_nothing_pending() {
            tracing::info!("No new versions found in the master definition.");
            return RunOutcome::NothingPending;
        }
        if !plan.missing.is_empty() {
            let listed = join_versions(&plan.missing);
            if plan.is_blocked(ctx.force) {
                tracing::error!(
                    "There are still some older version(s) not applied: {listed}. \
                     Use the force (-f) flag to force the import of these versions"
                );
                return RunOutcome::Blocked {
                    missing: plan.missing,
                };
            }
            tracing::warn!("Forcing older version(s) that were never applied: {listed}");
        }
        if let Err(error) = self.check_selection(ctx, &plan.pending) {
            tracing::error!("{error}");
            return RunOutcome::Aborted {
                summary: RunSummary::default(),
                error: error.into(),
            };
        }

        let mut summary = RunSummary::default();
        for version in plan.pending {
            let span = tracing::info_span!("version", version = %version);
            let _entered = span.enter();
            tracing::info!("Processing version {version}");

            if let Dispatch::AbortRun(error) = self.dispatch_version(ctx, version, &mut summary) {
                tracing::error!("{error}");
                return RunOutcome::Aborted { summary, error };
            }
            match self.ledger.record_applied(version, Utc::now()) {
                Ok(record) => {
                    tracing::info!(applied_at = %record.applied_at, "Version {version} applied");
                    summary.applied.push(version);
                }
                Err(error) => {
                    tracing::error!("{error}");
                    return RunOutcome::Aborted {
                        summary,
                        error: error.into(),
                    };
                }
            }
        }
        RunOutcome::Completed(summary)
    }

    /// Every requested alias must be defined in every pending version.
    fn check_selection(
        &self,
        ctx: &ExecutionContext,
        pending: &[VersionNumber],
    ) -> Result<(), DefinitionError> {
        for &version in pending {
            let Some(components) = self.master.components(version) else {
                continue;
            };
            if let Some(absent) = ctx
                .components
                .iter()
                .find(|alias| !components.contains_key(alias.as_str()))
            {
                return Err(DefinitionError::ComponentNotInVersion {
                    alias: absent.clone(),
                    version,
                });
            }
        }
        Ok(())
    }

    fn dispatch_version(
        &mut self,
        ctx: &ExecutionContext,
        version: VersionNumber,
        summary: &mut RunSummary,
    ) -> Dispatch {
        let master = self.master;
        let Some(components) = master.components(version) else {
            return Dispatch::Continue;
        };
        for (alias, config) in components.iter().filter(|(alias, _)| ctx.selects(alias)) {
            let span = tracing::info_span!("component", component = %alias);
            let _entered = span.enter();
            if let Dispatch::AbortRun(error) = self.dispatch_component(ctx, alias, config, summary)
            {
                return Dispatch::AbortRun(error);
            }
        }
        Dispatch::Continue
    }

    fn dispatch_component(
        &mut self,
        ctx: &ExecutionContext,
        alias: &str,
        config: &ComponentConfig,
        summary: &mut RunSummary,
    ) -> Dispatch {
        if !config.enabled {
            tracing::debug!(depth = 1, "Component '{alias}' is disabled; skipping");
            return Dispatch::Continue;
        }
        let component = match self.registry.create(alias) {
            Ok(component) => component,
            Err(error) => return Dispatch::AbortRun(error.into()),
        };
        let mut importer = Importer::new(component);
        tracing::debug!("Loading component {}", importer.component().name());

        for source in &config.sources {
            self.process_source(&mut importer, source, summary);
        }
        if config.env.is_empty() {
            tracing::debug!("No environment node for '{alias}' component");
            return Dispatch::Continue;
        }
        let Some(overlay) = config.overlay(&ctx.environment) else {
            tracing::debug!(
                "No '{}' environment specific node for '{alias}' component",
                ctx.environment
            );
            return Dispatch::Continue;
        };
        if overlay.sources.is_empty() {
            tracing::debug!(
                "No '{}' environment specific sources for '{alias}' component",
                ctx.environment
            );
        }
        for source in &overlay.sources {
            self.process_source(&mut importer, source, summary);
        }
        Dispatch::Continue
    }

    fn process_source(
        &mut self,
        importer: &mut Importer,
        source: &SourceRef,
        summary: &mut RunSummary,
    ) {
        match importer.set_source(source.clone()).process(&mut *self.admin) {
            Ok(processed) => {
                summary.created += processed.created;
                summary.updated += processed.updated;
                summary.unchanged += processed.unchanged;
                summary.record_failures += processed.failures.len();
                let component = importer.component().alias();
                summary
                    .failed_records
                    .extend(processed.failures.into_iter().map(|failure| FailedRecord {
                        component: component.to_string(),
                        source: source.to_string(),
                        key: failure.key,
                        message: failure.error.to_string(),
                    }));
            }
            Err(error) => {
                tracing::error!(source = %source, "{error}");
                summary.source_failures += 1;
            }
        }
    }
}

fn join_versions(versions: &[VersionNumber]) -> String {
    versions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
