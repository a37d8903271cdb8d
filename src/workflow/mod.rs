//! Command handlers.
//!
//! Each handler loads what it needs through `ProjectContext` and keeps
//! printing on stdout; diagnostics go through tracing.
mod components;
mod context;
mod history;
mod init;
mod run;
mod status;

pub use components::run_components;
pub use context::ProjectContext;
pub use history::run_history;
pub use init::run_init;
pub use run::run_run;
pub use status::run_status;
