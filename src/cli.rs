//! CLI argument parsing for the configurator.
//!
//! Argument types only; each command is handled in `workflow`.
use crate::ledger::Filter;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "configurator",
    version,
    about = "Apply versioned configuration components to a project",
    after_help = "Commands:\n  init                          Write configurator.json and a master skeleton\n  run --env <ENV>               Apply pending versions\n  status [--env <ENV>]          Show applied, pending, and missing versions\n  history                       List applied versions from the ledger\n  components                    List registered components\n\nExamples:\n  configurator init --root /srv/shop\n  configurator run --env production\n  configurator run --env staging -c pages -c categories -f\n  configurator status --json\n  configurator history --from 3 --desc --page-size 10",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Project root holding configurator.json, the master file, and state
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        env = "CONFIGURATOR_ROOT",
        default_value = "."
    )]
    pub root: PathBuf,

    /// Increase log detail (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Run(RunArgs),
    Status(StatusArgs),
    History(HistoryArgs),
    Components(ComponentsArgs),
}

/// Run command inputs.
#[derive(Parser, Debug)]
#[command(about = "Apply every pending version of the master definition")]
pub struct RunArgs {
    /// Environment whose `env` overlay sources are applied
    #[arg(short, long, value_name = "ENV")]
    pub env: String,

    /// Restrict the run to these component aliases (repeatable)
    #[arg(short, long = "component", value_name = "ALIAS")]
    pub components: Vec<String>,

    /// Apply pending versions even when older ones were never applied
    #[arg(short, long)]
    pub force: bool,
}

/// Status command inputs.
#[derive(Parser, Debug)]
#[command(about = "Summarize applied, pending, and missing versions")]
pub struct StatusArgs {
    /// Environment to report overlay sources for
    #[arg(short, long, value_name = "ENV")]
    pub env: Option<String>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// History command inputs.
#[derive(Parser, Debug)]
#[command(about = "List applied versions recorded in the ledger")]
pub struct HistoryArgs {
    /// Only versions greater than or equal to this one
    #[arg(long, value_name = "VERSION")]
    pub from: Option<u32>,

    /// Only versions less than or equal to this one
    #[arg(long, value_name = "VERSION")]
    pub to: Option<u32>,

    /// Extra filter such as `version!=4` or `applied_at>=2026-01-01T00:00:00Z` (repeatable)
    #[arg(long = "filter", value_name = "EXPR")]
    pub filters: Vec<Filter>,

    /// Field to order by
    #[arg(long, value_enum, default_value_t = HistorySort::Version)]
    pub sort: HistorySort,

    /// Reverse the order (newest first)
    #[arg(long)]
    pub desc: bool,

    /// Records per page (all records when omitted)
    #[arg(long, value_name = "N")]
    pub page_size: Option<usize>,

    /// 1-based page number
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub page: usize,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Sort key for `history`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HistorySort {
    Version,
    AppliedAt,
}

/// Components command inputs.
#[derive(Parser, Debug)]
#[command(about = "List registered component aliases")]
pub struct ComponentsArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Init command inputs.
#[derive(Parser, Debug)]
#[command(about = "Write configurator.json and a skeleton master definition")]
pub struct InitArgs {
    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}
