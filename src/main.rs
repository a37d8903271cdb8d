mod cli;
mod component;
mod components;
mod config;
mod error;
mod history;
mod ledger;
mod logging;
mod master;
mod paths;
mod processor;
mod registry;
mod store;
mod util;
mod workflow;

use clap::Parser;
use cli::{Command, RootArgs};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = RootArgs::parse();
    let level = logging::level_for(args.verbose);
    logging::init(level);

    let result = match &args.command {
        Command::Init(init) => workflow::run_init(&args.root, init).map(|()| ExitCode::SUCCESS),
        Command::Run(run) => workflow::run_run(&args.root, run, level)
            .map(|status| ExitCode::from(status.exit_code())),
        Command::Status(status) => {
            workflow::run_status(&args.root, status).map(|()| ExitCode::SUCCESS)
        }
        Command::History(history) => {
            workflow::run_history(&args.root, history).map(|()| ExitCode::SUCCESS)
        }
        Command::Components(components) => {
            workflow::run_components(components).map(|()| ExitCode::SUCCESS)
        }
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
