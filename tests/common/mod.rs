//! Shared test infrastructure for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A temporary project root driven through the compiled binary.
pub struct Project {
    dir: TempDir,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root, creating parents.
    pub fn write(&self, rel: &str, text: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, text).expect("write fixture");
        path
    }

    pub fn write_master(&self, yaml: &str) {
        self.write("app/etc/master.yaml", yaml);
    }

    /// Run the binary with `--root` pointing at this project.
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_configurator"))
            .arg("--root")
            .arg(self.root())
            .args(args)
            .env_remove("RUST_LOG")
            .env_remove("CONFIGURATOR_ROOT")
            .output()
            .expect("run configurator")
    }

    pub fn json(&self, rel: &str) -> serde_json::Value {
        let text = fs::read_to_string(self.root().join(rel)).expect("read json");
        serde_json::from_str(&text).expect("parse json")
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root().join(rel)).expect("read file")
    }
}

/// Parse stdout of a `--json` command.
pub fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

pub fn ledger_versions(project: &Project) -> Vec<u64> {
    project.json("var/configurator/versions.json")["records"]
        .as_array()
        .map(|records| {
            records
                .iter()
                .filter_map(|record| record["version"].as_u64())
                .collect()
        })
        .unwrap_or_default()
}
