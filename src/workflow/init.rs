//! Init command.
//!
//! Bootstraps `configurator.json` and a skeleton master definition so `run`
//! has something to read.
use crate::cli::InitArgs;
use crate::config::{config_stub, load_config};
use crate::paths::ProjectPaths;
use crate::util::write_new_file;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

const MASTER_SKELETON: &str = "\
# Versions apply in ascending order; components run in the order listed.
versions:
  1:
    pages:
      enabled: false
      sources:
        - data/pages.yaml
";

/// Write the config and master skeleton under `root`.
pub fn run_init(root: &Path, args: &InitArgs) -> Result<()> {
    let defaults = ProjectPaths::with_defaults(root.to_path_buf());
    let config_path = defaults.config_path();
    if config_path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            config_path.display()
        ));
    }
    write_new_file(&config_path, &config_stub()?, true)
        .with_context(|| format!("write {}", config_path.display()))?;
    println!("wrote {}", config_path.display());

    let config = load_config(root)?;
    let master_path = ProjectPaths::new(root.to_path_buf(), &config).master_path();
    let written = write_new_file(&master_path, MASTER_SKELETON, args.force)
        .with_context(|| format!("write {}", master_path.display()))?;
    if written {
        println!("wrote {}", master_path.display());
    } else {
        println!("kept existing {}", master_path.display());
    }
    Ok(())
}
