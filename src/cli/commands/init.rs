//! Write the default configuration.

use anyhow::{Context, Result};
use screener_config::default_toml;

use crate::cli::InitConfigArgs;

pub fn run(args: InitConfigArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        );
    }

    if let Some(parent) = args.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&args.path, default_toml()?)
        .with_context(|| format!("Failed to write {}", args.path.display()))?;

    println!("Wrote default configuration to {}", args.path.display());
    Ok(())
}
