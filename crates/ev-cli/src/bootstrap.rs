use anyhow::Context;
use ev_config::EvConfig;
use ev_pipeline::ProgramCatalog;

use crate::cli::GlobalFlags;

pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<EvConfig> {
    let config = match &flags.config {
        Some(path) => EvConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EvConfig::load_with_dotenv().context("failed to load configuration")?,
    };
    config.validate()?;
    Ok(config)
}

/// Built-in programs, extended by `--catalog` when given.
pub fn load_catalog(flags: &GlobalFlags) -> anyhow::Result<ProgramCatalog> {
    match &flags.catalog {
        Some(path) => Ok(ProgramCatalog::with_overrides(path)?),
        None => Ok(ProgramCatalog::builtin()),
    }
}
