pub mod types;

use anyhow::{Context, Result};
use std::path::Path;

pub use types::{Config, LogConfig, SessionConfig, VhostConfig, VhostEntry};

pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    let config = Config::from_yaml_str(&content)
        .with_context(|| format!("failed to parse config '{}'", path.display()))?;
    Ok(config)
}
