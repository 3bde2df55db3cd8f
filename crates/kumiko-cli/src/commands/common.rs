//! Shared CLI helpers used across multiple commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kumiko_config::{EngineConfig, default_config_path, find_patch, load_into};
use kumiko_core::Patcher;

/// Loads the engine config: an explicit path must exist, the default one
/// may be missing.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::load_or_default(default_config_path())?,
    };
    Ok(config)
}

/// Resolves a patch by path or by name in the user patch directory.
pub fn resolve_patch(name: &str) -> anyhow::Result<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Ok(path);
    }
    if let Some(found) = find_patch(name) {
        return Ok(found);
    }
    anyhow::bail!(
        "Patch '{}' not found. Use 'kumiko patches' to see saved patches.",
        name
    )
}

/// A patcher with the built-in objects and `config` applied.
pub fn new_patcher(config: &EngineConfig) -> Arc<Patcher> {
    let patcher = Arc::new(Patcher::new(kumiko_registry::factory()));
    config.apply(&patcher);
    patcher
}

/// A configured patcher holding the patch `name`.
pub fn open_patch(name: &str, config: &EngineConfig) -> anyhow::Result<Arc<Patcher>> {
    let path = resolve_patch(name)?;
    let patcher = new_patcher(config);
    let boxes = load_into(&patcher, &path)?;
    tracing::info!(path = %path.display(), boxes, "patch loaded");
    Ok(patcher)
}
