//! Patch files: the Dico text notation on disk.

use std::path::Path;

use kumiko_core::{Dico, Patcher};

use crate::error::ConfigError;

/// Reads a patch file. Malformed lines are skipped, never fatal.
pub fn load_patch(path: impl AsRef<Path>) -> Result<Dico, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let patch = Dico::from_text(&content);
    tracing::debug!(path = %path.display(), keys = patch.len(), "patch file read");
    Ok(patch)
}

/// Writes `patch` to `path`, creating the parent directory.
pub fn save_patch(path: impl AsRef<Path>, patch: &Dico) -> Result<(), ConfigError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }
    std::fs::write(path, patch.to_text()).map_err(|e| ConfigError::write_file(path, e))?;
    tracing::debug!(path = %path.display(), "patch file written");
    Ok(())
}

/// Replaces the contents of `patcher` with the patch at `path`. Returns the
/// number of boxes created.
pub fn load_into(patcher: &Patcher, path: impl AsRef<Path>) -> Result<usize, ConfigError> {
    let patch = load_patch(path)?;
    Ok(patcher.read(&patch))
}

/// Writes the contents of `patcher` to `path`.
pub fn save_from(patcher: &Patcher, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    save_patch(path, &patcher.write())
}
