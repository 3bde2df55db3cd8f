//! Platform-specific paths for configuration and patches.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/kumiko/` (Linux), `~/Library/Application Support/kumiko/` (macOS), `%APPDATA%\kumiko\` (Windows)
//! - **User patches**: `<user config>/patches/`
//! - **Engine settings**: `<user config>/engine.toml`

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "kumiko";

/// Subdirectory name for patches.
const PATCHES_SUBDIR: &str = "patches";

/// Engine settings file name.
const CONFIG_FILE: &str = "engine.toml";

/// Extension of patch files.
pub const PATCH_EXTENSION: &str = "kumiko";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user-specific patches directory.
pub fn user_patches_dir() -> PathBuf {
    user_config_dir().join(PATCHES_SUBDIR)
}

/// Returns the default engine settings path.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf, ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// Ensure the user config directory exists.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_config_dir())
}

/// Ensure the user patches directory exists.
pub fn ensure_user_patches_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_patches_dir())
}

/// Find a patch file by name.
///
/// `name` may be a path to an existing file, or a patch name (with or
/// without the `.kumiko` extension) looked up in the user patches directory.
pub fn find_patch(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }
    let user_path = user_patches_dir().join(with_patch_extension(name));
    user_path.is_file().then_some(user_path)
}

/// Appends `.kumiko` unless `name` already ends with it.
pub fn with_patch_extension(name: &str) -> String {
    if Path::new(name)
        .extension()
        .is_some_and(|ext| ext == PATCH_EXTENSION)
    {
        name.to_string()
    } else {
        format!("{name}.{PATCH_EXTENSION}")
    }
}

/// List all patch files in the user patches directory.
pub fn list_user_patches() -> Vec<PathBuf> {
    list_patches_in_dir(&user_patches_dir())
}

/// List `.kumiko` files in `dir`, sorted by path. Empty if unreadable.
pub fn list_patches_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut patches: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == PATCH_EXTENSION))
        .collect();
    patches.sort();
    patches
}

/// Get the patch name from a file path (the file stem).
///
/// ```rust
/// use kumiko_config::paths::patch_name_from_path;
/// use std::path::Path;
///
/// let name = patch_name_from_path(Path::new("/path/to/drone.kumiko"));
/// assert_eq!(name, Some("drone".to_string()));
/// ```
pub fn patch_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
