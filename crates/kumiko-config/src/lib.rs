//! Configuration and patch files for kumiko.
//!
//! # Features
//!
//! - **Engine settings**: sample rate, block size, channels and dispatch depth
//!   in a TOML file
//! - **Patch files**: `.kumiko` files holding a patcher's Dico text
//! - **Paths**: platform-specific config and patch directories
//!
//! # Example
//!
//! ```rust,no_run
//! use kumiko_config::{EngineConfig, default_config_path, load_patch};
//!
//! let config = EngineConfig::load_or_default(default_config_path()).unwrap();
//! let patch = load_patch("drone.kumiko").unwrap();
//! println!("{} Hz, {} boxes", config.sample_rate, patch.get("boxes").len());
//! ```

mod error;
mod patch_file;
mod settings;

/// Platform-specific paths for configuration and patches.
pub mod paths;

pub use error::ConfigError;
pub use patch_file::{load_into, load_patch, save_from, save_patch};
pub use paths::{
    PATCH_EXTENSION, default_config_path, ensure_user_config_dir, ensure_user_patches_dir,
    find_patch, list_user_patches, patch_name_from_path, user_config_dir, user_patches_dir,
};
pub use settings::{EngineConfig, MAX_BLOCK_SIZE, MAX_CHANNELS};
