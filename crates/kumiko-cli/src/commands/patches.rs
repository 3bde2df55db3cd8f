//! Saved patch listing.

use kumiko_config::{list_user_patches, patch_name_from_path, user_patches_dir};

pub fn run() -> anyhow::Result<()> {
    println!("User Patches ({}):", user_patches_dir().display());
    let patches = list_user_patches();
    if patches.is_empty() {
        println!("  (none)");
        println!();
        println!("  Save one from the console with: save <path>.kumiko");
        return Ok(());
    }
    for path in patches {
        let name = patch_name_from_path(&path).unwrap_or_else(|| "unknown".to_string());
        println!("  {name:20} {}", path.display());
    }
    Ok(())
}
