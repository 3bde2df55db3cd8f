//! Integration tests for kumiko-config.
//!
//! Settings and patches written to disk and read back into live patchers.

use kumiko_config::{
    ConfigError, EngineConfig, load_into, load_patch, save_from, save_patch,
};
use kumiko_core::{Atom, Dico, Patcher};
use tempfile::TempDir;

#[test]
fn test_engine_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("engine.toml");

    let config = EngineConfig {
        log_filter: Some("kumiko_core=debug".to_string()),
        ..EngineConfig::default().with_block_size(256)
    };
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    assert_eq!(
        EngineConfig::load_or_default(&path).unwrap(),
        EngineConfig::default()
    );
    assert!(matches!(
        EngineConfig::load(&path),
        Err(ConfigError::ReadFile { .. })
    ));
}

#[test]
fn test_config_applies_to_patcher() {
    let patcher = Patcher::new(kumiko_registry::factory());
    let config = EngineConfig::default().with_channels(1, 4);
    config.apply(&patcher);
    assert_eq!(patcher.channels(), (1, 4));
    assert_eq!(patcher.max_depth(), 512);
}

#[test]
fn test_patch_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("patch.kumiko");

    let mut patch = Dico::new();
    patch.set_atom("title", "a drone");
    patch.set("numbers", vec![Atom::Long(1), Atom::Double(2.5)]);
    save_patch(&path, &patch).unwrap();

    assert_eq!(load_patch(&path).unwrap(), patch);
}

#[test]
fn test_patcher_survives_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("voice.kumiko");
    let factory = kumiko_registry::factory();

    let patcher = Patcher::new(factory.clone());
    let osc = patcher.create_from_text("osc~ 220").unwrap();
    let gain = patcher.create_from_text("*~ 0.25").unwrap();
    let dac = patcher.create_from_text("dac~ 1 2").unwrap();
    patcher.connect(osc, 0, gain, 0).unwrap();
    patcher.connect(gain, 0, dac, 0).unwrap();
    patcher.connect(gain, 0, dac, 1).unwrap();
    patcher
        .set_attribute(dac, "position", &[Atom::Long(100), Atom::Long(200)])
        .unwrap();
    save_from(&patcher, &path).unwrap();

    let restored = Patcher::new(factory);
    assert_eq!(load_into(&restored, &path).unwrap(), 3);
    assert_eq!(restored.connection_count(), 3);
    let texts: Vec<String> = restored
        .box_ids()
        .into_iter()
        .filter_map(|id| restored.box_info(id))
        .map(|info| info.text)
        .collect();
    assert_eq!(texts, vec!["osc~ 220", "*~ 0.25", "dac~ 1 2"]);

    let dac = restored.box_ids()[2];
    assert_eq!(
        restored.attributes(dac).unwrap().attribute_value("position"),
        vec![Atom::Double(100.0), Atom::Double(200.0)]
    );
}

#[test]
fn test_missing_patch_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        load_patch(dir.path().join("nothing.kumiko")),
        Err(ConfigError::ReadFile { .. })
    ));
}
