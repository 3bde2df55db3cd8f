//! Integration tests for kumiko-io.
//!
//! Offline renders and the block driver running real patches built from the
//! built-in objects.

use std::sync::Arc;
use std::time::Duration;

use kumiko_core::Patcher;
use kumiko_io::{
    BlockDriver, Error, RenderSettings, WavSpec, read_wav, render, render_with_input, write_wav,
};
use tempfile::TempDir;

fn patcher() -> Patcher {
    Patcher::new(kumiko_registry::factory())
}

fn assert_close(got: &[f32], want: &[f32]) {
    assert_eq!(got.len(), want.len());
    for (i, (g, w)) in got.iter().zip(want).enumerate() {
        assert!((g - w).abs() < 1e-5, "sample {i}: got {g}, want {w}");
    }
}

#[test]
fn test_render_constant_into_both_channels() {
    let patcher = patcher();
    let sig = patcher.create_from_text("sig~ 0.25").unwrap();
    let dac = patcher.create_from_text("dac~ 1 2").unwrap();
    patcher.connect(sig, 0, dac, 0).unwrap();
    patcher.connect(sig, 0, dac, 1).unwrap();

    let settings = RenderSettings {
        seconds: 0.01,
        sample_rate: 8000,
        block_size: 32,
    };
    let mut calls = Vec::new();
    let channels = render(&patcher, &settings, |done, total| calls.push((done, total))).unwrap();

    // 80 frames from three blocks, the last one truncated.
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0], vec![0.25; 80]);
    assert_eq!(channels[1], vec![0.25; 80]);
    assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
    assert!(!patcher.is_running());
}

#[test]
fn test_render_oscillator_keeps_phase_across_blocks() {
    let patcher = patcher();
    let osc = patcher.create_from_text("osc~ 1000").unwrap();
    let dac = patcher.create_from_text("dac~ 1").unwrap();
    patcher.connect(osc, 0, dac, 0).unwrap();

    let settings = RenderSettings {
        seconds: 0.003,
        sample_rate: 4000,
        block_size: 5,
    };
    let channels = render(&patcher, &settings, |_, _| {}).unwrap();
    assert_close(
        &channels[0],
        &[1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0],
    );
    assert_eq!(channels[1], vec![0.0; 12]);
}

#[test]
fn test_render_feeds_inputs_through_adc() {
    let patcher = patcher();
    let adc = patcher.create_from_text("adc~ 1").unwrap();
    let gain = patcher.create_from_text("*~ 2").unwrap();
    let dac = patcher.create_from_text("dac~ 2").unwrap();
    patcher.connect(adc, 0, gain, 0).unwrap();
    patcher.connect(gain, 0, dac, 0).unwrap();

    let settings = RenderSettings {
        seconds: 1.0,
        sample_rate: 10,
        block_size: 4,
    };
    let input = vec![0.5, 1.0, 1.5];
    let channels = render_with_input(&patcher, &settings, &[input], |_, _| {}).unwrap();

    assert_eq!(channels[0], vec![0.0; 10]);
    let mut expected = vec![1.0, 2.0, 3.0];
    expected.resize(10, 0.0);
    assert_eq!(channels[1], expected);
}

#[test]
fn test_render_survives_signal_cycle() {
    let patcher = patcher();
    let a = patcher.create_from_text("+~").unwrap();
    let b = patcher.create_from_text("+~").unwrap();
    let dac = patcher.create_from_text("dac~ 1").unwrap();
    patcher.connect(a, 0, b, 0).unwrap();
    patcher.connect(b, 0, a, 0).unwrap();
    patcher.connect(b, 0, dac, 0).unwrap();

    let settings = RenderSettings {
        seconds: 0.1,
        sample_rate: 100,
        block_size: 4,
    };
    let channels = render(&patcher, &settings, |_, _| {}).unwrap();
    assert_eq!(channels[0], vec![0.0; 10]);
}

#[test]
fn test_render_rejects_bad_settings() {
    let patcher = patcher();
    let settings = RenderSettings {
        seconds: -1.0,
        ..RenderSettings::default()
    };
    assert!(matches!(
        render(&patcher, &settings, |_, _| {}),
        Err(Error::InvalidSettings(_))
    ));
    assert!(!patcher.is_running());
}

#[test]
fn test_rendered_wav_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("render.wav");

    let patcher = patcher();
    let sig = patcher.create_from_text("sig~ -0.5").unwrap();
    let dac = patcher.create_from_text("dac~ 1").unwrap();
    patcher.connect(sig, 0, dac, 0).unwrap();

    let settings = RenderSettings {
        seconds: 0.005,
        sample_rate: 16000,
        block_size: 64,
    };
    let channels = render(&patcher, &settings, |_, _| {}).unwrap();
    let spec = WavSpec::for_render(&settings, channels.len());
    write_wav(&path, &channels, spec).unwrap();

    let (read, read_spec) = read_wav(&path).unwrap();
    assert_eq!(read_spec, spec);
    assert_eq!(read, channels);
    assert_eq!(read[0], vec![-0.5; 80]);
}

#[test]
fn test_block_driver_runs_until_stopped() {
    let patcher = Arc::new(patcher());
    let sig = patcher.create_from_text("sig~ 1").unwrap();
    let dac = patcher.create_from_text("dac~ 1").unwrap();
    patcher.connect(sig, 0, dac, 0).unwrap();

    // 8000 Hz in blocks of 16: one block every 2 ms.
    let mut driver = BlockDriver::spawn(Arc::clone(&patcher), 8000, 16).unwrap();
    std::thread::sleep(Duration::from_millis(60));
    assert!(driver.is_running());
    assert!(patcher.is_running());

    driver.stop();
    let blocks = driver.blocks();
    assert!(blocks >= 5, "only {blocks} blocks in 60 ms");
    assert!(!patcher.is_running());

    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(driver.blocks(), blocks);
}

#[test]
fn test_block_driver_exits_when_patcher_stops() {
    let patcher = Arc::new(patcher());
    let driver = BlockDriver::spawn(Arc::clone(&patcher), 8000, 16).unwrap();
    patcher.stop();
    std::thread::sleep(Duration::from_millis(30));
    assert!(!driver.is_running());
    drop(driver);
}

#[test]
fn test_block_driver_patches_while_running() {
    let patcher = Arc::new(patcher());
    let driver = BlockDriver::spawn(Arc::clone(&patcher), 8000, 16).unwrap();

    let osc = patcher.create_from_text("osc~ 440").unwrap();
    let dac = patcher.create_from_text("dac~ 1").unwrap();
    patcher.connect(osc, 0, dac, 0).unwrap();
    std::thread::sleep(Duration::from_millis(20));

    assert_eq!(patcher.chain_order(), Some(vec![osc, dac]));
    assert!(driver.blocks() > 0);
}
