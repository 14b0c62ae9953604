use std::io::Write;

use assert_matches::assert_matches;
use cycle_gan::{CycleGan, CycleGanConfig, CycleGanError, DeviceChoice, LossLabels};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_full_config() {
    let file = write_config(
        r#"{
            "input_nc": 1,
            "output_nc": 3,
            "n_residual_blocks": 6,
            "affine_norm": true,
            "init_std": 0.01,
            "labels": { "real": 0.9, "fake": 0.1 },
            "device": "cpu"
        }"#,
    );

    let config = CycleGanConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.input_nc, 1);
    assert_eq!(config.output_nc, 3);
    assert_eq!(config.n_residual_blocks, 6);
    assert!(config.affine_norm);
    assert_eq!(config.init_std, 0.01);
    assert_eq!(config.labels, LossLabels { real: 0.9, fake: 0.1 });
    assert_eq!(config.device, DeviceChoice::Cpu);
}

#[test]
fn empty_object_gives_defaults() {
    let file = write_config("{}");
    let config = CycleGanConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config, CycleGanConfig::default());
}

#[test]
fn serialized_default_round_trips_through_file() {
    let json = serde_json::to_string_pretty(&CycleGanConfig::default()).unwrap();
    let file = write_config(&json);
    assert_eq!(
        CycleGanConfig::from_json_file(file.path()).unwrap(),
        CycleGanConfig::default()
    );
}

#[test]
fn invalid_values_are_config_errors() {
    let file = write_config(r#"{ "output_nc": -1 }"#);
    assert_matches!(
        CycleGanConfig::from_json_file(file.path()),
        Err(CycleGanError::Config(_))
    );
}

#[test]
fn malformed_json_is_a_json_error() {
    let file = write_config(r#"{ "input_nc": "#);
    assert_matches!(
        CycleGanConfig::from_json_file(file.path()),
        Err(CycleGanError::Json(_))
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert_matches!(
        CycleGanConfig::from_json_file(dir.path().join("absent.json")),
        Err(CycleGanError::Io(_))
    );
}

#[test]
fn manager_rejects_invalid_config() {
    let config = CycleGanConfig {
        labels: LossLabels { real: 1.0, fake: 1.0 },
        ..Default::default()
    };
    assert_matches!(CycleGan::new(config).err(), Some(CycleGanError::Config(_)));
}

#[test]
fn cuda_device_needs_a_cuda_runtime() {
    let file = write_config(r#"{ "device": "cuda" }"#);
    let result = CycleGanConfig::from_json_file(file.path());
    if tch::Cuda::is_available() {
        assert_eq!(result.unwrap().device, DeviceChoice::Cuda);
    } else {
        assert_matches!(result, Err(CycleGanError::Config(_)));
    }
}
