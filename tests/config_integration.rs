//! Integration tests for pipeline files and engine settings on disk.

mod common;

use common::expect_signal;
use daqflow::config::{EngineSettings, PipelineSpec};
use daqflow::pipeline::{ExecutorSettings, Signal, Value};
use daqflow::{Block, DaqflowError, ScriptEngine};
use std::fs;
use tempfile::TempDir;

const EMG_TOML: &str = r#"
name = "emg"

[pipeline]
series = [
    { block = "ensure_2d" },
    { block = "windower", length = 4, name = "window" },
    { block = "filter", b = [0.5, 0.5] },
    { parallel = [
        { block = "centerer" },
        { block = "script", source = "rms(x[0])", name = "power" },
    ] },
]
"#;

#[test]
fn test_toml_pipeline_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("emg.toml");
    fs::write(&path, EMG_TOML).unwrap();

    let mut graph = PipelineSpec::load(&path)
        .unwrap()
        .compile(&ScriptEngine::new(), ExecutorSettings::default())
        .unwrap();
    assert_eq!(graph.name(), "emg");
    assert_eq!(
        graph.named_blocks().map(|(path, _)| path).collect::<Vec<_>>(),
        vec!["Ensure2D", "window", "Filter", "Centerer", "power"]
    );

    // window [0, 0, 2, 2] -> filtered [0, 0, 1, 2]
    let out = graph.run(vec![2.0, 2.0]).unwrap();
    let items = out.as_tuple().unwrap();
    assert_eq!(
        items[0],
        Value::Signal(Signal::from_rows(&[[-0.75, -0.75, 0.25, 1.25]]).unwrap())
    );
    let power = items[1].as_scalar().unwrap();
    assert!((power - (5.0f64 / 4.0).sqrt()).abs() < 1e-12);
}

#[test]
fn test_json_pipeline_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pair.JSON");
    fs::write(
        &path,
        r#"{
            "input_tuple": 2,
            "pipeline": {
                "series": [
                    { "parallel": [
                        { "block": "script", "source": "x[0] - x[1]", "inputs": 2, "name": "diff" },
                        { "block": "script", "source": "x[0] + x[1]", "inputs": 2, "name": "sum" }
                    ] },
                    { "block": "script", "source": "x[0] * x[1]", "inputs": 2 }
                ]
            }
        }"#,
    )
    .unwrap();

    let mut graph = PipelineSpec::load(&path)
        .unwrap()
        .compile(&ScriptEngine::new(), ExecutorSettings::default())
        .unwrap();
    // (5 - 3) * (5 + 3)
    assert_eq!(graph.run(Value::tuple([5.0, 3.0])).unwrap(), Value::Scalar(16.0));
}

#[test]
fn test_invalid_pipeline_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[pipeline]\nblock = \"fft\"\n").unwrap();

    let err = PipelineSpec::load(&path).unwrap_err();
    assert!(matches!(err, DaqflowError::WithContext { .. }));
    assert!(matches!(err.root(), DaqflowError::Config(_)));
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn test_missing_pipeline_file() {
    let dir = TempDir::new().unwrap();
    let err = PipelineSpec::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, DaqflowError::Config(_)));
}

#[test]
fn test_incompatible_pipeline_fails_before_running() {
    let spec = PipelineSpec::from_toml_str(
        r#"
        [pipeline]
        series = [
            { parallel = [{ block = "centerer" }, { block = "centerer" }] },
            { block = "windower", length = 2 },
        ]
        "#,
    )
    .unwrap();
    let err = spec
        .compile(&ScriptEngine::new(), ExecutorSettings::default())
        .unwrap_err();
    match err {
        DaqflowError::Pipeline(e) => assert!(e.is_configuration()),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_settings_round_trip_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("settings.toml");

    let mut settings = EngineSettings::default();
    settings.logging.filter = "warn,daqflow::pipeline=trace".to_string();
    settings.logging.ansi = false;
    settings.script.max_operations = 5_000;
    settings.executor.trace_blocks = true;
    settings.save_to(&path).unwrap();

    assert_eq!(EngineSettings::load_from(&path).unwrap(), settings);
}

#[test]
fn test_settings_drive_script_limits() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(&path, "[script]\nmax_operations = 50\n").unwrap();

    let settings = EngineSettings::load_from(&path).unwrap();
    let engine = ScriptEngine::with_settings(&settings.script);
    let spec = PipelineSpec::from_toml_str(
        r#"
        [pipeline]
        block = "script"
        source = "let s = 0.0; for i in 0..10000 { s += 1.0; } s"
        "#,
    )
    .unwrap();
    let mut graph = spec.compile(&engine, settings.executor).unwrap();
    assert!(graph.run(0.0).is_err());
}

#[test]
fn test_malformed_settings_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(&path, "[logging]\nansi = \"yes\"\n").unwrap();
    assert!(matches!(
        EngineSettings::load_from(&path),
        Err(DaqflowError::Config(_))
    ));
}

#[test]
fn test_segmented_recording_through_file_pipeline() {
    let spec = PipelineSpec::from_toml_str(
        r#"
        [pipeline]
        series = [{ block = "filter", b = [1.0] }, { block = "centerer" }]
        "#,
    )
    .unwrap();
    let mut graph = spec
        .compile(&ScriptEngine::new(), ExecutorSettings::default())
        .unwrap();

    let recording = common::ramp_signal(2, 6);
    for chunk in daqflow::pipeline::segment(&recording, 3, 0).unwrap() {
        let out = expect_signal(graph.run(chunk).unwrap());
        for row in out.rows() {
            assert!(row.iter().sum::<f64>().abs() < 1e-9);
        }
    }
    assert_eq!(graph.passes(), 2);
}
