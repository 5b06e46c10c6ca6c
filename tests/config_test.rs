//! Experiment configuration tests

use std::time::Duration;

use trueno_gapbench::experiment::ExperimentConfig;
use trueno_gapbench::{Dataset, Error};

fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("gapbench-{}-{name}.json", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_from_file() {
    let path = write_temp(
        "full",
        r#"{
            "proportions": [0.05, 0.1, 0.2],
            "gap_widths": [1, 5, 10],
            "replicates": 20,
            "algorithms": ["linear", "spline"],
            "seed": 42,
            "threads": 4,
            "call_timeout_ms": 30000
        }"#,
    );
    let config = ExperimentConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.proportions(), &[0.05, 0.1, 0.2]);
    assert_eq!(config.replicates(), 20);
    assert_eq!(config.algorithms(), &["linear".to_string(), "spline".to_string()]);
    assert_eq!(config.seed(), 42);
    assert_eq!(config.threads(), Some(4));
    assert_eq!(config.call_timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn test_optional_fields_default() {
    let config = ExperimentConfig::from_json_str(
        r#"{"proportions": [0.1], "gap_widths": [2], "replicates": 3}"#,
    )
    .unwrap();
    assert!(config.algorithms().is_empty());
    assert_eq!(config.seed(), 0);
    assert_eq!(config.threads(), None);
}

#[test]
fn test_missing_file_is_io_error() {
    let result = ExperimentConfig::from_json_file("/nonexistent/gapbench/config.json");
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_malformed_json_is_json_error() {
    assert!(matches!(
        ExperimentConfig::from_json_str("{ proportions: }"),
        Err(Error::Json(_))
    ));
}

#[test]
fn test_negative_proportion_rejected() {
    let result = ExperimentConfig::from_json_str(
        r#"{"proportions": [-0.1], "gap_widths": [1], "replicates": 1}"#,
    );
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[test]
fn test_validation_names_offending_dataset() {
    let config = ExperimentConfig::builder()
        .proportions(vec![0.3])
        .gap_widths(vec![5])
        .replicates(2)
        .build()
        .unwrap();
    let long = Dataset::new("long", vec![1.0; 100]);
    // 0.3 * 5 = 1.5 >= 3 - 2
    let short = Dataset::new("short", vec![1.0, 2.0, 3.0]);

    assert!(config.validate(std::slice::from_ref(&long)).is_ok());
    let err = config.validate(&[long, short]).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(err.to_string().contains("short"));
}
