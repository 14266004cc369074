//! Configuration files driving registry construction and the CLI run context.

use std::path::PathBuf;

use export_progress::cli::{Commands, ConfigFormat, RunContext};
use export_progress::config::{ConfigLoader, CounterPolicy, ExportProgressConfig};
use tempfile::TempDir;

#[test]
fn config_file_configures_registry() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("export.toml");
    std::fs::write(
        &config_file,
        r#"
[registry]
reap_interval_secs = 60
max_age_secs = 120.5
counter_policy = "clamp"
stall_timeout_secs = 3600

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.registry.reap_interval_secs, 60.0);
    assert_eq!(config.registry.max_age_secs, 120.5);
    assert_eq!(config.registry.counter_policy, CounterPolicy::Clamp);
    assert_eq!(config.registry.stall_timeout_secs, Some(3600.0));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");

    let registry = config.build_registry().unwrap();
    registry.create("e", None);
    registry.update("e", 10, 10);
    registry.update("e", 5, 5);
    assert_eq!(registry.get("e").unwrap().rows_processed, 10);
}

#[test]
fn missing_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml"));
    assert!(result.is_err());
}

#[test]
fn invalid_settings_fail_run_context() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("bad.toml");
    std::fs::write(&config_file, "[registry]\nmax_age_secs = -1\n").unwrap();

    let result = RunContext::new(temp_dir.path().to_path_buf(), Some(config_file));
    let err = result.err().expect("negative max age must be rejected");
    assert!(err.to_string().contains("max_age_secs"));
}

#[test]
fn config_command_renders_json() {
    let ctx = RunContext::from_config(PathBuf::from("."), ExportProgressConfig::default()).unwrap();
    let out = ctx
        .execute(&Commands::Config {
            format: ConfigFormat::Json,
        })
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["registry"]["counter_policy"], "accept");
    assert!(value["registry"]["stall_timeout_secs"].is_null());
}
