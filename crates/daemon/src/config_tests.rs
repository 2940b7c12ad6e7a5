use super::*;
use hids_engine::BackpressurePolicy;
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

fn clear_env() {
    std::env::remove_var("HIDS_CONFIG");
    std::env::remove_var("DEBUG_MODE");
    std::env::remove_var("HIDS_LOG_DIR");
}

#[test]
#[serial]
fn load_with_no_env_or_file_returns_defaults() {
    clear_env();
    let config = RuntimeConfig::load().unwrap();
    assert_eq!(config, RuntimeConfig::default());
}

#[test]
#[serial]
fn missing_config_file_path_is_not_an_error() {
    clear_env();
    std::env::set_var("HIDS_CONFIG", "/nonexistent/path/hids.toml");
    let config = RuntimeConfig::load().unwrap();
    assert_eq!(config.num_workers, RuntimeConfig::default().num_workers);
    clear_env();
}

#[test]
#[serial]
fn toml_file_overrides_named_fields_only() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "num_workers = 8").unwrap();
    writeln!(file, "backpressure_policy = \"drop\"").unwrap();
    std::env::set_var("HIDS_CONFIG", file.path());

    let config = RuntimeConfig::load().unwrap();
    assert_eq!(config.num_workers, 8);
    assert_eq!(config.backpressure_policy, BackpressurePolicy::Drop);
    assert_eq!(
        config.poll_interval_secs,
        RuntimeConfig::default().poll_interval_secs
    );
    clear_env();
}

#[test]
#[serial]
fn malformed_toml_file_is_a_validation_error() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "num_workers = [this is not valid toml").unwrap();
    std::env::set_var("HIDS_CONFIG", file.path());

    assert!(matches!(
        RuntimeConfig::load(),
        Err(ConfigError::Parse { .. })
    ));
    clear_env();
}

#[test]
#[serial]
fn debug_mode_env_overrides_the_toml_default() {
    clear_env();
    std::env::set_var("DEBUG_MODE", "false");
    let config = RuntimeConfig::load().unwrap();
    assert!(!config.debug_mode);
    clear_env();
}

#[test]
#[serial]
fn hids_log_dir_env_redirects_all_three_rotating_sinks() {
    clear_env();
    std::env::set_var("HIDS_LOG_DIR", "/tmp/hids-test-logs");
    let config = RuntimeConfig::load().unwrap();
    assert_eq!(
        config.runtime_log_path,
        PathBuf::from("/tmp/hids-test-logs/runtime.log")
    );
    assert_eq!(
        config.detection_log_path,
        PathBuf::from("/tmp/hids-test-logs/detection.log")
    );
    assert_eq!(
        config.alert_log_path,
        PathBuf::from("/tmp/hids-test-logs/alerts.log")
    );
    clear_env();
}

#[test]
#[serial]
fn env_overrides_apply_after_the_toml_file() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "debug_mode = true").unwrap();
    std::env::set_var("HIDS_CONFIG", file.path());
    std::env::set_var("DEBUG_MODE", "false");

    let config = RuntimeConfig::load().unwrap();
    assert!(!config.debug_mode);
    clear_env();
}
