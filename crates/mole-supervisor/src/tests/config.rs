use crate::SupervisorConfig;
use crate::tests::{EnvGuard, clear_overrides};

use std::path::PathBuf;

use googletest::assert_that;
use googletest::prelude::{anything, contains_substring, eq, err, none, ok};
use serial_test::serial;
use tempfile::TempDir;

// =========================================================================
// Loading
// =========================================================================

#[test]
#[serial]
fn given_no_config_file_when_load_from_then_fixed_launch_contract() {
    // Given
    let _guards = clear_overrides();
    let temp = TempDir::new().unwrap();

    // When
    let result = SupervisorConfig::load_from(temp.path());

    // Then
    assert_that!(result, ok(anything()));
    let config = result.unwrap();
    assert_that!(config.server.host.as_str(), eq("127.0.0.1"));
    assert_that!(config.server.port, eq(8081));
    assert_that!(config.server.suppress_browser, eq(true));
    assert_that!(config.server.templates_dir, none());
    assert_that!(config.binary.name.as_str(), eq("web-go"));
    assert_that!(config.health.path.as_str(), eq("/health"));
    assert_that!(config.health.interval_ms, eq(500));
    assert_that!(config.health.max_attempts, eq(20));
    assert_that!(config.health.request_timeout_ms, eq(750));
    assert_that!(config.log_sink.file_name.as_str(), eq("server.log"));
}

#[test]
#[serial]
fn given_partial_toml_when_load_from_then_missing_fields_defaulted() {
    // Given
    let _guards = clear_overrides();
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.toml"),
        r#"
            [server]
            port = 9090

            [health]
            max_attempts = 5
        "#,
    )
    .unwrap();

    // When
    let config = SupervisorConfig::load_from(temp.path()).unwrap();

    // Then
    assert_that!(config.server.port, eq(9090));
    assert_that!(config.server.host.as_str(), eq("127.0.0.1"));
    assert_that!(config.health.max_attempts, eq(5));
    assert_that!(config.health.interval_ms, eq(500));
}

#[test]
#[serial]
fn given_env_port_and_toml_when_load_from_then_env_overrides_toml() {
    // Given
    let _guards = clear_overrides();
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), "[server]\nport = 9090\n").unwrap();
    let _port = EnvGuard::set(crate::ENV_PORT, "7777");

    // When
    let config = SupervisorConfig::load_from(temp.path()).unwrap();

    // Then
    assert_that!(config.server.port, eq(7777));
}

#[test]
#[serial]
fn given_unparseable_env_port_when_load_from_then_keeps_default() {
    let _guards = clear_overrides();
    let temp = TempDir::new().unwrap();
    let _port = EnvGuard::set(crate::ENV_PORT, "not-a-port");

    let config = SupervisorConfig::load_from(temp.path()).unwrap();

    assert_that!(config.server.port, eq(8081));
}

#[test]
#[serial]
fn given_env_binary_and_templates_when_load_from_then_paths_set() {
    let _guards = clear_overrides();
    let temp = TempDir::new().unwrap();
    let _binary = EnvGuard::set(crate::ENV_BINARY, "/opt/mole/web-go");
    let _templates = EnvGuard::set(crate::ENV_TEMPLATES, "/src/mole/cmd/web/templates");

    let config = SupervisorConfig::load_from(temp.path()).unwrap();

    assert_eq!(config.binary.path, Some(PathBuf::from("/opt/mole/web-go")));
    assert_eq!(
        config.server.templates_dir,
        Some(PathBuf::from("/src/mole/cmd/web/templates"))
    );
}

#[test]
#[serial]
fn given_malformed_toml_when_load_from_then_error_names_file() {
    // Given
    let _guards = clear_overrides();
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), "[server\nport = ").unwrap();

    // When
    let result = SupervisorConfig::load_from(temp.path());

    // Then
    assert_that!(result, err(anything()));
    let err_msg = result.unwrap_err().to_string();
    assert_that!(err_msg, contains_substring("config.toml"));
}

#[test]
#[serial]
fn given_config_dir_env_when_config_dir_then_env_wins() {
    let _guards = clear_overrides();
    let temp = TempDir::new().unwrap();
    let _dir = EnvGuard::set(crate::ENV_CONFIG_DIR, temp.path().to_str().unwrap());

    let dir = SupervisorConfig::config_dir().unwrap();

    assert_eq!(dir, temp.path().to_path_buf());
}

// =========================================================================
// Validation
// =========================================================================

#[test]
fn given_defaults_when_validate_then_ok() {
    let result = SupervisorConfig::default().validate();

    assert_that!(result, ok(anything()));
}

#[test]
fn given_localhost_when_validate_then_ok() {
    let mut config = SupervisorConfig::default();
    config.server.host = "localhost".into();

    assert_that!(config.validate(), ok(anything()));
}

#[test]
fn given_non_loopback_host_when_validate_then_error() {
    let mut config = SupervisorConfig::default();
    config.server.host = "0.0.0.0".into();

    let result = config.validate();

    assert_that!(result, err(anything()));
    let err_msg = result.unwrap_err().to_string();
    assert_that!(err_msg, contains_substring("server.host"));
}

#[test]
fn given_privileged_port_when_validate_then_error() {
    let mut config = SupervisorConfig::default();
    config.server.port = 80;

    assert_that!(config.validate(), err(anything()));
}

#[test]
fn given_zero_attempts_when_validate_then_error() {
    let mut config = SupervisorConfig::default();
    config.health.max_attempts = 0;

    let result = config.validate();

    assert_that!(result, err(anything()));
    let err_msg = result.unwrap_err().to_string();
    assert_that!(err_msg, contains_substring("health.max_attempts"));
}

#[test]
fn given_one_second_request_timeout_when_validate_then_error() {
    let mut config = SupervisorConfig::default();
    config.health.request_timeout_ms = 1000;

    let result = config.validate();

    assert_that!(result, err(anything()));
    let err_msg = result.unwrap_err().to_string();
    assert_that!(err_msg, contains_substring("request_timeout_ms"));
}

#[test]
fn given_interval_below_minimum_when_validate_then_error() {
    let mut config = SupervisorConfig::default();
    config.health.interval_ms = 1;

    assert_that!(config.validate(), err(anything()));
}

#[test]
fn given_health_path_without_slash_when_validate_then_error() {
    let mut config = SupervisorConfig::default();
    config.health.path = "health".into();

    assert_that!(config.validate(), err(anything()));
}

#[test]
fn given_binary_name_with_separator_when_validate_then_error() {
    let mut config = SupervisorConfig::default();
    config.binary.name = "bin/web-go".into();

    let result = config.validate();

    assert_that!(result, err(anything()));
    let err_msg = result.unwrap_err().to_string();
    assert_that!(err_msg, contains_substring("binary.name"));
}

// =========================================================================
// Derived values
// =========================================================================

#[test]
fn given_defaults_when_health_url_then_loopback_health_endpoint() {
    let config = SupervisorConfig::default();

    assert_that!(config.health_url().as_str(), eq("http://127.0.0.1:8081/health"));
    assert_that!(config.server_url().as_str(), eq("http://127.0.0.1:8081"));
}

#[test]
fn given_log_directory_when_log_path_then_joined_with_file_name() {
    let mut config = SupervisorConfig::default();
    config.log_sink.directory = Some(PathBuf::from("/var/tmp/mole"));

    let path = config.log_path().unwrap();

    assert_eq!(path, PathBuf::from("/var/tmp/mole/server.log"));
}
