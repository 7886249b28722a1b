// ABOUTME: Integration tests for environment-driven configuration loading
// ABOUTME: Serialized because they mutate process environment variables

#![allow(missing_docs, clippy::unwrap_used)]

use std::env;

use serial_test::serial;
use velo_rental::config::ServerConfig;

fn clear_config_env() {
    for key in [
        "ADDR",
        "DATABASE_URL",
        "JWT_SECRET",
        "ADMIN_CREDENTIALS",
        "TOKEN_EXPIRY_DAYS",
    ] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn loads_full_configuration_from_env() {
    clear_config_env();
    env::set_var("ADDR", "0.0.0.0:9000");
    env::set_var("DATABASE_URL", "sqlite:/tmp/rental-test.db");
    env::set_var("JWT_SECRET", "a-long-enough-test-secret");
    env::set_var("ADMIN_CREDENTIALS", "ops:wheelie");
    env::set_var("TOKEN_EXPIRY_DAYS", "7");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.addr, "0.0.0.0:9000");
    assert_eq!(config.database_url, "sqlite:/tmp/rental-test.db");
    assert_eq!(config.admin.username, "ops");
    assert_eq!(config.admin.password, "wheelie");
    assert_eq!(config.token_expiry_days, 7);

    clear_config_env();
}

#[test]
#[serial]
fn defaults_apply_when_optional_vars_are_unset() {
    clear_config_env();
    env::set_var("JWT_SECRET", "a-long-enough-test-secret");
    env::set_var("ADMIN_CREDENTIALS", "admin:password");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.addr, "127.0.0.1:8080");
    assert!(config.database_url.starts_with("sqlite:"));
    assert_eq!(config.token_expiry_days, 30);

    clear_config_env();
}

#[test]
#[serial]
fn missing_required_vars_are_all_reported_at_once() {
    clear_config_env();

    let err = ServerConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("JWT_SECRET"), "error was: {err}");
    assert!(err.contains("ADMIN_CREDENTIALS"), "error was: {err}");

    env::set_var("JWT_SECRET", "a-long-enough-test-secret");
    let err = ServerConfig::from_env().unwrap_err().to_string();
    assert!(!err.contains("JWT_SECRET"), "error was: {err}");
    assert!(err.contains("ADMIN_CREDENTIALS"), "error was: {err}");

    clear_config_env();
}

#[test]
#[serial]
fn required_vars_are_enforced() {
    clear_config_env();
    assert!(ServerConfig::from_env().is_err());

    env::set_var("JWT_SECRET", "short");
    env::set_var("ADMIN_CREDENTIALS", "admin:password");
    assert!(ServerConfig::from_env().is_err());

    env::set_var("JWT_SECRET", "a-long-enough-test-secret");
    env::set_var("ADMIN_CREDENTIALS", "malformed");
    assert!(ServerConfig::from_env().is_err());

    clear_config_env();
}
