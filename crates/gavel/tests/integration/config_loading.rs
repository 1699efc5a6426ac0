use gavel::config::Config;

use super::fixture_path;

#[test]
fn test_load_valid_config() {
    let config = Config::from_file(fixture_path("configs", "valid_full.toml"))
        .expect("Failed to load config");

    assert!(config.languages.contains_key("cpp"));
    assert!(config.languages.contains_key("python"));
    assert_eq!(config.default_limits.run_timeout, Some(2.0));
    assert_eq!(config.max_concurrent_gradings, 2);

    let cpp = config.get_language("cpp").unwrap();
    assert_eq!(config.effective_limits(cpp).run_timeout, Some(1.0));
    assert_eq!(config.effective_limits(cpp).compile_timeout, Some(20.0));
}

#[test]
fn test_load_minimal_config() {
    let config = Config::from_file(fixture_path("configs", "valid_minimal.toml"))
        .expect("Failed to load config");

    assert!(config.languages.contains_key("test"));
    assert_eq!(config.max_concurrent_gradings, 4);
}

#[test]
fn test_load_invalid_zero_concurrency() {
    let result = Config::from_file(fixture_path("configs", "invalid_zero_concurrency.toml"));
    assert!(result.is_err());
}

#[test]
fn test_load_invalid_empty_run_command() {
    let result = Config::from_file(fixture_path("configs", "invalid_empty_run_command.toml"));
    assert!(result.is_err());
}

#[test]
fn test_load_missing_file() {
    let result = Config::from_file(fixture_path("configs", "does_not_exist.toml"));
    assert!(result.is_err());
}
