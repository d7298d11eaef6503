// tests/config_loading.rs
//
// Config resolution: env-var path override first, then the default path,
// then built-in defaults. Serialized because the env var is process-global.

use newsgate::config::{Config, ENV_CONFIG_PATH};
use std::io::Write;

#[serial_test::serial]
#[test]
fn env_override_points_at_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(
        f,
        "[health]\ndegraded_after = 2\n\n[ingest]\nbatch_size = 5\n"
    )
    .unwrap();

    std::env::set_var(ENV_CONFIG_PATH, &path);
    let cfg = Config::load_default().unwrap();
    std::env::remove_var(ENV_CONFIG_PATH);

    assert_eq!(cfg.health.degraded_after, 2);
    assert_eq!(cfg.ingest.batch_size, 5);
    // Everything else falls back to defaults.
    assert_eq!(cfg.health.error_after, 6);
    assert_eq!(cfg.extract.min_content_chars, 50);
}

#[serial_test::serial]
#[test]
fn missing_env_file_is_an_error() {
    std::env::set_var(ENV_CONFIG_PATH, "/nonexistent/newsgate.toml");
    let res = Config::load_default();
    std::env::remove_var(ENV_CONFIG_PATH);
    assert!(res.is_err());
}

#[serial_test::serial]
#[test]
fn no_file_anywhere_yields_defaults() {
    std::env::remove_var(ENV_CONFIG_PATH);
    let old = std::env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_current_dir(tmp.path()).unwrap();

    let cfg = Config::load_default().unwrap();

    std::env::set_current_dir(old).unwrap();
    assert_eq!(cfg.health.disable_after, 10);
    assert_eq!(cfg.quality.min_word_count, 100);
}
