use reposcope::Settings;
use std::env;
use tempfile::TempDir;

#[test]
fn test_file_and_env_layering() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.toml");
    std::fs::write(
        &config_path,
        r#"
[indexing]
concurrency = 3
parse_timeout_ms = 250

[search]
max_results = 12

[search.weights]
comment = 0.1
"#,
    )
    .unwrap();

    unsafe {
        // Double underscore separates nested levels
        env::set_var("RS_SEARCH__MAX_RESULTS", "7");
        env::set_var("RS_WATCH__DEBOUNCE_MS", "40");
    }

    let settings = Settings::load_from(&config_path).unwrap();

    unsafe {
        env::remove_var("RS_SEARCH__MAX_RESULTS");
        env::remove_var("RS_WATCH__DEBOUNCE_MS");
    }

    assert_eq!(settings.indexing.concurrency, 3);
    assert_eq!(settings.indexing.parse_timeout_ms, 250);
    assert_eq!(settings.search.weights.comment, 0.1);
    assert_eq!(settings.search.weights.symbol_definition, 3.0);
    assert_eq!(settings.search.max_results, 7, "env overrides the file");
    assert_eq!(settings.watch.debounce_ms, 40);
    assert_eq!(settings.indexing.ignore_patterns[0], "node_modules/**");
}
