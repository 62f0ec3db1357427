use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_dir(label: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("researchhub_{label}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

#[test]
fn defaults_point_at_local_backend() {
    let settings = Settings::default();
    assert_eq!(settings.api_base_url, "http://localhost:8080/api");
    assert_eq!(settings.search_debounce(), Duration::from_millis(300));
    assert_eq!(settings.page_size, 10);
}

#[test]
fn missing_file_keeps_defaults() {
    let mut settings = Settings::default();
    apply_file(&mut settings, Path::new("/definitely/not/here.toml")).expect("missing is fine");
    assert_eq!(settings, Settings::default());
}

#[test]
fn file_values_override_defaults() {
    let dir = temp_dir("file");
    let path = dir.join("researchhub.toml");
    fs::write(
        &path,
        "api_base_url = \"https://rh.example.edu/api\"\npage_size = 25\nsearch_debounce_ms = 150\n",
    )
    .expect("write config");

    let mut settings = Settings::default();
    apply_file(&mut settings, &path).expect("apply file");

    assert_eq!(settings.api_base_url, "https://rh.example.edu/api");
    assert_eq!(settings.page_size, 25);
    assert_eq!(settings.search_debounce_ms, 150);
    assert_eq!(settings.database_url, Settings::default().database_url);

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn malformed_file_is_an_error() {
    let dir = temp_dir("bad");
    let path = dir.join("researchhub.toml");
    fs::write(&path, "page_size = \"many\"").expect("write config");

    let err = apply_file(&mut Settings::default(), &path).expect_err("bad type");
    assert!(err.to_string().contains("failed to parse"));

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn app_prefixed_env_wins_and_bad_numbers_are_ignored() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("RESEARCHHUB_API_URL", "http://short/api"),
        ("APP__API_BASE_URL", "http://app/api"),
        ("RESEARCHHUB_DATABASE_URL", "sqlite::memory:"),
        ("RESEARCHHUB_PAGE_SIZE", "0"),
        ("APP__SEARCH_DEBOUNCE_MS", "soon"),
        ("RESEARCHHUB_REQUEST_TIMEOUT_SECS", "0"),
    ]);

    let mut settings = Settings::default();
    apply_env(&mut settings, |key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(settings.api_base_url, "http://app/api");
    assert_eq!(settings.database_url, "sqlite::memory:");
    assert_eq!(settings.page_size, 10);
    assert_eq!(settings.search_debounce_ms, 300);
    assert_eq!(settings.request_timeout(), None);
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("  "),
        Settings::default().database_url
    );
}

#[tokio::test]
async fn normalized_url_opens_a_fresh_store_in_a_nested_directory() {
    let dir = temp_dir("open");
    let db_path = dir.join("nested").join("researchhub.db");

    let url = normalize_database_url(db_path.to_string_lossy().as_ref());
    let storage = storage::Storage::new(&url).await.expect("open sqlite");
    drop(storage);

    assert!(db_path.exists(), "database file should exist: {}", db_path.display());
    fs::remove_dir_all(dir).expect("cleanup");
}
