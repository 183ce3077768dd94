use super::*;

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_and_env_yield_defaults() {
    let settings = load_client_settings_from(Path::new("/definitely/not/here.toml"), no_env);
    assert_eq!(settings, ClientSettings::default());
    assert_eq!(settings.api_url, "http://localhost:3000");
    assert_eq!(settings.fetch_delay(), Duration::from_millis(1000));
    assert_eq!(settings.retry_policy(), RetryPolicy::default());
}

#[test]
fn file_values_are_overridden_by_env() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("profile_client_settings_{suffix}.toml"));
    fs::write(
        &path,
        "api_url = \"http://file:4000\"\nfetch_delay_ms = 10\nquery_retries = 1\n",
    )
    .expect("write settings");

    let vars = HashMap::from([
        ("APP__API_URL", "http://env:5000"),
        ("APP__QUERY_RETRIES", "not-a-number"),
    ]);
    let settings = load_client_settings_from(&path, |key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(settings.api_url, "http://env:5000");
    assert_eq!(settings.fetch_delay_ms, 10);
    assert_eq!(settings.query_retries, 1);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn app_prefixed_env_wins_over_legacy_name() {
    let vars = HashMap::from([
        ("API_URL", "http://legacy:1"),
        ("APP__API_URL", "http://app:2"),
        ("APP__FETCH_DELAY_MS", "0"),
    ]);
    let settings = load_client_settings_from(Path::new("/definitely/not/here.toml"), |key| {
        vars.get(key).map(|v| v.to_string())
    });

    assert_eq!(settings.api_url, "http://app:2");
    assert_eq!(settings.fetch_delay(), Duration::ZERO);
}
