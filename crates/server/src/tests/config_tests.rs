use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_path(name: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("profile_server_{name}_{suffix}"))
}

#[test]
fn defaults_bind_the_mock_api_port() {
    let settings = load_settings_from(Path::new("/definitely/not/here.toml"), |_| None);
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.server_bind, "127.0.0.1:3000");
}

#[test]
fn env_overrides_file_settings() {
    let path = temp_path("settings.toml");
    fs::write(&path, "bind_addr = \"0.0.0.0:4000\"\nseed_path = \"db.json\"\n")
        .expect("write settings");
    let vars = HashMap::from([("APP__BIND_ADDR", "127.0.0.1:5000")]);

    let settings = load_settings_from(&path, |key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(settings.server_bind, "127.0.0.1:5000");
    assert_eq!(settings.seed_path.as_deref(), Some("db.json"));
    fs::remove_file(path).expect("cleanup");
}

#[test]
fn seed_file_loads_users() {
    let path = temp_path("db.json");
    fs::write(
        &path,
        r#"{"users":[{"id":"1","name":"Alice","email":"a@b.com","phone":"555"}]}"#,
    )
    .expect("write seed");

    let users = load_seed_users(path.to_string_lossy().as_ref()).expect("seed");

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Alice");
    fs::remove_file(path).expect("cleanup");
}

#[test]
fn blank_seed_path_starts_empty_and_bad_json_fails() {
    assert!(load_seed_users("  ").expect("blank").is_empty());

    let path = temp_path("bad.json");
    fs::write(&path, "not json").expect("write seed");
    let err = load_seed_users(path.to_string_lossy().as_ref()).expect_err("bad json");
    assert!(err.to_string().contains("not valid users json"));
    fs::remove_file(path).expect("cleanup");
}
