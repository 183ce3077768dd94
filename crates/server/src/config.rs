use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::UserRecord;

use crate::api::SeedData;

pub const DEFAULT_SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub seed_path: Option<String>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            seed_path: None,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    seed_path: Option<String>,
    log_filter: Option<String>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| {
        std::env::var(key).ok()
    })
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<FileSettings>(&raw) {
            if let Some(v) = file_cfg.bind_addr {
                settings.server_bind = v;
            }
            if let Some(v) = file_cfg.seed_path {
                settings.seed_path = Some(v);
            }
            if let Some(v) = file_cfg.log_filter {
                settings.log_filter = v;
            }
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("APP__SEED_PATH") {
        settings.seed_path = Some(v);
    }

    if let Some(v) = env("RUST_LOG") {
        settings.log_filter = v;
    }

    settings
}

/// Reads the initial users. A blank path means start empty.
pub fn load_seed_users(seed_path: &str) -> anyhow::Result<Vec<UserRecord>> {
    let seed_path = seed_path.trim();
    if seed_path.is_empty() {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(seed_path)
        .with_context(|| format!("failed to read seed file '{seed_path}'"))?;
    let seed: SeedData = serde_json::from_str(&raw)
        .with_context(|| format!("seed file '{seed_path}' is not valid users json"))?;
    Ok(seed.users)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
