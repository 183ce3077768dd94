use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{query_cache::RetryPolicy, DEFAULT_API_URL, DEFAULT_FETCH_DELAY};

pub const DEFAULT_SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_url: String,
    pub fetch_delay_ms: u64,
    pub query_retries: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            fetch_delay_ms: DEFAULT_FETCH_DELAY.as_millis() as u64,
            query_retries: RetryPolicy::default().max_retries,
        }
    }
}

impl ClientSettings {
    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.query_retries,
            ..RetryPolicy::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    fetch_delay_ms: Option<u64>,
    query_retries: Option<u32>,
}

/// Defaults, then `client.toml` in the working directory, then environment.
pub fn load_client_settings() -> ClientSettings {
    load_client_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| {
        std::env::var(key).ok()
    })
}

pub fn load_client_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.api_url {
                    settings.api_url = v;
                }
                if let Some(v) = file_cfg.fetch_delay_ms {
                    settings.fetch_delay_ms = v;
                }
                if let Some(v) = file_cfg.query_retries {
                    settings.query_retries = v;
                }
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "ignoring malformed client settings file");
            }
        }
    }

    if let Some(v) = env("API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("APP__FETCH_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.fetch_delay_ms = parsed;
        }
    }

    if let Some(v) = env("APP__QUERY_RETRIES") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.query_retries = parsed;
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
