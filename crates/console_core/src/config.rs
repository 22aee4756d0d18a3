use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_BASE_PATH: &str = "/api/v1";
const DEFAULT_SETTINGS_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub server_url: String,
    pub base_path: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            base_path: DEFAULT_BASE_PATH.into(),
            request_timeout_secs: 30,
            user_agent: concat!("employee-office-console/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl ConsoleSettings {
    /// Server url joined with the normalized base path, e.g. `http://host:8080/api/v1`.
    pub fn api_root(&self) -> anyhow::Result<Url> {
        let server_url = self.server_url.trim().trim_end_matches('/');
        let root = format!("{server_url}{}", normalize_base_path(&self.base_path));
        let url = Url::parse(&root).with_context(|| format!("invalid api root '{root}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("api root must use http or https: {root}");
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Defaults, then `console.toml` in the working directory, then environment.
pub fn load_settings() -> ConsoleSettings {
    let mut settings = ConsoleSettings::default();

    if let Ok(raw) = fs::read_to_string(DEFAULT_SETTINGS_FILE) {
        apply_file_values(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings);

    settings
}

/// Like [`load_settings`] but with an explicit file that must exist and parse.
pub fn load_settings_file(path: &Path) -> anyhow::Result<ConsoleSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    toml::from_str::<HashMap<String, toml::Value>>(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;

    let mut settings = ConsoleSettings::default();
    apply_file_values(&mut settings, &raw);
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn apply_file_values(settings: &mut ConsoleSettings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        return;
    };

    if let Some(v) = file_cfg.get("server_url").and_then(toml::Value::as_str) {
        settings.server_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("base_path").and_then(toml::Value::as_str) {
        settings.base_path = normalize_base_path(v);
    }
    if let Some(v) = file_cfg.get("request_timeout_secs") {
        let parsed = match v {
            toml::Value::Integer(secs) => u64::try_from(*secs).ok(),
            toml::Value::String(secs) => secs.trim().parse::<u64>().ok(),
            _ => None,
        };
        if let Some(secs) = parsed {
            settings.request_timeout_secs = secs;
        }
    }
}

fn apply_env_overrides(settings: &mut ConsoleSettings) {
    if let Ok(v) = std::env::var("CONSOLE_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Ok(v) = std::env::var("CONSOLE_BASE_PATH") {
        settings.base_path = normalize_base_path(&v);
    }
    if let Ok(v) = std::env::var("APP__BASE_PATH") {
        settings.base_path = normalize_base_path(&v);
    }

    if let Ok(v) = std::env::var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

/// Leading slash, no trailing slash; blank falls back to `/api/v1`.
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_BASE_PATH.to_string();
    }
    format!("/{trimmed}")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
