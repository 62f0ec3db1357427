use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "researchhub.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub database_url: String,
    pub search_debounce_ms: u64,
    pub page_size: u32,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".into(),
            database_url: "sqlite://./data/researchhub.db".into(),
            search_debounce_ms: 300,
            page_size: 10,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// `None` disables the client-side timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    database_url: Option<String>,
    search_debounce_ms: Option<u64>,
    page_size: Option<u32>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then `researchhub.toml` in the working directory, then the
/// environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    let path = std::env::var("RESEARCHHUB_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
    apply_file(&mut settings, Path::new(&path))?;
    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

/// A missing file is fine; a file that does not parse is not.
pub fn apply_file(settings: &mut Settings, path: &Path) -> anyhow::Result<()> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    let file_cfg: FileSettings = toml::from_str(&raw)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;

    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.search_debounce_ms {
        settings.search_debounce_ms = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    Ok(())
}

/// `APP__*` wins over `RESEARCHHUB_*` when both are set. Numbers that do
/// not parse are ignored.
pub fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |short: &str, app: &str| lookup(app).or_else(|| lookup(short));

    if let Some(v) = var("RESEARCHHUB_API_URL", "APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("RESEARCHHUB_DATABASE_URL", "APP__DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("RESEARCHHUB_SEARCH_DEBOUNCE_MS", "APP__SEARCH_DEBOUNCE_MS") {
        if let Ok(parsed) = v.parse() {
            settings.search_debounce_ms = parsed;
        }
    }
    if let Some(v) = var("RESEARCHHUB_PAGE_SIZE", "APP__PAGE_SIZE") {
        if let Ok(parsed) = v.parse::<u32>() {
            if parsed > 0 {
                settings.page_size = parsed;
            }
        }
    }
    if let Some(v) = var("RESEARCHHUB_REQUEST_TIMEOUT_SECS", "APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse() {
            settings.request_timeout_secs = parsed;
        }
    }
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.replace('\\', "/");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
