use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use client_core::{parse_endpoint, ZipPolicy, DEFAULT_ENDPOINT_URL};
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "analyzer.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint_url: String,
    pub zip_policy: ZipPolicy,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.into(),
            zip_policy: ZipPolicy::Strict,
            log_filter: "info".into(),
        }
    }
}

pub fn load_settings(config_path: &Path) -> Settings {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

/// Defaults, then the optional TOML file, then environment overrides.
pub fn load_settings_with(config_path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("endpoint_url") {
                settings.endpoint_url = v.clone();
            }
            if let Some(policy) = file_cfg.get("zip_policy").and_then(|v| v.parse().ok()) {
                settings.zip_policy = policy;
            }
            if let Some(v) = file_cfg.get("log_filter") {
                settings.log_filter = v.clone();
            }
        }
    }

    if let Some(v) = env("ANALYZER_ENDPOINT_URL") {
        settings.endpoint_url = v;
    }
    if let Some(v) = env("APP__ENDPOINT_URL") {
        settings.endpoint_url = v;
    }

    if let Some(policy) = env("APP__ZIP_POLICY").and_then(|v| v.parse().ok()) {
        settings.zip_policy = policy;
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    settings
}

pub fn resolve_endpoint(raw_endpoint: &str) -> anyhow::Result<Url> {
    parse_endpoint(raw_endpoint)
        .with_context(|| format!("invalid analysis endpoint '{raw_endpoint}'"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
