use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use checkout_core::{NavigatorOptions, SessionSettings};
use embedding::EmbeddedOptions;
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "checkout.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub store_url: String,
    pub checkout_id: String,
    pub current_url: String,
    pub login_url: String,
    /// Set when the checkout runs embedded in another page.
    pub container_id: Option<String>,
    pub parent_origin: String,
    pub view_debounce_ms: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: "http://127.0.0.1:8080".into(),
            checkout_id: String::new(),
            current_url: "http://127.0.0.1:8080/checkout".into(),
            login_url: "/login.php".into(),
            container_id: None,
            parent_origin: "*".into(),
            view_debounce_ms: 300,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn embedding(&self) -> Option<EmbeddedOptions> {
        self.container_id.as_ref().map(|_| EmbeddedOptions {
            parent_origin: self.parent_origin.clone(),
        })
    }

    pub fn navigator_options(&self) -> NavigatorOptions {
        NavigatorOptions {
            login_url: self.login_url.clone(),
            view_delay: Duration::from_millis(self.view_debounce_ms),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            container_id: self.container_id.clone().unwrap_or_default(),
            current_url: self.current_url.clone(),
        }
    }
}

/// Defaults, then the settings file, then `CHECKOUT_*` and `APP__*`
/// environment variables. A missing file is not an error unless it was
/// asked for explicitly.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    match fs::read_to_string(file) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", file.display()))?,
        Err(err) if path.is_some() => {
            return Err(err).with_context(|| format!("failed to read '{}'", file.display()))
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

pub fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    for (key, value) in file_cfg {
        set(settings, &key, value);
    }
    Ok(())
}

pub fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    for key in KEYS {
        let upper = key.to_ascii_uppercase();
        if let Some(v) = lookup(&format!("CHECKOUT_{upper}")) {
            set(settings, key, v);
        }
        if let Some(v) = lookup(&format!("APP__{upper}")) {
            set(settings, key, v);
        }
    }
}

const KEYS: [&str; 8] = [
    "store_url",
    "checkout_id",
    "current_url",
    "login_url",
    "container_id",
    "parent_origin",
    "view_debounce_ms",
    "log_filter",
];

fn set(settings: &mut Settings, key: &str, value: String) {
    match key {
        "store_url" => settings.store_url = value,
        "checkout_id" => settings.checkout_id = value,
        "current_url" => settings.current_url = value,
        "login_url" => settings.login_url = value,
        "container_id" => {
            settings.container_id = Some(value).filter(|id| !id.trim().is_empty());
        }
        "parent_origin" => settings.parent_origin = value,
        "view_debounce_ms" => {
            if let Ok(parsed) = value.parse::<u64>() {
                settings.view_debounce_ms = parsed;
            }
        }
        "log_filter" => settings.log_filter = value,
        _ => {}
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
