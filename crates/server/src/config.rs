use std::{collections::HashMap, path::Path};

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;
use shared::domain::{KitchenId, StoreId};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KitchenSetting {
    pub id: KitchenId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub event_buffer: usize,
    pub max_body_bytes: usize,
    pub store_id: StoreId,
    #[serde(default = "default_kitchens")]
    pub kitchens: Vec<KitchenSetting>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            event_buffer: 256,
            max_body_bytes: 64 * 1024,
            store_id: StoreId(1),
            kitchens: default_kitchens(),
        }
    }
}

fn default_kitchens() -> Vec<KitchenSetting> {
    ["Grill", "Fryer", "Drinks"]
        .into_iter()
        .enumerate()
        .map(|(index, name)| KitchenSetting {
            id: KitchenId(index as i64 + 1),
            name: name.to_string(),
        })
        .collect()
}

/// Defaults, then `server.toml` if present, then `APP__*` variables.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(None, None)
}

/// Same layering with an explicit file and, for tests, an explicit
/// environment map instead of the process environment.
pub fn load_settings_from(
    file: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> anyhow::Result<Settings> {
    let defaults = Settings::default();
    let file_source = match file {
        Some(path) => File::from(path).required(true),
        None => File::with_name("server").required(false),
    };
    let settings = Config::builder()
        .set_default("server_bind", defaults.server_bind)?
        .set_default("event_buffer", defaults.event_buffer as u64)?
        .set_default("max_body_bytes", defaults.max_body_bytes as u64)?
        .set_default("store_id", defaults.store_id.0)?
        .add_source(file_source)
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()
        .context("failed to read server settings")?
        .try_deserialize::<Settings>()
        .context("invalid server settings")?;
    if settings.event_buffer == 0 {
        anyhow::bail!("event_buffer must be greater than zero");
    }
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
