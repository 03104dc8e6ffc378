use std::path::PathBuf;

use rocket::figment::Figment;
use serde::{Deserialize, Serialize};

const CONFIG_KEY: &str = "moneylog";

/// Application settings read from the `moneylog` table of Rocket's
/// configuration (`Rocket.toml` or `ROCKET_MONEYLOG`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub static_dir: PathBuf,
    pub max_sessions: i64,
    pub cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data").join("moneylog.sqlite"),
            static_dir: PathBuf::from("static"),
            max_sessions: 5,
            cache_ttl_secs: 30,
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        Self::from_figment(&rocket::Config::figment())
    }

    pub fn from_figment(figment: &Figment) -> Self {
        if !figment.contains(CONFIG_KEY) {
            return Self::default();
        }
        match figment.extract_inner::<AppConfig>(CONFIG_KEY) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "invalid `{CONFIG_KEY}` configuration, using defaults");
                Self::default()
            }
        }
    }
}
