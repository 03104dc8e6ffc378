#[macro_use]
extern crate rocket;

pub mod aggregate;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod forms;
pub mod holidays;
pub mod icons;
pub mod models;
pub mod mutations;
pub mod queries;
pub mod routes;
pub mod views;

use std::sync::Once;
use std::time::Duration;

use rocket::fs::{FileServer, Options};
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;
use tracing_subscriber::EnvFilter;

use crate::cache::QueryCache;
use crate::config::AppConfig;
use crate::error::AppResult;

static INIT_TRACING: Once = Once::new();

/// Installs the global subscriber once. `RUST_LOG` overrides the default
/// filter; Rocket's `log` records are forwarded into it.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("moneylog=info,rocket=warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    });
}

/// Opens the store and assembles the server without launching it.
pub fn build(config: AppConfig) -> AppResult<Rocket<Build>> {
    let pool = db::init_db(&config.database_path)?;
    let cache = QueryCache::new(Duration::from_secs(config.cache_ttl_secs));
    let static_files = FileServer::new(&config.static_dir, Options::Missing | Options::NormalizeDirs);
    tracing::info!(
        database = %config.database_path.display(),
        cache_ttl_secs = config.cache_ttl_secs,
        "moneylog configured"
    );

    Ok(rocket::build()
        .manage(pool)
        .manage(cache)
        .manage(config)
        .mount("/", routes::routes())
        .mount("/static", static_files)
        .attach(Template::fairing()))
}
