//! Builds the `AppConfig` from layered config files and the environment.
//! `config/base.toml` is merged with `config/{environment}.toml` and finally with
//! `APP_`-prefixed environment variables (`__` separates nested keys),
//! e.g. `APP_NET_CONFIG__APP_PORT=9000`.
//! Gets initialized with `OnceLock` so it only needs to get initialized once.

mod error;
mod types;

use std::{path::Path, sync::OnceLock};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use tracing::info;

pub use error::{ConfigError, ConfigResult};
pub use types::{
    AppConfig, DbConfig, Environment, NetConfig, SessionConfig, SiteConfig, SslRequire,
};

/// Allocates a static `OnceLock` containing `AppConfig`.
/// This ensures configuration only gets initialized the first time we call this function.
/// Every other caller gets a &'static ref to AppConfig.
/// Panics if anything goes wrong.
pub fn get_or_init_config() -> &'static AppConfig {
    static CONFIG_INIT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG_INIT.get_or_init(|| {
        info!("{:<20} - Initializing the configuration", "get_or_init_config");
        load_config().unwrap_or_else(|er| panic!("Fatal Error: Building config: {er}"))
    })
}

/// Reads the configuration for the environment named by `APP_ENVIRONMENT` (`local` by default).
pub fn load_config() -> ConfigResult<AppConfig> {
    let config_dir = std::env::current_dir()?.join("config");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()?;

    let mut config = load_from_dir(&config_dir, &environment)?;

    // Setup DbConfig for production
    if matches!(environment, Environment::Production) {
        let production_db =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;
        config.db_config = DbConfig::try_from(production_db.as_str())?;
    }

    Ok(config)
}

fn load_from_dir(config_dir: &Path, environment: &Environment) -> ConfigResult<AppConfig> {
    let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

    let config = Figment::new()
        .merge(Toml::file(config_dir.join("base.toml")))
        .merge(Toml::file(config_dir.join(environment_filename)))
        .merge(Env::prefixed("APP_").split("__"))
        .extract()?;

    Ok(config)
}
