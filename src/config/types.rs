//! The configuration structs used to build the AppConfig, and their impls.
use std::path::PathBuf;

use lazy_regex::regex_captures;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::{
    postgres::{PgConnectOptions, PgSslMode},
    ConnectOptions,
};
use strum_macros::AsRefStr;

use crate::config::{ConfigError, ConfigResult};
use crate::utils;

/// Both signing keys (flash/CSRF cookies and session cookies) need at least 64 bytes.
const MIN_COOKIE_SECRET_LEN: usize = 64;

// ###################################
// ->   STRUCTS
// ###################################
#[derive(AsRefStr)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    pub db_config: DbConfig,
    pub session_config: SessionConfig,
    pub site_config: SiteConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
    pub redis_uri: SecretString,
    pub cookie_secret_b64enc: SecretString,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionConfig {
    pub secure: bool,
    pub expiry_secs: i64,
}

/// Presentation settings, read once at startup.
#[derive(Deserialize, Clone, Debug)]
pub struct SiteConfig {
    /// Enables the static file responder.
    pub debug: bool,
    /// Directory static assets are resolved against.
    pub static_root: PathBuf,
    /// Extensions (without the dot) that are served from anywhere under `static_root`.
    pub static_extensions: Vec<String>,
    /// Top level directories whose contents are served regardless of extension.
    pub static_dirs: Vec<String>,
    pub site_header: String,
    pub site_title: String,
    pub index_title: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DbConfig {
    pub username: String,
    pub password: SecretString,
    pub port: u16,
    pub host: String,
    pub db_name: String,
    pub require_ssl: SslRequire,
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SslRequire {
    #[default]
    Prefer,
    Require,
    Disable,
}

// ###################################
// ->   IMPLs
// ###################################
impl NetConfig {
    /// Decodes the Base64-URL encoded cookie secret.
    pub fn cookie_secret(&self) -> ConfigResult<Vec<u8>> {
        let secret = utils::b64u_decode(self.cookie_secret_b64enc.expose_secret())
            .map_err(|er| ConfigError::CookieSecret(er.to_string()))?;

        if secret.len() < MIN_COOKIE_SECRET_LEN {
            return Err(ConfigError::CookieSecret(format!(
                "expected at least {MIN_COOKIE_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }

        Ok(secret)
    }
}

impl SessionConfig {
    pub fn expiry(&self) -> tower_sessions::cookie::time::Duration {
        tower_sessions::cookie::time::Duration::seconds(self.expiry_secs)
    }
}

impl DbConfig {
    pub fn connection_options(&self) -> PgConnectOptions {
        self.connection_options_without_db().database(&self.db_name)
    }
    pub fn connection_options_without_db(&self) -> PgConnectOptions {
        // Create new PgConnectOptions struct but don't try to use the '$HOME/.pgpass' file.
        PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(self.require_ssl.into())
            .log_statements(tracing::log::LevelFilter::Trace)
    }
}

impl From<SslRequire> for PgSslMode {
    fn from(value: SslRequire) -> Self {
        match value {
            SslRequire::Require => PgSslMode::Require,
            SslRequire::Disable => PgSslMode::Disable,
            SslRequire::Prefer => PgSslMode::Prefer,
        }
    }
}

// ###################################
// ->   TRY FROMs
// ###################################

impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail),
        }
    }
}

impl TryFrom<&str> for DbConfig {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // postgres://{username}:{password}@{hostname}:{port}/{database}?{options}
        let (_whole, username, password, host, port, db_name, options) = regex_captures!(
            r#"^postgres:\/\/([^:]+):([^@]+)@([^:\/]+):(\d+)\/([^\s\/?]+)(\?[^\s]*)?$"#,
            value
        )
        .ok_or(Self::Error::StringToDbConfigFail)?;

        let port = port
            .parse()
            .map_err(|_| Self::Error::StringToDbConfigFail)?;

        let require_ssl = options
            .strip_prefix('?')
            .into_iter()
            .flat_map(|options| options.split(['&', ',']))
            .filter_map(|option| option.split_once('='))
            .filter(|(id, _)| *id == "sslmode")
            .fold(SslRequire::default(), |acc, (_, val)| match val {
                "disable" => SslRequire::Disable,
                "require" => SslRequire::Require,
                _ => acc,
            });

        Ok(DbConfig {
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
            port,
            host: host.to_string(),
            db_name: db_name.to_string(),
            require_ssl,
        })
    }
}

// ###################################
// ->   TESTS
// ###################################
