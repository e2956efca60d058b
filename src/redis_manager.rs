//! Redis access for the admin session store.

use std::time::Duration;

use secrecy::ExposeSecret;
use tower_sessions_redis_store::{
    fred::{
        self,
        prelude::{ClientLike, Config, Pool},
        types::Builder,
    },
    RedisStore,
};
use tracing::info;

use crate::config::AppConfig;

type Result<T> = core::result::Result<T, fred::error::Error>;

const POOL_SIZE: usize = 10;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the Redis connection pool backing the admin sessions. Cheaply cloneable.
#[derive(Clone, Debug)]
pub struct RedisManager {
    pool: Pool,
}

impl RedisManager {
    /// Connects eagerly, startup fails without Redis.
    pub async fn init(app_config: &AppConfig) -> Result<Self> {
        info!("{:<20} - connecting the session store", "init_redis");
        let conf = Config::from_url(app_config.net_config.redis_uri.expose_secret())?;

        let pool = Builder::from_config(conf)
            .with_connection_config(|config| config.connection_timeout = CONNECT_TIMEOUT)
            .build_pool(POOL_SIZE)?;
        pool.init().await?;
        info!("{:<20} - {POOL_SIZE} connections ready", "init_redis");

        Ok(RedisManager { pool })
    }

    /// A `tower-sessions` store over a clone of the pool.
    pub fn session_store(&self) -> RedisStore<Pool> {
        RedisStore::new(self.pool.clone())
    }
}
