use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Connection, PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::config::{AppConfig, DbConfig};

/// Owns the Postgres connection pool. Cheaply cloneable.
#[derive(Clone, Debug)]
pub struct DbManager {
    db: PgPool,
}

impl DbManager {
    pub async fn init(config: &AppConfig) -> Result<Self> {
        info!("{:<20} - Initializing the DB pool", "init_db");
        let db = connect_pool(&config.db_config, 5).await?;

        Ok(Self { db })
    }

    /// Creates a fresh, uniquely named database, runs the migrations against it and returns
    /// a manager connected to it. The passed `DbConfig` is updated with the new database name.
    pub async fn init_for_test(db_config: &mut DbConfig) -> Result<Self> {
        db_config.db_name = format!("waxwarm_test_{}", Uuid::new_v4().simple());

        let mut connection =
            PgConnection::connect_with(&db_config.connection_options_without_db()).await?;
        let sql = format!(r#"CREATE DATABASE "{}";"#, db_config.db_name);
        sqlx::query(&sql).execute(&mut connection).await?;

        let dm = Self {
            db: connect_pool(db_config, 2).await?,
        };
        dm.migrate().await?;

        Ok(dm)
    }

    pub async fn migrate(&self) -> Result<()> {
        info!("{:<20} - Running migrations", "migrate_db");
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }

    /// Wraps an existing pool, e.g. a lazily connecting one.
    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &PgPool {
        &self.db
    }
}

async fn connect_pool(db_config: &DbConfig, max_cons: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_cons)
        .acquire_timeout(Duration::from_millis(500))
        .connect_with(db_config.connection_options())
        .await
        .map_err(|ex| Error::FailToCreatePool(ex.to_string()))
}

// ###################################
// ->   ERROR
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create db pool: {0}")]
    FailToCreatePool(String),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("sqlx migration error: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),
}
