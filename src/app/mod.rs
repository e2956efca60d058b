use std::{net::SocketAddr, sync::Arc};

use anyhow::anyhow;
use derive_more::Deref;
use tokio::net::TcpListener;
use tower_cookies::Key;
use tracing::info;

use crate::{
    config::{AppConfig, SessionConfig, SiteConfig},
    database::DbManager,
    newsletter::SubscriptionService,
    redis_manager::RedisManager,
    templ_manager::TemplateManager,
    Result,
};

// ###################################
// ->  Structs
// ###################################
/// Everything `serve` needs: the shared state, the bound listener and the session backend.
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
    pub redis_mgr: RedisManager,
    pub session_config: SessionConfig,
    pub session_key: tower_sessions::cookie::Key,
}

impl App {
    /// Connects to Postgres (running pending migrations) and builds the app.
    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let dm = DbManager::init(&config).await?;
        dm.migrate().await?;

        Self::build(config, dm).await
    }

    /// Builds the app on top of an existing database manager.
    pub async fn build(config: AppConfig, dm: DbManager) -> Result<Self> {
        let cookie_secret = config.net_config.cookie_secret()?;
        let cookie_key = Key::try_from(cookie_secret.as_slice())
            .map_err(|er| anyhow!("cookie signing key: {er}"))?;
        let session_key = tower_sessions::cookie::Key::try_from(cookie_secret.as_slice())
            .map_err(|er| anyhow!("session signing key: {er}"))?;

        let redis_mgr = RedisManager::init(&config).await?;
        let tm = TemplateManager::init();

        let app_state = AppState::new(dm, tm, cookie_key, config.site_config);

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        Ok(App {
            app_state,
            listener,
            redis_mgr,
            session_config: config.session_config,
            session_key,
        })
    }
}

pub struct InternalState {
    pub database_mgr: DbManager,
    pub subscriptions: SubscriptionService<DbManager>,
    pub templ_mgr: TemplateManager,
    /// Signs the flash and CSRF cookies.
    pub cookie_key: Key,
    pub site_config: SiteConfig,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(
        database_mgr: DbManager,
        templ_mgr: TemplateManager,
        cookie_key: Key,
        site_config: SiteConfig,
    ) -> Self {
        AppState(Arc::new(InternalState {
            subscriptions: SubscriptionService::new(database_mgr.clone()),
            database_mgr,
            templ_mgr,
            cookie_key,
            site_config,
        }))
    }
}
