mod export;
mod login;
mod subscriptions;

use anyhow::anyhow;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    middleware,
    response::Redirect,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::OffsetDateTime;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    web::{self, auth::AuthenticatedUser, midware},
    AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("tower_sessions error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("templating error: {0}")]
    Tera(#[from] tera::Error),
}

/// Routes nested under "/admin". Everything but the login form requires a staff session.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(|| async { Redirect::to("/admin/subscriptions") }),
        )
        .route("/subscriptions", get(subscriptions::list))
        .route("/subscriptions/actions", post(subscriptions::bulk_action))
        .route("/subscriptions/{id}/activate", post(subscriptions::activate))
        .route(
            "/subscriptions/{id}/deactivate",
            post(subscriptions::deactivate),
        )
        .route("/logout", post(login::logout))
        .route_layer(middleware::from_fn(midware::require_admin))
        .route("/login", get(login::login_get).post(login::login_post))
}

/// Admin information
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminData {
    user_id: Uuid,
    username: String,
    first_seen: OffsetDateTime,
    last_seen: OffsetDateTime,
}

impl AdminData {
    pub fn new(user: AuthenticatedUser) -> Self {
        AdminData {
            user_id: user.user_id,
            username: user.username,
            first_seen: OffsetDateTime::now_utc(),
            last_seen: OffsetDateTime::now_utc(),
        }
    }
}

/// An implementation of admin sessions.
/// Can be extracted from the request and can therefore be used in a handler.
/// Contains the information about the staff user and the session.
/// Staff users are stored in the `users` table in the database.
pub struct AdminSession {
    session: Session,
    admin_data: AdminData,
}

impl AdminSession {
    const ADMIN_DATA_KEY: &'static str = "admin";

    // -> constructor
    pub fn new(session: Session, admin_data: AdminData) -> Self {
        Self {
            session,
            admin_data,
        }
    }

    // -> getters
    pub fn user_id(&self) -> Uuid {
        self.admin_data.user_id
    }

    pub fn username(&self) -> &str {
        &self.admin_data.username
    }

    pub async fn cycle_id(&self) -> Result<(), AdminError> {
        self.session.cycle_id().await.map_err(AdminError::Session)
    }

    /// Writes the contained data into the session.
    /// Needs to be called when first building the AdminSession.
    pub async fn update_session(&self) -> Result<(), AdminError> {
        self.session
            .insert(Self::ADMIN_DATA_KEY, self.admin_data.clone())
            .await?;
        Ok(())
    }

    /// Whether the session already belongs to a logged-in staff user.
    pub async fn is_logged_in(session: &Session) -> Result<bool, AdminError> {
        Ok(session
            .get::<AdminData>(Self::ADMIN_DATA_KEY)
            .await?
            .is_some())
    }
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = web::Error;

    #[instrument(skip_all, name = "AdminSession from_request_parts")]
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(session) = Session::from_request_parts(parts, state).await else {
            return Err(anyhow!("unable to extract the session from request parts").into());
        };

        let Some(mut admin_data) = session
            .get::<AdminData>(Self::ADMIN_DATA_KEY)
            .await
            .map_err(AdminError::Session)?
        else {
            return Err(web::Error::AccessDenied);
        };

        admin_data.last_seen = OffsetDateTime::now_utc();

        let admin_session = Self::new(session, admin_data);
        admin_session.update_session().await?;

        Ok(admin_session)
    }
}
