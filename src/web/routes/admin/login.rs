use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_cookies::Cookies;
use tower_sessions::Session;
use tracing::debug;

use super::{AdminData, AdminError, AdminSession};
use crate::{
    web::{
        auth::Credentials,
        csrf,
        flash::{self, Level},
        routes::pages::base_context,
        WebResult,
    },
    AppState,
};

const INVALID_LOGIN_MSG: &str =
    "Please enter the correct username and password for a staff account.";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: SecretString,
    csrfmiddlewaretoken: Option<String>,
}

/// Body of the admin forms that carry nothing but the CSRF token.
#[derive(Debug, Deserialize)]
pub struct CsrfForm {
    csrfmiddlewaretoken: Option<String>,
}

impl CsrfForm {
    pub fn token(&self) -> Option<&str> {
        self.csrfmiddlewaretoken.as_deref()
    }
}

#[tracing::instrument(name = "login_get", skip_all)]
pub async fn login_get(
    State(app_state): State<AppState>,
    cookies: Cookies,
    session: Session,
) -> WebResult<Response> {
    if AdminSession::is_logged_in(&session).await? {
        return Ok(Redirect::to("/admin/subscriptions").into_response());
    }

    let ctx = base_context(&app_state, &cookies);
    let body = app_state
        .templ_mgr
        .render_html_to_string(&ctx, "admin/login.html")
        .map_err(AdminError::Tera)?;

    Ok(Html(body).into_response())
}

#[tracing::instrument(name = "login_post", skip_all, fields(username = %form.username))]
pub async fn login_post(
    State(app_state): State<AppState>,
    cookies: Cookies,
    // untyped session
    session: Session,
    Form(form): Form<LoginForm>,
) -> WebResult<Redirect> {
    let key = &app_state.cookie_key;
    csrf::verify(&cookies, key, form.csrfmiddlewaretoken.as_deref())?;

    let user = match Credentials::new(form.username, form.password)
        .authenticate(&app_state.database_mgr)
        .await
    {
        Ok(user) => user,
        Err(er) if er.is_credentials_error() => {
            debug!("rejected login: {er}");
            flash::push(&cookies, key, Level::Error, INVALID_LOGIN_MSG);
            return Ok(Redirect::to("/admin/login"));
        }
        Err(er) => return Err(er.into()),
    };

    let admin_session = AdminSession::new(session, AdminData::new(user));
    // Mitigate session fixation attacks
    admin_session.cycle_id().await?;
    admin_session.update_session().await?;
    debug!(user_id = %admin_session.user_id(), "staff user logged in");

    Ok(Redirect::to("/admin/subscriptions"))
}

#[tracing::instrument(name = "logout", skip_all)]
pub async fn logout(
    State(app_state): State<AppState>,
    cookies: Cookies,
    session: Session,
    Form(form): Form<CsrfForm>,
) -> WebResult<Redirect> {
    let key = &app_state.cookie_key;
    csrf::verify(&cookies, key, form.token())?;

    session.flush().await?;
    flash::push(&cookies, key, Level::Info, "You have been logged out.");

    Ok(Redirect::to("/admin/login"))
}
