//! Newsletter signup and unsubscribe endpoints used by the site's forms.
//!
//! Every subscribe request makes one service call. The outcome is then formatted either as a
//! JSON body or as a flash message plus a redirect back to the home page.

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tower_cookies::{Cookies, Key};
use tracing::error;

use crate::{
    model,
    newsletter::{SubscribeOutcome, UnsubscribeOutcome},
    web::{
        client::ClientMeta,
        csrf,
        flash::{self, Level},
        Error, WebResult, CSRF_FORM_FIELD, CSRF_HEADER,
    },
    AppState,
};

pub(super) const SUBSCRIBED_MSG: &str = "Successfully subscribed to our newsletter!";
pub(super) const ALREADY_SUBSCRIBED_MSG: &str =
    "This email is already subscribed to our newsletter.";
pub(super) const SERVICE_ERROR_MSG: &str = "An error occurred. Please try again later.";
pub(super) const INVALID_JSON_MSG: &str = "Invalid JSON data.";
const UNSUBSCRIBED_MSG: &str = "Successfully unsubscribed from our newsletter.";
const NOT_SUBSCRIBED_MSG: &str = "Email address not found in our subscription list.";

/// Body of a JSON subscribe request. A missing `email` reads as empty.
#[derive(Debug, Deserialize)]
pub(super) struct EmailPayload {
    #[serde(default)]
    pub email: String,
}

/// The email forms on the site. Browsers post them urlencoded, the site's script posts
/// them as `multipart/form-data`.
#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
pub struct EmailForm {
    #[serde(default)]
    email: String,
    csrfmiddlewaretoken: Option<String>,
}

impl EmailForm {
    async fn from_multipart(mut multipart: Multipart) -> WebResult<Self> {
        let mut form = EmailForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|er| Error::InvalidForm(er.body_text()))?
        {
            let name = field.name().map(str::to_string);
            // Other fields, file uploads included, are skipped unread.
            if !matches!(name.as_deref(), Some("email" | CSRF_FORM_FIELD)) {
                continue;
            }
            let value = field
                .text()
                .await
                .map_err(|er| Error::InvalidForm(er.body_text()))?;

            if name.as_deref() == Some("email") {
                form.email = value;
            } else {
                form.csrfmiddlewaretoken = Some(value);
            }
        }

        Ok(form)
    }
}

impl<S> FromRequest<S> for EmailForm
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> WebResult<Self> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rej| Error::InvalidForm(rej.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rej| Error::InvalidForm(rej.body_text()))?;
        serde_urlencoded::from_bytes(&body).map_err(|er| Error::InvalidForm(er.to_string()))
    }
}

/// There is no signup page of its own, the form lives on the home page.
pub async fn signup_get() -> Redirect {
    Redirect::to("/")
}

#[tracing::instrument(name = "newsletter_signup", skip_all, fields(json = tracing::field::Empty))]
pub async fn signup_post(
    State(app_state): State<AppState>,
    cookies: Cookies,
    client: ClientMeta,
    headers: HeaderMap,
    req: Request,
) -> WebResult<Response> {
    let key = &app_state.cookie_key;
    let is_json = headers
        .get(CONTENT_TYPE)
        .is_some_and(|ct| ct.as_bytes() == b"application/json");
    tracing::Span::current().record("json", is_json);

    if is_json {
        let submitted = headers.get(CSRF_HEADER).and_then(|val| val.to_str().ok());
        csrf::verify(&cookies, key, submitted)?;

        let body = Bytes::from_request(req, &())
            .await
            .map_err(|rej| Error::InvalidForm(rej.body_text()))?;
        let Ok(payload) = serde_json::from_slice::<EmailPayload>(&body) else {
            return Ok(json_failure(StatusCode::BAD_REQUEST, INVALID_JSON_MSG));
        };
        let result = app_state
            .subscriptions
            .subscribe(&payload.email, client.ip_address, client.user_agent)
            .await;

        return Ok(json_adapter(result));
    }

    let form = EmailForm::from_request(req, &()).await?;
    csrf::verify(&cookies, key, form.csrfmiddlewaretoken.as_deref())?;

    let result = app_state
        .subscriptions
        .subscribe(&form.email, client.ip_address, client.user_agent)
        .await;

    Ok(redirect_adapter(result, &cookies, key))
}

pub async fn unsubscribe_get() -> Redirect {
    Redirect::to("/")
}

#[tracing::instrument(name = "newsletter_unsubscribe", skip_all)]
pub async fn unsubscribe_post(
    State(app_state): State<AppState>,
    cookies: Cookies,
    form: EmailForm,
) -> WebResult<Redirect> {
    let key = &app_state.cookie_key;
    csrf::verify(&cookies, key, form.csrfmiddlewaretoken.as_deref())?;

    match app_state.subscriptions.unsubscribe(&form.email).await {
        Ok(UnsubscribeOutcome::Unsubscribed) => {
            flash::push(&cookies, key, Level::Success, UNSUBSCRIBED_MSG)
        }
        Ok(UnsubscribeOutcome::NotFound) => {
            flash::push(&cookies, key, Level::Warning, NOT_SUBSCRIBED_MSG)
        }
        Ok(UnsubscribeOutcome::ValidationFailed) => flash::push(
            &cookies,
            key,
            Level::Error,
            model::EmailError::Empty.to_string(),
        ),
        Err(er) => {
            error!("Newsletter unsubscription error: {er}");
            flash::push(&cookies, key, Level::Error, SERVICE_ERROR_MSG)
        }
    }

    Ok(Redirect::to("/"))
}

// ###################################
// ->   ADAPTERS
// ###################################
/// Formats a subscribe result as `{success, message}`.
pub(super) fn json_adapter(result: model::Result<SubscribeOutcome>) -> Response {
    match result {
        Ok(SubscribeOutcome::Created(_)) => {
            Json(json!({ "success": true, "message": SUBSCRIBED_MSG })).into_response()
        }
        Ok(SubscribeOutcome::Conflict) => {
            json_failure(StatusCode::BAD_REQUEST, ALREADY_SUBSCRIBED_MSG)
        }
        Ok(SubscribeOutcome::ValidationFailed(er)) => {
            json_failure(StatusCode::BAD_REQUEST, &er.to_string())
        }
        Err(er) => {
            error!("Newsletter subscription error: {er}");
            json_failure(StatusCode::INTERNAL_SERVER_ERROR, SERVICE_ERROR_MSG)
        }
    }
}

/// Formats a subscribe result as a flash message and a redirect home.
fn redirect_adapter(
    result: model::Result<SubscribeOutcome>,
    cookies: &Cookies,
    key: &Key,
) -> Response {
    let (level, message) = match result {
        Ok(SubscribeOutcome::Created(_)) => (Level::Success, SUBSCRIBED_MSG.to_string()),
        Ok(SubscribeOutcome::Conflict) => (Level::Warning, ALREADY_SUBSCRIBED_MSG.to_string()),
        Ok(SubscribeOutcome::ValidationFailed(er)) => (Level::Error, er.to_string()),
        Err(er) => {
            error!("Newsletter subscription error: {er}");
            (Level::Error, SERVICE_ERROR_MSG.to_string())
        }
    };
    flash::push(cookies, key, level, message);

    Redirect::to("/").into_response()
}

pub(super) fn json_failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}
