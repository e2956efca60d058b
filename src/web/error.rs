use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use strum_macros::AsRefStr;

use super::{auth, routes::AdminError};
use crate::model;

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("the submitted CSRF token is missing or does not match the cookie")]
    CsrfFailed,
    #[error("the request requires a staff session")]
    AccessDenied,
    #[error("no page or static file at: {0}")]
    NotFound(String),
    #[error("unreadable form body: {0}")]
    InvalidForm(String),

    #[error("admin error: {0}")]
    Admin(#[from] AdminError),
    #[error("authentication error: {0}")]
    Auth(#[from] auth::AuthError),
    #[error("model error: {0}")]
    Model(#[from] model::Error),

    #[error("tower_sessions error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("templating error: {0}")]
    Tera(#[from] tera::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::CsrfFailed => (StatusCode::FORBIDDEN, CsrfFailed),
            Error::AccessDenied => (StatusCode::FORBIDDEN, AccessDenied),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, NotFound),
            Error::InvalidForm(_) => (StatusCode::BAD_REQUEST, InvalidForm),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, ServiceError),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// What the client gets to see. Never carries internal details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Access denied")]
    AccessDenied,
    #[display("CSRF verification failed")]
    CsrfFailed,
    #[display("File not found")]
    NotFound,
    #[display("Invalid form data")]
    InvalidForm,
    #[display("Service Error!")]
    ServiceError,
}
