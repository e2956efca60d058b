use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header::SET_COOKIE, HeaderMap, Method, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::web::{log, routes::AdminSession, Error, REQUEST_ID_HEADER};

/// Turns a `web::Error` stashed in the response extensions into the client facing JSON error
/// and logs a line for every request.
pub async fn response_mapper(
    req_method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    resp: Response,
) -> Response {
    let req_id = req_headers
        .get(REQUEST_ID_HEADER)
        .and_then(|id| id.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let web_error = resp.extensions().get::<Arc<Error>>().map(Arc::as_ref);
    let client_status_and_error = web_error.map(Error::status_code_and_client_error);

    if let Some(er) = web_error {
        if client_status_and_error
            .as_ref()
            .is_some_and(|(status, _)| status.is_server_error())
        {
            tracing::error!("SERVER ERROR: {er:?} ID: {req_id}");
        }
    }

    let err_resp = client_status_and_error.as_ref().map(|(status, cl_err)| {
        let client_error_body = json!({
            "error": cl_err.to_string(),
            "req_id": req_id,
        });

        let mut err_resp = (*status, Json(client_error_body)).into_response();
        // The replacement response needs the request id and any cookies set on the way out.
        let headers = err_resp.headers_mut();
        if let Some(id) = req_headers.get(REQUEST_ID_HEADER) {
            headers.insert(REQUEST_ID_HEADER, id.clone());
        }
        for cookie in resp.headers().get_all(SET_COOKIE) {
            headers.append(SET_COOKIE, cookie.clone());
        }
        err_resp
    });

    log::log_request(
        &req_id,
        req_method,
        uri,
        resp.status(),
        web_error,
        client_status_and_error,
    );

    err_resp.unwrap_or(resp)
}

/// Guards the admin pages. Visitors without a staff session are sent to the login form.
pub async fn require_admin(
    admin_session: Result<AdminSession, Error>,
    req: Request,
    next: Next,
) -> Response {
    match admin_session {
        Ok(_) => next.run(req).await,
        Err(Error::AccessDenied) => Redirect::to("/admin/login").into_response(),
        Err(er) => er.into_response(),
    }
}
