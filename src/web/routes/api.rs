use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::newsletter::{
    json_adapter, json_failure, EmailPayload, INVALID_JSON_MSG, SUBSCRIBED_MSG,
};
use crate::{newsletter::SubscribeOutcome, web::client::ClientMeta, AppState};

/// JSON-only subscribe endpoint for scripts. Not CSRF protected.
#[tracing::instrument(name = "api_subscribe", skip_all)]
pub async fn subscribe(
    State(app_state): State<AppState>,
    client: ClientMeta,
    body: Bytes,
) -> Response {
    let Ok(payload) = serde_json::from_slice::<EmailPayload>(&body) else {
        return json_failure(StatusCode::BAD_REQUEST, INVALID_JSON_MSG);
    };

    let result = app_state
        .subscriptions
        .subscribe(&payload.email, client.ip_address, client.user_agent)
        .await;

    match result {
        Ok(SubscribeOutcome::Created(subscription)) => Json(json!({
            "success": true,
            "message": SUBSCRIBED_MSG,
            "subscription_id": subscription.id,
        }))
        .into_response(),
        other => json_adapter(other),
    }
}
