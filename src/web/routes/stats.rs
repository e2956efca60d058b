use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    model::Stats,
    web::{routes::AdminSession, WebResult},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct StatsBody {
    total_subscriptions: i64,
    active_subscriptions: i64,
    inactive_subscriptions: i64,
}

impl From<Stats> for StatsBody {
    fn from(stats: Stats) -> Self {
        StatsBody {
            total_subscriptions: stats.total,
            active_subscriptions: stats.active,
            inactive_subscriptions: stats.inactive,
        }
    }
}

/// Subscription counts for staff. Anyone else gets `403 {"error": "Access denied"}`
/// from the response mapper.
#[tracing::instrument(name = "newsletter_stats", skip_all)]
pub async fn stats(
    State(app_state): State<AppState>,
    _admin: AdminSession,
) -> WebResult<Json<StatsBody>> {
    let stats = app_state.subscriptions.stats().await?;
    Ok(Json(stats.into()))
}
