//! The admin subscription list and the actions that can be taken on it.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_cookies::{Cookies, Key};
use tracing::info;

use super::{export, login::CsrfForm, AdminError, AdminSession};
use crate::{
    model::{DateRange, Subscription, SubscriptionFilter},
    web::{
        csrf,
        flash::{self, Level},
        routes::pages::base_context,
        WebResult, CSRF_FORM_FIELD,
    },
    AppState,
};

const LIST_PATH: &str = "/admin/subscriptions";
const NOTHING_SELECTED_MSG: &str =
    "Items must be selected in order to perform actions on them. No items have been changed.";
const NO_ACTION_MSG: &str = "No action selected.";

/// Query string of the list page. Unknown filter values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    q: Option<String>,
    is_active: Option<String>,
    since: Option<String>,
    page: Option<String>,
}

impl ListQuery {
    fn is_active(&self) -> Option<bool> {
        match self.is_active.as_deref()? {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    fn since(&self) -> Option<DateRange> {
        let since = self.since.as_deref()?;
        serde_json::from_value(serde_json::Value::String(since.to_string())).ok()
    }

    fn search(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
    }

    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|page| page.parse().ok())
            .unwrap_or(1)
    }

    fn to_filter(&self) -> SubscriptionFilter {
        SubscriptionFilter {
            is_active: self.is_active(),
            subscribed_since: self.since().map(|range| range.lower_bound(Utc::now())),
            search: self.search(),
        }
    }
}

/// A subscription as the list template shows it.
#[derive(Debug, Serialize)]
struct RowView {
    id: i64,
    email: String,
    is_active: bool,
    subscribed_at: String,
    ip_address: String,
    user_agent: String,
}

impl From<Subscription> for RowView {
    fn from(sub: Subscription) -> Self {
        RowView {
            id: sub.id,
            email: sub.email,
            is_active: sub.is_active,
            subscribed_at: sub.subscribed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ip_address: sub.ip_address.unwrap_or_else(|| "-".into()),
            user_agent: sub.user_agent.unwrap_or_default(),
        }
    }
}

#[tracing::instrument(name = "admin_list", skip(app_state, cookies, admin))]
pub async fn list(
    State(app_state): State<AppState>,
    cookies: Cookies,
    admin: AdminSession,
    Query(query): Query<ListQuery>,
) -> WebResult<Html<String>> {
    let filter = query.to_filter();
    let listing = app_state.subscriptions.list(&filter, query.page()).await?;
    let stats = app_state.subscriptions.stats().await?;

    let rows: Vec<RowView> = listing.rows.into_iter().map(RowView::from).collect();

    let mut ctx = base_context(&app_state, &cookies);
    ctx.insert("username", admin.username());
    ctx.insert("stats", &stats);
    ctx.insert("rows", &rows);
    ctx.insert("total_matching", &listing.total_matching);
    ctx.insert("page", &listing.page);
    ctx.insert("page_count", &listing.page_count);
    ctx.insert("q", &query.search().unwrap_or_default());
    ctx.insert(
        "is_active",
        &query.is_active().map(|flag| flag.to_string()).unwrap_or_default(),
    );
    ctx.insert("since", &query.since());

    let body = app_state
        .templ_mgr
        .render_html_to_string(&ctx, "admin/subscriptions.html")
        .map_err(AdminError::Tera)?;

    Ok(Html(body))
}

/// The list page's action form: an `action` plus repeated `_selected_action` ids.
#[derive(Debug, Default, PartialEq, Eq)]
struct ActionForm {
    action: Option<String>,
    selected: Vec<i64>,
    csrf_token: Option<String>,
}

impl ActionForm {
    /// Repeated keys don't fit a derived struct, so the pairs are folded by hand.
    /// Ids that aren't integers are skipped.
    fn parse(body: &[u8]) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).unwrap_or_default();

        pairs
            .into_iter()
            .fold(ActionForm::default(), |mut form, (key, val)| {
                match key.as_str() {
                    "action" if !val.is_empty() => form.action = Some(val),
                    "_selected_action" => form.selected.extend(val.trim().parse::<i64>().ok()),
                    CSRF_FORM_FIELD => form.csrf_token = Some(val),
                    _ => {}
                }
                form
            })
    }
}

#[tracing::instrument(name = "admin_bulk_action", skip_all, fields(user_id = %admin.user_id()))]
pub async fn bulk_action(
    State(app_state): State<AppState>,
    cookies: Cookies,
    admin: AdminSession,
    body: Bytes,
) -> WebResult<Response> {
    let key = &app_state.cookie_key;
    let form = ActionForm::parse(&body);
    csrf::verify(&cookies, key, form.csrf_token.as_deref())?;

    let Some(action) = form.action.as_deref() else {
        flash::push(&cookies, key, Level::Warning, NO_ACTION_MSG);
        return Ok(Redirect::to(LIST_PATH).into_response());
    };
    if form.selected.is_empty() {
        flash::push(&cookies, key, Level::Warning, NOTHING_SELECTED_MSG);
        return Ok(Redirect::to(LIST_PATH).into_response());
    }

    match action {
        "activate_selected" => set_selected(&app_state, &cookies, key, &form.selected, true).await,
        "deactivate_selected" => {
            set_selected(&app_state, &cookies, key, &form.selected, false).await
        }
        "export_as_csv" => {
            let selected = app_state.subscriptions.selected(&form.selected).await?;
            info!(rows = selected.len(), "exporting subscriptions as CSV");
            Ok(export::csv_response(&selected))
        }
        _ => {
            flash::push(&cookies, key, Level::Warning, NO_ACTION_MSG);
            Ok(Redirect::to(LIST_PATH).into_response())
        }
    }
}

async fn set_selected(
    app_state: &AppState,
    cookies: &Cookies,
    key: &Key,
    ids: &[i64],
    is_active: bool,
) -> WebResult<Response> {
    let affected = app_state
        .subscriptions
        .set_active_many(ids, is_active)
        .await?;
    flash::push(cookies, key, Level::Success, bulk_message(affected, is_active));

    Ok(Redirect::to(LIST_PATH).into_response())
}

fn bulk_message(affected: u64, is_active: bool) -> String {
    let verb = if is_active { "activated" } else { "deactivated" };
    format!("{affected} subscription(s) were successfully {verb}.")
}

#[tracing::instrument(name = "admin_activate", skip(app_state, cookies, _admin, form))]
pub async fn activate(
    State(app_state): State<AppState>,
    cookies: Cookies,
    _admin: AdminSession,
    Path(id): Path<i64>,
    Form(form): Form<CsrfForm>,
) -> WebResult<Redirect> {
    set_one(&app_state, &cookies, id, true, form).await
}

#[tracing::instrument(name = "admin_deactivate", skip(app_state, cookies, _admin, form))]
pub async fn deactivate(
    State(app_state): State<AppState>,
    cookies: Cookies,
    _admin: AdminSession,
    Path(id): Path<i64>,
    Form(form): Form<CsrfForm>,
) -> WebResult<Redirect> {
    set_one(&app_state, &cookies, id, false, form).await
}

async fn set_one(
    app_state: &AppState,
    cookies: &Cookies,
    id: i64,
    is_active: bool,
    form: CsrfForm,
) -> WebResult<Redirect> {
    let key = &app_state.cookie_key;
    csrf::verify(cookies, key, form.token())?;

    let svc = &app_state.subscriptions;
    let found = if is_active {
        svc.activate(id).await?
    } else {
        svc.deactivate(id).await?
    };

    if found {
        flash::push(cookies, key, Level::Success, bulk_message(1, is_active));
    } else {
        flash::push(
            cookies,
            key,
            Level::Warning,
            format!("Subscription with ID \"{id}\" doesn't exist."),
        );
    }

    Ok(Redirect::to(LIST_PATH))
}
