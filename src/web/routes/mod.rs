//! Contains all the routes that this application can handle.

mod admin;
mod api;
mod newsletter;
mod pages;
mod stats;

// re-exports
pub use admin::{AdminError, AdminSession};
pub use pages::Page;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_cookies::Cookies;

use crate::{web::static_files, AppState};

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All the routes of the server
pub fn routes(app_state: AppState) -> Router {
    let mut router = Router::new().route(
        Page::Index.path(),
        get(|state: State<AppState>, cookies: Cookies| {
            pages::render_page(state, cookies, Page::Index)
        }),
    );
    for page in Page::NAMED {
        router = route_both(
            router,
            page.path(),
            get(move |state: State<AppState>, cookies: Cookies| {
                pages::render_page(state, cookies, page)
            }),
        );
    }

    let signup = get(newsletter::signup_get).post(newsletter::signup_post);
    let router = route_both(router, "/newsletter-signup", signup.clone());
    let router = route_both(router, "/newsletter-login", signup);
    let router = route_both(
        router,
        "/newsletter-unsubscribe",
        get(newsletter::unsubscribe_get).post(newsletter::unsubscribe_post),
    );
    let router = route_both(router, "/api/newsletter/subscribe", post(api::subscribe));
    let router = route_both(router, "/newsletter-stats", get(stats::stats));

    router
        .route("/health-check", get(health_check))
        .nest("/admin", admin::routes())
        .fallback(static_files::serve_static)
        .with_state(app_state)
}

/// Registers `method_router` at `path` and at `path/`.
fn route_both(
    router: Router<AppState>,
    path: &str,
    method_router: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, method_router.clone())
        .route(&format!("{path}/"), method_router)
}
