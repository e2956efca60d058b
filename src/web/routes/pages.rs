use axum::{extract::State, response::Html};
use tower_cookies::Cookies;

use crate::{
    web::{csrf, flash, WebResult},
    AppState,
};

/// The site's public pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Index,
    About,
    Shop,
    Blog,
    Contact,
    Cart,
    Sproduct,
}

impl Page {
    pub const NAMED: [Page; 6] = [
        Page::About,
        Page::Shop,
        Page::Blog,
        Page::Contact,
        Page::Cart,
        Page::Sproduct,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Page::Index => "/",
            Page::About => "/about",
            Page::Shop => "/shop",
            Page::Blog => "/blog",
            Page::Contact => "/contact",
            Page::Cart => "/cart",
            Page::Sproduct => "/sproduct",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Page::Index => "pages/index.html",
            Page::About => "pages/about.html",
            Page::Shop => "pages/shop.html",
            Page::Blog => "pages/blog.html",
            Page::Contact => "pages/contact.html",
            Page::Cart => "pages/cart.html",
            Page::Sproduct => "pages/sproduct.html",
        }
    }
}

/// Context every rendered page gets: branding, the CSRF token and pending flash messages.
/// Issues the CSRF cookie on first visit.
pub(super) fn base_context(app_state: &AppState, cookies: &Cookies) -> tera::Context {
    let site = &app_state.site_config;
    let mut ctx = tera::Context::new();

    ctx.insert("site_title", &site.site_title);
    ctx.insert("site_header", &site.site_header);
    ctx.insert("index_title", &site.index_title);
    ctx.insert(
        "csrf_token",
        &csrf::get_or_create_token(cookies, &app_state.cookie_key),
    );
    ctx.insert(
        "flash_messages",
        &flash::take(cookies, &app_state.cookie_key),
    );

    ctx
}

#[tracing::instrument(name = "render_page", skip(app_state, cookies))]
pub async fn render_page(
    State(app_state): State<AppState>,
    cookies: Cookies,
    page: Page,
) -> WebResult<Html<String>> {
    let ctx = base_context(&app_state, &cookies);
    let body = app_state
        .templ_mgr
        .render_html_to_string(&ctx, page.template())?;

    Ok(Html(body))
}
