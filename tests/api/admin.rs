use anyhow::Result;
use reqwest::StatusCode;

use crate::helpers::{
    assert_resp_redir_to, extract_csrf_token, TestApp, STAFF_PASSWORD, STAFF_USERNAME,
};

/// Subscribes `count` readers and returns their emails.
async fn seed(app: &TestApp, count: usize) -> Result<Vec<String>> {
    let mut emails = Vec::with_capacity(count);
    for i in 0..count {
        let email = format!("reader{i}@example.com");
        app.subscribe(&email).await?;
        emails.push(email);
    }
    Ok(emails)
}

async fn id_of(app: &TestApp, email: &str) -> Result<String> {
    let sub = app.find_subscription(email).await?.expect("seeded");
    Ok(sub.id.to_string())
}

/// Token currently bound to the admin list page.
async fn admin_token(app: &TestApp) -> Result<String> {
    let html = app.get_html("/admin/subscriptions").await?;
    extract_csrf_token(&html)
}

#[tokio::test]
async fn admin_pages_redirect_anonymous_visitors_to_login() -> Result<()> {
    let app = TestApp::spawn().await?;

    for path in ["/admin", "/admin/subscriptions"] {
        let resp = app.get(path).await?;
        assert_resp_redir_to(&resp, "/admin/login");
    }

    let resp = app
        .post_form_with_csrf(
            "/admin/subscriptions/actions",
            &[("action", "deactivate_selected"), ("_selected_action", "1")],
        )
        .await?;
    assert_resp_redir_to(&resp, "/admin/login");

    Ok(())
}

#[tokio::test]
async fn wrong_credentials_flash_an_error_once() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.create_user(STAFF_USERNAME, STAFF_PASSWORD, true).await?;

    let resp = app.login(STAFF_USERNAME, "not-the-password").await?;
    assert_resp_redir_to(&resp, "/admin/login");

    let expected = "Please enter the correct username and password for a staff account.";
    let html = app.get_html("/admin/login").await?;
    assert!(html.contains(expected));
    let html = app.get_html("/admin/login").await?;
    assert!(!html.contains(expected));

    let resp = app.login("nobody", STAFF_PASSWORD).await?;
    assert_resp_redir_to(&resp, "/admin/login");

    Ok(())
}

#[tokio::test]
async fn staff_sees_the_list_with_summary() -> Result<()> {
    let app = TestApp::spawn().await?;
    let emails = seed(&app, 3).await?;
    app.login_staff().await?;

    let resp = app.get("/admin/subscriptions").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await?;

    assert!(html.contains("Wax and Warmth Admin"));
    assert!(html.contains(r#"<strong id="stats-total">3</strong>"#));
    for email in &emails {
        assert!(html.contains(email.as_str()));
    }
    // Newest first.
    let newest = html.find("reader2@example.com").expect("listed");
    let oldest = html.find("reader0@example.com").expect("listed");
    assert!(newest < oldest);

    // Logged-in staff skip the login form.
    let resp = app.get("/admin/login").await?;
    assert_resp_redir_to(&resp, "/admin/subscriptions");

    Ok(())
}

#[tokio::test]
async fn list_filters_by_search_and_status() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed(&app, 3).await?;
    app.subscribe("someone@shop.test").await?;
    app.post_form_with_csrf("/newsletter-unsubscribe/", &[("email", "reader1@example.com")])
        .await?;
    app.login_staff().await?;

    let html = app.get_html("/admin/subscriptions?q=SHOP.test").await?;
    assert!(html.contains("someone@shop.test"));
    assert!(!html.contains("reader0@example.com"));

    let html = app
        .get_html("/admin/subscriptions?is_active=false&since=today")
        .await?;
    assert!(html.contains("reader1@example.com"));
    assert!(!html.contains("reader0@example.com"));
    assert!(html.contains("1 subscription(s)"));

    Ok(())
}

#[tokio::test]
async fn bulk_deactivate_and_activate_report_counts() -> Result<()> {
    let app = TestApp::spawn().await?;
    let emails = seed(&app, 3).await?;
    app.login_staff().await?;

    let first = id_of(&app, &emails[0]).await?;
    let second = id_of(&app, &emails[1]).await?;
    let token = admin_token(&app).await?;

    let resp = app
        .post_form(
            "/admin/subscriptions/actions",
            &[
                ("csrfmiddlewaretoken", &token),
                ("action", "deactivate_selected"),
                ("_selected_action", &first),
                ("_selected_action", &second),
            ],
        )
        .await?;
    assert_resp_redir_to(&resp, "/admin/subscriptions");

    let html = app.get_html("/admin/subscriptions").await?;
    assert!(html.contains("2 subscription(s) were successfully deactivated."));
    assert!(html.contains(r#"<strong id="stats-inactive">2</strong>"#));
    assert!(!app.find_subscription(&emails[0]).await?.expect("kept").is_active);

    let token = extract_csrf_token(&html)?;
    app.post_form(
        "/admin/subscriptions/actions",
        &[
            ("csrfmiddlewaretoken", &token),
            ("action", "activate_selected"),
            ("_selected_action", &first),
        ],
    )
    .await?;
    let html = app.get_html("/admin/subscriptions").await?;
    assert!(html.contains("1 subscription(s) were successfully activated."));

    Ok(())
}

#[tokio::test]
async fn bulk_action_without_selection_changes_nothing() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed(&app, 2).await?;
    app.login_staff().await?;
    let token = admin_token(&app).await?;

    let resp = app
        .post_form(
            "/admin/subscriptions/actions",
            &[
                ("csrfmiddlewaretoken", &token),
                ("action", "deactivate_selected"),
            ],
        )
        .await?;
    assert_resp_redir_to(&resp, "/admin/subscriptions");

    let html = app.get_html("/admin/subscriptions").await?;
    assert!(html.contains("No items have been changed."));
    assert!(html.contains(r#"<strong id="stats-active">2</strong>"#));

    Ok(())
}

#[tokio::test]
async fn export_selected_as_csv() -> Result<()> {
    let app = TestApp::spawn().await?;
    let emails = seed(&app, 2).await?;
    app.login_staff().await?;
    let id = id_of(&app, &emails[1]).await?;
    let token = admin_token(&app).await?;

    let resp = app
        .post_form(
            "/admin/subscriptions/actions",
            &[
                ("csrfmiddlewaretoken", &token),
                ("action", "export_as_csv"),
                ("_selected_action", &id),
            ],
        )
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/csv");
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=\"newsletter_subscriptions.csv\""
    );

    let csv = resp.text().await?;
    let lines: Vec<&str> = csv.split_terminator("\r\n").collect();
    assert_eq!(lines[0], "Email,Active,Subscribed At,IP Address");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("reader1@example.com,Yes,"));
    assert!(lines[1].ends_with(",127.0.0.1"));

    Ok(())
}

#[tokio::test]
async fn single_row_activate_and_deactivate() -> Result<()> {
    let app = TestApp::spawn().await?;
    let emails = seed(&app, 1).await?;
    app.login_staff().await?;
    let id = id_of(&app, &emails[0]).await?;

    let token = admin_token(&app).await?;
    let resp = app
        .post_form(
            &format!("/admin/subscriptions/{id}/deactivate"),
            &[("csrfmiddlewaretoken", &token)],
        )
        .await?;
    assert_resp_redir_to(&resp, "/admin/subscriptions");
    assert!(!app.find_subscription(&emails[0]).await?.expect("kept").is_active);

    let token = admin_token(&app).await?;
    app.post_form(
        &format!("/admin/subscriptions/{id}/activate"),
        &[("csrfmiddlewaretoken", &token)],
    )
    .await?;
    assert!(app.find_subscription(&emails[0]).await?.expect("kept").is_active);

    let token = admin_token(&app).await?;
    app.post_form(
        "/admin/subscriptions/99999/activate",
        &[("csrfmiddlewaretoken", &token)],
    )
    .await?;
    let html = app.get_html("/admin/subscriptions").await?;
    assert!(html.contains("doesn"));

    Ok(())
}

#[tokio::test]
async fn logout_ends_the_session() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.login_staff().await?;
    let token = admin_token(&app).await?;

    let resp = app
        .post_form("/admin/logout", &[("csrfmiddlewaretoken", &token)])
        .await?;
    assert_resp_redir_to(&resp, "/admin/login");

    let resp = app.get("/admin/subscriptions").await?;
    assert_resp_redir_to(&resp, "/admin/login");
    let resp = app.get("/newsletter-stats/").await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    Ok(())
}
