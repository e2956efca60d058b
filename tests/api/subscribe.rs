//! The site's signup form: form posts, JSON posts and the `/newsletter-login` alias.

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use crate::helpers::{assert_resp_redir_to, TestApp};

#[tokio::test]
async fn form_subscribe_creates_record_and_flashes_success() -> Result<()> {
    let app = TestApp::spawn().await?;

    let resp = app.subscribe("  Reader@Example.COM ").await?;
    assert_resp_redir_to(&resp, "/");

    let sub = app
        .find_subscription("reader@example.com")
        .await?
        .expect("subscription stored");
    assert!(sub.is_active);
    assert_eq!(sub.ip_address.as_deref(), Some("127.0.0.1"));

    // The message shows up once.
    let html = app.get_html("/").await?;
    assert!(html.contains(r#"class="flash flash-success""#));
    assert!(html.contains("Successfully subscribed to our newsletter!"));
    let html = app.get_html("/").await?;
    assert!(!html.contains("Successfully subscribed to our newsletter!"));

    Ok(())
}

#[tokio::test]
async fn duplicate_subscription_flashes_warning() -> Result<()> {
    let app = TestApp::spawn().await?;

    app.subscribe("a@b.com").await?;
    let resp = app.subscribe("A@B.com").await?;
    assert_resp_redir_to(&resp, "/");

    let html = app.get_html("/").await?;
    assert!(html.contains(r#"class="flash flash-warning""#));
    assert!(html.contains("This email is already subscribed to our newsletter."));

    Ok(())
}

#[tokio::test]
async fn invalid_emails_are_rejected_without_storing() -> Result<()> {
    let app = TestApp::spawn().await?;

    let cases = [
        ("", "Email address is required."),
        ("no-at-sign.com", "Please enter a valid email address."),
        ("nodot@localhost", "Please enter a valid email address."),
    ];

    for (email, expected_msg) in cases {
        let resp = app.subscribe(email).await?;
        assert_resp_redir_to(&resp, "/");

        let html = app.get_html("/").await?;
        assert!(html.contains(r#"class="flash flash-error""#), "email: {email:?}");
        assert!(html.contains(expected_msg), "email: {email:?}");
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions")
        .fetch_one(app.dm.db())
        .await?;
    assert_eq!(count, 0);

    Ok(())
}

#[tokio::test]
async fn form_post_without_csrf_token_is_forbidden() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.get("/").await?;

    let resp = app
        .post_form("/newsletter-signup/", &[("email", "a@b.com")])
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "CSRF verification failed");

    assert!(app.find_subscription("a@b.com").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn multipart_form_subscribe_is_accepted() -> Result<()> {
    let app = TestApp::spawn().await?;

    let resp = app
        .post_multipart_with_csrf("/newsletter-signup/", &[("email", "reader@example.com")])
        .await?;
    assert_resp_redir_to(&resp, "/");
    assert!(app.find_subscription("reader@example.com").await?.is_some());

    let html = app.get_html("/").await?;
    assert!(html.contains("Successfully subscribed to our newsletter!"));

    Ok(())
}

#[tokio::test]
async fn login_alias_behaves_like_signup() -> Result<()> {
    let app = TestApp::spawn().await?;

    let resp = app
        .post_form_with_csrf("/newsletter-login", &[("email", "alias@example.com")])
        .await?;
    assert_resp_redir_to(&resp, "/");
    assert!(app.find_subscription("alias@example.com").await?.is_some());

    for path in ["/newsletter-login/", "/newsletter-signup"] {
        let resp = app.get(path).await?;
        assert_resp_redir_to(&resp, "/");
    }

    Ok(())
}

#[tokio::test]
async fn json_signup_returns_json_outcomes() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.csrf_token().await?;

    let post = |body: String| {
        app.http_client
            .post(app.url("/newsletter-signup/"))
            .header("Content-Type", "application/json")
            .header("X-CSRFToken", &token)
            .body(body)
            .send()
    };

    let resp = post(json!({ "email": "json@example.com" }).to_string()).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(
        body,
        json!({ "success": true, "message": "Successfully subscribed to our newsletter!" })
    );

    let resp = post(json!({ "email": "json@example.com" }).to_string()).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "This email is already subscribed to our newsletter."
    );

    let resp = post(json!({ "email": "" }).to_string()).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["message"], "Email address is required.");

    let resp = post("{not json".to_string()).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["message"], "Invalid JSON data.");

    Ok(())
}

#[tokio::test]
async fn json_signup_requires_the_csrf_header() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.get("/").await?;

    let resp = app
        .http_client
        .post(app.url("/newsletter-signup/"))
        .header("Content-Type", "application/json")
        .body(json!({ "email": "json@example.com" }).to_string())
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(app.find_subscription("json@example.com").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn content_type_with_parameters_is_treated_as_form() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.csrf_token().await?;

    // Not exactly `application/json`, so the body is read as a form and carries no token.
    let resp = app
        .http_client
        .post(app.url("/newsletter-signup/"))
        .header("Content-Type", "application/json; charset=utf-8")
        .header("X-CSRFToken", &token)
        .body(json!({ "email": "json@example.com" }).to_string())
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(app.find_subscription("json@example.com").await?.is_none());

    Ok(())
}
