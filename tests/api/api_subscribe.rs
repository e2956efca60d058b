use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::helpers::TestApp;

const API_PATH: &str = "/api/newsletter/subscribe/";

async fn post_json(app: &TestApp, body: String) -> Result<reqwest::Response> {
    Ok(app
        .http_client
        .post(app.url(API_PATH))
        .header("Content-Type", "application/json")
        .header("User-Agent", "waxwarm-tests/1.0")
        .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
        .body(body)
        .send()
        .await?)
}

#[tokio::test]
async fn api_subscribe_returns_the_new_id_without_csrf() -> Result<()> {
    let app = TestApp::spawn().await?;

    let resp = post_json(&app, json!({ "email": "User@Example.com " }).to_string()).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Successfully subscribed to our newsletter!");

    let sub = app
        .find_subscription("user@example.com")
        .await?
        .expect("subscription stored");
    assert_eq!(body["subscription_id"], sub.id);
    assert_eq!(sub.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(sub.user_agent.as_deref(), Some("waxwarm-tests/1.0"));

    Ok(())
}

#[tokio::test]
async fn api_subscribe_conflict_is_a_bad_request() -> Result<()> {
    let app = TestApp::spawn().await?;

    post_json(&app, json!({ "email": "a@b.com" }).to_string()).await?;
    let resp = post_json(&app, json!({ "email": "a@b.com" }).to_string()).await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await?;
    assert_eq!(
        body,
        json!({
            "success": false,
            "message": "This email is already subscribed to our newsletter."
        })
    );

    Ok(())
}

#[tokio::test]
async fn api_subscribe_rejects_bad_input() -> Result<()> {
    let app = TestApp::spawn().await?;

    let cases = [
        (json!({}).to_string(), "Email address is required."),
        (json!({ "email": "   " }).to_string(), "Email address is required."),
        (
            json!({ "email": "not-an-email" }).to_string(),
            "Please enter a valid email address.",
        ),
        ("{\"email\": ".to_string(), "Invalid JSON data."),
        (json!({ "email": 42 }).to_string(), "Invalid JSON data."),
    ];

    for (body, expected_msg) in cases {
        let resp = post_json(&app, body.clone()).await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let json: Value = resp.json().await?;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], expected_msg, "body: {body}");
    }

    Ok(())
}

#[tokio::test]
async fn api_subscribe_without_trailing_slash() -> Result<()> {
    let app = TestApp::spawn().await?;

    let resp = app
        .http_client
        .post(app.url("/api/newsletter/subscribe"))
        .json(&json!({ "email": "slash@example.com" }))
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}
