//! One-shot messages carried to the next rendered page in a signed cookie.

use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies, Key};
use tracing::warn;

use crate::{utils, web::FLASH_COOKIE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub message: String,
}

/// Queues a message for the next page render.
pub fn push(cookies: &Cookies, key: &Key, level: Level, message: impl Into<String>) {
    let mut messages = read(cookies, key);
    messages.push(FlashMessage {
        level,
        message: message.into(),
    });

    let json = match serde_json::to_vec(&messages) {
        Ok(json) => json,
        Err(er) => {
            warn!("dropping flash messages: {er}");
            return;
        }
    };
    let cookie = Cookie::build((FLASH_COOKIE, utils::b64u_encode(json)))
        .path("/")
        .http_only(true)
        .build();
    cookies.signed(key).add(cookie);
}

/// Returns every queued message and clears the queue.
pub fn take(cookies: &Cookies, key: &Key) -> Vec<FlashMessage> {
    let messages = read(cookies, key);
    if !messages.is_empty() {
        cookies
            .signed(key)
            .remove(Cookie::build((FLASH_COOKIE, "")).path("/").build());
    }
    messages
}

/// A tampered or undecodable cookie reads as no messages.
fn read(cookies: &Cookies, key: &Key) -> Vec<FlashMessage> {
    cookies
        .signed(key)
        .get(FLASH_COOKIE)
        .and_then(|cookie| utils::b64u_decode(cookie.value()).ok())
        .and_then(|json| serde_json::from_slice(&json).ok())
        .unwrap_or_default()
}
