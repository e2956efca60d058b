//! Double-submit CSRF protection.
//!
//! The token lives in a signed cookie and must be echoed back in the `csrfmiddlewaretoken`
//! form field or in the `X-CSRFToken` header.

use tower_cookies::{Cookie, Cookies, Key};

use crate::{
    utils,
    web::{Error, WebResult, CSRF_COOKIE},
};

/// Returns the visitor's token, issuing a new cookie if there is none yet.
pub fn get_or_create_token(cookies: &Cookies, key: &Key) -> String {
    let signed = cookies.signed(key);
    if let Some(cookie) = signed.get(CSRF_COOKIE) {
        return cookie.value().to_string();
    }

    let token = utils::random_b64u_token::<32>();
    let cookie = Cookie::build((CSRF_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .build();
    signed.add(cookie);

    token
}

pub fn verify(cookies: &Cookies, key: &Key, submitted: Option<&str>) -> WebResult<()> {
    let expected = cookies.signed(key).get(CSRF_COOKIE);

    match (expected, submitted) {
        (Some(expected), Some(submitted))
            if !submitted.is_empty() && constant_time_eq(expected.value(), submitted) =>
        {
            Ok(())
        }
        _ => Err(Error::CsrfFailed),
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}
