use std::{
    convert::Infallible,
    net::{IpAddr, SocketAddr},
};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts, HeaderMap},
};

/// Where a request came from, as recorded with a new subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientMeta {
            ip_address: client_ip(&parts.headers, peer).map(|ip| ip.to_string()),
            user_agent: user_agent(&parts.headers),
        })
    }
}

/// The first `X-Forwarded-For` entry wins if it is a valid address, otherwise the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or(peer)
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|val| val.to_str().ok())
        .filter(|ua| !ua.is_empty())
        .map(str::to_string)
}
