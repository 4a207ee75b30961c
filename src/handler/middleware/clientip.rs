use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{request::Parts, HeaderMap, StatusCode};
use std::{
    fmt::{self, Formatter},
    net::SocketAddr,
};

const PROXY_HEADERS: [&str; 4] = [
    "x-client-ip",
    "x-forwarded-for",
    "x-real-ip",
    "cf-connecting-ip",
];

pub struct ClientIp(String);

impl ClientIp {
    /// Proxy headers win over the socket address; `X-Forwarded-For` lists are
    /// reduced to their first entry.
    pub fn resolve(headers: &HeaderMap, connect_info: Option<SocketAddr>) -> Self {
        for header in PROXY_HEADERS {
            if let Some(ip) = headers.get(header).and_then(|v| v.to_str().ok()) {
                let first_ip = ip.split(',').next().unwrap_or(ip).trim();
                if !first_ip.is_empty() {
                    return ClientIp(first_ip.to_string());
                }
            }
        }
        match connect_info {
            Some(addr) => ClientIp(addr.ip().to_string()),
            None => ClientIp("-".to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let connect_info = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self::resolve(&parts.headers, connect_info))
    }
}

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
