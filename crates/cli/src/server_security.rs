use anyhow::{Context as AnyhowContext, Result};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::net::SocketAddr;

pub(crate) const AUTH_TOKEN_ENV: &str = "PROBE_AUTH_TOKEN";

/// Exposure rules for the local server.
///
/// The probe echoes runtime configuration, so non-loopback binds are opt-in
/// and require a bearer token.
#[derive(Clone, Debug)]
pub(crate) struct ServeGuard {
    token: Option<String>,
    public: bool,
}

impl ServeGuard {
    pub(crate) fn new(raw_token: Option<&str>, public: bool) -> Result<Self> {
        let token = match raw_token.map(str::trim) {
            Some("") => anyhow::bail!("auth token must be non-empty"),
            Some(token) => Some(token.to_string()),
            None => None,
        };
        if public && token.is_none() {
            anyhow::bail!("--public requires an auth token: set --auth-token or export {AUTH_TOKEN_ENV}");
        }
        Ok(Self { token, public })
    }

    pub(crate) fn auth_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn authorize(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.token else {
            return true;
        };
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().strip_prefix("Bearer "))
            .is_some_and(|presented| constant_time_eq(presented.trim(), expected))
    }

    /// Resolve `bind`, refusing non-loopback addresses unless public.
    pub(crate) async fn resolve(&self, bind: &str) -> Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(bind)
            .await
            .with_context(|| format!("Failed to resolve bind address: {bind}"))?
            .collect();
        if addrs.is_empty() {
            anyhow::bail!("Bind address resolved to zero socket addrs: {bind}")
        }

        if !self.public && addrs.iter().any(|addr| !addr.ip().is_loopback()) {
            anyhow::bail!(
                "Refusing to bind to non-loopback address without --public: {bind}"
            )
        }
        Ok(addrs)
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}
