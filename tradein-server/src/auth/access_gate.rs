//! Source-address gate for the external ingestion endpoint

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use shared::error::AppError;

use crate::db::WhitelistStore;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny,
}

/// Resolved caller address, inserted into request extensions by the gate
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[derive(Clone)]
pub struct AccessGate {
    whitelist: Arc<dyn WhitelistStore>,
    allow_loopback: bool,
}

impl AccessGate {
    /// `allow_loopback` must only be set in development
    pub fn new(whitelist: Arc<dyn WhitelistStore>, allow_loopback: bool) -> Self {
        Self {
            whitelist,
            allow_loopback,
        }
    }

    /// Decide whether `addr` may call the gated endpoint.
    ///
    /// Unresolvable addresses, missing entries, inactive entries and store
    /// failures all deny.
    pub async fn authorize(&self, addr: Option<IpAddr>) -> AccessDecision {
        let Some(addr) = addr.map(|a| a.to_canonical()) else {
            return AccessDecision::Deny;
        };

        if self.allow_loopback && addr.is_loopback() {
            return AccessDecision::Allow;
        }

        match self.whitelist.find_active(&addr.to_string()).await {
            Ok(Some(entry)) if entry.is_active => AccessDecision::Allow,
            Ok(_) => AccessDecision::Deny,
            Err(e) => {
                tracing::error!(ip = %addr, error = %e, "Whitelist lookup failed");
                AccessDecision::Deny
            }
        }
    }
}

/// Extract client IP: X-Forwarded-For header first, then peer address.
///
/// A present but unparsable header resolves to `None` instead of falling
/// through to the peer (which would be the proxy).
pub fn client_ip(request: &Request) -> Option<IpAddr> {
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        // Comma-separated; first entry is the original client
        return forwarded
            .to_str()
            .ok()
            .and_then(|val| val.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok())
            .map(|ip| ip.to_canonical());
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_canonical())
}

/// Middleware guarding the external gateway
pub async fn access_gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    match state.gate.authorize(ip).await {
        AccessDecision::Allow => {
            if let Some(ip) = ip {
                request.extensions_mut().insert(ClientIp(ip));
            }
            next.run(request).await
        }
        AccessDecision::Deny => {
            tracing::warn!(
                ip = ip.map(|a| a.to_string()).as_deref().unwrap_or("unknown"),
                path = %request.uri().path(),
                "External request denied by access gate"
            );
            AppError::access_denied().into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use axum::body::Body;
    use shared::models::IpWhitelistEntry;

    async fn gate_with(addresses: &[(&str, bool)], allow_loopback: bool) -> AccessGate {
        let store = Arc::new(MemoryStore::new());
        for (i, (address, active)) in addresses.iter().enumerate() {
            WhitelistStore::insert(
                store.as_ref(),
                &IpWhitelistEntry {
                    id: i as i64 + 1,
                    address: address.to_string(),
                    label: "partner".into(),
                    is_active: *active,
                    created_at: 0,
                },
            )
            .await
            .unwrap();
        }
        AccessGate::new(store, allow_loopback)
    }

    fn ip(s: &str) -> Option<IpAddr> {
        Some(s.parse().unwrap())
    }

    #[tokio::test]
    async fn test_active_entry_allows() {
        let gate = gate_with(&[("203.0.113.7", true)], false).await;
        assert_eq!(gate.authorize(ip("203.0.113.7")).await, AccessDecision::Allow);
        assert_eq!(gate.authorize(ip("203.0.113.8")).await, AccessDecision::Deny);
    }

    #[tokio::test]
    async fn test_inactive_entry_denies() {
        let gate = gate_with(&[("203.0.113.7", false)], false).await;
        assert_eq!(gate.authorize(ip("203.0.113.7")).await, AccessDecision::Deny);
    }

    #[tokio::test]
    async fn test_mapped_ipv6_matches_ipv4_entry() {
        let gate = gate_with(&[("203.0.113.7", true)], false).await;
        assert_eq!(
            gate.authorize(ip("::ffff:203.0.113.7")).await,
            AccessDecision::Allow
        );
    }

    #[tokio::test]
    async fn test_loopback_bypass_only_when_enabled() {
        let dev = gate_with(&[], true).await;
        assert_eq!(dev.authorize(ip("127.0.0.1")).await, AccessDecision::Allow);
        assert_eq!(dev.authorize(ip("::1")).await, AccessDecision::Allow);

        let prod = gate_with(&[], false).await;
        assert_eq!(prod.authorize(ip("127.0.0.1")).await, AccessDecision::Deny);
    }

    #[tokio::test]
    async fn test_unresolved_address_denies() {
        let gate = gate_with(&[("203.0.113.7", true)], true).await;
        assert_eq!(gate.authorize(None).await, AccessDecision::Deny);
    }

    #[test]
    fn test_forwarded_header_takes_first_entry() {
        let request = axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&request), ip("203.0.113.7"));
    }

    #[test]
    fn test_peer_address_fallback() {
        let mut request = axum::http::Request::builder().body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([198, 51, 100, 4], 41000))));
        assert_eq!(client_ip(&request), ip("198.51.100.4"));
    }

    #[test]
    fn test_garbage_forwarded_header_is_unresolved() {
        let mut request = axum::http::Request::builder()
            .header("x-forwarded-for", "not-an-ip")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 41000))));
        assert_eq!(client_ip(&request), None);
    }
}
