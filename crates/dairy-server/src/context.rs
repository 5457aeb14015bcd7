//! Per-request caller context used for auditing.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use dairy_audit::SYSTEM_PRINCIPAL;
use dairy_core::Role;
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::geo::{GeoError, GeoLocator};
use crate::middleware::Session;
use crate::state::AppState;

/// Who is calling and from where.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallerContext {
    pub principal_id: Option<Uuid>,
    pub principal_role: Option<Role>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl CallerContext {
    /// Principal id as recorded in audit records.
    pub fn principal(&self) -> String {
        self.principal_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| SYSTEM_PRINCIPAL.to_string())
    }

    /// Location and device metadata for an audit record.
    ///
    /// Lookup failures degrade to whatever is known locally.
    pub async fn audit_metadata(&self, geo: &dyn GeoLocator) -> Map<String, Value> {
        let mut metadata = Map::new();
        if let Some(ref ip) = self.ip {
            match geo.resolve(ip).await {
                Ok(location) => metadata.extend(location.to_metadata()),
                Err(GeoError::Disabled) => {}
                Err(e) => tracing::debug!(ip = %ip, error = %e, "Geolocation lookup failed"),
            }
            metadata
                .entry("ip")
                .or_insert_with(|| Value::from(ip.clone()));
        }
        if let Some(ref agent) = self.user_agent {
            metadata.insert("userAgent".to_string(), Value::from(agent.clone()));
        }
        metadata
    }
}

/// Client address: the first `x-forwarded-for` entry when trusted, else the
/// socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> Option<String> {
    if trust_forwarded_for
        && let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    {
        return Some(forwarded.to_string());
    }
    peer.map(|addr| addr.ip().to_string())
}

impl FromRequestParts<AppState> for CallerContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Session>();
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self {
            principal_id: session.map(|s| s.user.id),
            principal_role: session.map(|s| s.user.role),
            ip: client_ip(&parts.headers, peer, state.config().server.trust_forwarded_for),
            user_agent: parts
                .headers
                .get(USER_AGENT)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{DisabledLocator, GeoLocation};
    use async_trait::async_trait;
    use axum::http::HeaderValue;

    struct FixedLocator;

    #[async_trait]
    impl GeoLocator for FixedLocator {
        async fn resolve(&self, ip: &str) -> Result<GeoLocation, GeoError> {
            Ok(GeoLocation {
                city: Some("Anand".to_string()),
                country: Some("India".to_string()),
                ip: Some(ip.to_string()),
                ..Default::default()
            })
        }
    }

    struct FailingLocator;

    #[async_trait]
    impl GeoLocator for FailingLocator {
        async fn resolve(&self, _ip: &str) -> Result<GeoLocation, GeoError> {
            Err(GeoError::UpstreamUnavailable("timeout".to_string()))
        }
    }

    #[test]
    fn test_client_ip_prefers_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();

        assert_eq!(client_ip(&headers, Some(peer), true).as_deref(), Some("203.0.113.7"));
        assert_eq!(client_ip(&headers, Some(peer), false).as_deref(), Some("127.0.0.1"));
        assert_eq!(client_ip(&HeaderMap::new(), None, true), None);
    }

    #[test]
    fn test_principal_defaults_to_system() {
        assert_eq!(CallerContext::default().principal(), "SYSTEM");
    }

    #[tokio::test]
    async fn test_metadata_with_location() {
        let caller = CallerContext {
            ip: Some("203.0.113.7".to_string()),
            user_agent: Some("curl/8.0".to_string()),
            ..Default::default()
        };
        let metadata = caller.audit_metadata(&FixedLocator).await;
        assert_eq!(metadata["city"], "Anand");
        assert_eq!(metadata["ip"], "203.0.113.7");
        assert_eq!(metadata["userAgent"], "curl/8.0");
    }

    #[tokio::test]
    async fn test_metadata_degrades_on_lookup_failure() {
        let caller = CallerContext {
            ip: Some("203.0.113.7".to_string()),
            ..Default::default()
        };
        for metadata in [
            caller.audit_metadata(&FailingLocator).await,
            caller.audit_metadata(&DisabledLocator).await,
        ] {
            assert_eq!(metadata.len(), 1);
            assert_eq!(metadata["ip"], "203.0.113.7");
        }
    }
}
