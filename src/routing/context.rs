//! Per-request matching context.

use std::net::IpAddr;

use uuid::Uuid;

use crate::routing::method::Method;

/// Immutable snapshot of the request attributes the router matches on.
/// Created once per incoming request and discarded after dispatch.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    /// Lowercased URL scheme (`http` / `https`).
    scheme: String,
    /// Lowercased host, without port.
    host: String,
    path: String,
    client_ip: Option<IpAddr>,
    /// Correlation id for log lines belonging to this request.
    request_id: Uuid,
}

impl RequestContext {
    pub fn new(
        method: Method,
        scheme: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            method,
            scheme: scheme.into().to_lowercase(),
            host: host.into().to_lowercase(),
            path: path.into(),
            client_ip: None,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_ip
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_and_host_are_normalized() {
        let ctx = RequestContext::new(Method::Get, "HTTPS", "WWW.Example.COM", "/");
        assert_eq!(ctx.scheme(), "https");
        assert_eq!(ctx.host(), "www.example.com");
    }

    #[test]
    fn test_client_ip_is_optional() {
        let ctx = RequestContext::new(Method::Get, "http", "localhost", "/");
        assert!(ctx.client_ip().is_none());
        let ctx = ctx.with_client_ip("10.0.0.1".parse().unwrap());
        assert_eq!(ctx.client_ip(), Some("10.0.0.1".parse().unwrap()));
    }
}
