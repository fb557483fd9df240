//! Uniform request facility used by the prober, the interception layer and
//! the reconciler's cleanup request.
//!
//! Two variants exist. [`PrivilegedTransport`] can reach any URL regardless
//! of the page's origin. [`SameOriginTransport`] is the fallback: it only
//! issues requests that the page's own network context can reach, which
//! covers the page's host and the loopback interface. [`select_transport`]
//! picks one of them once and the engine never reconsiders.
//!
//! Neither variant retries; retry policy belongs to callers.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
pub use reqwest::Method;
use url::Host;
use url::Url;

use crate::config::TransportPreference;
use crate::error::TransportError;

/// A response that arrived in time, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl TransportResponse {
    /// 2xx and 3xx count as success for action requests.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Privileged,
    SameOrigin,
}

#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Issue one request. Fails with [`TransportError::Timeout`] if no full
    /// response arrives within `timeout`.
    async fn request(
        &self,
        method: Method,
        url: &Url,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

/// What the hosting environment offers, detected once per page load.
#[derive(Debug, Clone, Default)]
pub struct HostCapabilities {
    /// A cross-origin capable request facility is available.
    pub privileged_requests: bool,
    pub page_origin: Option<Url>,
}

/// Pick the transport for this page load.
pub fn select_transport(
    capabilities: &HostCapabilities,
    preference: TransportPreference,
) -> Arc<dyn Transport> {
    let use_privileged = match preference {
        TransportPreference::SameOrigin => false,
        TransportPreference::Auto => capabilities.privileged_requests,
        TransportPreference::Privileged => {
            if !capabilities.privileged_requests {
                tracing::warn!(
                    "privileged transport requested but unavailable; using same-origin client"
                );
            }
            capabilities.privileged_requests
        }
    };

    if use_privileged {
        tracing::debug!("using privileged transport");
        Arc::new(PrivilegedTransport::new())
    } else {
        tracing::debug!("using same-origin transport");
        Arc::new(SameOriginTransport::new(capabilities.page_origin.clone()))
    }
}

fn build_client() -> reqwest::Client {
    // Loopback traffic must never be routed through a configured proxy.
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

async fn send(
    client: &reqwest::Client,
    method: Method,
    url: &Url,
    timeout: Duration,
) -> Result<TransportResponse, TransportError> {
    let exchange = async {
        let resp = client.request(method, url.clone()).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok::<_, reqwest::Error>((status, body))
    };

    match tokio::time::timeout(timeout, exchange).await {
        Err(_elapsed) => Err(TransportError::Timeout {
            url: url.to_string(),
            timeout,
        }),
        Ok(Err(err)) if err.is_timeout() => Err(TransportError::Timeout {
            url: url.to_string(),
            timeout,
        }),
        Ok(Err(err)) => Err(TransportError::Network {
            url: url.to_string(),
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            status_text: err.to_string(),
        }),
        Ok(Ok((status, body))) => Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        }),
    }
}

/// Cross-origin capable client.
#[derive(Debug, Clone)]
pub struct PrivilegedTransport {
    client: reqwest::Client,
}

impl PrivilegedTransport {
    pub fn new() -> Self {
        Self {
            client: build_client(),
        }
    }
}

impl Default for PrivilegedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for PrivilegedTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Privileged
    }

    async fn request(
        &self,
        method: Method,
        url: &Url,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        send(&self.client, method, url, timeout).await
    }
}

/// Fallback client confined to what the page itself can reach.
#[derive(Debug, Clone)]
pub struct SameOriginTransport {
    client: reqwest::Client,
    page_origin: Option<Url>,
}

impl SameOriginTransport {
    pub fn new(page_origin: Option<Url>) -> Self {
        Self {
            client: build_client(),
            page_origin,
        }
    }

    pub fn can_reach(&self, url: &Url) -> bool {
        if url.host().is_some_and(|host| is_loopback(&host)) {
            return true;
        }
        match &self.page_origin {
            Some(origin) => origin.origin() == url.origin(),
            None => false,
        }
    }

    fn origin_label(&self) -> String {
        self.page_origin
            .as_ref()
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_else(|| "null".to_string())
    }
}

fn is_loopback(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(ip) => IpAddr::V4(*ip).is_loopback(),
        Host::Ipv6(ip) => IpAddr::V6(*ip).is_loopback(),
    }
}

#[async_trait]
impl Transport for SameOriginTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::SameOrigin
    }

    async fn request(
        &self,
        method: Method,
        url: &Url,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        if !self.can_reach(url) {
            return Err(TransportError::Blocked {
                url: url.to_string(),
                origin: self.origin_label(),
            });
        }
        send(&self.client, method, url, timeout).await
    }
}
