#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tagport_core::DiscoveryConfig;
use tagport_core::MemoryPage;
use tagport_core::Transport;
use tagport_core::TransportError;
use tagport_core::TransportKind;
use tagport_core::TransportResponse;
use tagport_core::transport::Method;
use url::Url;

pub const SIGNATURE: &str = "MusicBrainz-Picard";
pub const LOOPBACK: &str = "127.0.0.1";
pub const RELEASE_PAGE: &str = "https://musicbrainz.org/release/0e9c4a0e-1b2c-4d5e-8f90-a1b2c3d4e5f6";

pub fn load_default_config_for_test() -> DiscoveryConfig {
    let config = DiscoveryConfig::default();
    config.validate().expect("defaults for test should always be valid");
    config
}

/// Action link the music database renders for a release when the
/// companion service was last seen on `port`.
pub fn tagger_link(port: u16) -> Url {
    Url::parse(&format!(
        "http://{LOOPBACK}:{port}/openalbum?id=0e9c4a0e-1b2c-4d5e-8f90-a1b2c3d4e5f6&t=1700000000"
    ))
    .expect("valid link")
}

pub fn release_page(query: &str, links: Vec<Url>) -> MemoryPage {
    let location = if query.is_empty() {
        RELEASE_PAGE.to_string()
    } else {
        format!("{RELEASE_PAGE}?{query}")
    };
    MemoryPage::new(Url::parse(&location).expect("valid page url"), links)
}

/// A loopback port with nothing listening on it.
pub fn unused_local_port() -> u16 {
    let listener = std::net::TcpListener::bind((LOOPBACK, 0)).expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

pub async fn start_mock_server() -> wiremock::MockServer {
    wiremock::MockServer::start().await
}

/// One scripted answer of [`FakeTransport`].
#[derive(Debug, Clone)]
pub enum Reply {
    Respond { status: u16, body: String },
    Refused,
    /// Waits out the caller's timeout, then fails.
    Timeout,
}

impl Reply {
    pub fn live() -> Self {
        Reply::Respond {
            status: 200,
            body: format!("<html><body>{SIGNATURE} 2.12</body></html>"),
        }
    }

    pub fn body(status: u16, body: &str) -> Self {
        Reply::Respond {
            status,
            body: body.to_string(),
        }
    }
}

/// Scripted [`Transport`] keyed by `host:port`. Unscripted authorities
/// refuse the connection. Every request is recorded.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<(Method, Url)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request to `host:port` with `reply`.
    pub fn with_reply(self, authority: &str, reply: Reply) -> Self {
        self.with_replies(authority, vec![reply])
    }

    /// Answer successive requests with `replies`; the last one repeats.
    pub fn with_replies(self, authority: &str, replies: Vec<Reply>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(authority.to_string(), replies.into());
        self
    }

    pub fn live_on(self, port: u16) -> Self {
        self.with_reply(&format!("{LOOPBACK}:{port}"), Reply::live())
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, url)| url.clone())
            .collect()
    }

    /// Ports probed on the loopback host, in order.
    pub fn probed_ports(&self) -> Vec<u16> {
        self.requests()
            .into_iter()
            .filter(|url| url.host_str() == Some(LOOPBACK) && url.path() == "/")
            .filter_map(|url| url.port())
            .collect()
    }

    fn next_reply(&self, authority: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(authority) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Reply::Refused),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::Refused),
            None => Reply::Refused,
        }
    }
}

fn authority(url: &Url) -> String {
    format!(
        "{}:{}",
        url.host_str().unwrap_or_default(),
        url.port_or_known_default().unwrap_or_default()
    )
}

#[async_trait]
impl Transport for FakeTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Privileged
    }

    async fn request(
        &self,
        method: Method,
        url: &Url,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((method, url.clone()));

        match self.next_reply(&authority(url)) {
            Reply::Respond { status, body } => Ok(TransportResponse {
                status,
                status_text: String::new(),
                body,
            }),
            Reply::Refused => Err(TransportError::Network {
                url: url.to_string(),
                status: 0,
                status_text: "connection refused".to_string(),
            }),
            Reply::Timeout => {
                tokio::time::sleep(timeout).await;
                Err(TransportError::Timeout {
                    url: url.to_string(),
                    timeout,
                })
            }
        }
    }
}
