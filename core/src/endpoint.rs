use serde::Serialize;
use url::Url;

/// A host:port pair to be probed. Built fresh for every probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEndpoint {
    host: String,
    port: u16,
}

impl CandidateEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `http://{host}:{port}/`, bracketing bare IPv6 literals.
    pub fn root_url(&self) -> Result<Url, url::ParseError> {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        Url::parse(&format!("http://{host}:{}/", self.port))
    }
}

impl std::fmt::Display for CandidateEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The endpoint the page's action links point at, or the live endpoint
/// accepted for the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredEndpoint {
    pub protocol: String,
    pub host: String,
    pub port: Option<u16>,
}

impl DiscoveredEndpoint {
    pub fn live(candidate: &CandidateEndpoint) -> Self {
        Self {
            protocol: "http".to_string(),
            host: candidate.host().to_string(),
            port: Some(candidate.port()),
        }
    }

    /// Split an action href into its endpoint parts. Only an explicit port
    /// counts; a scheme default is treated as absent.
    pub fn from_href(href: &Url) -> Option<Self> {
        let host = href.host_str()?;
        Some(Self {
            protocol: href.scheme().to_string(),
            host: host.to_string(),
            port: href.port(),
        })
    }
}
