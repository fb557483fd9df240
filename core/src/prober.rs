use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::DiscoveryConfig;
use crate::endpoint::CandidateEndpoint;
use crate::transport::Method;
use crate::transport::Transport;

/// Classifies a single candidate endpoint as the companion service or not.
///
/// A refused connection, a timeout and a port held by an unrelated service
/// are all the same answer: not live. None of them is an error.
#[derive(Clone)]
pub struct Prober {
    transport: Arc<dyn Transport>,
    signatures: Vec<String>,
    timeout: Duration,
}

impl Prober {
    pub fn new(transport: Arc<dyn Transport>, signatures: Vec<String>, timeout: Duration) -> Self {
        let signatures = signatures.into_iter().filter(|s| !s.is_empty()).collect();
        Self {
            transport,
            signatures,
            timeout,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &DiscoveryConfig) -> Self {
        Self::new(
            transport,
            config.liveness_signatures.clone(),
            config.probe_timeout(),
        )
    }

    pub async fn probe(&self, candidate: &CandidateEndpoint) -> bool {
        let url = match candidate.root_url() {
            Ok(url) => url,
            Err(err) => {
                debug!("cannot build probe url for {candidate}: {err}");
                return false;
            }
        };

        match self.transport.request(Method::GET, &url, self.timeout).await {
            Ok(response) => {
                let live = self.matches_signature(&response.body);
                debug!(
                    status = response.status,
                    live, "probe response from {candidate}"
                );
                live
            }
            Err(err) => {
                debug!("probe of {candidate} failed: {err}");
                false
            }
        }
    }

    pub fn matches_signature(&self, body: &str) -> bool {
        self.signatures.iter().any(|s| body.contains(s.as_str()))
    }
}
