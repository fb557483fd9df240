//! Decides whether the page's action links already point at the live
//! companion service and corrects or disables them when they don't.
//!
//! ```text
//! Excluded? ── yes ──▶ done
//!     │ no
//! FastPathChecking ── believed port live ──▶ Synchronized
//!     │ dead or absent
//! FullScanning ── found == believed ──▶ Synchronized
//!     ├── found != believed ──▶ Correcting (navigate with the new port)
//!     └── nothing found ── believed existed ──▶ Disabling
//!                       └─ no believed port ─▶ done
//! ```
//!
//! Every probe failure is a transition, never an error.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;
use url::Url;

use crate::config::DiscoveryConfig;
use crate::endpoint::CandidateEndpoint;
use crate::endpoint::DiscoveredEndpoint;
use crate::interception::Interceptor;
use crate::page::Page;
use crate::page::PageState;
use crate::page::with_port_param;
use crate::prober::Prober;
use crate::scanner::PortScanner;
use crate::transport::Method;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcileState {
    Excluded,
    FastPathChecking,
    FullScanning,
    Synchronized,
    Correcting,
    Disabling,
}

/// Terminal result of one reconciliation for a page instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The page is not eligible; nothing was probed.
    Excluded,
    /// The believed endpoint is live and its controls are intercepted.
    Synchronized {
        endpoint: DiscoveredEndpoint,
        intercepted: usize,
    },
    /// A different live port was found and the page was sent to `location`.
    Corrected {
        endpoint: DiscoveredEndpoint,
        location: Url,
    },
    /// Nothing is live; the stale controls were hidden.
    Disabled { stale_port: u16, hidden: usize },
    /// Nothing is live and the page never pointed anywhere.
    NotFound,
}

impl Outcome {
    /// The live endpoint, if this run found one.
    pub fn endpoint(&self) -> Option<&DiscoveredEndpoint> {
        match self {
            Outcome::Synchronized { endpoint, .. } | Outcome::Corrected { endpoint, .. } => {
                Some(endpoint)
            }
            Outcome::Excluded | Outcome::Disabled { .. } | Outcome::NotFound => None,
        }
    }

    pub fn state(&self) -> ReconcileState {
        match self {
            Outcome::Excluded => ReconcileState::Excluded,
            Outcome::Synchronized { .. } => ReconcileState::Synchronized,
            Outcome::Corrected { .. } => ReconcileState::Correcting,
            Outcome::Disabled { .. } => ReconcileState::Disabling,
            Outcome::NotFound => ReconcileState::FullScanning,
        }
    }
}

fn enter(state: ReconcileState) {
    debug!(?state, "reconcile state");
}

pub struct Reconciler {
    config: Arc<DiscoveryConfig>,
    transport: Arc<dyn Transport>,
    prober: Prober,
    scanner: PortScanner,
    interceptor: Interceptor,
}

impl Reconciler {
    pub fn new(config: Arc<DiscoveryConfig>, transport: Arc<dyn Transport>) -> Self {
        let prober = Prober::from_config(Arc::clone(&transport), &config);
        let scanner = PortScanner::new(prober.clone());
        let interceptor = Interceptor::new(Arc::clone(&transport), &config);
        Self {
            config,
            transport,
            prober,
            scanner,
            interceptor,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn prober(&self) -> &Prober {
        &self.prober
    }

    pub fn scanner(&self) -> &PortScanner {
        &self.scanner
    }

    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Run one reconciliation for a freshly loaded page. `excluded` is the
    /// eligibility signal supplied by the page rules.
    pub async fn reconcile(&self, page: &dyn Page, excluded: bool) -> Outcome {
        if excluded {
            enter(ReconcileState::Excluded);
            return Outcome::Excluded;
        }

        let state = PageState::read(page, &self.config.port_param, excluded);
        let host = self.config.host.as_str();

        enter(ReconcileState::FastPathChecking);
        if let Some(port) = state.believed_port {
            let candidate = CandidateEndpoint::new(host, port);
            if self.prober.probe(&candidate).await {
                info!("action links configured for port {port}");
                return self.synchronize(page, &candidate);
            }
        }

        enter(ReconcileState::FullScanning);
        let found = self
            .scanner
            .scan(host, self.config.default_port, self.config.max_port)
            .await;

        match (found, state.believed_port) {
            (Some(port), Some(believed)) if port == believed => {
                debug!("action links already active on port {port}");
                self.synchronize(page, &CandidateEndpoint::new(host, port))
            }
            (Some(port), _) => {
                enter(ReconcileState::Correcting);
                info!("found companion service listening on port {port}");
                let location = with_port_param(&page.location(), &self.config.port_param, port);
                info!("reloading to activate action links on port {port}");
                page.navigate(location.clone());
                Outcome::Corrected {
                    endpoint: DiscoveredEndpoint::live(&CandidateEndpoint::new(host, port)),
                    location,
                }
            }
            (None, Some(stale_port)) => {
                enter(ReconcileState::Disabling);
                self.disable(page, stale_port).await
            }
            (None, None) => {
                info!("could not find companion service listening for action links");
                Outcome::NotFound
            }
        }
    }

    fn synchronize(&self, page: &dyn Page, candidate: &CandidateEndpoint) -> Outcome {
        enter(ReconcileState::Synchronized);
        let intercepted = self.interceptor.activate(page, page.action_controls());
        Outcome::Synchronized {
            endpoint: DiscoveredEndpoint::live(candidate),
            intercepted,
        }
    }

    async fn disable(&self, page: &dyn Page, stale_port: u16) -> Outcome {
        info!("companion service gone from port {stale_port}; disabling action links");
        let controls = page.action_controls();
        for control in &controls {
            page.hide_control(control.id);
        }

        // Best effort; failures are logged and dropped.
        let cleared = with_port_param(&page.location(), &self.config.port_param, 0);
        match self
            .transport
            .request(Method::GET, &cleared, self.config.action_timeout())
            .await
        {
            Ok(response) if response.is_success() => {
                debug!("cleared persisted port via {cleared}");
            }
            Ok(response) => {
                warn!(
                    "clearing persisted port was answered with {} {}",
                    response.status, response.status_text
                );
            }
            Err(err) => warn!("failed to clear persisted port: {err}"),
        }

        Outcome::Disabled {
            stale_port,
            hidden: controls.len(),
        }
    }
}
