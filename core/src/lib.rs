//! Discovery and reconciliation engine for a companion service listening on
//! a small window of loopback ports.
//!
//! The engine locates the live service, decides whether the page's current
//! action links already point at it, and either leaves them alone, corrects
//! them by re-navigating, or disables them. The pieces are layered leaves
//! first: [`transport`] issues requests, [`prober`] classifies one port,
//! [`scanner`] walks the window, [`reconcile`] drives the state machine and
//! [`interception`] rewires action controls for in-page requests.

pub mod config;
pub mod eligibility;
pub mod endpoint;
pub mod error;
pub mod interception;
pub mod memory_page;
pub mod page;
pub mod prober;
pub mod reconcile;
pub mod scanner;
pub mod transport;

pub use config::ConfigOverrides;
pub use config::DiscoveryConfig;
pub use config::TransportPreference;
pub use eligibility::Eligibility;
pub use eligibility::PageRules;
pub use endpoint::CandidateEndpoint;
pub use endpoint::DiscoveredEndpoint;
pub use error::ConfigError;
pub use error::TransportError;
pub use interception::ActionHandler;
pub use interception::Interceptor;
pub use memory_page::MemoryPage;
pub use page::ActionControl;
pub use page::ControlId;
pub use page::ControlStatus;
pub use page::Page;
pub use page::PageState;
pub use page::StatusIcon;
pub use prober::Prober;
pub use reconcile::Outcome;
pub use reconcile::ReconcileState;
pub use reconcile::Reconciler;
pub use scanner::PortScanner;
pub use transport::HostCapabilities;
pub use transport::PrivilegedTransport;
pub use transport::SameOriginTransport;
pub use transport::Transport;
pub use transport::TransportKind;
pub use transport::TransportResponse;
pub use transport::select_transport;
