use tracing::debug;
use tracing::info;

use crate::endpoint::CandidateEndpoint;
use crate::prober::Prober;

/// Walks a port window strictly in ascending order, one probe at a time,
/// and stops at the first live port.
///
/// Worst case is `(end - start + 1) * probe timeout`, reached when nothing
/// in the window answers.
#[derive(Clone)]
pub struct PortScanner {
    prober: Prober,
}

impl PortScanner {
    pub fn new(prober: Prober) -> Self {
        Self { prober }
    }

    pub async fn scan(&self, host: &str, start_port: u16, end_port: u16) -> Option<u16> {
        if start_port > end_port {
            debug!("empty scan window {start_port}..={end_port}");
            return None;
        }

        for port in start_port..=end_port {
            debug!("probing port {port}");
            if self.prober.probe(&CandidateEndpoint::new(host, port)).await {
                return Some(port);
            }
        }

        info!("no live endpoint on {host} in {start_port}..={end_port}");
        None
    }
}
