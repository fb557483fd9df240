//! Turns navigation-based action links into in-page asynchronous requests.
//!
//! Every activation replaces each control with a fresh clone carrying
//! exactly one [`ActionHandler`]; handlers from an earlier activation are
//! discarded together with the element they were bound to.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::error;
use url::Url;

use crate::config::DiscoveryConfig;
use crate::page::ActionControl;
use crate::page::ControlId;
use crate::page::ControlStatus;
use crate::page::Page;
use crate::transport::Method;
use crate::transport::Transport;

/// The single click handler bound to one action control.
pub struct ActionHandler {
    control: ControlId,
    href: Url,
    transport: Arc<dyn Transport>,
    timeout: Duration,
    error_message: String,
}

impl ActionHandler {
    pub fn control(&self) -> ControlId {
        self.control
    }

    pub fn href(&self) -> &Url {
        &self.href
    }

    /// Issue the control's request instead of navigating and record the
    /// outcome on the control. Failures end up on the control, never as an
    /// error to the caller.
    pub async fn on_click(&self, page: &dyn Page) -> ControlStatus {
        debug!("action control {} clicked: {}", self.control, self.href);
        let status = match self
            .transport
            .request(Method::GET, &self.href, self.timeout)
            .await
        {
            Ok(response) if response.is_success() => {
                debug!("action request succeeded: {}", response.body);
                ControlStatus::success(response.body)
            }
            Ok(response) => {
                error!(
                    "action request to {} was answered with {} {}",
                    self.href, response.status, response.status_text
                );
                ControlStatus::error(self.error_message.clone())
            }
            Err(err) => {
                error!("action request error: {err}");
                ControlStatus::error(self.error_message.clone())
            }
        };
        page.set_status(self.control, status.clone());
        status
    }
}

impl std::fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandler")
            .field("control", &self.control)
            .field("href", &self.href.as_str())
            .field("transport", &self.transport.kind())
            .finish()
    }
}

#[derive(Clone)]
pub struct Interceptor {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    error_message: String,
}

impl Interceptor {
    pub fn new(transport: Arc<dyn Transport>, config: &DiscoveryConfig) -> Self {
        Self {
            transport,
            timeout: config.action_timeout(),
            error_message: config.error_message.clone(),
        }
    }

    /// Rebind every control in `controls`. Returns how many were rebound.
    pub fn activate(&self, page: &dyn Page, controls: Vec<ActionControl>) -> usize {
        let count = controls.len();
        for control in controls {
            let handler = Arc::new(ActionHandler {
                control: control.id,
                href: control.href.clone(),
                transport: Arc::clone(&self.transport),
                timeout: self.timeout,
                error_message: self.error_message.clone(),
            });
            page.replace_control(control, handler);
        }
        debug!("intercepting {count} action control(s)");
        count
    }
}
