//! Page collaborator seam.
//!
//! The page owns its action controls; the engine reads their hrefs and
//! rewrites their presentation, never their identity.

use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::endpoint::DiscoveredEndpoint;
use crate::interception::ActionHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ControlId(pub usize);

impl std::fmt::Display for ControlId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusIcon {
    /// Whatever icon the page rendered the control with.
    Original,
    Success,
    Error,
}

/// Presentation applied to a control after a click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlStatus {
    pub icon: StatusIcon,
    /// Tooltip text.
    pub title: String,
}

impl ControlStatus {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            icon: StatusIcon::Success,
            title: title.into(),
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            icon: StatusIcon::Error,
            title: title.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.icon == StatusIcon::Success
    }
}

/// A hand-off link to the companion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionControl {
    pub id: ControlId,
    pub href: Url,
    pub title: Option<String>,
    pub icon: StatusIcon,
    pub hidden: bool,
}

impl ActionControl {
    pub fn new(id: ControlId, href: Url) -> Self {
        Self {
            id,
            href,
            title: None,
            icon: StatusIcon::Original,
            hidden: false,
        }
    }
}

/// DOM-side collaborator the engine drives.
pub trait Page: Send + Sync {
    fn location(&self) -> Url;

    /// All elements carrying the action-control marker, in document order.
    fn action_controls(&self) -> Vec<ActionControl>;

    /// Swap the element for `replacement`, whose only click handler is
    /// `handler`. Any handler bound to the old element goes with it.
    fn replace_control(&self, replacement: ActionControl, handler: Arc<ActionHandler>);

    fn set_status(&self, id: ControlId, status: ControlStatus);

    fn hide_control(&self, id: ControlId);

    /// Full page transition. Terminal for the current page instance.
    fn navigate(&self, url: Url);
}

/// What the page believes at load time. Read once, never updated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub believed_port: Option<u16>,
    pub excluded: bool,
}

impl PageState {
    /// The query parameter wins; otherwise the port embedded in the first
    /// action control's href.
    pub fn read(page: &dyn Page, port_param: &str, excluded: bool) -> Self {
        let believed_port = persisted_port(&page.location(), port_param)
            .or_else(|| find_action_endpoint(page).and_then(|endpoint| endpoint.port));
        Self {
            believed_port,
            excluded,
        }
    }
}

/// Port stored in the query parameter. `0` and unparsable values mean no
/// active endpoint.
pub fn persisted_port(location: &Url, port_param: &str) -> Option<u16> {
    location
        .query_pairs()
        .find(|(key, _)| key == port_param)
        .and_then(|(_, value)| value.trim().parse::<u16>().ok())
        .filter(|port| *port != 0)
}

/// `location` with `port_param` set to `port`. The first existing occurrence
/// keeps its position; duplicates are dropped.
pub fn with_port_param(location: &Url, port_param: &str, port: u16) -> Url {
    let port = port.to_string();
    let mut replaced = false;
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, value) in location.query_pairs() {
        if key == port_param {
            if !replaced {
                pairs.push((key.into_owned(), port.clone()));
                replaced = true;
            }
        } else {
            pairs.push((key.into_owned(), value.into_owned()));
        }
    }
    if !replaced {
        pairs.push((port_param.to_string(), port));
    }

    let mut url = location.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url
}

/// Endpoint of the first action control, if the page has one.
pub fn find_action_endpoint(page: &dyn Page) -> Option<DiscoveredEndpoint> {
    page.action_controls()
        .first()
        .and_then(|control| DiscoveredEndpoint::from_href(&control.href))
}
