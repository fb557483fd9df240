use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use url::Url;

use crate::interception::ActionHandler;
use crate::page::ActionControl;
use crate::page::ControlId;
use crate::page::ControlStatus;
use crate::page::Page;

/// In-memory [`Page`] used by the CLI and tests.
///
/// Each control lives in one slot that holds the element and at most one
/// click handler. Replacing a control overwrites the whole slot. Navigations
/// are recorded instead of performed.
pub struct MemoryPage {
    location: Url,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    slots: Vec<Slot>,
    navigations: Vec<Url>,
}

struct Slot {
    control: ActionControl,
    handler: Option<Arc<ActionHandler>>,
    replacements: usize,
}

impl MemoryPage {
    /// A page at `location` with one action control per link, in order.
    pub fn new(location: Url, links: Vec<Url>) -> Self {
        let slots = links
            .into_iter()
            .enumerate()
            .map(|(i, href)| Slot {
                control: ActionControl::new(ControlId(i), href),
                handler: None,
                replacements: 0,
            })
            .collect();
        Self {
            location,
            inner: Mutex::new(Inner {
                slots,
                navigations: Vec::new(),
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn control(&self, id: ControlId) -> Option<ActionControl> {
        self.inner()
            .slots
            .iter()
            .find(|slot| slot.control.id == id)
            .map(|slot| slot.control.clone())
    }

    pub fn handler(&self, id: ControlId) -> Option<Arc<ActionHandler>> {
        self.inner()
            .slots
            .iter()
            .find(|slot| slot.control.id == id)
            .and_then(|slot| slot.handler.clone())
    }

    /// How many times the control has been swapped for a fresh clone.
    pub fn replacements(&self, id: ControlId) -> usize {
        self.inner()
            .slots
            .iter()
            .find(|slot| slot.control.id == id)
            .map(|slot| slot.replacements)
            .unwrap_or(0)
    }

    pub fn navigations(&self) -> Vec<Url> {
        self.inner().navigations.clone()
    }

    /// Simulate a user click. An intercepted control runs its handler and
    /// returns the resulting status; a plain link navigates to its href and
    /// returns `None`. Hidden or unknown controls do nothing.
    pub async fn click(&self, id: ControlId) -> Option<ControlStatus> {
        let (href, handler) = {
            let inner = self.inner();
            let slot = inner.slots.iter().find(|slot| slot.control.id == id)?;
            if slot.control.hidden {
                return None;
            }
            (slot.control.href.clone(), slot.handler.clone())
        };

        match handler {
            Some(handler) => Some(handler.on_click(self).await),
            None => {
                self.navigate(href);
                None
            }
        }
    }

    fn with_slot(&self, id: ControlId, f: impl FnOnce(&mut Slot)) {
        let mut inner = self.inner();
        if let Some(slot) = inner.slots.iter_mut().find(|slot| slot.control.id == id) {
            f(slot);
        } else {
            tracing::debug!("no action control {id} on page");
        }
    }
}

impl Page for MemoryPage {
    fn location(&self) -> Url {
        self.location.clone()
    }

    fn action_controls(&self) -> Vec<ActionControl> {
        self.inner()
            .slots
            .iter()
            .map(|slot| slot.control.clone())
            .collect()
    }

    fn replace_control(&self, replacement: ActionControl, handler: Arc<ActionHandler>) {
        self.with_slot(replacement.id, |slot| {
            let replacements = slot.replacements + 1;
            *slot = Slot {
                control: replacement,
                handler: Some(handler),
                replacements,
            };
        });
    }

    fn set_status(&self, id: ControlId, status: ControlStatus) {
        self.with_slot(id, |slot| {
            slot.control.icon = status.icon;
            slot.control.title = Some(status.title);
        });
    }

    fn hide_control(&self, id: ControlId) {
        self.with_slot(id, |slot| slot.control.hidden = true);
    }

    fn navigate(&self, url: Url) {
        self.inner().navigations.push(url);
    }
}
