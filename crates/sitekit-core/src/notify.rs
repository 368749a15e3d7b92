//! Document-level notifications (`CustomEvent`s) and their in-process bus

use serde::Serialize;
use serde_json::Value;

pub const MOBILE_MENU_OPENED: &str = "mobileMenuOpened";
pub const MOBILE_MENU_CLOSED: &str = "mobileMenuClosed";
pub const GET_STARTED_CLICKED: &str = "getStartedClicked";
pub const APP_LOADED: &str = "appLoaded";
pub const APP_ERROR: &str = "appError";

/// Bounded history length
const MAX_HISTORY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub name: String,
    /// Informal key/value payload
    pub detail: Value,
    pub at_ms: f64,
}

type Listener = Box<dyn FnMut(&Notification)>;

/// Publish/subscribe for notifications inside the runtime
#[derive(Default)]
pub struct NotificationBus {
    history: Vec<Notification>,
    listeners: Vec<(u64, Option<String>, Listener)>,
    next_id: u64,
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("history", &self.history.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, name: &str, detail: Value, at_ms: f64) -> &Notification {
        let notification = Notification {
            name: name.to_string(),
            detail,
            at_ms,
        };
        for (_, filter, listener) in self.listeners.iter_mut() {
            if filter.as_deref().map_or(true, |f| f == name) {
                listener(&notification);
            }
        }
        if self.history.len() >= MAX_HISTORY {
            self.history.remove(0);
        }
        self.history.push(notification);
        &self.history[self.history.len() - 1]
    }

    /// Listen to one notification name, or every name with `None`
    pub fn subscribe(
        &mut self,
        name: Option<&str>,
        listener: impl FnMut(&Notification) + 'static,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners
            .push((id, name.map(str::to_string), Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: u64) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn history(&self) -> &[Notification] {
        &self.history
    }

    pub fn count(&self, name: &str) -> usize {
        self.history.iter().filter(|n| n.name == name).count()
    }

    pub fn last(&self, name: &str) -> Option<&Notification> {
        self.history.iter().rev().find(|n| n.name == name)
    }
}
