//! Shared page context handed to every module
//!
//! Modules never hold on to the document; they receive `&mut Page` for the
//! duration of a handler and return.

use std::sync::Arc;

use serde_json::Value;
use sitekit_core::{Dom, NotificationBus, Scheduler, SiteConfig};

use crate::animations::AnimTask;
use crate::app::AppTask;
use crate::enhancers::{EnhancerKind, EnhancerTask};
use crate::navigation::NavTask;
use crate::viewport::ViewportTask;

/// Deferred work, tagged with the module that owns it
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Viewport(ViewportTask),
    Navigation(NavTask),
    Animation(AnimTask),
    Enhancer(EnhancerKind, EnhancerTask),
    App(AppTask),
}

pub struct Page {
    pub dom: Box<dyn Dom>,
    pub timers: Scheduler<Task>,
    pub bus: NotificationBus,
    pub config: Arc<SiteConfig>,
}

impl Page {
    pub fn new(dom: Box<dyn Dom>, config: Arc<SiteConfig>) -> Self {
        Self {
            dom,
            timers: Scheduler::new(),
            bus: NotificationBus::new(),
            config,
        }
    }

    /// Milliseconds since page start
    #[inline]
    pub fn now(&self) -> f64 {
        self.timers.now()
    }

    /// Fire a document `CustomEvent` and record it on the bus
    pub fn emit(&mut self, name: &str, detail: Value) {
        self.dom.dispatch_custom_event(name, &detail);
        let at = self.now();
        self.bus.publish(name, detail, at);
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("now", &self.now())
            .field("pending_timers", &self.timers.pending())
            .field("bus", &self.bus)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sitekit_core::HeadlessDom;

    #[test]
    fn test_emit_reaches_document_and_bus() {
        let mut page = Page::new(Box::new(HeadlessDom::default()), Arc::new(SiteConfig::default()));
        page.timers.advance_to(42.0);
        page.emit("mobileMenuOpened", json!({ "section": "home" }));

        let last = page.bus.last("mobileMenuOpened").expect("published");
        assert_eq!(last.at_ms, 42.0);
        assert_eq!(last.detail["section"], "home");

        let dom = page.dom.as_any().downcast_ref::<HeadlessDom>().expect("headless");
        assert_eq!(dom.dispatched_names(), vec!["mobileMenuOpened"]);
    }
}
