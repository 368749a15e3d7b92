//! Viewport measurement, breakpoints and scoped listener registration

use serde::Serialize;
use sitekit_core::config::ViewportConfig;
use sitekit_core::dom::Orientation;
use sitekit_core::{Dom, EventKind, ListenTarget, TimerId, UiEvent};
use tracing::{debug, warn};

use crate::app::Disposable;
use crate::helpers::{px, Debounce, Throttle};
use crate::page::{Page, Task};

/// Body attribute holding the scroll offset saved by `lock_scroll`
const SCROLL_LOCK_ATTR: &str = "data-scroll-lock-y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Xs,
    Sm,
    Md,
    Lg,
    Xl,
}

impl Breakpoint {
    /// Half-open tiers: `[1400,∞) xl`, `[1024,1400) lg`, `[768,1024) md`,
    /// `[480,768) sm`, `[0,480) xs`
    pub fn from_width(width: f64) -> Self {
        if width >= 1400.0 {
            Breakpoint::Xl
        } else if width >= 1024.0 {
            Breakpoint::Lg
        } else if width >= 768.0 {
            Breakpoint::Md
        } else if width >= 480.0 {
            Breakpoint::Sm
        } else {
            Breakpoint::Xs
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Breakpoint::Xs => "xs",
            Breakpoint::Sm => "sm",
            Breakpoint::Md => "md",
            Breakpoint::Lg => "lg",
            Breakpoint::Xl => "xl",
        }
    }
}

impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Device classes use inclusive upper bounds, so 768 is both `md` and mobile.
pub fn is_mobile_width(width: f64) -> bool {
    width <= 768.0
}

pub fn is_tablet_width(width: f64) -> bool {
    width > 768.0 && width <= 1024.0
}

pub fn is_desktop_width(width: f64) -> bool {
    width > 1024.0
}

/// `y / (document height - viewport height)`, clamped to [0, 1]
///
/// A page that cannot scroll reports 0.
pub fn scroll_progress(y: f64, document_height: f64, viewport_height: f64) -> f64 {
    let range = document_height - viewport_height;
    if range <= 0.0 || !range.is_finite() {
        return 0.0;
    }
    (y / range).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportInfo {
    pub width: f64,
    pub height: f64,
    pub breakpoint: Breakpoint,
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub is_desktop: bool,
    pub portrait: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollInfo {
    pub y: f64,
    pub progress: f64,
}

/// Handle returned by the `on_*` registrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Subscription(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportTask {
    /// Debounced resize/orientation change settled
    Settled(Subscription),
    /// Throttled scroll trailing call
    ScrollTrailing(Subscription),
}

/// Delivered to the owner of a subscription
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportSignal {
    Changed(Subscription, ViewportInfo),
    Scrolled(Subscription, ScrollInfo),
}

impl ViewportSignal {
    pub fn subscription(&self) -> Subscription {
        match self {
            ViewportSignal::Changed(sub, _) | ViewportSignal::Scrolled(sub, _) => *sub,
        }
    }
}

#[derive(Debug)]
enum Listener {
    Change(Debounce),
    Scroll(Throttle),
}

#[derive(Debug)]
struct Registration {
    id: Subscription,
    listener: Listener,
}

#[derive(Debug)]
pub struct ViewportUtils {
    config: ViewportConfig,
    registrations: Vec<Registration>,
    next_id: u64,
}

impl ViewportUtils {
    pub fn new(config: &ViewportConfig) -> Self {
        Self {
            config: config.clone(),
            registrations: Vec::new(),
            next_id: 1,
        }
    }

    pub fn init(&mut self, page: &mut Page) -> sitekit_core::Result<()> {
        let info = Self::viewport_info(page.dom.as_ref());
        debug!(
            breakpoint = info.breakpoint.as_str(),
            width = info.width,
            "Viewport ready"
        );
        Ok(())
    }

    pub fn current_breakpoint(dom: &dyn Dom) -> Breakpoint {
        Breakpoint::from_width(dom.viewport().width)
    }

    pub fn is_mobile(dom: &dyn Dom) -> bool {
        is_mobile_width(dom.viewport().width)
    }

    pub fn is_tablet(dom: &dyn Dom) -> bool {
        is_tablet_width(dom.viewport().width)
    }

    pub fn is_desktop(dom: &dyn Dom) -> bool {
        is_desktop_width(dom.viewport().width)
    }

    pub fn viewport_info(dom: &dyn Dom) -> ViewportInfo {
        let viewport = dom.viewport();
        ViewportInfo {
            width: viewport.width,
            height: viewport.height,
            breakpoint: Breakpoint::from_width(viewport.width),
            is_mobile: is_mobile_width(viewport.width),
            is_tablet: is_tablet_width(viewport.width),
            is_desktop: is_desktop_width(viewport.width),
            portrait: viewport.orientation() == Orientation::Portrait,
        }
    }

    pub fn scroll_info(dom: &dyn Dom) -> ScrollInfo {
        let y = dom.scroll_y();
        ScrollInfo {
            y,
            progress: scroll_progress(y, dom.document_height(), dom.viewport().height),
        }
    }

    /// Debounced resize + orientation-change registration
    ///
    /// Returns the current viewport as the immediate first invocation.
    pub fn on_viewport_change(
        &mut self,
        page: &mut Page,
        debounce_ms: Option<f64>,
    ) -> (Subscription, ViewportInfo) {
        let wait = debounce_ms.unwrap_or(self.config.resize_debounce_ms as f64);
        let id = self.register(Listener::Change(Debounce::new(wait)));
        page.dom.listen(ListenTarget::Window, EventKind::Resize);
        page.dom.listen(ListenTarget::Window, EventKind::OrientationChange);
        (id, Self::viewport_info(page.dom.as_ref()))
    }

    /// Throttled scroll registration
    pub fn on_scroll(&mut self, page: &mut Page, throttle_ms: Option<f64>) -> Subscription {
        let limit = throttle_ms.unwrap_or(self.config.scroll_throttle_ms as f64);
        let id = self.register(Listener::Scroll(Throttle::new(limit)));
        page.dom.listen(ListenTarget::Window, EventKind::Scroll);
        id
    }

    /// Release a registration: its listeners and any pending timer
    pub fn unsubscribe(&mut self, page: &mut Page, id: Subscription) -> bool {
        let Some(idx) = self.registrations.iter().position(|r| r.id == id) else {
            return false;
        };
        let registration = self.registrations.remove(idx);
        Self::release(page, registration);
        true
    }

    pub fn subscriptions(&self) -> usize {
        self.registrations.len()
    }

    fn register(&mut self, listener: Listener) -> Subscription {
        let id = Subscription(self.next_id);
        self.next_id += 1;
        self.registrations.push(Registration { id, listener });
        id
    }

    fn release(page: &mut Page, registration: Registration) {
        match registration.listener {
            Listener::Change(mut debounce) => {
                debounce.cancel(&mut page.timers);
                page.dom.unlisten(ListenTarget::Window, EventKind::Resize);
                page.dom.unlisten(ListenTarget::Window, EventKind::OrientationChange);
            }
            Listener::Scroll(mut throttle) => {
                throttle.cancel(&mut page.timers);
                page.dom.unlisten(ListenTarget::Window, EventKind::Scroll);
            }
        }
    }

    pub fn handle(&mut self, page: &mut Page, event: &UiEvent) -> Vec<ViewportSignal> {
        let mut signals = Vec::new();
        match event {
            UiEvent::Resize | UiEvent::OrientationChange => {
                for registration in self.registrations.iter_mut() {
                    if let Listener::Change(debounce) = &mut registration.listener {
                        let task = Task::Viewport(ViewportTask::Settled(registration.id));
                        debounce.call(&mut page.timers, task);
                    }
                }
            }
            UiEvent::Scroll => {
                let info = Self::scroll_info(page.dom.as_ref());
                for registration in self.registrations.iter_mut() {
                    if let Listener::Scroll(throttle) = &mut registration.listener {
                        let task = Task::Viewport(ViewportTask::ScrollTrailing(registration.id));
                        if throttle.call(&mut page.timers, task) {
                            signals.push(ViewportSignal::Scrolled(registration.id, info));
                        }
                    }
                }
            }
            _ => {}
        }
        signals
    }

    pub fn on_timer(
        &mut self,
        page: &mut Page,
        id: TimerId,
        task: ViewportTask,
    ) -> Option<ViewportSignal> {
        let (ViewportTask::Settled(sub) | ViewportTask::ScrollTrailing(sub)) = task;
        let now = page.now();
        let registration = self.registrations.iter_mut().find(|r| r.id == sub)?;
        let current = match (&mut registration.listener, task) {
            (Listener::Change(debounce), ViewportTask::Settled(_)) => debounce.fire(id),
            (Listener::Scroll(throttle), ViewportTask::ScrollTrailing(_)) => throttle.fire(id, now),
            _ => false,
        };
        if !current {
            return None;
        }
        let dom = page.dom.as_ref();
        Some(match task {
            ViewportTask::Settled(_) => ViewportSignal::Changed(sub, Self::viewport_info(dom)),
            ViewportTask::ScrollTrailing(_) => ViewportSignal::Scrolled(sub, Self::scroll_info(dom)),
        })
    }

    /// Freeze the page at its current offset; false if already locked
    pub fn lock_scroll(dom: &mut dyn Dom) -> bool {
        let body = dom.body();
        if Self::is_scroll_locked(dom) {
            warn!("Scroll is already locked");
            return false;
        }
        let y = dom.scroll_y();
        dom.set_attribute(body, SCROLL_LOCK_ATTR, &y.to_string());
        dom.set_style(body, "position", "fixed");
        dom.set_style(body, "top", &px(-y));
        dom.set_style(body, "width", "100%");
        dom.set_style(body, "overflow", "hidden");
        debug!(y, "Scroll locked");
        true
    }

    /// Undo `lock_scroll` and restore the saved offset; false if not locked
    pub fn unlock_scroll(dom: &mut dyn Dom) -> bool {
        let body = dom.body();
        let Some(saved) = dom.attribute(body, SCROLL_LOCK_ATTR) else {
            return false;
        };
        let y = saved.parse::<f64>().unwrap_or(0.0);
        dom.remove_attribute(body, SCROLL_LOCK_ATTR);
        for property in ["position", "top", "width", "overflow"] {
            dom.remove_style(body, property);
        }
        dom.scroll_to(y);
        debug!(y, "Scroll unlocked");
        true
    }

    pub fn is_scroll_locked(dom: &dyn Dom) -> bool {
        dom.attribute(dom.body(), SCROLL_LOCK_ATTR).is_some()
    }
}

impl Disposable for ViewportUtils {
    fn dispose(&mut self, page: &mut Page) {
        for registration in std::mem::take(&mut self.registrations) {
            Self::release(page, registration);
        }
        Self::unlock_scroll(page.dom.as_mut());
    }
}
