//! Self-initialising interaction bundles for the hero's CTA button and laptop mockup
//!
//! Both controllers share one [`Enhancer`] core; an [`EnhancerProfile`] carries
//! everything that differs between them.

pub mod button;
pub mod laptop;
mod preview;

use serde_json::json;
use sitekit_core::config::EnhancerConfig;
use sitekit_core::notify::GET_STARTED_CLICKED;
use sitekit_core::{Dom, EventKind, ListenTarget, NodeId, TimerId, UiEvent};
use tracing::{debug, info, warn};

use crate::helpers::{emit, is_in_viewport, px, Debounce};
use crate::page::{Page, Task};

pub use preview::Preview;

/// How long after a touch or keyboard activation the browser's follow-up click is ignored
const FOLLOW_UP_CLICK_MS: f64 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnhancerKind {
    Button,
    Laptop,
}

impl EnhancerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnhancerKind::Button => "button",
            EnhancerKind::Laptop => "laptop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancerTask {
    /// Start the ripple transition on the next turn, after the span is laid out
    ExpandRipple(NodeId),
    RemoveRipple(NodeId),
    Pulse,
    EndPulse,
    ApplySizing,
}

/// How an activation reached the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Click,
    Keyboard,
    Touch,
}

impl Activation {
    fn as_str(&self) -> &'static str {
        match self {
            Activation::Click => "click",
            Activation::Keyboard => "keyboard",
            Activation::Touch => "touch",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnhancerProfile {
    pub kind: EnhancerKind,
    /// Root element selector
    pub target: &'static str,
    /// Element inside the root that receives hover/tilt transforms
    pub surface: Option<&'static str>,
    pub rest_transform: &'static str,
    pub hover_transform: &'static str,
    pub press_transform: &'static str,
    pub tilt_max_deg: f64,
    pub ripple_ms: f64,
    pub ripple_color: &'static str,
    pub pulse_class: &'static str,
    pub pulse_ms: f64,
    /// Emit `getStartedClicked` on activation
    pub emits_activation: bool,
    /// Responsive max-width tiers and the double-click preview
    pub responsive: bool,
}

#[derive(Debug)]
pub struct Enhancer {
    profile: EnhancerProfile,
    config: EnhancerConfig,
    target: Option<NodeId>,
    surface: Option<NodeId>,
    hovered: bool,
    pulse_timer: Option<TimerId>,
    /// Deadline for swallowing the click a browser sends after `touchend` or Enter
    follow_up_click: Option<f64>,
    sizing: Debounce,
    preview: Preview,
    initialized: bool,
}

impl Enhancer {
    pub fn new(profile: EnhancerProfile, config: &EnhancerConfig) -> Self {
        Self {
            profile,
            config: config.clone(),
            target: None,
            surface: None,
            hovered: false,
            pulse_timer: None,
            follow_up_click: None,
            sizing: Debounce::new(config.resize_debounce_ms as f64),
            preview: Preview::default(),
            initialized: false,
        }
    }

    pub fn kind(&self) -> EnhancerKind {
        self.profile.kind
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    /// Locate the target and wire everything; a missing target leaves the controller inert
    pub fn init(&mut self, page: &mut Page) -> bool {
        if self.initialized {
            return true;
        }
        let name = self.profile.kind.as_str();
        let Some(target) = page.dom.query(self.profile.target) else {
            warn!(enhancer = name, selector = self.profile.target, "Enhancer target not found");
            return false;
        };
        let surface = self
            .profile
            .surface
            .and_then(|s| page.dom.query_in(target, s).into_iter().next())
            .unwrap_or(target);
        self.target = Some(target);
        self.surface = Some(surface);

        let dom = page.dom.as_mut();
        dom.set_style(target, "position", "relative");
        dom.set_style(target, "overflow", "hidden");
        dom.set_style(surface, "transition", "transform 0.3s ease");
        for kind in [
            EventKind::PointerEnter,
            EventKind::PointerLeave,
            EventKind::PointerMove,
            EventKind::Click,
            EventKind::TouchStart,
            EventKind::TouchEnd,
        ] {
            dom.listen(ListenTarget::Node(target), kind);
        }
        dom.listen(ListenTarget::Document, EventKind::KeyDown);

        if self.profile.responsive {
            dom.listen(ListenTarget::Node(surface), EventKind::DoubleClick);
            dom.listen(ListenTarget::Window, EventKind::Resize);
            laptop::apply_sizing(dom);
        }

        let interval = self.config.pulse_interval_ms as f64;
        self.pulse_timer = Some(
            page.timers
                .set_interval(interval, Task::Enhancer(self.profile.kind, EnhancerTask::Pulse)),
        );
        self.initialized = true;
        info!(enhancer = name, "Enhancer initialized");
        true
    }

    fn inside(&self, dom: &dyn Dom, node: NodeId) -> bool {
        self.target.is_some_and(|t| dom.contains(t, node))
    }

    pub fn handle(&mut self, page: &mut Page, event: &UiEvent) {
        if !self.initialized {
            return;
        }
        if self.preview.handle(page, event) {
            return;
        }
        let (Some(target), Some(surface)) = (self.target, self.surface) else {
            return;
        };
        let dom = page.dom.as_ref();
        match event {
            UiEvent::PointerEnter { target: node } if self.inside(dom, *node) => {
                if !self.hovered {
                    self.hovered = true;
                    page.dom.set_style(surface, "transform", self.profile.hover_transform);
                }
            }
            UiEvent::PointerLeave { target: node, related } if self.inside(dom, *node) => {
                if related.is_some_and(|r| self.inside(dom, r)) {
                    return;
                }
                self.hovered = false;
                page.dom.set_style(surface, "transform", self.profile.rest_transform);
            }
            UiEvent::PointerMove { target: node, x, y } if self.inside(dom, *node) => {
                self.tilt(page, surface, *x, *y);
            }
            UiEvent::Click { target: node, x, y } if self.inside(dom, *node) => {
                let now = page.now();
                if self.follow_up_click.take().is_some_and(|until| now <= until) {
                    debug!(enhancer = self.profile.kind.as_str(), "Follow-up click ignored");
                    return;
                }
                self.ripple(page, *x, *y);
                self.activated(page, Activation::Click);
            }
            UiEvent::DoubleClick { target: node, .. }
                if self.profile.responsive && dom.contains(surface, *node) =>
            {
                self.preview.open(page, surface);
            }
            UiEvent::TouchStart { target: node, .. } if self.inside(dom, *node) => {
                page.dom.set_style(surface, "transform", self.profile.press_transform);
            }
            UiEvent::TouchEnd { target: node, x, y } if self.inside(dom, *node) => {
                page.dom.set_style(surface, "transform", self.profile.rest_transform);
                self.ripple(page, *x, *y);
                self.activated(page, Activation::Touch);
                self.follow_up_click = Some(page.now() + FOLLOW_UP_CLICK_MS);
            }
            UiEvent::KeyDown { key, target: Some(node) }
                if key.is_activation() && self.inside(dom, *node) =>
            {
                let (cx, cy) = dom.bounding_rect(target).center();
                self.ripple(page, cx, cy);
                self.activated(page, Activation::Keyboard);
                self.follow_up_click = Some(page.now() + FOLLOW_UP_CLICK_MS);
            }
            UiEvent::Resize if self.profile.responsive => {
                let task = Task::Enhancer(self.profile.kind, EnhancerTask::ApplySizing);
                self.sizing.call(&mut page.timers, task);
            }
            _ => {}
        }
    }

    /// 3D tilt toward the pointer; flat below the tilt width
    fn tilt(&self, page: &mut Page, surface: NodeId, x: f64, y: f64) {
        if page.dom.viewport().width < self.config.tilt_min_width {
            return;
        }
        let rect = page.dom.bounding_rect(surface);
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let (cx, cy) = rect.center();
        let max = self.profile.tilt_max_deg;
        let rotate_x = ((cy - y) / (rect.height / 2.0)).clamp(-1.0, 1.0) * max;
        let rotate_y = ((x - cx) / (rect.width / 2.0)).clamp(-1.0, 1.0) * max;
        let transform = format!(
            "perspective(1000px) rotateX({:.2}deg) rotateY({:.2}deg) {}",
            rotate_x, rotate_y, self.profile.hover_transform
        );
        page.dom.set_style(surface, "transform", &transform);
    }

    /// Expanding radial-gradient circle at a viewport point
    fn ripple(&self, page: &mut Page, x: f64, y: f64) {
        let Some(target) = self.target else {
            return;
        };
        let rect = page.dom.bounding_rect(target);
        let size = rect.width.max(rect.height);
        let duration = self.profile.ripple_ms;

        let dom = page.dom.as_mut();
        let ripple = dom.create_element("span");
        dom.add_class(ripple, "ripple");
        for (property, value) in [
            ("position", "absolute".to_string()),
            ("border-radius", "50%".to_string()),
            ("pointer-events", "none".to_string()),
            ("width", px(size)),
            ("height", px(size)),
            ("left", px(x - rect.x - size / 2.0)),
            ("top", px(y - rect.y - size / 2.0)),
            (
                "background",
                format!("radial-gradient(circle, {} 0%, transparent 70%)", self.profile.ripple_color),
            ),
            ("transform", "scale(0)".to_string()),
            ("opacity", "1".to_string()),
            (
                "transition",
                format!("transform {d}ms ease-out, opacity {d}ms ease-out", d = duration as i64),
            ),
        ] {
            dom.set_style(ripple, property, &value);
        }
        dom.append_child(target, ripple);

        let kind = self.profile.kind;
        page.timers
            .set_timeout(0.0, Task::Enhancer(kind, EnhancerTask::ExpandRipple(ripple)));
        page.timers
            .set_timeout(duration, Task::Enhancer(kind, EnhancerTask::RemoveRipple(ripple)));
    }

    fn activated(&self, page: &mut Page, how: Activation) {
        debug!(enhancer = self.profile.kind.as_str(), source = how.as_str(), "Activated");
        if self.profile.emits_activation {
            let timestamp = page.now();
            emit(
                page,
                GET_STARTED_CLICKED,
                json!({ "source": how.as_str(), "timestamp": timestamp }),
            );
        }
    }

    pub fn on_timer(&mut self, page: &mut Page, id: TimerId, task: EnhancerTask) {
        let dom = page.dom.as_mut();
        match task {
            EnhancerTask::ExpandRipple(ripple) => {
                // Timers outlive their element; skip anything detached
                if dom.is_connected(ripple) {
                    dom.set_style(ripple, "transform", "scale(2)");
                    dom.set_style(ripple, "opacity", "0");
                }
            }
            EnhancerTask::RemoveRipple(ripple) => {
                if dom.is_connected(ripple) {
                    dom.remove(ripple);
                }
            }
            EnhancerTask::Pulse => {
                let Some(target) = self.target else {
                    return;
                };
                if dom.is_hidden() || !is_in_viewport(dom, target) {
                    return;
                }
                dom.add_class(target, self.profile.pulse_class);
                let kind = self.profile.kind;
                page.timers
                    .set_timeout(self.profile.pulse_ms, Task::Enhancer(kind, EnhancerTask::EndPulse));
            }
            EnhancerTask::EndPulse => {
                if let Some(target) = self.target {
                    dom.remove_class(target, self.profile.pulse_class);
                }
            }
            EnhancerTask::ApplySizing => {
                if self.sizing.fire(id) {
                    laptop::apply_sizing(dom);
                }
            }
        }
    }
}
