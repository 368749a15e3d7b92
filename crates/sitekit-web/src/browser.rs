//! `Dom` over the live document via `web-sys`

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use sitekit_core::{Dom, EventKind, Key, ListenTarget, NodeId, Rect, SiteConfig, UiEvent, Viewport};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CustomEvent, CustomEventInit, Document, Element, Event, EventTarget, HtmlElement, KeyboardEvent,
    MediaQueryListEvent, MouseEvent, TouchEvent, Window,
};

use crate::events::{
    cancels_native, dom_event_name, host_target, is_passive, HostTarget, REDUCED_MOTION_QUERY,
};

/// Handle returned when element creation fails; every operation on it is a no-op
const UNATTACHED: NodeId = NodeId(u32::MAX);

/// Browser events captured by listener closures, drained by the host each frame
pub type EventQueue = Rc<RefCell<VecDeque<RawEvent>>>;

/// A browser event before its elements are mapped to [`NodeId`]s
#[derive(Debug)]
pub enum RawEvent {
    Ready,
    Load,
    Window(EventKind),
    Pointer {
        kind: EventKind,
        target: Option<Element>,
        related: Option<Element>,
        x: f64,
        y: f64,
    },
    Key {
        key: String,
        target: Option<Element>,
    },
    Visibility(bool),
    ReducedMotion(bool),
    Error {
        message: String,
        stack: Option<String>,
    },
    Rejection(String),
}

/// A shared browser listener; dropping it detaches it
struct Attached {
    count: usize,
    _listener: EventListener,
}

pub struct BrowserDom {
    window: Window,
    document: Document,
    /// Registry behind `NodeId`; index 0 is `<body>`
    nodes: RefCell<Vec<Element>>,
    queue: EventQueue,
    /// Links the runtime smooth-scrolls; only these lose their native jump
    smooth_links: Rc<str>,
    /// One real listener per kind, shared by every module registration
    listeners: BTreeMap<EventKind, Attached>,
}

impl fmt::Debug for BrowserDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserDom")
            .field("nodes", &self.nodes.borrow().len())
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BrowserDom {
    pub fn new(queue: EventQueue) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let body = document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;
        Ok(Self {
            window,
            document,
            nodes: RefCell::new(vec![body.into()]),
            queue,
            smooth_links: SiteConfig::default().navigation.links.into(),
            listeners: BTreeMap::new(),
        })
    }

    /// Must run before any module registers a click listener
    pub fn set_smooth_links(&mut self, selector: &str) {
        self.smooth_links = selector.into();
    }

    /// Configuration from `<body data-sitekit-config='{...}'>`, or defaults
    pub fn embedded_config(&self) -> SiteConfig {
        let raw = self
            .document
            .body()
            .and_then(|body| body.get_attribute("data-sitekit-config"));
        match raw.map(|json| SiteConfig::from_json_str(&json)) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                warn!(error = %e, "Ignoring invalid embedded configuration");
                SiteConfig::default()
            }
            None => SiteConfig::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Map a raw event onto registry handles
    pub fn resolve(&self, raw: RawEvent) -> Option<UiEvent> {
        let event = match raw {
            RawEvent::Ready => UiEvent::DomReady,
            RawEvent::Load => UiEvent::Load,
            RawEvent::Window(EventKind::Resize) => UiEvent::Resize,
            RawEvent::Window(EventKind::OrientationChange) => UiEvent::OrientationChange,
            RawEvent::Window(EventKind::Scroll) => UiEvent::Scroll,
            RawEvent::Window(_) => return None,
            RawEvent::Pointer {
                kind,
                target,
                related,
                x,
                y,
            } => {
                let target = self.node_for(&target?);
                let related = related.map(|el| self.node_for(&el));
                match kind {
                    EventKind::Click => UiEvent::Click { target, x, y },
                    EventKind::DoubleClick => UiEvent::DoubleClick { target, x, y },
                    EventKind::PointerEnter => UiEvent::PointerEnter { target },
                    EventKind::PointerLeave => UiEvent::PointerLeave { target, related },
                    EventKind::PointerMove => UiEvent::PointerMove { target, x, y },
                    EventKind::TouchStart => UiEvent::TouchStart { target, x, y },
                    EventKind::TouchEnd => UiEvent::TouchEnd { target, x, y },
                    _ => return None,
                }
            }
            RawEvent::Key { key, target } => UiEvent::KeyDown {
                key: Key::from_dom(&key),
                target: target.map(|el| self.node_for(&el)),
            },
            RawEvent::Visibility(hidden) => UiEvent::VisibilityChange { hidden },
            RawEvent::ReducedMotion(reduce) => UiEvent::ReducedMotionChange { reduce },
            RawEvent::Error { message, stack } => UiEvent::ScriptError { message, stack },
            RawEvent::Rejection(reason) => UiEvent::UnhandledRejection { reason },
        };
        Some(event)
    }

    fn node_for(&self, element: &Element) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(index) = nodes.iter().position(|known| known == element) {
            return NodeId(index as u32);
        }
        nodes.push(element.clone());
        NodeId((nodes.len() - 1) as u32)
    }

    fn element(&self, node: NodeId) -> Option<Element> {
        self.nodes.borrow().get(node.index()).cloned()
    }

    fn html(&self, node: NodeId) -> Option<HtmlElement> {
        self.element(node)?.dyn_into::<HtmlElement>().ok()
    }

    fn collect(&self, list: Result<web_sys::NodeList, JsValue>, selector: &str) -> Vec<NodeId> {
        let list = match list {
            Ok(list) => list,
            Err(_) => {
                warn!(selector, "Invalid selector");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|el| self.node_for(&el))
            .collect()
    }

    fn listener_target(&self, kind: EventKind) -> Option<(EventTarget, EventListenerPhase)> {
        match host_target(kind) {
            HostTarget::Window => Some((self.window.clone().into(), EventListenerPhase::Bubble)),
            HostTarget::Document => Some((self.document.clone().into(), EventListenerPhase::Capture)),
            HostTarget::ReducedMotionQuery => self
                .window
                .match_media(REDUCED_MOTION_QUERY)
                .ok()
                .flatten()
                .map(|query| (query.into(), EventListenerPhase::Bubble)),
        }
    }
}

/// Translate a browser event and queue it
fn capture(kind: EventKind, event: &Event) -> Option<RawEvent> {
    let element = |target: Option<EventTarget>| target.and_then(|t| t.dyn_into::<Element>().ok());
    let raw = match kind {
        EventKind::Resize | EventKind::OrientationChange | EventKind::Scroll => RawEvent::Window(kind),
        EventKind::KeyDown => {
            let key = event.dyn_ref::<KeyboardEvent>()?.key();
            RawEvent::Key {
                key,
                target: element(event.target()),
            }
        }
        EventKind::TouchStart | EventKind::TouchEnd => {
            let touch = event.dyn_ref::<TouchEvent>()?.changed_touches().get(0);
            let (x, y) = touch
                .map(|t| (t.client_x() as f64, t.client_y() as f64))
                .unwrap_or_default();
            RawEvent::Pointer {
                kind,
                target: element(event.target()),
                related: None,
                x,
                y,
            }
        }
        EventKind::VisibilityChange => {
            let hidden = web_sys::window()
                .and_then(|w| w.document())
                .map(|d| d.hidden())
                .unwrap_or(false);
            RawEvent::Visibility(hidden)
        }
        EventKind::ReducedMotionChange => {
            RawEvent::ReducedMotion(event.dyn_ref::<MediaQueryListEvent>()?.matches())
        }
        EventKind::Click
        | EventKind::DoubleClick
        | EventKind::PointerEnter
        | EventKind::PointerLeave
        | EventKind::PointerMove => {
            let mouse = event.dyn_ref::<MouseEvent>()?;
            RawEvent::Pointer {
                kind,
                target: element(event.target()),
                related: element(mouse.related_target()),
                x: mouse.client_x() as f64,
                y: mouse.client_y() as f64,
            }
        }
    };
    Some(raw)
}

/// Suppress the native jump for smooth-scrolled links and Space on the CTA
fn prevent_native(kind: EventKind, event: &Event, smooth_links: &str) {
    if !matches!(kind, EventKind::Click | EventKind::KeyDown) {
        return;
    }
    let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
        return;
    };
    let key = event.dyn_ref::<KeyboardEvent>().map(|e| e.key());
    let on_smooth_link = kind == EventKind::Click && matches!(target.closest(smooth_links), Ok(Some(_)));
    let on_cta = target.matches(".cta-button").unwrap_or(false);
    if cancels_native(kind, key.as_deref(), on_smooth_link, on_cta) {
        event.prevent_default();
    }
}

impl Dom for BrowserDom {
    fn body(&self) -> NodeId {
        NodeId(0)
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.collect(self.document.query_selector_all(selector), selector)
    }

    fn query_in(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        match self.element(root) {
            Some(root) => self.collect(root.query_selector_all(selector), selector),
            None => Vec::new(),
        }
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.document
            .get_element_by_id(id)
            .map(|el| self.node_for(&el))
    }

    fn matches(&self, node: NodeId, selector: &str) -> bool {
        self.element(node)
            .is_some_and(|el| el.matches(selector).unwrap_or(false))
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        match (self.element(ancestor), self.element(node)) {
            (Some(ancestor), Some(node)) => ancestor.contains(Some(node.as_ref())),
            _ => false,
        }
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|el| el.is_connected())
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|el| el.tag_name().to_lowercase())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.element(node)?.parent_element()?;
        Some(self.node_for(&parent))
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        let Some(el) = self.element(node) else {
            return Vec::new();
        };
        let children = el.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .map(|child| self.node_for(&child))
            .collect()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|el| el.class_list().contains(class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element(node) {
            let _ = el.class_list().add_1(class);
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element(node) {
            let _ = el.class_list().remove_1(class);
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)?.get_attribute(name)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element(node) {
            let _ = el.set_attribute(name, value);
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.element(node) {
            let _ = el.remove_attribute(name);
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.html(node)?
            .style()
            .get_property_value(property)
            .ok()
            .filter(|value| !value.is_empty())
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(el) = self.html(node) {
            let _ = el.style().set_property(property, value);
        }
    }

    fn remove_style(&mut self, node: NodeId, property: &str) {
        if let Some(el) = self.html(node) {
            let _ = el.style().remove_property(property);
        }
    }

    fn text(&self, node: NodeId) -> String {
        self.element(node)
            .and_then(|el| el.text_content())
            .unwrap_or_default()
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(el) = self.element(node) {
            el.set_text_content(Some(text));
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        match self.document.create_element(tag) {
            Ok(el) => self.node_for(&el),
            Err(_) => {
                warn!(tag, "Failed to create element");
                UNATTACHED
            }
        }
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let (Some(parent), Some(child)) = (self.element(parent), self.element(child)) {
            let _ = parent.append_child(&child);
        }
    }

    fn remove(&mut self, node: NodeId) {
        if let Some(el) = self.element(node) {
            el.remove();
        }
    }

    fn clone_node(&mut self, node: NodeId) -> Option<NodeId> {
        let copy = self.element(node)?.clone_node_with_deep(true).ok()?;
        let copy = copy.dyn_into::<Element>().ok()?;
        Some(self.node_for(&copy))
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        match self.element(node) {
            Some(el) => {
                let rect = el.get_bounding_client_rect();
                Rect::new(rect.x(), rect.y(), rect.width(), rect.height())
            }
            None => Rect::default(),
        }
    }

    fn offset_top(&self, node: NodeId) -> f64 {
        self.html(node).map(|el| el.offset_top() as f64).unwrap_or(0.0)
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        self.html(node)
            .map(|el| el.offset_height() as f64)
            .unwrap_or(0.0)
    }

    fn viewport(&self) -> Viewport {
        let size = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport::new(size(self.window.inner_width()), size(self.window.inner_height()))
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn scroll_to(&mut self, y: f64) {
        self.window.scroll_to_with_x_and_y(0.0, y);
    }

    fn document_height(&self) -> f64 {
        self.document
            .document_element()
            .map(|root| root.scroll_height() as f64)
            .unwrap_or(0.0)
    }

    fn focus(&mut self, node: NodeId) {
        if let Some(el) = self.html(node) {
            let _ = el.focus();
        }
    }

    fn active_element(&self) -> Option<NodeId> {
        let active = self.document.active_element()?;
        Some(self.node_for(&active))
    }

    fn prefers_reduced_motion(&self) -> bool {
        matches!(
            self.window.match_media(REDUCED_MOTION_QUERY),
            Ok(Some(query)) if query.matches()
        )
    }

    fn is_hidden(&self) -> bool {
        self.document.hidden()
    }

    fn location(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn user_agent(&self) -> String {
        self.window.navigator().user_agent().unwrap_or_default()
    }

    fn reload(&mut self) {
        let _ = self.window.location().reload();
    }

    fn listen(&mut self, target: ListenTarget, kind: EventKind) {
        if let Some(attached) = self.listeners.get_mut(&kind) {
            attached.count += 1;
            return;
        }
        let Some((event_target, phase)) = self.listener_target(kind) else {
            warn!(?kind, "No host target for listener");
            return;
        };

        let queue = self.queue.clone();
        let smooth_links = self.smooth_links.clone();
        let listener = EventListener::new_with_options(
            &event_target,
            dom_event_name(kind),
            EventListenerOptions {
                phase,
                passive: is_passive(kind),
            },
            move |event: &Event| {
                prevent_native(kind, event, &smooth_links);
                if let Some(raw) = capture(kind, event) {
                    queue.borrow_mut().push_back(raw);
                }
            },
        );
        debug!(?kind, ?target, "Listener attached");
        self.listeners.insert(
            kind,
            Attached {
                count: 1,
                _listener: listener,
            },
        );
    }

    fn unlisten(&mut self, _target: ListenTarget, kind: EventKind) {
        let Some(attached) = self.listeners.get_mut(&kind) else {
            return;
        };
        attached.count -= 1;
        if attached.count > 0 {
            return;
        }
        if self.listeners.remove(&kind).is_some() {
            debug!(?kind, "Listener detached");
        }
    }

    fn dispatch_custom_event(&mut self, name: &str, detail: &serde_json::Value) {
        let init = CustomEventInit::new();
        let detail = js_sys::JSON::parse(&detail.to_string()).unwrap_or(JsValue::NULL);
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(name, &init) {
            Ok(event) => {
                let _ = self.document.dispatch_event(&event);
            }
            Err(_) => warn!(name, "Failed to create custom event"),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
