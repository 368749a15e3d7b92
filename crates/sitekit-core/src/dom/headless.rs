//! Arena-backed document used by tests and the headless CLI
//!
//! Layout boxes are supplied by the caller in document coordinates; the document
//! never computes layout itself.

use std::any::Any;
use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use super::selector::{ElementView, Selector};
use super::{Dom, ListenTarget, NodeId, Rect, Viewport};
use crate::event::EventKind;

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Document-relative layout box
    layout: Rect,
}

#[derive(Debug, Clone)]
pub struct HeadlessDom {
    nodes: Vec<Element>,
    root: NodeId,
    body: NodeId,
    viewport: Viewport,
    scroll_y: f64,
    document_height: Option<f64>,
    focused: Option<NodeId>,
    reduced_motion: bool,
    hidden: bool,
    location: String,
    user_agent: String,
    reloads: usize,
    listeners: BTreeMap<(ListenTarget, EventKind), usize>,
    dispatched: Vec<(String, Value)>,
}

impl Default for HeadlessDom {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

impl HeadlessDom {
    pub fn new(width: f64, height: f64) -> Self {
        let root = Element {
            tag: "html".to_string(),
            ..Default::default()
        };
        let body = Element {
            tag: "body".to_string(),
            parent: Some(NodeId(0)),
            layout: Rect::new(0.0, 0.0, width, height),
            ..Default::default()
        };
        let mut nodes = vec![root, body];
        nodes[0].children.push(NodeId(1));

        Self {
            nodes,
            root: NodeId(0),
            body: NodeId(1),
            viewport: Viewport::new(width, height),
            scroll_y: 0.0,
            document_height: None,
            focused: None,
            reduced_motion: false,
            hidden: false,
            location: "https://example.test/".to_string(),
            user_agent: "sitekit-headless".to_string(),
            reloads: 0,
            listeners: BTreeMap::new(),
            dispatched: Vec::new(),
        }
    }

    /// Append a new element under `parent` and return a builder for it
    pub fn element(&mut self, parent: NodeId, tag: &str) -> ElementBuilder<'_> {
        let node = self.create_element(tag);
        self.append_child(parent, node);
        ElementBuilder { dom: self, node }
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
        self.scroll_y = self.scroll_y.min(self.max_scroll());
    }

    pub fn set_layout(&mut self, node: NodeId, rect: Rect) {
        if let Some(el) = self.get_mut(node) {
            el.layout = rect;
        }
    }

    pub fn set_document_height(&mut self, height: Option<f64>) {
        self.document_height = height;
    }

    pub fn set_reduced_motion(&mut self, reduce: bool) {
        self.reduced_motion = reduce;
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = user_agent.into();
    }

    /// Custom events dispatched so far, oldest first
    pub fn dispatched(&self) -> &[(String, Value)] {
        &self.dispatched
    }

    pub fn dispatched_names(&self) -> Vec<&str> {
        self.dispatched.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn listener_count(&self, target: ListenTarget, kind: EventKind) -> usize {
        self.listeners.get(&(target, kind)).copied().unwrap_or(0)
    }

    pub fn reload_count(&self) -> usize {
        self.reloads
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn get(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node.index())
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(node.index())
    }

    fn max_scroll(&self) -> f64 {
        (self.document_height() - self.viewport.height).max(0.0)
    }

    /// Descendants of `root` in document order
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.get(root) {
            Some(el) => el.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(node) = stack.pop() {
            out.push(node);
            if let Some(el) = self.get(node) {
                stack.extend(el.children.iter().rev().copied());
            }
        }
        out
    }

    fn select(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("{}", e);
                return Vec::new();
            }
        };
        self.descendants(root)
            .into_iter()
            .filter(|node| parsed.matches(self, *node))
            .collect()
    }

    fn is_fixed(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            let Some(el) = self.get(n) else {
                return false;
            };
            if el.style.get("position").map(String::as_str) == Some("fixed") {
                return true;
            }
            current = el.parent;
        }
        false
    }

    fn deep_clone(&mut self, node: NodeId) -> Option<NodeId> {
        let source = self.get(node)?.clone();
        let copy = NodeId(self.nodes.len() as u32);
        self.nodes.push(Element {
            parent: None,
            children: Vec::new(),
            ..source.clone()
        });
        for child in source.children {
            if let Some(child_copy) = self.deep_clone(child) {
                self.nodes[child_copy.index()].parent = Some(copy);
                self.nodes[copy.index()].children.push(child_copy);
            }
        }
        Some(copy)
    }
}

impl ElementView for HeadlessDom {
    fn tag(&self, node: NodeId) -> Option<&str> {
        self.get(node).map(|el| el.tag.as_str())
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node)?.attrs.get(name).map(String::as_str)
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get(node).is_some_and(|el| el.classes.iter().any(|c| c == class))
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }
}

impl Dom for HeadlessDom {
    fn body(&self) -> NodeId {
        self.body
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.select(self.root, selector)
    }

    fn query_in(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        self.select(root, selector)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|node| ElementView::attr(self, *node, "id") == Some(id))
    }

    fn matches(&self, node: NodeId, selector: &str) -> bool {
        match Selector::parse(selector) {
            Ok(parsed) => parsed.matches(self, node),
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent_of(n);
        }
        false
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.get(node).is_some() && self.contains(self.root, node)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.get(node).map(|el| el.tag.clone())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent_of(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node).map(|el| el.children.clone()).unwrap_or_default()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        ElementView::has_class(self, node, class)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.get_mut(node) {
            if !el.classes.iter().any(|c| c == class) {
                el.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.get_mut(node) {
            el.classes.retain(|c| c != class);
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let el = self.get(node)?;
        if name == "class" {
            return (!el.classes.is_empty()).then(|| el.classes.join(" "));
        }
        el.attrs.get(name).cloned()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(el) = self.get_mut(node) {
            if name == "class" {
                el.classes = value.split_whitespace().map(str::to_string).collect();
            } else {
                el.attrs.insert(name.to_string(), value.to_string());
            }
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.get_mut(node) {
            if name == "class" {
                el.classes.clear();
            } else {
                el.attrs.remove(name);
            }
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.get(node)?.style.get(property).cloned()
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if value.is_empty() {
            self.remove_style(node, property);
            return;
        }
        let is_body = node == self.body;
        if let Some(el) = self.get_mut(node) {
            el.style.insert(property.to_string(), value.to_string());
        }
        // A fixed body cannot scroll; browsers report scrollY = 0
        if is_body && property == "position" && value == "fixed" {
            self.scroll_y = 0.0;
        }
    }

    fn remove_style(&mut self, node: NodeId, property: &str) {
        if let Some(el) = self.get_mut(node) {
            el.style.remove(property);
        }
    }

    fn text(&self, node: NodeId) -> String {
        self.get(node).map(|el| el.text.clone()).unwrap_or_default()
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(el) = self.get_mut(node) {
            el.text = text.to_string();
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        let node = NodeId(self.nodes.len() as u32);
        self.nodes.push(Element {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        });
        node
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.get(parent).is_none() || self.get(child).is_none() || self.contains(child, parent) {
            return;
        }
        self.remove(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    fn remove(&mut self, node: NodeId) {
        if node == self.root || node == self.body {
            return;
        }
        let Some(parent) = self.get(node).and_then(|el| el.parent) else {
            return;
        };
        self.nodes[parent.index()].children.retain(|c| *c != node);
        self.nodes[node.index()].parent = None;
        if self.focused.is_some_and(|f| self.contains(node, f)) {
            self.focused = None;
        }
    }

    fn clone_node(&mut self, node: NodeId) -> Option<NodeId> {
        self.deep_clone(node)
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        let Some(el) = self.get(node) else {
            return Rect::default();
        };
        if self.is_fixed(node) {
            el.layout
        } else {
            el.layout.translate_y(-self.scroll_y)
        }
    }

    fn offset_top(&self, node: NodeId) -> f64 {
        self.get(node).map(|el| el.layout.y).unwrap_or(0.0)
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        self.get(node).map(|el| el.layout.height).unwrap_or(0.0)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn scroll_to(&mut self, y: f64) {
        self.scroll_y = y.clamp(0.0, self.max_scroll());
    }

    fn document_height(&self) -> f64 {
        if let Some(height) = self.document_height {
            return height;
        }
        self.descendants(self.root)
            .iter()
            .filter_map(|node| self.get(*node))
            .map(|el| el.layout.bottom())
            .fold(self.viewport.height, f64::max)
    }

    fn focus(&mut self, node: NodeId) {
        if self.is_connected(node) {
            self.focused = Some(node);
        }
    }

    fn active_element(&self) -> Option<NodeId> {
        self.focused
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn location(&self) -> String {
        self.location.clone()
    }

    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn reload(&mut self) {
        self.reloads += 1;
    }

    fn listen(&mut self, target: ListenTarget, kind: EventKind) {
        *self.listeners.entry((target, kind)).or_insert(0) += 1;
    }

    fn unlisten(&mut self, target: ListenTarget, kind: EventKind) {
        if let Some(count) = self.listeners.get_mut(&(target, kind)) {
            *count -= 1;
            if *count == 0 {
                self.listeners.remove(&(target, kind));
            }
        }
    }

    fn dispatch_custom_event(&mut self, name: &str, detail: &Value) {
        self.dispatched.push((name.to_string(), detail.clone()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Fluent setup for a freshly appended element
pub struct ElementBuilder<'a> {
    dom: &'a mut HeadlessDom,
    node: NodeId,
}

impl ElementBuilder<'_> {
    pub fn id(self, id: &str) -> Self {
        self.dom.set_attribute(self.node, "id", id);
        self
    }

    /// Space-separated class list
    pub fn class(self, classes: &str) -> Self {
        for class in classes.split_whitespace() {
            self.dom.add_class(self.node, class);
        }
        self
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.dom.set_attribute(self.node, name, value);
        self
    }

    pub fn style(self, property: &str, value: &str) -> Self {
        self.dom.set_style(self.node, property, value);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.dom.set_text(self.node, text);
        self
    }

    /// Document-relative layout box
    pub fn rect(self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.dom.set_layout(self.node, Rect::new(x, y, width, height));
        self
    }

    pub fn finish(self) -> NodeId {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (HeadlessDom, NodeId, NodeId) {
        let mut dom = HeadlessDom::new(1280.0, 800.0);
        let body = dom.body();
        let nav = dom.element(body, "nav").id("mainNav").finish();
        let link = dom
            .element(nav, "a")
            .attr("href", "#about")
            .class("nav-link")
            .finish();
        dom.element(body, "section")
            .id("about")
            .rect(0.0, 1200.0, 1280.0, 900.0)
            .finish();
        (dom, nav, link)
    }

    #[test]
    fn test_queries_follow_document_order() {
        let (dom, nav, link) = page();
        assert_eq!(dom.query("#mainNav"), Some(nav));
        assert_eq!(dom.query_all("nav a[href^=\"#\"]"), vec![link]);
        assert_eq!(dom.query_in(nav, "a"), vec![link]);
        assert!(dom.query_in(link, "a").is_empty());
        assert!(dom.element_by_id("about").is_some());
        assert!(dom.query("nav >").is_none());
    }

    #[test]
    fn test_removed_nodes_are_detached_and_inert() {
        let (mut dom, nav, link) = page();
        dom.focus(link);
        dom.remove(nav);
        assert!(!dom.is_connected(link));
        assert_eq!(dom.active_element(), None);
        assert!(dom.query("a").is_none());

        // Mutating a detached node is allowed; it simply stays detached
        dom.add_class(link, "active");
        assert!(Dom::has_class(&dom, link, "active"));
        dom.remove(link);
        dom.set_style(NodeId(999), "opacity", "1");
    }

    #[test]
    fn test_scroll_is_clamped_to_document() {
        let (mut dom, _, _) = page();
        assert_eq!(dom.document_height(), 2100.0);
        dom.scroll_to(5000.0);
        assert_eq!(dom.scroll_y(), 1300.0);
        dom.scroll_to(-10.0);
        assert_eq!(dom.scroll_y(), 0.0);
    }

    #[test]
    fn test_bounding_rect_tracks_scroll_except_fixed() {
        let (mut dom, nav, _) = page();
        let about = dom.element_by_id("about").unwrap();
        dom.set_layout(nav, Rect::new(0.0, 0.0, 1280.0, 70.0));
        dom.set_style(nav, "position", "fixed");
        dom.scroll_to(400.0);
        assert_eq!(dom.bounding_rect(about).top(), 800.0);
        assert_eq!(dom.bounding_rect(nav).top(), 0.0);
    }

    #[test]
    fn test_fixed_body_resets_scroll() {
        let (mut dom, _, _) = page();
        dom.scroll_to(300.0);
        let body = dom.body();
        dom.set_style(body, "position", "fixed");
        assert_eq!(dom.scroll_y(), 0.0);
    }

    #[test]
    fn test_clone_is_deep_and_detached() {
        let (mut dom, nav, _) = page();
        let copy = dom.clone_node(nav).unwrap();
        assert!(!dom.is_connected(copy));
        assert_eq!(dom.children(copy).len(), 1);
        assert_eq!(dom.attribute(copy, "id").as_deref(), Some("mainNav"));
    }

    #[test]
    fn test_class_attribute_view() {
        let (mut dom, _, link) = page();
        assert_eq!(dom.attribute(link, "class").as_deref(), Some("nav-link"));
        dom.set_attribute(link, "class", "a b");
        assert!(Dom::has_class(&dom, link, "b"));
        assert!(!Dom::has_class(&dom, link, "nav-link"));
    }

    #[test]
    fn test_listener_bookkeeping() {
        let mut dom = HeadlessDom::default();
        dom.listen(ListenTarget::Window, EventKind::Resize);
        dom.listen(ListenTarget::Window, EventKind::Resize);
        dom.unlisten(ListenTarget::Window, EventKind::Resize);
        assert_eq!(dom.listener_count(ListenTarget::Window, EventKind::Resize), 1);
        dom.unlisten(ListenTarget::Window, EventKind::Resize);
        dom.unlisten(ListenTarget::Window, EventKind::Resize);
        assert_eq!(dom.listener_count(ListenTarget::Window, EventKind::Resize), 0);
    }
}
