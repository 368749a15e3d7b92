//! Host-neutral document access
//!
//! Every module in the interactivity layer talks to the page through the [`Dom`]
//! trait. Elements are addressed by compact [`NodeId`] handles owned by the host:
//! the headless arena document in this crate, or the browser registry in
//! `sitekit-web`.
//!
//! Mutating a node the host does not know about (or one that was removed from the
//! document) is a silent no-op, never a panic. Timers that outlive their element
//! rely on this.

mod fixture;
mod headless;
pub mod selector;

pub use fixture::{ElementFixture, PageFixture, ViewportFixture};
pub use headless::{ElementBuilder, HeadlessDom};
pub use selector::Selector;

use std::any::Any;

use crate::event::EventKind;

/// Node identifier - index into the host's element registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Axis-aligned box in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn translate_y(&self, dy: f64) -> Self {
        Self { y: self.y + dy, ..*self }
    }

    /// Overlap with another box, `None` when they do not touch
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Window inner size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn orientation(&self) -> Orientation {
        if self.height > self.width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

/// Where a listener is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenTarget {
    Window,
    Document,
    Node(NodeId),
}

/// The page surface used by the interactivity layer
pub trait Dom {
    fn body(&self) -> NodeId;

    /// First element in document order matching `selector`
    fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    /// Descendants of `root` (excluding `root`) matching `selector`
    fn query_in(&self, root: NodeId, selector: &str) -> Vec<NodeId>;

    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    fn matches(&self, node: NodeId, selector: &str) -> bool;

    /// Inclusive: a node contains itself
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    fn is_connected(&self, node: NodeId) -> bool;

    /// Lowercase tag name
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn add_class(&mut self, node: NodeId, class: &str);
    fn remove_class(&mut self, node: NodeId, class: &str);

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&mut self, node: NodeId, name: &str);

    /// Inline style property
    fn style(&self, node: NodeId, property: &str) -> Option<String>;
    fn set_style(&mut self, node: NodeId, property: &str, value: &str);
    fn remove_style(&mut self, node: NodeId, property: &str);

    fn text(&self, node: NodeId) -> String;
    fn set_text(&mut self, node: NodeId, text: &str);

    /// New detached element
    fn create_element(&mut self, tag: &str) -> NodeId;
    fn append_child(&mut self, parent: NodeId, child: NodeId);
    /// Detach `node` from the document
    fn remove(&mut self, node: NodeId);
    /// Deep, detached copy
    fn clone_node(&mut self, node: NodeId) -> Option<NodeId>;

    /// Viewport-relative box (`getBoundingClientRect`)
    fn bounding_rect(&self, node: NodeId) -> Rect;
    /// Document-relative top edge
    fn offset_top(&self, node: NodeId) -> f64;
    fn offset_height(&self, node: NodeId) -> f64;

    fn viewport(&self) -> Viewport;
    fn scroll_y(&self) -> f64;
    fn scroll_to(&mut self, y: f64);
    fn document_height(&self) -> f64;

    fn focus(&mut self, node: NodeId);
    fn active_element(&self) -> Option<NodeId>;

    /// `(prefers-reduced-motion: reduce)`
    fn prefers_reduced_motion(&self) -> bool;
    /// `document.hidden`
    fn is_hidden(&self) -> bool;
    fn location(&self) -> String;
    fn user_agent(&self) -> String;
    fn reload(&mut self);

    fn listen(&mut self, target: ListenTarget, kind: EventKind);
    fn unlisten(&mut self, target: ListenTarget, kind: EventKind);

    /// Fire a `CustomEvent` on the document
    fn dispatch_custom_event(&mut self, name: &str, detail: &serde_json::Value);

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 100.0, 100.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(50.0, 50.0, 50.0, 50.0)));

        let far = Rect::new(300.0, 300.0, 10.0, 10.0);
        assert_eq!(a.intersection(&far), None);
    }

    #[test]
    fn test_viewport_orientation() {
        assert_eq!(Viewport::new(400.0, 800.0).orientation(), Orientation::Portrait);
        assert_eq!(Viewport::new(1280.0, 800.0).orientation(), Orientation::Landscape);
    }
}
