//! Small DOM utilities shared by every module

pub mod rate;

use serde_json::Value;
use sitekit_core::{Dom, NodeId};

use crate::page::Page;

pub use rate::{Debounce, Throttle};

/// Toggle `class` on `node`, or force it on/off; returns whether it is now set
pub fn toggle_class(dom: &mut dyn Dom, node: NodeId, class: &str, force: Option<bool>) -> bool {
    let on = force.unwrap_or_else(|| !dom.has_class(node, class));
    if on {
        dom.add_class(node, class);
    } else {
        dom.remove_class(node, class);
    }
    on
}

/// Whether the element's box lies entirely inside the viewport
pub fn is_in_viewport(dom: &dyn Dom, node: NodeId) -> bool {
    if !dom.is_connected(node) {
        return false;
    }
    let rect = dom.bounding_rect(node);
    let viewport = dom.viewport();
    rect.top() >= 0.0
        && rect.left() >= 0.0
        && rect.bottom() <= viewport.height
        && rect.right() <= viewport.width
}

/// Dispatch a custom notification on the document
pub fn emit(page: &mut Page, name: &str, detail: Value) {
    page.emit(name, detail);
}

/// Format a pixel length for inline styles (`12px`, `12.5px`)
pub fn px(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}px", rounded as i64)
    } else {
        format!("{}px", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitekit_core::HeadlessDom;

    #[test]
    fn test_toggle_class() {
        let mut dom = HeadlessDom::default();
        let body = dom.body();
        let node = dom.element(body, "div").finish();

        assert!(toggle_class(&mut dom, node, "open", None));
        assert!(Dom::has_class(&dom, node, "open"));
        assert!(!toggle_class(&mut dom, node, "open", None));
        assert!(!Dom::has_class(&dom, node, "open"));

        assert!(toggle_class(&mut dom, node, "open", Some(true)));
        assert!(toggle_class(&mut dom, node, "open", Some(true)));
        assert!(!toggle_class(&mut dom, node, "open", Some(false)));
    }

    #[test]
    fn test_is_in_viewport_requires_full_containment() {
        let mut dom = HeadlessDom::new(1000.0, 800.0);
        let body = dom.body();
        let inside = dom.element(body, "div").rect(10.0, 10.0, 100.0, 100.0).finish();
        let partial = dom.element(body, "div").rect(10.0, 750.0, 100.0, 100.0).finish();
        let below = dom.element(body, "div").rect(10.0, 1200.0, 100.0, 100.0).finish();

        assert!(is_in_viewport(&dom, inside));
        assert!(!is_in_viewport(&dom, partial));
        assert!(!is_in_viewport(&dom, below));

        dom.scroll_to(1000.0);
        assert!(is_in_viewport(&dom, below));
        assert!(!is_in_viewport(&dom, inside));

        dom.remove(below);
        assert!(!is_in_viewport(&dom, below));
    }

    #[test]
    fn test_px_formatting() {
        assert_eq!(px(800.0), "800px");
        assert_eq!(px(-12.5), "-12.5px");
        assert_eq!(px(1.0 / 3.0), "0.33px");
    }
}
