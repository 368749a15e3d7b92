//! Full-viewport preview of the laptop image

use sitekit_core::{EventKind, Key, ListenTarget, NodeId, UiEvent};
use tracing::debug;

use crate::page::Page;

#[derive(Debug, Clone, Copy)]
struct Open {
    overlay: NodeId,
    close: NodeId,
    return_focus: NodeId,
}

#[derive(Debug, Default)]
pub struct Preview {
    open: Option<Open>,
    /// Body `overflow` before the overlay took it over
    saved_overflow: Option<String>,
}

impl Preview {
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn overlay(&self) -> Option<NodeId> {
        self.open.map(|o| o.overlay)
    }

    /// Show a clone of `image` over the page; a second open is a no-op
    pub fn open(&mut self, page: &mut Page, image: NodeId) -> bool {
        if self.is_open() {
            return false;
        }
        let dom = page.dom.as_mut();
        let Some(clone) = dom.clone_node(image) else {
            return false;
        };
        dom.remove_attribute(clone, "id");
        dom.set_attribute(clone, "class", "laptop-preview-image");
        dom.remove_style(clone, "transform");
        dom.remove_style(clone, "max-width");
        dom.set_style(clone, "max-width", "90vw");
        dom.set_style(clone, "max-height", "90vh");

        let overlay = dom.create_element("div");
        dom.add_class(overlay, "laptop-preview-overlay");
        for (property, value) in [
            ("position", "fixed"),
            ("inset", "0"),
            ("display", "flex"),
            ("align-items", "center"),
            ("justify-content", "center"),
            ("background", "rgba(0, 0, 0, 0.9)"),
            ("backdrop-filter", "blur(10px)"),
            ("z-index", "10000"),
        ] {
            dom.set_style(overlay, property, value);
        }

        let close = dom.create_element("button");
        dom.add_class(close, "laptop-preview-close");
        dom.set_attribute(close, "aria-label", "Close preview");
        dom.set_text(close, "×");

        dom.append_child(overlay, clone);
        dom.append_child(overlay, close);
        let body = dom.body();
        dom.append_child(body, overlay);

        self.saved_overflow = dom.style(body, "overflow");
        dom.set_style(body, "overflow", "hidden");
        dom.listen(ListenTarget::Node(overlay), EventKind::Click);
        dom.focus(close);

        self.open = Some(Open {
            overlay,
            close,
            return_focus: image,
        });
        debug!("Laptop preview opened");
        true
    }

    pub fn close(&mut self, page: &mut Page) -> bool {
        let Some(open) = self.open.take() else {
            return false;
        };
        let dom = page.dom.as_mut();
        dom.unlisten(ListenTarget::Node(open.overlay), EventKind::Click);
        dom.remove(open.overlay);
        let body = dom.body();
        match self.saved_overflow.take() {
            Some(value) => dom.set_style(body, "overflow", &value),
            None => dom.remove_style(body, "overflow"),
        }
        dom.focus(open.return_focus);
        debug!("Laptop preview closed");
        true
    }

    /// Returns true when the event belonged to the overlay
    pub fn handle(&mut self, page: &mut Page, event: &UiEvent) -> bool {
        let Some(open) = self.open else {
            return false;
        };
        match event {
            UiEvent::Click { target, .. } => {
                let dom = page.dom.as_ref();
                if !dom.contains(open.overlay, *target) {
                    return false;
                }
                // The image itself keeps the preview open
                if *target == open.overlay || dom.contains(open.close, *target) {
                    self.close(page);
                }
                true
            }
            UiEvent::KeyDown { key: Key::Escape, .. } => {
                self.close(page);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::enhancers::laptop::{laptop_enhancer, IMAGE_SELECTOR};
    use crate::testing::{landing_page, page_with};
    use sitekit_core::config::EnhancerConfig;
    use sitekit_core::{Dom, Key, UiEvent};

    fn click(target: sitekit_core::NodeId) -> UiEvent {
        UiEvent::Click { target, x: 10.0, y: 10.0 }
    }

    #[test]
    fn test_double_click_opens_one_preview() {
        let mut dom = landing_page();
        let body = dom.body();
        dom.set_style(body, "overflow", "auto");
        let mut page = page_with(dom);
        let mut laptop = laptop_enhancer(&EnhancerConfig::default());
        laptop.init(&mut page);
        let image = page.dom.query(IMAGE_SELECTOR).unwrap();

        let dblclick = UiEvent::DoubleClick { target: image, x: 900.0, y: 300.0 };
        laptop.handle(&mut page, &dblclick);
        laptop.handle(&mut page, &dblclick);
        assert_eq!(page.dom.query_all(".laptop-preview-overlay").len(), 1);
        assert!(laptop.preview().is_open());

        let clone = page.dom.query(".laptop-preview-image").expect("clone");
        assert_ne!(clone, image);
        assert!(!page.dom.has_class(clone, "laptop-image"));
        assert_eq!(page.dom.style(body, "overflow").as_deref(), Some("hidden"));
        let close = page.dom.query(".laptop-preview-close").unwrap();
        assert_eq!(page.dom.text(close), "×");

        // Clicking the enlarged image keeps it open
        laptop.handle(&mut page, &click(clone));
        assert!(laptop.preview().is_open());

        laptop.handle(&mut page, &click(close));
        assert!(!laptop.preview().is_open());
        assert!(page.dom.query(".laptop-preview-overlay").is_none());
        assert_eq!(page.dom.style(body, "overflow").as_deref(), Some("auto"));
    }

    #[test]
    fn test_background_click_and_escape_close() {
        let mut page = page_with(landing_page());
        let mut laptop = laptop_enhancer(&EnhancerConfig::default());
        laptop.init(&mut page);
        let image = page.dom.query(IMAGE_SELECTOR).unwrap();
        let body = page.dom.body();
        let dblclick = UiEvent::DoubleClick { target: image, x: 900.0, y: 300.0 };

        laptop.handle(&mut page, &dblclick);
        let overlay = laptop.preview().overlay().unwrap();
        laptop.handle(&mut page, &click(overlay));
        assert!(!laptop.preview().is_open());
        assert_eq!(page.dom.style(body, "overflow"), None);

        laptop.handle(&mut page, &dblclick);
        laptop.handle(&mut page, &UiEvent::KeyDown { key: Key::Escape, target: None });
        assert!(!laptop.preview().is_open());
        assert_eq!(page.dom.active_element(), Some(image));
    }
}
