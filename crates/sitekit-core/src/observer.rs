//! Polling intersection observer
//!
//! The host calls [`IntersectionObserver::poll`] after anything that can move
//! elements relative to the viewport (scroll, resize, first paint). Only state
//! changes are reported, plus one initial entry per newly observed target.

use crate::dom::{Dom, NodeId, Rect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub ratio: f64,
    pub is_intersecting: bool,
}

#[derive(Debug, Clone)]
pub struct IntersectionObserver {
    threshold: f64,
    root_margin_bottom: f64,
    /// Last reported state; `None` until the first poll
    targets: Vec<(NodeId, Option<bool>)>,
}

impl IntersectionObserver {
    pub fn new(threshold: f64, root_margin_bottom: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            root_margin_bottom: root_margin_bottom.max(0.0),
            targets: Vec::new(),
        }
    }

    pub fn observe(&mut self, target: NodeId) {
        if !self.is_observing(target) {
            self.targets.push((target, None));
        }
    }

    pub fn unobserve(&mut self, target: NodeId) {
        self.targets.retain(|(t, _)| *t != target);
    }

    pub fn disconnect(&mut self) {
        self.targets.clear();
    }

    pub fn is_observing(&self, target: NodeId) -> bool {
        self.targets.iter().any(|(t, _)| *t == target)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Visible fraction of `target` inside the (margin-trimmed) viewport
    pub fn ratio(&self, dom: &dyn Dom, target: NodeId) -> f64 {
        let viewport = dom.viewport();
        let root = Rect::new(
            0.0,
            0.0,
            viewport.width,
            (viewport.height - self.root_margin_bottom).max(0.0),
        );
        let rect = dom.bounding_rect(target);
        let Some(overlap) = rect.intersection(&root) else {
            return 0.0;
        };
        let area = rect.area();
        if area <= 0.0 {
            // Zero-size boxes count as fully visible when they touch the root
            return 1.0;
        }
        (overlap.area() / area).clamp(0.0, 1.0)
    }

    pub fn poll(&mut self, dom: &dyn Dom) -> Vec<IntersectionEntry> {
        let mut entries = Vec::new();
        let threshold = self.threshold;
        let ratios: Vec<f64> = self
            .targets
            .iter()
            .map(|(target, _)| {
                if dom.is_connected(*target) {
                    self.ratio(dom, *target)
                } else {
                    0.0
                }
            })
            .collect();

        for ((target, last), ratio) in self.targets.iter_mut().zip(ratios) {
            let is_intersecting = ratio > 0.0 && ratio >= threshold;
            if *last != Some(is_intersecting) {
                *last = Some(is_intersecting);
                entries.push(IntersectionEntry {
                    target: *target,
                    ratio,
                    is_intersecting,
                });
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HeadlessDom;

    fn page() -> (HeadlessDom, NodeId, NodeId) {
        let mut dom = HeadlessDom::new(1000.0, 800.0);
        let body = dom.body();
        let hero = dom.element(body, "h1").rect(0.0, 100.0, 1000.0, 100.0).finish();
        let below = dom.element(body, "div").rect(0.0, 1600.0, 1000.0, 400.0).finish();
        (dom, hero, below)
    }

    #[test]
    fn test_initial_poll_reports_every_target() {
        let (dom, hero, below) = page();
        let mut observer = IntersectionObserver::new(0.1, 50.0);
        observer.observe(hero);
        observer.observe(below);
        let entries = observer.poll(&dom);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_intersecting);
        assert!(!entries[1].is_intersecting);
        assert!(observer.poll(&dom).is_empty());
    }

    #[test]
    fn test_reports_changes_after_scroll() {
        let (mut dom, hero, below) = page();
        let mut observer = IntersectionObserver::new(0.1, 50.0);
        observer.observe(below);
        observer.poll(&dom);

        // Top edge at 500px: 250 of 400px fall inside the 750px root
        dom.scroll_to(1100.0);
        let entries = observer.poll(&dom);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, below);
        assert!(entries[0].is_intersecting);
        assert!((entries[0].ratio - 0.625).abs() < 1e-9);
        assert!(observer.ratio(&dom, hero) == 0.0);
    }

    #[test]
    fn test_root_margin_trims_bottom() {
        let mut dom = HeadlessDom::new(1000.0, 800.0);
        let body = dom.body();
        // Only the bottom 40px strip of the viewport overlaps
        let node = dom.element(body, "div").rect(0.0, 760.0, 1000.0, 100.0).finish();
        let mut observer = IntersectionObserver::new(0.1, 50.0);
        observer.observe(node);
        assert!(!observer.poll(&dom)[0].is_intersecting);
    }

    #[test]
    fn test_unobserve_and_detached_targets() {
        let (mut dom, hero, below) = page();
        let mut observer = IntersectionObserver::new(0.1, 0.0);
        observer.observe(hero);
        observer.observe(hero);
        observer.observe(below);
        assert_eq!(observer.len(), 2);
        observer.unobserve(below);
        observer.poll(&dom);

        dom.remove(hero);
        let entries = observer.poll(&dom);
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].is_intersecting);

        observer.disconnect();
        assert!(observer.is_empty());
    }
}
