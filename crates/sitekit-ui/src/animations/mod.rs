//! Scroll-triggered entrance animations and decorative hover/parallax effects
//!
//! Each target is prepared hidden, observed, and revealed once when it first
//! intersects the viewport. Reveals are expressed as a [`Sequence`] so stagger
//! order is explicit and every pending step can be cancelled.

mod sequence;

use std::collections::HashSet;

use sitekit_core::config::AnimationConfig;
use sitekit_core::{Dom, EventKind, IntersectionObserver, ListenTarget, NodeId, TimerId, UiEvent};
use tracing::{debug, info};

use crate::app::Disposable;
use crate::helpers::px;
use crate::page::{Page, Task};

pub use sequence::{Reveal, Sequence};

const ANIMATED_CLASS: &str = "animated";
const SCREEN_SELECTOR: &str = ".screen-content > *";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimTask {
    Reveal(Reveal),
}

/// What kind of element a target is, which picks its entrance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    HeroHeading,
    LaptopFrame,
    CallToAction,
    Generic,
}

impl Role {
    pub fn of(dom: &dyn Dom, node: NodeId) -> Self {
        if dom.matches(node, ".hero h1") {
            Role::HeroHeading
        } else if dom.has_class(node, "laptop-frame") {
            Role::LaptopFrame
        } else if dom.has_class(node, "cta-button") {
            Role::CallToAction
        } else {
            Role::Generic
        }
    }

    /// Offset the element starts from before its reveal
    fn initial_transform(&self) -> &'static str {
        match self {
            Role::HeroHeading => "translateY(30px)",
            Role::LaptopFrame => "translateY(40px) scale(0.95)",
            Role::CallToAction => "translateY(20px) scale(0.95)",
            Role::Generic => "translateY(30px)",
        }
    }
}

/// Elements that already ran their entrance
#[derive(Debug, Clone, Default)]
pub struct AnimatedSet(HashSet<NodeId>);

impl AnimatedSet {
    /// False if `node` was already in the set
    pub fn insert(&mut self, node: NodeId) -> bool {
        self.0.insert(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.0.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Debug)]
pub struct Animations {
    config: AnimationConfig,
    observer: IntersectionObserver,
    animated: AnimatedSet,
    targets: Vec<NodeId>,
    hover_targets: Vec<NodeId>,
    parallax: Option<NodeId>,
    parallax_dirty: bool,
    reduced_motion: bool,
    paused: bool,
    reveal_timers: Vec<TimerId>,
    listening: Vec<(ListenTarget, EventKind)>,
    initialized: bool,
}

impl Animations {
    pub fn new(config: &AnimationConfig) -> Self {
        Self {
            config: config.clone(),
            observer: IntersectionObserver::new(config.threshold, config.root_margin_bottom),
            animated: AnimatedSet::default(),
            targets: Vec::new(),
            hover_targets: Vec::new(),
            parallax: None,
            parallax_dirty: false,
            reduced_motion: false,
            paused: false,
            reveal_timers: Vec::new(),
            listening: Vec::new(),
            initialized: false,
        }
    }

    pub fn init(&mut self, page: &mut Page) -> sitekit_core::Result<()> {
        if self.initialized {
            return Ok(());
        }
        let dom = page.dom.as_ref();
        self.reduced_motion = dom.prefers_reduced_motion();
        self.targets = collect(dom, &self.config.targets);
        self.hover_targets = collect(dom, &self.config.hover_targets);
        self.parallax = dom.query(&self.config.parallax_target);

        self.listen(page, ListenTarget::Window, EventKind::Scroll);
        self.listen(page, ListenTarget::Window, EventKind::Resize);
        self.listen(page, ListenTarget::Window, EventKind::ReducedMotionChange);
        for card in self.hover_targets.clone() {
            self.listen(page, ListenTarget::Node(card), EventKind::PointerEnter);
            self.listen(page, ListenTarget::Node(card), EventKind::PointerLeave);
        }
        self.initialized = true;

        if self.reduced_motion {
            self.show_all(page);
        } else {
            for target in self.targets.clone() {
                self.prepare(page.dom.as_mut(), target);
                self.observer.observe(target);
            }
            self.poll(page);
        }
        info!(
            targets = self.targets.len(),
            reduced_motion = self.reduced_motion,
            "Animations initialized"
        );
        Ok(())
    }

    fn listen(&mut self, page: &mut Page, target: ListenTarget, kind: EventKind) {
        page.dom.listen(target, kind);
        self.listening.push((target, kind));
    }

    pub fn animated(&self) -> &AnimatedSet {
        &self.animated
    }

    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    pub fn is_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn transition(&self, duration_ms: f64) -> String {
        let curve = &self.config.easing_curve;
        format!(
            "opacity {d}ms {c}, transform {d}ms {c}",
            d = duration_ms.round() as i64,
            c = curve
        )
    }

    fn base(&self) -> f64 {
        self.config.base_duration_ms as f64
    }

    fn prepare(&self, dom: &mut dyn Dom, node: NodeId) {
        let role = Role::of(dom, node);
        dom.set_style(node, "opacity", "0");
        dom.set_style(node, "transform", role.initial_transform());
        if role == Role::LaptopFrame {
            for child in dom.query_in(node, SCREEN_SELECTOR) {
                dom.set_style(child, "opacity", "0");
                dom.set_style(child, "transform", "translateY(10px)");
            }
        }
    }

    /// Stagger plan for one target
    pub fn plan(&self, dom: &dyn Dom, node: NodeId) -> Sequence {
        let base = self.base();
        match Role::of(dom, node) {
            Role::LaptopFrame => {
                let frame = base * 1.2;
                Sequence::new()
                    .then(0.0, Reveal { node, duration_ms: frame })
                    .stagger(
                        frame * 0.6,
                        self.config.screen_stagger_ms as f64,
                        dom.query_in(node, SCREEN_SELECTOR),
                        base,
                    )
            }
            Role::CallToAction => Sequence::new().then(
                self.config.cta_delay_ms as f64,
                Reveal { node, duration_ms: base },
            ),
            Role::HeroHeading | Role::Generic => {
                Sequence::new().then(0.0, Reveal { node, duration_ms: base })
            }
        }
    }

    /// Fire-once entrance; false when `node` was already triggered
    pub fn trigger(&mut self, page: &mut Page, node: NodeId) -> bool {
        if !self.animated.insert(node) {
            return false;
        }
        self.observer.unobserve(node);
        if !page.dom.is_connected(node) {
            debug!(?node, "Skipping reveal for detached element");
            return true;
        }
        if self.reduced_motion {
            show_now(page.dom.as_mut(), node);
            for child in page.dom.query_in(node, SCREEN_SELECTOR) {
                show_now(page.dom.as_mut(), child);
            }
            return true;
        }
        let plan = self.plan(page.dom.as_ref(), node);
        let ids = plan.schedule(&mut page.timers, |r| Task::Animation(AnimTask::Reveal(r)));
        self.reveal_timers.extend(ids);
        true
    }

    fn reveal(&self, dom: &mut dyn Dom, reveal: Reveal) {
        dom.set_style(reveal.node, "transition", &self.transition(reveal.duration_ms));
        dom.set_style(reveal.node, "opacity", "1");
        dom.set_style(reveal.node, "transform", "none");
        dom.add_class(reveal.node, ANIMATED_CLASS);
    }

    pub fn on_timer(&mut self, page: &mut Page, id: TimerId, task: AnimTask) {
        self.reveal_timers.retain(|t| *t != id);
        let AnimTask::Reveal(reveal) = task;
        if !page.dom.is_connected(reveal.node) {
            return;
        }
        self.reveal(page.dom.as_mut(), reveal);
    }

    /// Check observed targets against the viewport
    pub fn poll(&mut self, page: &mut Page) {
        if !self.initialized || self.paused || self.reduced_motion {
            return;
        }
        let entries = self.observer.poll(page.dom.as_ref());
        for entry in entries.into_iter().filter(|e| e.is_intersecting) {
            self.trigger(page, entry.target);
        }
    }

    /// Reveal everything at once, without transitions
    fn show_all(&mut self, page: &mut Page) {
        for id in self.reveal_timers.drain(..) {
            page.timers.cancel(id);
        }
        self.observer.disconnect();
        for target in self.targets.clone() {
            self.animated.insert(target);
            show_now(page.dom.as_mut(), target);
            for child in page.dom.query_in(target, SCREEN_SELECTOR) {
                show_now(page.dom.as_mut(), child);
            }
        }
        for card in &self.hover_targets {
            page.dom.remove_style(*card, "transform");
        }
        if let Some(node) = self.parallax {
            page.dom.remove_style(node, "transform");
        }
    }

    pub fn set_reduced_motion(&mut self, page: &mut Page, reduce: bool) {
        if reduce == self.reduced_motion {
            return;
        }
        self.reduced_motion = reduce;
        debug!(reduce, "Reduced motion preference changed");
        if reduce && self.initialized {
            self.show_all(page);
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self, page: &mut Page) {
        self.paused = false;
        self.poll(page);
    }

    pub fn handle(&mut self, page: &mut Page, event: &UiEvent) {
        if !self.initialized {
            return;
        }
        match event {
            UiEvent::Scroll => {
                self.parallax_dirty = true;
                self.poll(page);
            }
            UiEvent::Resize | UiEvent::OrientationChange => self.poll(page),
            UiEvent::ReducedMotionChange { reduce } => self.set_reduced_motion(page, *reduce),
            UiEvent::PointerEnter { target } => {
                if let Some(card) = self.hover_card(page.dom.as_ref(), *target) {
                    page.dom.set_style(card, "transition", "transform 0.3s ease");
                    page.dom.set_style(card, "transform", "translateY(-10px)");
                }
            }
            UiEvent::PointerLeave { target, related } => {
                let dom = page.dom.as_ref();
                if let Some(card) = self.hover_card(dom, *target) {
                    // Moving onto a child of the card is not a leave
                    if related.is_some_and(|r| dom.contains(card, r)) {
                        return;
                    }
                    page.dom.set_style(card, "transform", "translateY(0)");
                }
            }
            _ => {}
        }
    }

    fn hover_card(&self, dom: &dyn Dom, target: NodeId) -> Option<NodeId> {
        if self.reduced_motion {
            return None;
        }
        self.hover_targets
            .iter()
            .copied()
            .find(|card| dom.contains(*card, target))
    }

    /// Apply the hero parallax once per frame after scrolling
    pub fn on_frame(&mut self, page: &mut Page) {
        if !std::mem::take(&mut self.parallax_dirty) || self.reduced_motion {
            return;
        }
        let Some(node) = self.parallax else {
            return;
        };
        let y = page.dom.scroll_y();
        if y < page.dom.viewport().height {
            let offset = px(y * self.config.parallax_factor);
            page.dom.set_style(node, "transform", &format!("translateY({})", offset));
        }
    }
}

impl Disposable for Animations {
    fn dispose(&mut self, page: &mut Page) {
        self.observer.disconnect();
        for id in self.reveal_timers.drain(..) {
            page.timers.cancel(id);
        }
        page.timers.cancel_where(|task| matches!(task, Task::Animation(_)));
        self.animated.clear();
        for (target, kind) in self.listening.drain(..) {
            page.dom.unlisten(target, kind);
        }
        self.initialized = false;
    }
}

fn show_now(dom: &mut dyn Dom, node: NodeId) {
    dom.remove_style(node, "transition");
    dom.set_style(node, "opacity", "1");
    dom.set_style(node, "transform", "none");
    dom.add_class(node, ANIMATED_CLASS);
}

/// Matches for every selector, in document order per selector, without repeats
fn collect(dom: &dyn Dom, selectors: &[String]) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    selectors
        .iter()
        .flat_map(|selector| dom.query_all(selector))
        .filter(|node| seen.insert(*node))
        .collect()
}
