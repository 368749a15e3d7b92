//! The `Site` runtime: owns the page, routes host events and drives timers/frames

use std::sync::Arc;

use serde::Serialize;
use sitekit_core::{Dom, HeadlessDom, SiteConfig, TimerId, UiEvent};
use tracing::{debug, info};

use crate::app::App;
use crate::enhancers::button::button_enhancer;
use crate::enhancers::laptop::laptop_enhancer;
use crate::enhancers::{Enhancer, EnhancerKind};
use crate::page::{Page, Task};
use crate::viewport::{Breakpoint, ViewportUtils};

/// Headless frame length
pub const FRAME_MS: f64 = 16.0;

/// Summary of the interactive state, for the CLI and assertions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub breakpoint: Breakpoint,
    pub menu_open: bool,
    pub current_section: String,
    pub animated: usize,
    pub scroll_y: f64,
    pub pending_timers: usize,
}

#[derive(Debug)]
pub struct Site {
    page: Page,
    app: App,
    enhancers: Vec<Enhancer>,
    /// Headless documents do not raise scroll events on their own
    synthetic_scroll: bool,
}

impl Site {
    /// Build the page context and start both enhancers, as on script load
    pub fn boot(dom: Box<dyn Dom>, config: Arc<SiteConfig>) -> Self {
        let synthetic_scroll = dom.as_any().is::<HeadlessDom>();
        let mut page = Page::new(dom, config.clone());
        let app = App::new(&config);
        let mut enhancers = vec![
            button_enhancer(&config.enhancers),
            laptop_enhancer(&config.enhancers),
        ];
        for enhancer in enhancers.iter_mut() {
            enhancer.init(&mut page);
        }
        info!(
            enhancers = enhancers.iter().filter(|e| e.is_initialized()).count(),
            "Site booted"
        );
        Self {
            page,
            app,
            enhancers,
            synthetic_scroll,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn enhancer(&self, kind: EnhancerKind) -> Option<&Enhancer> {
        self.enhancers.iter().find(|e| e.kind() == kind)
    }

    pub fn now(&self) -> f64 {
        self.page.now()
    }

    pub fn headless(&self) -> Option<&HeadlessDom> {
        self.page.dom.as_any().downcast_ref::<HeadlessDom>()
    }

    pub fn headless_mut(&mut self) -> Option<&mut HeadlessDom> {
        self.page.dom.as_any_mut().downcast_mut::<HeadlessDom>()
    }

    /// Deliver one host event to the coordinator and, separately, each enhancer
    pub fn handle(&mut self, event: UiEvent) {
        debug!(?event, "Event");
        self.app.handle(&mut self.page, &event);
        for enhancer in self.enhancers.iter_mut() {
            enhancer.handle(&mut self.page, &event);
        }
    }

    /// Fire due timers, then run one animation frame
    pub fn tick(&mut self, now: f64) {
        let scroll_before = self.page.dom.scroll_y();
        while let Some((id, task)) = self.page.timers.pop_due(now) {
            self.dispatch(id, task);
        }
        self.page.timers.advance_to(now);
        self.app.on_frame(&mut self.page);

        if self.synthetic_scroll && self.page.dom.scroll_y() != scroll_before {
            self.handle(UiEvent::Scroll);
        }
    }

    /// Step the clock forward in frames
    pub fn advance(&mut self, ms: f64) {
        let end = self.now() + ms.max(0.0);
        loop {
            let next = (self.now() + FRAME_MS).min(end);
            self.tick(next);
            if next >= end {
                break;
            }
        }
    }

    fn dispatch(&mut self, id: TimerId, task: Task) {
        match task {
            Task::Enhancer(kind, task) => {
                if let Some(enhancer) = self.enhancers.iter_mut().find(|e| e.kind() == kind) {
                    enhancer.on_timer(&mut self.page, id, task);
                }
            }
            task => self.app.on_timer(&mut self.page, id, task),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let dom = self.page.dom.as_ref();
        let navigation = self.app.navigation();
        Snapshot {
            breakpoint: ViewportUtils::current_breakpoint(dom),
            menu_open: navigation.is_open(),
            current_section: navigation.current_section().to_string(),
            animated: self.app.animations().animated().len(),
            scroll_y: dom.scroll_y(),
            pending_timers: self.page.timers.pending(),
        }
    }

    pub fn destroy(&mut self) {
        self.app.destroy(&mut self.page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::landing_page;
    use sitekit_core::notify::{GET_STARTED_CLICKED, MOBILE_MENU_CLOSED, MOBILE_MENU_OPENED};
    use sitekit_core::Key;

    fn boot(dom: HeadlessDom) -> Site {
        let mut site = Site::boot(Box::new(dom), Arc::new(SiteConfig::default()));
        site.handle(UiEvent::DomReady);
        site
    }

    fn click(site: &mut Site, selector: &str) {
        let target = site.page().dom.query(selector).expect(selector);
        site.handle(UiEvent::Click { target, x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_enhancers_start_before_the_coordinator() {
        let site = Site::boot(Box::new(landing_page()), Arc::new(SiteConfig::default()));
        assert!(!site.app().is_ready());
        assert!(site.enhancer(EnhancerKind::Button).unwrap().is_initialized());
        assert!(site.enhancer(EnhancerKind::Laptop).unwrap().is_initialized());
    }

    #[test]
    fn test_wide_viewport_scenario() {
        let mut dom = landing_page();
        dom.set_viewport(1500.0, 900.0);
        let site = boot(dom);
        assert_eq!(site.snapshot().breakpoint, Breakpoint::Xl);
        let image = site.page().dom.query(".laptop-image").unwrap();
        assert_eq!(site.page().dom.style(image, "max-width").as_deref(), Some("800px"));
    }

    #[test]
    fn test_tablet_viewport_scenario() {
        let mut dom = landing_page();
        dom.set_viewport(800.0, 1000.0);
        let site = boot(dom);
        let dom = site.page().dom.as_ref();
        assert!(!ViewportUtils::is_mobile(dom));
        assert!(ViewportUtils::is_tablet(dom));
        assert_eq!(ViewportUtils::current_breakpoint(dom), Breakpoint::Md);
    }

    #[test]
    fn test_menu_scenario() {
        let mut dom = landing_page();
        dom.set_viewport(375.0, 700.0);
        let mut site = boot(dom);
        click(&mut site, "#mobileMenuBtn");
        let button = site.page().dom.query("#mobileMenuBtn").unwrap();
        assert_eq!(site.page().dom.attribute(button, "aria-expanded").as_deref(), Some("true"));
        site.handle(UiEvent::KeyDown { key: Key::Escape, target: None });

        let names = site.headless().unwrap().dispatched_names();
        assert_eq!(names, vec![MOBILE_MENU_OPENED, MOBILE_MENU_CLOSED]);
    }

    #[test]
    fn test_smooth_scroll_drives_section_tracking() {
        let mut site = boot(landing_page());
        let about = site.page().dom.query("#about p").unwrap();
        assert!(!site.page().dom.has_class(about, "animated"));
        click(&mut site, "nav a[href=\"#testimonials\"]");
        site.advance(1000.0);

        let snapshot = site.snapshot();
        assert_eq!(snapshot.scroll_y, 2400.0 - 150.0);
        // 2250 + 100 is still above the testimonials top
        assert_eq!(snapshot.current_section, "services");
        assert!(!snapshot.menu_open);
        // Revealed on the way down
        assert!(site.page().dom.has_class(about, "animated"));
    }

    #[test]
    fn test_missing_target_scenario() {
        let mut site = boot(landing_page());
        click(&mut site, "nav a[href=\"#pricing\"]");
        site.advance(1000.0);
        assert_eq!(site.snapshot().scroll_y, 0.0);
    }

    #[test]
    fn test_reduced_motion_scenario() {
        let mut dom = landing_page();
        dom.set_reduced_motion(true);
        let mut site = boot(dom);
        site.advance(100.0);
        site.headless_mut().unwrap().scroll_to(3000.0);
        site.handle(UiEvent::Scroll);
        site.advance(1000.0);

        let page = site.page();
        for target in site.app().animations().targets() {
            assert_eq!(page.dom.style(*target, "opacity").as_deref(), Some("1"));
            assert_eq!(page.dom.style(*target, "transition"), None);
        }
    }

    #[test]
    fn test_cta_click_reaches_enhancer_and_coordinator() {
        let mut site = boot(landing_page());
        click(&mut site, ".cta-button");
        assert_eq!(site.page().bus.count(GET_STARTED_CLICKED), 1);
        site.advance(700.0);
        assert!(site.page().dom.query(".ripple").is_none());
    }

    #[test]
    fn test_destroy_leaves_only_enhancer_timers() {
        let mut site = boot(landing_page());
        site.advance(50.0);
        site.destroy();
        let pulses = site.page().timers.pending();
        assert_eq!(pulses, 2);
    }
}
