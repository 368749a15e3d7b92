//! Mobile menu state machine, smooth in-page scrolling and active-link tracking

use serde::Serialize;
use serde_json::json;
use sitekit_core::config::NavigationConfig;
use sitekit_core::dom::Selector;
use sitekit_core::notify::{MOBILE_MENU_CLOSED, MOBILE_MENU_OPENED};
use sitekit_core::{Dom, EventKind, Key, ListenTarget, NodeId, TimerId, UiEvent};
use tracing::{debug, info, warn};

use crate::app::Disposable;
use crate::helpers::{emit, toggle_class};
use crate::page::{Page, Task};
use crate::scroll::ScrollTween;
use crate::viewport::{Subscription, ViewportSignal, ViewportUtils};

const OPEN_GLYPH: &str = "✕";
const CLOSED_GLYPH: &str = "☰";
const OPEN_LABEL: &str = "Close menu";
const CLOSED_LABEL: &str = "Open menu";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTask {
    /// Delayed close after a link click on a mobile viewport
    CloseMenu,
}

#[derive(Debug)]
pub struct Navigation {
    config: NavigationConfig,
    button: Option<NodeId>,
    menu: Option<NodeId>,
    header: Option<NodeId>,
    links: Vec<NodeId>,
    state: MenuState,
    current_section: String,
    tween: Option<ScrollTween>,
    /// Scroll requested while the menu held the scroll lock
    pending_target: Option<NodeId>,
    close_timer: Option<TimerId>,
    resize_sub: Option<Subscription>,
    scroll_sub: Option<Subscription>,
    listening: Vec<(ListenTarget, EventKind)>,
    initialized: bool,
}

impl Navigation {
    pub fn new(config: &NavigationConfig) -> Self {
        Self {
            config: config.clone(),
            button: None,
            menu: None,
            header: None,
            links: Vec::new(),
            state: MenuState::Closed,
            current_section: Self::default_section(config),
            tween: None,
            pending_target: None,
            close_timer: None,
            resize_sub: None,
            scroll_sub: None,
            listening: Vec::new(),
            initialized: false,
        }
    }

    fn default_section(config: &NavigationConfig) -> String {
        config
            .sections
            .first()
            .cloned()
            .unwrap_or_else(|| "home".to_string())
    }

    pub fn init(&mut self, page: &mut Page, viewport: &mut ViewportUtils) -> sitekit_core::Result<()> {
        if self.initialized {
            return Ok(());
        }
        for selector in [
            &self.config.menu_button,
            &self.config.menu,
            &self.config.links,
            &self.config.header,
        ] {
            Selector::parse(selector)?;
        }

        let dom = page.dom.as_ref();
        self.button = dom.query(&self.config.menu_button);
        self.menu = dom.query(&self.config.menu);
        self.header = dom.query(&self.config.header);
        self.links = dom.query_all(&self.config.links);

        if self.button.is_none() || self.menu.is_none() {
            warn!(
                button = %self.config.menu_button,
                menu = %self.config.menu,
                "Mobile menu elements not found, menu disabled"
            );
        }

        self.listen(page, ListenTarget::Document, EventKind::Click);
        self.listen(page, ListenTarget::Document, EventKind::KeyDown);

        let (resize, _) = viewport.on_viewport_change(page, None);
        self.resize_sub = Some(resize);
        self.scroll_sub = Some(viewport.on_scroll(page, None));

        self.apply_state(page.dom.as_mut());
        self.update_active_section(page.dom.as_mut());
        self.update_header(page.dom.as_mut());
        self.initialized = true;
        info!(links = self.links.len(), "Navigation initialized");
        Ok(())
    }

    fn listen(&mut self, page: &mut Page, target: ListenTarget, kind: EventKind) {
        page.dom.listen(target, kind);
        self.listening.push((target, kind));
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == MenuState::Open
    }

    pub fn current_section(&self) -> &str {
        &self.current_section
    }

    pub fn is_scrolling(&self) -> bool {
        self.tween.is_some()
    }

    fn menu_enabled(&self) -> bool {
        self.button.is_some() && self.menu.is_some()
    }

    /// Mirror the state onto the menu and button in one pass
    fn apply_state(&self, dom: &mut dyn Dom) {
        let open = self.is_open();
        if let Some(menu) = self.menu {
            toggle_class(dom, menu, "active", Some(open));
        }
        if let Some(button) = self.button {
            toggle_class(dom, button, "active", Some(open));
            dom.set_attribute(button, "aria-expanded", if open { "true" } else { "false" });
            dom.set_attribute(button, "aria-label", if open { OPEN_LABEL } else { CLOSED_LABEL });
            dom.set_text(button, if open { OPEN_GLYPH } else { CLOSED_GLYPH });
        }
    }

    pub fn open_menu(&mut self, page: &mut Page) -> bool {
        if !self.menu_enabled() || self.is_open() {
            return false;
        }
        self.state = MenuState::Open;
        self.apply_state(page.dom.as_mut());
        if let Some(first) = self.links.first() {
            page.dom.focus(*first);
        }
        ViewportUtils::lock_scroll(page.dom.as_mut());
        debug!("Mobile menu opened");
        emit(page, MOBILE_MENU_OPENED, json!({ "section": self.current_section }));
        true
    }

    /// No-op when already closed
    pub fn close_menu(&mut self, page: &mut Page) -> bool {
        if !self.is_open() {
            return false;
        }
        self.state = MenuState::Closed;
        self.apply_state(page.dom.as_mut());
        if let Some(id) = self.close_timer.take() {
            page.timers.cancel(id);
        }
        if let Some(button) = self.button {
            page.dom.focus(button);
        }
        ViewportUtils::unlock_scroll(page.dom.as_mut());
        debug!("Mobile menu closed");
        emit(page, MOBILE_MENU_CLOSED, json!({ "section": self.current_section }));

        if let Some(target) = self.pending_target.take() {
            self.scroll_to_target(page, target);
        }
        true
    }

    pub fn toggle_menu(&mut self, page: &mut Page) -> bool {
        if self.is_open() {
            self.close_menu(page)
        } else {
            self.open_menu(page)
        }
    }

    pub fn handle(&mut self, page: &mut Page, event: &UiEvent) {
        if !self.initialized {
            return;
        }
        match event {
            UiEvent::Click { target, .. } => self.on_click(page, *target),
            UiEvent::KeyDown { key: Key::Escape, .. } if self.is_open() => {
                self.close_menu(page);
            }
            _ => {}
        }
    }

    fn on_click(&mut self, page: &mut Page, target: NodeId) {
        let dom = page.dom.as_ref();
        if let Some(button) = self.button {
            if dom.contains(button, target) {
                self.toggle_menu(page);
                return;
            }
        }
        if let Some(link) = self.links.iter().copied().find(|l| dom.contains(*l, target)) {
            self.on_link_click(page, link);
            return;
        }
        let inside_menu = self.menu.is_some_and(|menu| dom.contains(menu, target));
        if self.is_open() && !inside_menu {
            self.close_menu(page);
        }
    }

    fn on_link_click(&mut self, page: &mut Page, link: NodeId) {
        let href = page.dom.attribute(link, "href").unwrap_or_default();
        let id = href.trim_start_matches('#');
        let Some(target) = (!id.is_empty()).then(|| page.dom.element_by_id(id)).flatten() else {
            warn!(href = %href, "Navigation target not found");
            return;
        };

        self.set_current_section(page.dom.as_mut(), id.to_string());

        if !self.is_open() {
            self.scroll_to_target(page, target);
            return;
        }
        // The scroll lock pins the page until the menu closes
        self.pending_target = Some(target);
        if ViewportUtils::is_mobile(page.dom.as_ref()) {
            if let Some(timer) = self.close_timer.take() {
                page.timers.cancel(timer);
            }
            let delay = self.config.close_delay_ms as f64;
            self.close_timer = Some(page.timers.set_timeout(delay, Task::Navigation(NavTask::CloseMenu)));
        } else {
            self.close_menu(page);
        }
    }

    /// Scroll so `target` sits just below the header
    pub fn scroll_to_target(&mut self, page: &mut Page, target: NodeId) {
        if !page.dom.is_connected(target) {
            warn!(?target, "Scroll target is not in the document");
            return;
        }
        let header_height = self.header.map(|h| page.dom.offset_height(h)).unwrap_or(0.0);
        let offset = header_height + self.config.scroll_offset;
        let destination = (page.dom.offset_top(target) - offset).max(0.0);

        if self.config.respect_reduced_motion && page.dom.prefers_reduced_motion() {
            self.tween = None;
            page.dom.scroll_to(destination);
            return;
        }
        self.tween = Some(ScrollTween::new(
            page.now(),
            page.dom.scroll_y(),
            destination,
            self.config.scroll_duration_ms as f64,
            self.config.scroll_easing,
        ));
    }

    /// Advance the smooth-scroll tween by one frame
    pub fn on_frame(&mut self, page: &mut Page) {
        let Some(tween) = &self.tween else {
            return;
        };
        let now = page.now();
        page.dom.scroll_to(tween.sample(now));
        if tween.is_complete(now) {
            self.tween = None;
        }
    }

    /// Route a signal from one of this module's viewport subscriptions
    pub fn on_signal(&mut self, page: &mut Page, signal: &ViewportSignal) -> bool {
        match *signal {
            ViewportSignal::Changed(sub, info) if Some(sub) == self.resize_sub => {
                if self.is_open() && !info.is_mobile {
                    self.close_menu(page);
                }
                true
            }
            ViewportSignal::Scrolled(sub, _) if Some(sub) == self.scroll_sub => {
                self.update_active_section(page.dom.as_mut());
                self.update_header(page.dom.as_mut());
                true
            }
            _ => false,
        }
    }

    pub fn on_timer(&mut self, page: &mut Page, id: TimerId, task: NavTask) {
        match task {
            NavTask::CloseMenu => {
                if self.close_timer == Some(id) {
                    self.close_timer = None;
                    self.close_menu(page);
                }
            }
        }
    }

    /// Last section (in list order) whose top is at or above `scrollY + offset`
    pub fn section_at(&self, dom: &dyn Dom) -> String {
        let threshold = dom.scroll_y() + self.config.active_offset;
        self.config
            .sections
            .iter()
            .rev()
            .find(|id| {
                dom.element_by_id(id)
                    .is_some_and(|el| dom.offset_top(el) <= threshold)
            })
            .cloned()
            .unwrap_or_else(|| Self::default_section(&self.config))
    }

    fn update_active_section(&mut self, dom: &mut dyn Dom) {
        let section = self.section_at(dom);
        if section != self.current_section {
            debug!(section = %section, "Active section changed");
            self.set_current_section(dom, section);
        } else {
            self.sync_links(dom);
        }
    }

    fn set_current_section(&mut self, dom: &mut dyn Dom, section: String) {
        self.current_section = section;
        self.sync_links(dom);
    }

    fn sync_links(&self, dom: &mut dyn Dom) {
        let active_href = format!("#{}", self.current_section);
        for link in &self.links {
            let active = dom.attribute(*link, "href").as_deref() == Some(active_href.as_str());
            toggle_class(dom, *link, "active", Some(active));
        }
    }

    fn update_header(&self, dom: &mut dyn Dom) {
        if let Some(header) = self.header {
            let scrolled = dom.scroll_y() > self.config.scrolled_threshold;
            toggle_class(dom, header, "scrolled", Some(scrolled));
        }
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = Subscription> + '_ {
        self.resize_sub.iter().chain(self.scroll_sub.iter()).copied()
    }
}

impl Disposable for Navigation {
    fn dispose(&mut self, page: &mut Page) {
        self.pending_target = None;
        self.close_menu(page);
        page.timers.cancel_where(|task| matches!(task, Task::Navigation(_)));
        self.close_timer = None;
        self.tween = None;
        for (target, kind) in self.listening.drain(..) {
            page.dom.unlisten(target, kind);
        }
        self.resize_sub = None;
        self.scroll_sub = None;
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{headless, landing_page, page_with, run_timers};
    use sitekit_core::config::ViewportConfig;
    use sitekit_core::HeadlessDom;

    struct Fixture {
        page: Page,
        viewport: ViewportUtils,
        nav: Navigation,
    }

    impl Fixture {
        fn new(dom: HeadlessDom) -> Self {
            let mut page = page_with(dom);
            let mut viewport = ViewportUtils::new(&ViewportConfig::default());
            let mut nav = Navigation::new(&NavigationConfig::default());
            nav.init(&mut page, &mut viewport).expect("init");
            Self { page, viewport, nav }
        }

        fn mobile() -> Self {
            let mut dom = landing_page();
            dom.set_viewport(375.0, 700.0);
            Self::new(dom)
        }

        fn node(&self, selector: &str) -> NodeId {
            self.page.dom.query(selector).expect(selector)
        }

        fn click(&mut self, selector: &str) {
            let target = self.node(selector);
            let event = UiEvent::Click { target, x: 0.0, y: 0.0 };
            self.dispatch(&event);
        }

        fn dispatch(&mut self, event: &UiEvent) {
            for signal in self.viewport.handle(&mut self.page, event) {
                self.nav.on_signal(&mut self.page, &signal);
            }
            self.nav.handle(&mut self.page, event);
        }

        fn advance_to(&mut self, now: f64) {
            let (viewport, nav) = (&mut self.viewport, &mut self.nav);
            run_timers(&mut self.page, now, |page, id, task| match task {
                Task::Viewport(task) => {
                    if let Some(signal) = viewport.on_timer(page, id, task) {
                        nav.on_signal(page, &signal);
                    }
                }
                Task::Navigation(task) => nav.on_timer(page, id, task),
                _ => {}
            });
        }

        fn frame_until(&mut self, end: f64) {
            let mut now = self.page.now();
            while now < end {
                now = (now + 16.0).min(end);
                self.advance_to(now);
                self.nav.on_frame(&mut self.page);
            }
        }
    }

    #[test]
    fn test_menu_toggle_law() {
        let mut f = Fixture::mobile();
        let button = f.node("#mobileMenuBtn");
        let menu = f.node("#mainNav");
        let dom = f.page.dom.as_ref();
        assert_eq!(dom.attribute(button, "aria-expanded").as_deref(), Some("false"));
        assert!(!dom.has_class(menu, "active"));
        let before = (dom.attribute(button, "aria-expanded"), dom.text(button));

        assert!(f.nav.open_menu(&mut f.page));
        let dom = f.page.dom.as_ref();
        assert!(dom.has_class(menu, "active"));
        assert!(dom.has_class(button, "active"));
        assert_eq!(dom.attribute(button, "aria-expanded").as_deref(), Some("true"));
        assert_eq!(dom.attribute(button, "aria-label").as_deref(), Some("Close menu"));

        assert!(f.nav.close_menu(&mut f.page));
        let dom = f.page.dom.as_ref();
        assert_eq!((dom.attribute(button, "aria-expanded"), dom.text(button)), before);
        assert!(!dom.has_class(menu, "active"));
        assert!(!dom.has_class(button, "active"));

        // Closing a closed menu does nothing
        assert!(!f.nav.close_menu(&mut f.page));
        assert_eq!(f.page.bus.count(MOBILE_MENU_CLOSED), 1);
    }

    #[test]
    fn test_button_click_opens_and_escape_closes() {
        let mut f = Fixture::mobile();
        f.click("#mobileMenuBtn");
        assert!(f.nav.is_open());
        let button = f.node("#mobileMenuBtn");
        assert_eq!(f.page.dom.attribute(button, "aria-expanded").as_deref(), Some("true"));
        assert_eq!(headless(&mut f.page).dispatched_names(), vec![MOBILE_MENU_OPENED]);

        // Focus moves to the first link while open
        let first_link = f.node("nav a");
        assert_eq!(f.page.dom.active_element(), Some(first_link));
        assert!(ViewportUtils::is_scroll_locked(f.page.dom.as_ref()));

        f.dispatch(&UiEvent::KeyDown { key: Key::Escape, target: None });
        assert_eq!(f.nav.state(), MenuState::Closed);
        assert_eq!(
            headless(&mut f.page).dispatched_names(),
            vec![MOBILE_MENU_OPENED, MOBILE_MENU_CLOSED]
        );
        assert_eq!(f.page.dom.active_element(), Some(button));
        assert!(!ViewportUtils::is_scroll_locked(f.page.dom.as_ref()));
    }

    #[test]
    fn test_outside_click_closes_but_inside_click_does_not() {
        let mut f = Fixture::mobile();
        f.click("#mobileMenuBtn");
        f.click("#mainNav");
        assert!(f.nav.is_open());
        f.click("#about p");
        assert!(!f.nav.is_open());
    }

    #[test]
    fn test_resize_to_desktop_closes_after_debounce() {
        let mut f = Fixture::mobile();
        f.click("#mobileMenuBtn");
        headless(&mut f.page).set_viewport(1280.0, 800.0);
        f.dispatch(&UiEvent::Resize);
        assert!(f.nav.is_open());
        f.advance_to(250.0);
        assert!(!f.nav.is_open());
    }

    #[test]
    fn test_link_click_on_mobile_closes_after_delay_then_scrolls() {
        let mut f = Fixture::mobile();
        f.click("#mobileMenuBtn");
        f.click("nav a[href=\"#services\"]");
        assert!(f.nav.is_open());
        assert_eq!(f.nav.current_section(), "services");
        assert!(f.page.dom.has_class(f.node("nav a[href=\"#services\"]"), "active"));

        f.advance_to(299.0);
        assert!(f.nav.is_open());
        f.advance_to(300.0);
        assert!(!f.nav.is_open());
        assert!(f.nav.is_scrolling());

        f.frame_until(1200.0);
        // services at 1600, minus the 70px header and the 80px offset
        assert_eq!(f.page.dom.scroll_y(), 1450.0);
        assert!(!f.nav.is_scrolling());
    }

    #[test]
    fn test_smooth_scroll_follows_ease_in_out_quad() {
        let mut f = Fixture::new(landing_page());
        f.click("nav a[href=\"#about\"]");
        // about at 800 - 150 = 650 over 800ms
        f.frame_until(400.0);
        assert!((f.page.dom.scroll_y() - 325.0).abs() < 1e-6);
        f.frame_until(800.0);
        assert_eq!(f.page.dom.scroll_y(), 650.0);
    }

    #[test]
    fn test_missing_link_target_warns_without_scrolling() {
        let mut f = Fixture::new(landing_page());
        f.click("nav a[href=\"#pricing\"]");
        assert!(!f.nav.is_scrolling());
        f.frame_until(1000.0);
        assert_eq!(f.page.dom.scroll_y(), 0.0);
        assert_eq!(f.nav.current_section(), "home");
    }

    #[test]
    fn test_reduced_motion_jumps_instantly() {
        let mut dom = landing_page();
        dom.set_reduced_motion(true);
        let mut f = Fixture::new(dom);
        f.click("nav a[href=\"#contact\"]");
        assert!(!f.nav.is_scrolling());
        assert_eq!(f.page.dom.scroll_y(), 3200.0 - 150.0);
    }

    #[test]
    fn test_active_section_is_last_match_wins() {
        let mut f = Fixture::new(landing_page());
        assert_eq!(f.nav.current_section(), "home");

        headless(&mut f.page).scroll_to(1500.0);
        f.dispatch(&UiEvent::Scroll);
        // 1500 + 100 reaches services (1600) but not testimonials (2400)
        assert_eq!(f.nav.current_section(), "services");
        let header = f.node("header");
        assert!(f.page.dom.has_class(header, "scrolled"));
        let services_link = f.node("nav a[href=\"#services\"]");
        let home_link = f.node("nav a[href=\"#home\"]");
        assert!(f.page.dom.has_class(services_link, "active"));
        assert!(!f.page.dom.has_class(home_link, "active"));

        f.advance_to(20.0);
        headless(&mut f.page).scroll_to(0.0);
        f.dispatch(&UiEvent::Scroll);
        assert_eq!(f.nav.current_section(), "home");
        assert!(!f.page.dom.has_class(header, "scrolled"));
    }

    #[test]
    fn test_missing_menu_only_disables_the_menu() {
        let mut dom = landing_page();
        let button = dom.query("#mobileMenuBtn").expect("button");
        dom.remove(button);
        let mut f = Fixture::new(dom);
        assert!(!f.nav.open_menu(&mut f.page));

        f.click("nav a[href=\"#about\"]");
        assert!(f.nav.is_scrolling());
    }

    #[test]
    fn test_invalid_selector_fails_init() {
        let mut page = page_with(landing_page());
        let mut viewport = ViewportUtils::new(&ViewportConfig::default());
        let config = NavigationConfig {
            menu: "[data-open".to_string(),
            ..Default::default()
        };
        let mut nav = Navigation::new(&config);
        assert!(nav.init(&mut page, &mut viewport).is_err());
    }

    #[test]
    fn test_dispose_releases_everything() {
        let mut f = Fixture::mobile();
        f.click("#mobileMenuBtn");
        f.nav.dispose(&mut f.page);
        assert!(!f.nav.is_open());
        assert!(!ViewportUtils::is_scroll_locked(f.page.dom.as_ref()));
        let dom = headless(&mut f.page);
        assert_eq!(dom.listener_count(ListenTarget::Document, EventKind::Click), 0);
        assert_eq!(dom.listener_count(ListenTarget::Document, EventKind::KeyDown), 0);
    }
}
