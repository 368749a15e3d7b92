//! Application coordinator: init order, global error capture, visibility and post-load tweaks

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use sitekit_core::notify::{APP_ERROR, APP_LOADED};
use sitekit_core::{EventKind, ListenTarget, NodeId, SiteConfig, TimerId, UiEvent};
use tracing::{error, info};

use crate::animations::Animations;
use crate::helpers::toggle_class;
use crate::navigation::Navigation;
use crate::page::{Page, Task};
use crate::viewport::{ViewportSignal, ViewportUtils};

/// Modules that hold listeners, timers or observers released on teardown
pub trait Disposable {
    fn dispose(&mut self, page: &mut Page);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTask {
    DismissError,
}

/// Diagnostic record logged and emitted for every captured error
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub message: String,
    pub stack: Option<String>,
    pub timestamp: String,
    pub url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy)]
struct Banner {
    node: NodeId,
    reload: NodeId,
    timer: TimerId,
}

#[derive(Debug)]
pub struct App {
    viewport: ViewportUtils,
    navigation: Navigation,
    animations: Animations,
    modules: Vec<&'static str>,
    ready: bool,
    loaded: bool,
    banner: Option<Banner>,
    dismiss_ms: f64,
    lazy_images: bool,
}

impl App {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            viewport: ViewportUtils::new(&config.viewport),
            navigation: Navigation::new(&config.navigation),
            animations: Animations::new(&config.animation),
            modules: Vec::new(),
            ready: false,
            loaded: false,
            banner: None,
            dismiss_ms: config.app.error_dismiss_ms as f64,
            lazy_images: config.app.lazy_images,
        }
    }

    pub fn viewport(&self) -> &ViewportUtils {
        &self.viewport
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn animations(&self) -> &Animations {
        &self.animations
    }

    pub fn navigation_mut(&mut self) -> &mut Navigation {
        &mut self.navigation
    }

    pub fn animations_mut(&mut self) -> &mut Animations {
        &mut self.animations
    }

    /// Names of the modules that initialised successfully
    pub fn modules(&self) -> &[&'static str] {
        &self.modules
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Initialise viewport, navigation and animations in order
    ///
    /// A module that fails is reported and skipped; later modules still start.
    pub fn ready(&mut self, page: &mut Page) {
        if self.ready {
            return;
        }
        self.ready = true;
        page.dom.listen(ListenTarget::Document, EventKind::VisibilityChange);

        let result = self.viewport.init(page);
        self.record(page, "viewport", result);
        let result = self.navigation.init(page, &mut self.viewport);
        self.record(page, "navigation", result);
        let result = self.animations.init(page);
        self.record(page, "animations", result);

        info!(modules = ?self.modules, "Application ready");
    }

    fn record(&mut self, page: &mut Page, name: &'static str, result: sitekit_core::Result<()>) {
        match result {
            Ok(()) => self.modules.push(name),
            Err(e) => {
                error!(module = name, error = %e, "Module failed to initialize");
                self.report_error(page, format!("{} failed to initialize: {}", name, e), None);
            }
        }
    }

    /// Post-load cosmetics and the `appLoaded` notification
    pub fn on_load(&mut self, page: &mut Page) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        let body = page.dom.body();
        page.dom.add_class(body, "loaded");

        if self.lazy_images {
            let dom = page.dom.as_mut();
            for img in dom.query_all("img") {
                if dom.matches(img, ".hero img") || dom.attribute(img, "loading").is_some() {
                    continue;
                }
                dom.set_attribute(img, "loading", "lazy");
                dom.set_attribute(img, "decoding", "async");
            }
        }

        let load_time = page.now();
        info!(load_time_ms = load_time, "Page loaded");
        page.emit(
            APP_LOADED,
            json!({ "loadTime": load_time, "modules": self.modules }),
        );
    }

    pub fn handle(&mut self, page: &mut Page, event: &UiEvent) {
        match event {
            UiEvent::DomReady => self.ready(page),
            UiEvent::Load => self.on_load(page),
            UiEvent::ScriptError { message, stack } => {
                self.report_error(page, message.clone(), stack.clone());
            }
            UiEvent::UnhandledRejection { reason } => {
                self.report_error(page, format!("Unhandled promise rejection: {}", reason), None);
            }
            UiEvent::VisibilityChange { hidden } => self.on_visibility(page, *hidden),
            UiEvent::Click { target, .. } if self.is_reload_click(page, *target) => {
                info!("Reloading after error");
                page.dom.reload();
                return;
            }
            _ => {}
        }
        if !self.ready {
            return;
        }
        let signals = self.viewport.handle(page, event);
        self.route(page, &signals);
        self.navigation.handle(page, event);
        self.animations.handle(page, event);
    }

    fn route(&mut self, page: &mut Page, signals: &[ViewportSignal]) {
        for signal in signals {
            self.navigation.on_signal(page, signal);
        }
    }

    fn on_visibility(&mut self, page: &mut Page, hidden: bool) {
        let body = page.dom.body();
        toggle_class(page.dom.as_mut(), body, "page-hidden", Some(hidden));
        if hidden {
            self.animations.pause();
        } else {
            self.animations.resume(page);
        }
    }

    pub fn on_timer(&mut self, page: &mut Page, id: TimerId, task: Task) {
        match task {
            Task::Viewport(task) => {
                if let Some(signal) = self.viewport.on_timer(page, id, task) {
                    self.route(page, &[signal]);
                }
            }
            Task::Navigation(task) => self.navigation.on_timer(page, id, task),
            Task::Animation(task) => self.animations.on_timer(page, id, task),
            Task::App(AppTask::DismissError) => {
                if self.banner.is_some_and(|b| b.timer == id) {
                    self.dismiss_error(page);
                }
            }
            Task::Enhancer(..) => {}
        }
    }

    pub fn on_frame(&mut self, page: &mut Page) {
        self.navigation.on_frame(page);
        self.animations.on_frame(page);
    }

    /// Log, emit and surface an error to the visitor
    pub fn report_error(&mut self, page: &mut Page, message: String, stack: Option<String>) -> ErrorReport {
        let report = ErrorReport {
            message,
            stack,
            timestamp: Utc::now().to_rfc3339(),
            url: page.dom.location(),
            user_agent: page.dom.user_agent(),
        };
        let detail = serde_json::to_value(&report).unwrap_or_default();
        error!(report = %detail, "Application error");
        page.emit(APP_ERROR, detail);
        self.show_banner(page);
        report
    }

    pub fn error_banner(&self) -> Option<NodeId> {
        self.banner.map(|b| b.node)
    }

    fn show_banner(&mut self, page: &mut Page) {
        if self.banner.is_some() {
            return;
        }
        let dom = page.dom.as_mut();
        let node = dom.create_element("div");
        dom.add_class(node, "error-notification");
        dom.set_attribute(node, "role", "alert");
        let text = dom.create_element("p");
        dom.set_text(text, "Something went wrong. Please reload the page.");
        let reload = dom.create_element("button");
        dom.add_class(reload, "reload-button");
        dom.set_text(reload, "Reload");
        dom.append_child(node, text);
        dom.append_child(node, reload);
        let body = dom.body();
        dom.append_child(body, node);
        dom.listen(ListenTarget::Node(reload), EventKind::Click);

        let timer = page.timers.set_timeout(self.dismiss_ms, Task::App(AppTask::DismissError));
        self.banner = Some(Banner { node, reload, timer });
    }

    fn dismiss_error(&mut self, page: &mut Page) {
        if let Some(banner) = self.banner.take() {
            page.timers.cancel(banner.timer);
            page.dom.unlisten(ListenTarget::Node(banner.reload), EventKind::Click);
            page.dom.remove(banner.node);
        }
    }

    fn is_reload_click(&self, page: &Page, target: NodeId) -> bool {
        self.banner
            .is_some_and(|b| page.dom.contains(b.reload, target))
    }

    /// Tear down in reverse init order
    pub fn destroy(&mut self, page: &mut Page) {
        let disposables: [&mut dyn Disposable; 3] =
            [&mut self.animations, &mut self.navigation, &mut self.viewport];
        for module in disposables {
            module.dispose(page);
        }
        self.dismiss_error(page);
        page.dom.unlisten(ListenTarget::Document, EventKind::VisibilityChange);
        self.modules.clear();
        self.ready = false;
        info!("Application destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{headless, landing_page, page_with, run_timers};
    use sitekit_core::notify::MOBILE_MENU_OPENED;
    use sitekit_core::{Dom, HeadlessDom};

    fn ready(dom: HeadlessDom) -> (Page, App) {
        let mut page = page_with(dom);
        let mut app = App::new(&page.config.clone());
        app.handle(&mut page, &UiEvent::DomReady);
        (page, app)
    }

    fn run(page: &mut Page, app: &mut App, now: f64) {
        run_timers(page, now, |page, id, task| app.on_timer(page, id, task));
    }

    #[test]
    fn test_modules_initialize_in_order() {
        let (_, app) = ready(landing_page());
        assert_eq!(app.modules(), &["viewport", "navigation", "animations"]);
        assert!(app.is_ready());
    }

    #[test]
    fn test_failed_module_does_not_stop_the_rest() {
        let mut config = SiteConfig::default();
        config.navigation.links = "nav a[href^=".to_string();
        let mut page = page_with(landing_page());
        page.config = std::sync::Arc::new(config.clone());
        let mut app = App::new(&config);
        app.ready(&mut page);

        assert_eq!(app.modules(), &["viewport", "animations"]);
        let report = page.bus.last(APP_ERROR).expect("reported");
        assert!(report.detail["message"].as_str().unwrap().starts_with("navigation failed"));
        assert!(app.error_banner().is_some());
    }

    #[test]
    fn test_load_marks_body_and_lazy_loads_images() {
        let (mut page, mut app) = ready(landing_page());
        page.timers.advance_to(1234.0);
        app.handle(&mut page, &UiEvent::Load);

        let body = page.dom.body();
        assert!(page.dom.has_class(body, "loaded"));
        let hero_img = page.dom.query(".hero img").unwrap();
        let contact_img = page.dom.query("#contact img").unwrap();
        assert_eq!(page.dom.attribute(hero_img, "loading"), None);
        assert_eq!(page.dom.attribute(contact_img, "loading").as_deref(), Some("lazy"));
        assert_eq!(page.dom.attribute(contact_img, "decoding").as_deref(), Some("async"));

        let loaded = page.bus.last(APP_LOADED).unwrap();
        assert_eq!(loaded.detail["loadTime"], 1234.0);
        assert_eq!(loaded.detail["modules"], json!(["viewport", "navigation", "animations"]));
    }

    #[test]
    fn test_error_report_and_banner_lifecycle() {
        let (mut page, mut app) = ready(landing_page());
        app.handle(
            &mut page,
            &UiEvent::ScriptError { message: "boom".into(), stack: Some("at main.js:1".into()) },
        );
        app.handle(&mut page, &UiEvent::UnhandledRejection { reason: "timeout".into() });

        assert_eq!(page.bus.count(APP_ERROR), 2);
        let report = &page.bus.history()[0].detail;
        assert_eq!(report["message"], "boom");
        assert_eq!(report["stack"], "at main.js:1");
        assert_eq!(report["url"], "https://example.test/");
        assert_eq!(report["userAgent"], "sitekit-headless");
        assert!(chrono::DateTime::parse_from_rfc3339(report["timestamp"].as_str().unwrap()).is_ok());
        assert_eq!(page.dom.query_all(".error-notification").len(), 1);

        run(&mut page, &mut app, 9_999.0);
        assert!(app.error_banner().is_some());
        run(&mut page, &mut app, 10_000.0);
        assert!(app.error_banner().is_none());
        assert!(page.dom.query(".error-notification").is_none());
    }

    #[test]
    fn test_reload_button() {
        let (mut page, mut app) = ready(landing_page());
        app.handle(&mut page, &UiEvent::ScriptError { message: "boom".into(), stack: None });
        let reload = page.dom.query(".reload-button").unwrap();
        app.handle(&mut page, &UiEvent::Click { target: reload, x: 0.0, y: 0.0 });
        assert_eq!(headless(&mut page).reload_count(), 1);
    }

    #[test]
    fn test_visibility_toggles_body_class_and_pauses() {
        let (mut page, mut app) = ready(landing_page());
        let body = page.dom.body();
        app.handle(&mut page, &UiEvent::VisibilityChange { hidden: true });
        assert!(page.dom.has_class(body, "page-hidden"));
        assert!(app.animations().is_paused());
        app.handle(&mut page, &UiEvent::VisibilityChange { hidden: false });
        assert!(!page.dom.has_class(body, "page-hidden"));
        assert!(!app.animations().is_paused());
    }

    #[test]
    fn test_events_before_ready_are_ignored() {
        let mut dom = landing_page();
        dom.set_viewport(375.0, 700.0);
        let mut page = page_with(dom);
        let mut app = App::new(&SiteConfig::default());
        let button = page.dom.query("#mobileMenuBtn").unwrap();
        app.handle(&mut page, &UiEvent::Click { target: button, x: 0.0, y: 0.0 });
        assert_eq!(page.bus.count(MOBILE_MENU_OPENED), 0);

        app.handle(&mut page, &UiEvent::DomReady);
        app.handle(&mut page, &UiEvent::Click { target: button, x: 0.0, y: 0.0 });
        assert_eq!(page.bus.count(MOBILE_MENU_OPENED), 1);
    }

    #[test]
    fn test_destroy_releases_listeners() {
        let (mut page, mut app) = ready(landing_page());
        app.destroy(&mut page);
        let dom = headless(&mut page);
        for kind in [EventKind::Scroll, EventKind::Resize, EventKind::OrientationChange] {
            assert_eq!(dom.listener_count(ListenTarget::Window, kind), 0, "{:?}", kind);
        }
        assert_eq!(dom.listener_count(ListenTarget::Document, EventKind::Click), 0);
        assert!(app.modules().is_empty());
        assert_eq!(page.timers.pending(), 0);
    }
}
