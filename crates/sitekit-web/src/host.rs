//! Entry point: boots the runtime and drives it from `requestAnimationFrame`

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use gloo::events::EventListener;
use gloo::render::{request_animation_frame, AnimationFrame};
use sitekit_ui::Site;
use tracing::info;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, ErrorEvent, Event, EventTarget, PromiseRejectionEvent, Window};

use crate::browser::{BrowserDom, EventQueue, RawEvent};
use crate::console;

struct Host {
    site: Site,
    queue: EventQueue,
    /// `performance.now()` at boot; the runtime clock starts at zero
    origin: f64,
    pending_frame: Option<AnimationFrame>,
}

impl Host {
    fn frame(&mut self, timestamp: f64) {
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(raw) = next else {
                break;
            };
            let event = self
                .site
                .page()
                .dom
                .as_any()
                .downcast_ref::<BrowserDom>()
                .and_then(|dom| dom.resolve(raw));
            if let Some(event) = event {
                self.site.handle(event);
            }
        }
        let now = (timestamp - self.origin).max(self.site.now());
        self.site.tick(now);
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let queue = EventQueue::default();
    let mut dom = BrowserDom::new(queue.clone())?;
    let config = dom.embedded_config();
    console::init(&config.general.log_level);
    dom.set_smooth_links(&config.navigation.links);

    let origin = dom.window().performance().map(|p| p.now()).unwrap_or(0.0);
    watch_lifecycle(dom.window(), dom.document(), &queue);

    let site = Site::boot(Box::new(dom), Arc::new(config));
    let host = Rc::new(RefCell::new(Host {
        site,
        queue,
        origin,
        pending_frame: None,
    }));
    info!("Browser host started");
    schedule_frame(&host);
    Ok(())
}

/// Queue `DomReady`/`Load` now or when the document gets there, plus global error reports
fn watch_lifecycle(window: &Window, document: &Document, queue: &EventQueue) {
    let state = document.ready_state();
    if state == "loading" {
        once(document, "DOMContentLoaded", queue, |_| Some(RawEvent::Ready));
    } else {
        queue.borrow_mut().push_back(RawEvent::Ready);
    }
    if state == "complete" {
        queue.borrow_mut().push_back(RawEvent::Load);
    } else {
        once(window, "load", queue, |_| Some(RawEvent::Load));
    }

    forever(window, "error", queue, |event| {
        let event = event.dyn_ref::<ErrorEvent>()?;
        let stack = js_sys::Reflect::get(&event.error(), &JsValue::from_str("stack"))
            .ok()
            .and_then(|stack| stack.as_string());
        Some(RawEvent::Error {
            message: event.message(),
            stack,
        })
    });
    forever(window, "unhandledrejection", queue, |event| {
        let reason = event.dyn_ref::<PromiseRejectionEvent>()?.reason();
        let reason = reason
            .as_string()
            .or_else(|| js_sys::JSON::stringify(&reason).ok().and_then(|s| s.as_string()))
            .unwrap_or_else(|| "unknown rejection".to_string());
        Some(RawEvent::Rejection(reason))
    });
}

fn once(
    target: &EventTarget,
    name: &'static str,
    queue: &EventQueue,
    map: impl FnOnce(&Event) -> Option<RawEvent> + 'static,
) {
    let queue = queue.clone();
    EventListener::once(target, name, move |event| {
        if let Some(raw) = map(event) {
            queue.borrow_mut().push_back(raw);
        }
    })
    .forget();
}

fn forever(
    target: &EventTarget,
    name: &'static str,
    queue: &EventQueue,
    map: impl Fn(&Event) -> Option<RawEvent> + 'static,
) {
    let queue = queue.clone();
    // Page-lifetime listener
    EventListener::new(target, name, move |event| {
        if let Some(raw) = map(event) {
            queue.borrow_mut().push_back(raw);
        }
    })
    .forget();
}

/// Run one host frame on the next `requestAnimationFrame`, then queue the next;
/// storing the new handle releases the one that just fired
fn schedule_frame(host: &Rc<RefCell<Host>>) {
    let next = Rc::clone(host);
    let handle = request_animation_frame(move |timestamp| {
        next.borrow_mut().frame(timestamp);
        schedule_frame(&next);
    });
    host.borrow_mut().pending_frame = Some(handle);
}
