//! Shared fixtures for unit tests

use std::sync::Arc;

use sitekit_core::{Dom, HeadlessDom, SiteConfig, TimerId};

use crate::page::{Page, Task};

/// 1280×800 landing page, 4000px tall
///
/// | section       | top  |
/// |---------------|------|
/// | home (.hero)  | 0    |
/// | about         | 800  |
/// | services      | 1600 |
/// | testimonials  | 2400 |
/// | contact       | 3200 |
///
/// The header is 70px tall. The nav also links to `#pricing`, which does not exist.
pub fn landing_page() -> HeadlessDom {
    let mut dom = HeadlessDom::new(1280.0, 800.0);
    let body = dom.body();

    let header = dom.element(body, "header").rect(0.0, 0.0, 1280.0, 70.0).finish();
    dom.element(header, "button")
        .id("mobileMenuBtn")
        .class("mobile-menu-btn")
        .text("Menu")
        .rect(1200.0, 15.0, 40.0, 40.0)
        .finish();
    let nav = dom
        .element(header, "nav")
        .id("mainNav")
        .rect(300.0, 0.0, 800.0, 70.0)
        .finish();
    for (i, section) in ["home", "about", "services", "testimonials", "contact", "pricing"]
        .iter()
        .enumerate()
    {
        dom.element(nav, "a")
            .attr("href", &format!("#{}", section))
            .text(section)
            .rect(300.0 + i as f64 * 120.0, 20.0, 100.0, 30.0)
            .finish();
    }

    let home = dom
        .element(body, "section")
        .id("home")
        .class("hero")
        .rect(0.0, 0.0, 1280.0, 800.0)
        .finish();
    dom.element(home, "h1").text("Build faster").rect(100.0, 200.0, 560.0, 80.0).finish();
    dom.element(home, "a")
        .class("cta-button")
        .attr("href", "#contact")
        .text("Get Started")
        .rect(100.0, 500.0, 200.0, 50.0)
        .finish();
    let visual = dom
        .element(home, "div")
        .class("hero-visual")
        .rect(700.0, 120.0, 540.0, 560.0)
        .finish();
    let container = dom
        .element(visual, "div")
        .class("laptop-container")
        .rect(720.0, 150.0, 500.0, 400.0)
        .finish();
    let frame = dom
        .element(container, "div")
        .class("laptop-frame")
        .rect(720.0, 150.0, 500.0, 400.0)
        .finish();
    dom.element(frame, "img")
        .class("laptop-image")
        .attr("src", "laptop.png")
        .rect(740.0, 170.0, 460.0, 300.0)
        .finish();
    let screen = dom
        .element(frame, "div")
        .class("screen-content")
        .rect(760.0, 190.0, 420.0, 260.0)
        .finish();
    for i in 0..3 {
        dom.element(screen, "div")
            .class("screen-line")
            .rect(770.0, 200.0 + i as f64 * 60.0, 400.0, 50.0)
            .finish();
    }

    let about = dom.element(body, "section").id("about").rect(0.0, 800.0, 1280.0, 800.0).finish();
    dom.element(about, "p")
        .class("animate-on-scroll")
        .text("About us")
        .rect(100.0, 900.0, 600.0, 100.0)
        .finish();
    dom.element(about, "div").class("feature-card").rect(100.0, 1100.0, 300.0, 200.0).finish();

    let services = dom
        .element(body, "section")
        .id("services")
        .rect(0.0, 1600.0, 1280.0, 800.0)
        .finish();
    let card = dom.element(services, "div").class("service-card").rect(100.0, 1700.0, 300.0, 300.0).finish();
    dom.element(card, "h3").text("Design").rect(120.0, 1720.0, 260.0, 40.0).finish();

    let testimonials = dom
        .element(body, "section")
        .id("testimonials")
        .rect(0.0, 2400.0, 1280.0, 800.0)
        .finish();
    dom.element(testimonials, "div")
        .class("testimonial-card")
        .rect(100.0, 2500.0, 300.0, 200.0)
        .finish();

    let contact = dom
        .element(body, "section")
        .id("contact")
        .rect(0.0, 3200.0, 1280.0, 800.0)
        .finish();
    dom.element(contact, "img").attr("src", "map.png").rect(100.0, 3300.0, 400.0, 300.0).finish();

    dom
}

pub fn page_with(dom: HeadlessDom) -> Page {
    Page::new(Box::new(dom), Arc::new(SiteConfig::default()))
}

pub fn headless(page: &mut Page) -> &mut HeadlessDom {
    page.dom
        .as_any_mut()
        .downcast_mut::<HeadlessDom>()
        .expect("page is headless")
}

/// Fire every timer due by `now`, in order, then settle the clock at `now`
pub fn run_timers(page: &mut Page, now: f64, mut on_timer: impl FnMut(&mut Page, TimerId, Task)) {
    while let Some((id, task)) = page.timers.pop_due(now) {
        on_timer(page, id, task);
    }
    page.timers.advance_to(now);
}
