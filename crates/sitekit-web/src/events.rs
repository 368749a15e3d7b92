//! Mapping between listener kinds and browser event names

use sitekit_core::EventKind;

/// Media query behind [`EventKind::ReducedMotionChange`]
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Where a browser listener for a kind is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostTarget {
    Window,
    /// Capture phase, so non-bubbling events (`mouseenter`) are seen too
    Document,
    ReducedMotionQuery,
}

pub fn dom_event_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Resize => "resize",
        EventKind::OrientationChange => "orientationchange",
        EventKind::Scroll => "scroll",
        EventKind::Click => "click",
        EventKind::DoubleClick => "dblclick",
        EventKind::PointerEnter => "mouseenter",
        EventKind::PointerLeave => "mouseleave",
        EventKind::PointerMove => "mousemove",
        EventKind::TouchStart => "touchstart",
        EventKind::TouchEnd => "touchend",
        EventKind::KeyDown => "keydown",
        EventKind::VisibilityChange => "visibilitychange",
        EventKind::ReducedMotionChange => "change",
    }
}

pub fn host_target(kind: EventKind) -> HostTarget {
    match kind {
        EventKind::Resize | EventKind::OrientationChange | EventKind::Scroll => HostTarget::Window,
        EventKind::ReducedMotionChange => HostTarget::ReducedMotionQuery,
        _ => HostTarget::Document,
    }
}

/// Touch listeners stay passive so scrolling is never blocked
pub fn is_passive(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::Scroll | EventKind::TouchStart | EventKind::TouchEnd
    )
}

/// Whether the browser's default action is cancelled for an event
///
/// Only links the runtime smooth-scrolls lose their native jump; every other
/// hash anchor keeps it. Space on the CTA would otherwise scroll the page.
pub fn cancels_native(kind: EventKind, key: Option<&str>, on_smooth_link: bool, on_cta: bool) -> bool {
    match kind {
        EventKind::Click => on_smooth_link,
        EventKind::KeyDown => on_cta && key == Some(" "),
        _ => false,
    }
}
