//! Hero laptop mockup: hover zoom, tilt, glow pulse, responsive sizing and preview

use sitekit_core::config::EnhancerConfig;
use sitekit_core::Dom;
use tracing::debug;

use super::{Enhancer, EnhancerKind, EnhancerProfile};
use crate::helpers::px;

pub const SELECTOR: &str = ".laptop-container";
pub const IMAGE_SELECTOR: &str = ".laptop-image";

/// Elements that share the responsive max-width
const SIZED: [&str; 3] = [".laptop-container", ".laptop-image", ".laptop-frame"];

/// `(minimum viewport width, max-width)` from widest to narrowest
const TIERS: [(f64, f64); 5] = [
    (1400.0, 800.0),
    (1200.0, 750.0),
    (992.0, 650.0),
    (768.0, 580.0),
    (576.0, 520.0),
];
const NARROWEST: f64 = 450.0;

pub fn max_width_for(viewport_width: f64) -> f64 {
    TIERS
        .iter()
        .find(|(min, _)| viewport_width >= *min)
        .map(|(_, width)| *width)
        .unwrap_or(NARROWEST)
}

pub fn apply_sizing(dom: &mut dyn Dom) {
    let width = max_width_for(dom.viewport().width);
    let value = px(width);
    for selector in SIZED {
        for node in dom.query_all(selector) {
            dom.set_style(node, "max-width", &value);
        }
    }
    debug!(max_width = width, "Laptop sizing applied");
}

pub fn profile() -> EnhancerProfile {
    EnhancerProfile {
        kind: EnhancerKind::Laptop,
        target: SELECTOR,
        surface: Some(IMAGE_SELECTOR),
        rest_transform: "scale(1)",
        hover_transform: "scale(1.03)",
        press_transform: "scale(0.98)",
        tilt_max_deg: 8.0,
        ripple_ms: 800.0,
        ripple_color: "rgba(102, 126, 234, 0.4)",
        pulse_class: "glow",
        pulse_ms: 2000.0,
        emits_activation: false,
        responsive: true,
    }
}

pub fn laptop_enhancer(config: &EnhancerConfig) -> Enhancer {
    let mut profile = profile();
    profile.ripple_ms = config.laptop_ripple_ms as f64;
    Enhancer::new(profile, config)
}
