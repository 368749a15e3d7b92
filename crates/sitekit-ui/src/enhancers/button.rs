//! "Get Started" call-to-action button

use sitekit_core::config::EnhancerConfig;

use super::{Enhancer, EnhancerKind, EnhancerProfile};

pub const SELECTOR: &str = ".cta-button";

pub fn profile() -> EnhancerProfile {
    EnhancerProfile {
        kind: EnhancerKind::Button,
        target: SELECTOR,
        surface: None,
        rest_transform: "translateY(0) scale(1)",
        hover_transform: "translateY(-3px) scale(1.02)",
        press_transform: "scale(0.97)",
        tilt_max_deg: 10.0,
        ripple_ms: 600.0,
        ripple_color: "rgba(255, 255, 255, 0.6)",
        pulse_class: "pulse",
        pulse_ms: 1000.0,
        emits_activation: true,
        responsive: false,
    }
}

pub fn button_enhancer(config: &EnhancerConfig) -> Enhancer {
    let mut profile = profile();
    profile.ripple_ms = config.button_ripple_ms as f64;
    Enhancer::new(profile, config)
}
