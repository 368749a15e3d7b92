//! Smooth scrolling for in-page navigation
//!
//! - `easing`: curves over normalised progress
//! - `timing`: progress and interpolation over the virtual clock
//! - `tween`: one scroll animation, sampled once per frame
//!
//! # Usage
//!
//! ```ignore
//! use sitekit_ui::scroll::ScrollTween;
//!
//! let tween = ScrollTween::new(now, dom.scroll_y(), target_y, 800.0, EasingType::EaseInOutQuad);
//!
//! // Every animation frame
//! dom.scroll_to(tween.sample(frame_now));
//! ```

pub mod easing;
pub mod timing;
pub mod tween;

pub use easing::{ease_in_out_quad, Ease, EasingType};
pub use tween::ScrollTween;
