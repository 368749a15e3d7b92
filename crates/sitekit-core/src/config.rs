use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Easing curve used by scroll tweens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EasingType {
    /// Jump to the end value
    None,
    Linear,
    Cubic,
    Quintic,
    /// Exponential ease-out
    EaseOut,
    /// Quadratic ease-in/ease-out over the half-duration
    #[default]
    EaseInOutQuad,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub enhancers: EnhancerConfig,
    #[serde(default)]
    pub app: CoordinatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Debounce window for resize/orientation listeners
    #[serde(default = "default_resize_debounce")]
    pub resize_debounce_ms: u64,
    /// Throttle window for scroll listeners
    #[serde(default = "default_scroll_throttle")]
    pub scroll_throttle_ms: u64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            resize_debounce_ms: default_resize_debounce(),
            scroll_throttle_ms: default_scroll_throttle(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    #[serde(default = "default_menu_button")]
    pub menu_button: String,
    #[serde(default = "default_menu")]
    pub menu: String,
    #[serde(default = "default_links")]
    pub links: String,
    #[serde(default = "default_header")]
    pub header: String,
    /// Section ids scanned for active-link tracking, in document order
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,
    /// Extra offset added to scrollY when picking the active section
    #[serde(default = "default_active_offset")]
    pub active_offset: f64,
    /// Fixed offset added to the header height for smooth scrolling
    #[serde(default = "default_scroll_offset")]
    pub scroll_offset: f64,
    #[serde(default = "default_scroll_duration")]
    pub scroll_duration_ms: u64,
    #[serde(default)]
    pub scroll_easing: EasingType,
    /// Delay before the menu closes after a link click on mobile
    #[serde(default = "default_close_delay")]
    pub close_delay_ms: u64,
    /// scrollY beyond which the header gets the `scrolled` class
    #[serde(default = "default_scrolled_threshold")]
    pub scrolled_threshold: f64,
    /// Jump instead of tweening when reduced motion is preferred
    #[serde(default = "default_true")]
    pub respect_reduced_motion: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            menu_button: default_menu_button(),
            menu: default_menu(),
            links: default_links(),
            header: default_header(),
            sections: default_sections(),
            active_offset: default_active_offset(),
            scroll_offset: default_scroll_offset(),
            scroll_duration_ms: default_scroll_duration(),
            scroll_easing: EasingType::default(),
            close_delay_ms: default_close_delay(),
            scrolled_threshold: default_scrolled_threshold(),
            respect_reduced_motion: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_base_duration")]
    pub base_duration_ms: u64,
    /// Timing function used for every entrance transition
    #[serde(default = "default_easing_curve")]
    pub easing_curve: String,
    /// Intersection ratio that triggers a reveal
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Pixels trimmed from the bottom of the viewport before intersecting
    #[serde(default = "default_root_margin_bottom")]
    pub root_margin_bottom: f64,
    #[serde(default = "default_animation_targets")]
    pub targets: Vec<String>,
    #[serde(default = "default_hover_targets")]
    pub hover_targets: Vec<String>,
    #[serde(default = "default_screen_stagger")]
    pub screen_stagger_ms: u64,
    #[serde(default = "default_cta_delay")]
    pub cta_delay_ms: u64,
    #[serde(default = "default_parallax_target")]
    pub parallax_target: String,
    #[serde(default = "default_parallax_factor")]
    pub parallax_factor: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            base_duration_ms: default_base_duration(),
            easing_curve: default_easing_curve(),
            threshold: default_threshold(),
            root_margin_bottom: default_root_margin_bottom(),
            targets: default_animation_targets(),
            hover_targets: default_hover_targets(),
            screen_stagger_ms: default_screen_stagger(),
            cta_delay_ms: default_cta_delay(),
            parallax_target: default_parallax_target(),
            parallax_factor: default_parallax_factor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancerConfig {
    /// Pointer tilt is disabled below this viewport width
    #[serde(default = "default_tilt_min_width")]
    pub tilt_min_width: f64,
    #[serde(default = "default_pulse_interval")]
    pub pulse_interval_ms: u64,
    #[serde(default = "default_button_ripple")]
    pub button_ripple_ms: u64,
    #[serde(default = "default_laptop_ripple")]
    pub laptop_ripple_ms: u64,
    #[serde(default = "default_resize_debounce")]
    pub resize_debounce_ms: u64,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            tilt_min_width: default_tilt_min_width(),
            pulse_interval_ms: default_pulse_interval(),
            button_ripple_ms: default_button_ripple(),
            laptop_ripple_ms: default_laptop_ripple(),
            resize_debounce_ms: default_resize_debounce(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// How long the error notification stays on screen
    #[serde(default = "default_error_dismiss")]
    pub error_dismiss_ms: u64,
    /// Mark below-the-fold images as lazily loaded after `load`
    #[serde(default = "default_true")]
    pub lazy_images: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            error_dismiss_ms: default_error_dismiss(),
            lazy_images: default_true(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_resize_debounce() -> u64 {
    250
}

fn default_scroll_throttle() -> u64 {
    16 // ~60fps
}

fn default_menu_button() -> String { "#mobileMenuBtn".to_string() }
fn default_menu() -> String { "#mainNav".to_string() }
fn default_links() -> String { "nav a[href^=\"#\"]".to_string() }
fn default_header() -> String { "header".to_string() }

fn default_sections() -> Vec<String> {
    ["home", "about", "services", "testimonials", "contact"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_active_offset() -> f64 {
    100.0
}

fn default_scroll_offset() -> f64 {
    80.0
}

fn default_scroll_duration() -> u64 {
    800
}

fn default_close_delay() -> u64 {
    300
}

fn default_scrolled_threshold() -> f64 {
    50.0
}

fn default_base_duration() -> u64 {
    600
}

fn default_easing_curve() -> String {
    "cubic-bezier(0.4, 0, 0.2, 1)".to_string()
}

fn default_threshold() -> f64 {
    0.1
}

fn default_root_margin_bottom() -> f64 {
    50.0
}

fn default_animation_targets() -> Vec<String> {
    [".hero h1", ".laptop-frame", ".cta-button", ".animate-on-scroll"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_hover_targets() -> Vec<String> {
    [".service-card", ".testimonial-card", ".feature-card"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_screen_stagger() -> u64 {
    100
}

fn default_cta_delay() -> u64 {
    200
}

fn default_parallax_target() -> String {
    ".hero-visual".to_string()
}

fn default_parallax_factor() -> f64 {
    0.3
}

fn default_tilt_min_width() -> f64 {
    768.0
}

fn default_pulse_interval() -> u64 {
    10_000
}

fn default_button_ripple() -> u64 {
    600
}

fn default_laptop_ripple() -> u64 {
    800
}

fn default_error_dismiss() -> u64 {
    10_000
}

impl SiteConfig {
    /// Load configuration from the default path or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::from_path(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit TOML file
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Parse configuration embedded in a page (e.g. a data attribute)
    pub fn from_json_str(content: &str) -> crate::Result<Self> {
        serde_json::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to the default path
    pub fn save(&self) -> crate::Result<PathBuf> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&config_path, self.to_toml_string()?)?;

        Ok(config_path)
    }

    /// Get the configuration file path
    /// Always uses ~/.config/sitekit/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("sitekit")
            .join("config.toml")
    }
}
