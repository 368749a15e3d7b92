//! Replay scripts: a TOML `[[step]]` list of host interactions

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use sitekit_core::{Dom, HeadlessDom, Key, NodeId, UiEvent};

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Ready,
    Load,
    Resize { width: f64, height: f64 },
    /// Swap width and height
    Orientation,
    Scroll { y: f64 },
    Click {
        selector: String,
        x: Option<f64>,
        y: Option<f64>,
    },
    Dblclick { selector: String },
    Hover { selector: String },
    Leave { selector: String },
    Move { selector: String, x: f64, y: f64 },
    TouchStart { selector: String },
    TouchEnd { selector: String },
    Key { key: String, selector: Option<String> },
    Wait { ms: f64 },
    Visibility { hidden: bool },
    ReducedMotion { enabled: bool },
    Error { message: String, stack: Option<String> },
    Rejection { reason: String },
}

impl Script {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid replay script")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::from_toml_str(&content)
    }
}

impl Step {
    /// Apply host-side state changes and build the event to deliver
    ///
    /// `Wait` is handled by the caller and yields `None`.
    pub fn to_event(&self, dom: &mut HeadlessDom) -> Result<Option<UiEvent>> {
        let event = match self {
            Step::Ready => UiEvent::DomReady,
            Step::Load => UiEvent::Load,
            Step::Resize { width, height } => {
                dom.set_viewport(*width, *height);
                UiEvent::Resize
            }
            Step::Orientation => {
                let viewport = dom.viewport();
                dom.set_viewport(viewport.height, viewport.width);
                UiEvent::OrientationChange
            }
            Step::Scroll { y } => {
                dom.scroll_to(*y);
                UiEvent::Scroll
            }
            Step::Click { selector, x, y } => {
                let target = resolve(dom, selector)?;
                let (cx, cy) = dom.bounding_rect(target).center();
                UiEvent::Click {
                    target,
                    x: x.unwrap_or(cx),
                    y: y.unwrap_or(cy),
                }
            }
            Step::Dblclick { selector } => {
                let target = resolve(dom, selector)?;
                let (x, y) = dom.bounding_rect(target).center();
                UiEvent::DoubleClick { target, x, y }
            }
            Step::Hover { selector } => UiEvent::PointerEnter {
                target: resolve(dom, selector)?,
            },
            Step::Leave { selector } => UiEvent::PointerLeave {
                target: resolve(dom, selector)?,
                related: None,
            },
            Step::Move { selector, x, y } => UiEvent::PointerMove {
                target: resolve(dom, selector)?,
                x: *x,
                y: *y,
            },
            Step::TouchStart { selector } => {
                let target = resolve(dom, selector)?;
                let (x, y) = dom.bounding_rect(target).center();
                UiEvent::TouchStart { target, x, y }
            }
            Step::TouchEnd { selector } => {
                let target = resolve(dom, selector)?;
                let (x, y) = dom.bounding_rect(target).center();
                UiEvent::TouchEnd { target, x, y }
            }
            Step::Key { key, selector } => {
                let target = match selector {
                    Some(selector) => {
                        let target = resolve(dom, selector)?;
                        dom.focus(target);
                        Some(target)
                    }
                    None => dom.active_element(),
                };
                UiEvent::KeyDown {
                    key: Key::from_dom(key),
                    target,
                }
            }
            Step::Wait { .. } => return Ok(None),
            Step::Visibility { hidden } => {
                dom.set_hidden(*hidden);
                UiEvent::VisibilityChange { hidden: *hidden }
            }
            Step::ReducedMotion { enabled } => {
                dom.set_reduced_motion(*enabled);
                UiEvent::ReducedMotionChange { reduce: *enabled }
            }
            Step::Error { message, stack } => UiEvent::ScriptError {
                message: message.clone(),
                stack: stack.clone(),
            },
            Step::Rejection { reason } => UiEvent::UnhandledRejection {
                reason: reason.clone(),
            },
        };
        Ok(Some(event))
    }
}

fn resolve(dom: &HeadlessDom, selector: &str) -> Result<NodeId> {
    dom.query(selector)
        .ok_or_else(|| anyhow!("Selector '{}' matched no element", selector))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> HeadlessDom {
        let mut dom = HeadlessDom::new(1280.0, 800.0);
        let body = dom.body();
        dom.element(body, "a")
            .class("cta-button")
            .rect(100.0, 500.0, 200.0, 50.0)
            .finish();
        dom.element(body, "section").id("about").rect(0.0, 0.0, 1280.0, 3000.0).finish();
        dom
    }

    #[test]
    fn test_parse_steps() {
        let script = Script::from_toml_str(
            r##"
            [[step]]
            action = "ready"

            [[step]]
            action = "resize"
            width = 375
            height = 700

            [[step]]
            action = "click"
            selector = "#mobileMenuBtn"

            [[step]]
            action = "touch_start"
            selector = ".cta-button"

            [[step]]
            action = "reduced_motion"
            enabled = true

            [[step]]
            action = "wait"
            ms = 300
            "##,
        )
        .unwrap();

        assert_eq!(script.steps.len(), 6);
        assert_eq!(script.steps[0], Step::Ready);
        assert_eq!(script.steps[1], Step::Resize { width: 375.0, height: 700.0 });
        assert_eq!(
            script.steps[2],
            Step::Click {
                selector: "#mobileMenuBtn".to_string(),
                x: None,
                y: None
            }
        );
        assert_eq!(script.steps[5], Step::Wait { ms: 300.0 });
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result = Script::from_toml_str("[[step]]\naction = \"teleport\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_click_defaults_to_element_center() {
        let mut dom = page();
        let step = Step::Click {
            selector: ".cta-button".to_string(),
            x: None,
            y: None,
        };
        match step.to_event(&mut dom).unwrap() {
            Some(UiEvent::Click { x, y, .. }) => {
                assert_eq!(x, 200.0);
                assert_eq!(y, 525.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_missing_selector_fails() {
        let mut dom = page();
        let step = Step::Hover {
            selector: ".nowhere".to_string(),
        };
        let err = step.to_event(&mut dom).unwrap_err();
        assert!(err.to_string().contains(".nowhere"));
    }

    #[test]
    fn test_host_state_steps_update_the_document() {
        let mut dom = page();
        Step::Scroll { y: 400.0 }.to_event(&mut dom).unwrap();
        assert_eq!(dom.scroll_y(), 400.0);

        Step::Resize { width: 800.0, height: 1000.0 }.to_event(&mut dom).unwrap();
        Step::Orientation.to_event(&mut dom).unwrap();
        assert_eq!(dom.viewport().width, 1000.0);
        assert_eq!(dom.viewport().height, 800.0);

        assert!(Step::Wait { ms: 10.0 }.to_event(&mut dom).unwrap().is_none());
    }

    #[test]
    fn test_key_step_focuses_selector() {
        let mut dom = page();
        let step = Step::Key {
            key: "Enter".to_string(),
            selector: Some(".cta-button".to_string()),
        };
        let event = step.to_event(&mut dom).unwrap();
        let button = dom.query(".cta-button");
        assert_eq!(dom.active_element(), button);
        assert!(matches!(event, Some(UiEvent::KeyDown { key: Key::Enter, .. })));
    }
}
