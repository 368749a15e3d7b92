use crate::dom::NodeId;

/// Keyboard keys the interactivity layer reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Tab,
    Other(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Key::Escape,
            "Enter" => Key::Enter,
            " " | "Spacebar" | "Space" => Key::Space,
            "Tab" => Key::Tab,
            other => Key::Other(other.to_string()),
        }
    }

    /// Enter and Space activate buttons
    pub fn is_activation(&self) -> bool {
        matches!(self, Key::Enter | Key::Space)
    }
}

/// Listener categories a module can register for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Resize,
    OrientationChange,
    Scroll,
    Click,
    DoubleClick,
    PointerEnter,
    PointerLeave,
    PointerMove,
    TouchStart,
    TouchEnd,
    KeyDown,
    VisibilityChange,
    ReducedMotionChange,
}

/// Host events delivered to the runtime
///
/// Pointer and touch coordinates are viewport-relative (`clientX`/`clientY`).
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// The document finished parsing
    DomReady,
    /// Every resource finished loading
    Load,
    Resize,
    OrientationChange,
    Scroll,
    Click { target: NodeId, x: f64, y: f64 },
    DoubleClick { target: NodeId, x: f64, y: f64 },
    PointerEnter { target: NodeId },
    PointerLeave { target: NodeId, related: Option<NodeId> },
    PointerMove { target: NodeId, x: f64, y: f64 },
    TouchStart { target: NodeId, x: f64, y: f64 },
    TouchEnd { target: NodeId, x: f64, y: f64 },
    KeyDown { key: Key, target: Option<NodeId> },
    VisibilityChange { hidden: bool },
    ReducedMotionChange { reduce: bool },
    ScriptError { message: String, stack: Option<String> },
    UnhandledRejection { reason: String },
}

impl UiEvent {
    pub fn kind(&self) -> Option<EventKind> {
        let kind = match self {
            UiEvent::Resize => EventKind::Resize,
            UiEvent::OrientationChange => EventKind::OrientationChange,
            UiEvent::Scroll => EventKind::Scroll,
            UiEvent::Click { .. } => EventKind::Click,
            UiEvent::DoubleClick { .. } => EventKind::DoubleClick,
            UiEvent::PointerEnter { .. } => EventKind::PointerEnter,
            UiEvent::PointerLeave { .. } => EventKind::PointerLeave,
            UiEvent::PointerMove { .. } => EventKind::PointerMove,
            UiEvent::TouchStart { .. } => EventKind::TouchStart,
            UiEvent::TouchEnd { .. } => EventKind::TouchEnd,
            UiEvent::KeyDown { .. } => EventKind::KeyDown,
            UiEvent::VisibilityChange { .. } => EventKind::VisibilityChange,
            UiEvent::ReducedMotionChange { .. } => EventKind::ReducedMotionChange,
            UiEvent::DomReady
            | UiEvent::Load
            | UiEvent::ScriptError { .. }
            | UiEvent::UnhandledRejection { .. } => return None,
        };
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_dom() {
        assert_eq!(Key::from_dom("Escape"), Key::Escape);
        assert_eq!(Key::from_dom("Esc"), Key::Escape);
        assert_eq!(Key::from_dom(" "), Key::Space);
        assert_eq!(Key::from_dom("a"), Key::Other("a".to_string()));
        assert!(Key::Enter.is_activation());
        assert!(!Key::Tab.is_activation());
    }

    #[test]
    fn test_lifecycle_events_have_no_listener_kind() {
        assert_eq!(UiEvent::DomReady.kind(), None);
        assert_eq!(UiEvent::Scroll.kind(), Some(EventKind::Scroll));
    }
}
