pub mod config;
pub mod dom;
pub mod error;
pub mod event;
pub mod notify;
pub mod observer;
pub mod scheduler;

pub use config::{EasingType, SiteConfig};
pub use dom::{Dom, HeadlessDom, ListenTarget, NodeId, PageFixture, Rect, Viewport};
pub use error::{Error, Result};
pub use event::{EventKind, Key, UiEvent};
pub use notify::{Notification, NotificationBus};
pub use observer::{IntersectionEntry, IntersectionObserver};
pub use scheduler::{Scheduler, TimerId};
