pub mod animations;
pub mod app;
pub mod enhancers;
pub mod helpers;
pub mod navigation;
pub mod page;
pub mod runtime;
pub mod scroll;
pub mod viewport;

#[cfg(test)]
mod testing;

pub use app::{App, Disposable, ErrorReport};
pub use page::{Page, Task};
pub use runtime::{Site, Snapshot};
pub use viewport::{Breakpoint, ViewportUtils};
