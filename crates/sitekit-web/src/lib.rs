//! Browser host: runs the interactivity layer against the live document
//!
//! Build with `wasm-pack build crates/sitekit-web --target web` and load the
//! generated module from the page. The `#[wasm_bindgen(start)]` entry boots the
//! runtime, so no JavaScript glue beyond the import is needed.

pub mod events;

#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(target_arch = "wasm32")]
mod console;
#[cfg(target_arch = "wasm32")]
mod host;

#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserDom, EventQueue, RawEvent};
