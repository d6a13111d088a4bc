//! tabshell — a browser-like window.
//!
//! One top-level window holds a fixed control surface (address bar,
//! tab strip) and a stack of interchangeable content surfaces, one per
//! loaded page. This crate is the tab lifecycle and
//! state-synchronization core: surface registry, navigation-state
//! store, the control-surface sync channel, and the window-open
//! policy. Rendering is delegated to the native webview runtime
//! behind the `PageSession` seam (wry/tao under the `gui` feature).

pub mod channel;
pub mod config;
pub mod managers;
pub mod policy;
pub mod session;
pub mod types;

#[cfg(feature = "gui")]
pub mod ui;
