//! The seam between the lifecycle core and the native webview runtime.
//!
//! A `PageSession` is one loaded page: the core drives it through this
//! trait and receives its lifecycle signals as `SessionEvent`s. The
//! `gui` feature provides a wry-backed implementation; tests use an
//! in-memory fake.

use serde::{Deserialize, Serialize};

use crate::types::tab::TabId;

/// Per-session creation options, falling back to configured defaults
/// when a `new-tab` command carries none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionOptions {
    pub user_agent: Option<String>,
    pub incognito: bool,
    /// Script injected into every document the session loads.
    pub initialization_script: Option<String>,
}

/// Back/forward capability of a session at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavCaps {
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

/// Geometry assigned to the active surface, relative to the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Lifecycle/navigation signals delivered by a session's runtime.
///
/// For a single surface these arrive in the relative order listed;
/// the core performs no reordering or coalescing.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    /// A navigation began somewhere in the page.
    LoadStarted,
    /// A navigation started; only main-frame navigations update state.
    Navigated { url: String, is_main_frame: bool },
    /// The in-flight navigation was redirected.
    Redirected { url: String },
    TitleChanged { title: String },
    /// The page's favicon candidate list changed. May be empty.
    FaviconsUpdated { candidates: Vec<String> },
    LoadFinished,
    /// The document became interactive; the surface should take focus.
    DocumentReady,
}

/// A signal tagged with the surface it originated from.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub id: TabId,
    pub signal: SessionSignal,
}

/// One live page session. Navigation and teardown are fire-and-forget
/// against the underlying runtime; results come back as signals.
pub trait PageSession {
    fn id(&self) -> TabId;

    /// Begins navigation. An in-flight navigation is superseded, not
    /// cancelled.
    fn navigate(&mut self, url: &str);

    /// Actual current location, `None` until the first navigation.
    fn current_url(&self) -> Option<String>;

    fn caps(&self) -> NavCaps;

    fn go_back(&mut self);
    fn go_forward(&mut self);
    fn reload(&mut self);
    fn stop(&mut self);

    /// Gives the surface input focus.
    fn focus(&mut self);

    fn set_bounds(&mut self, bounds: SurfaceBounds);

    /// Attaches or detaches the surface from the window's visible
    /// surface stack.
    fn set_visible(&mut self, visible: bool);

    /// Tears down the underlying runtime resources.
    fn destroy(&mut self);
}

/// Allocates page sessions. Identifiers are monotonic and never
/// recycled while the factory lives.
pub trait SessionFactory {
    fn create(&mut self, options: &SessionOptions) -> Box<dyn PageSession>;
}
