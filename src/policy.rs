//! Window-open policy: decides whether a page's attempt to open a new
//! window becomes a new tab, a native window, or is denied.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::tab::TabId;

/// How the page asked for the target to be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    Default,
    ForegroundTab,
    BackgroundTab,
    NewWindow,
    Other,
}

/// Context of the frame that issued the open request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameContext {
    /// The surface the request originated from.
    pub opener: Option<TabId>,
    pub is_main_frame: bool,
    pub user_gesture: bool,
}

/// Outcome of a window-open decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenDecision {
    /// The request is dropped entirely.
    Deny,
    /// A genuine new top-level window may open outside the tab model.
    AllowWindow,
    /// The manager opens the target as a new tab spliced immediately
    /// after the opener; the original request is denied.
    OpenAsNewTab,
}

/// A wholesale replacement for [`decide`]. When configured, the
/// built-in decision is bypassed entirely.
pub type PolicyOverride = Box<dyn Fn(&str, Disposition, &FrameContext) -> OpenDecision>;

/// Built-in decision function.
///
/// Targets without a resolvable host (e.g. a bare `about:blank`
/// popup) are denied outright. An explicit `new-window` disposition is
/// allowed to open a native window; everything else is rerouted into
/// the tab model.
pub fn decide(target: &str, disposition: Disposition, _ctx: &FrameContext) -> OpenDecision {
    let has_host = Url::parse(target)
        .ok()
        .map(|u| u.host_str().is_some())
        .unwrap_or(false);
    if !has_host {
        return OpenDecision::Deny;
    }
    if disposition == Disposition::NewWindow {
        return OpenDecision::AllowWindow;
    }
    OpenDecision::OpenAsNewTab
}
