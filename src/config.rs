//! Construction-time configuration for a browser-like window.

use crate::policy::PolicyOverride;
use crate::session::SessionOptions;

/// Passthrough options for native window creation.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOptions {
    pub title: String,
    pub resizable: bool,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "tabshell".to_string(),
            resizable: true,
        }
    }
}

/// Recognized construction-time options.
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    /// Height of the fixed control surface at the top of the window.
    pub control_height: u32,
    /// Document location for the control surface. Empty means the
    /// bundled control page.
    pub control_url: String,
    pub control_session_options: SessionOptions,
    /// Defaults for content-surface sessions.
    pub session_options: SessionOptions,
    pub window_options: WindowOptions,
    /// Opened in a fresh tab on the control-ready handshake.
    pub start_page: String,
    /// Loaded into the replacement tab when the last tab closes.
    pub blank_page: String,
    /// Initial title for every freshly created tab.
    pub blank_title: String,
    /// Wholesale replacement for the built-in window-open policy.
    pub open_policy: Option<PolicyOverride>,
    /// Opens developer tooling on control and content surfaces.
    pub debug: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 800,
            control_height: 130,
            control_url: String::new(),
            control_session_options: SessionOptions::default(),
            session_options: SessionOptions::default(),
            window_options: WindowOptions::default(),
            start_page: String::new(),
            blank_page: String::new(),
            blank_title: "about:blank".to_string(),
            open_policy: None,
            debug: false,
        }
    }
}
