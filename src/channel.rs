//! SyncChannel: the message-typed, bidirectional protocol between one
//! control surface and its manager.
//!
//! Messages are tagged by name and carry a small payload. Each manager
//! instance owns its own `ChannelState`; the control surface's reply
//! handle is captured on the `control-ready` handshake and used for
//! every subsequent notification. Before the handshake, notifications
//! are simply not deliverable and are dropped, not queued.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::session::SessionOptions;
use crate::types::tab::{Tab, TabId, TabsSnapshot};

/// Control→manager commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload", rename_all = "kebab-case")]
pub enum ControlMessage {
    /// Handshake; captures the reply handle and opens the configured
    /// start page in a fresh tab.
    ControlReady,
    /// Updates the active tab's address-bar value only.
    UrlChange { url: String },
    /// Triggers navigation on the active tab.
    UrlEnter { url: String },
    /// Forwards a named action (back/forward/reload/stop) to the
    /// active tab.
    #[serde(rename_all = "camelCase")]
    Act { action_name: String },
    #[serde(rename_all = "camelCase")]
    NewTab {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        session_options: Option<SessionOptions>,
    },
    SwitchTab { id: TabId },
    CloseTab { id: TabId },
}

impl ControlMessage {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Manager→control notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload", rename_all = "kebab-case")]
pub enum ControlNotification {
    ActiveUpdate { id: TabId },
    TabsUpdate { confs: BTreeMap<TabId, Tab>, tabs: Vec<TabId> },
}

impl ControlNotification {
    pub fn tabs_update(snapshot: TabsSnapshot) -> Self {
        ControlNotification::TabsUpdate {
            confs: snapshot.confs,
            tabs: snapshot.tabs,
        }
    }

    pub fn to_json(&self) -> String {
        // The notification enums contain only JSON-safe types.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// The manager's live reply handle to its control surface.
pub trait ControlEndpoint {
    fn notify(&self, notification: &ControlNotification);
}

/// Per-manager channel lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    /// Commands are accepted but no reply handle is addressable yet.
    Uninitialized,
    Ready,
    /// Irreversible; all listeners are considered detached.
    Terminated,
}

/// Holds the channel phase and at most one live reply handle.
pub struct ChannelState {
    phase: ChannelPhase,
    reply: Option<Box<dyn ControlEndpoint>>,
}

impl ChannelState {
    pub fn new() -> Self {
        Self {
            phase: ChannelPhase::Uninitialized,
            reply: None,
        }
    }

    pub fn phase(&self) -> ChannelPhase {
        self.phase
    }

    /// Captures the reply handle. A repeated handshake replaces the
    /// previous handle (the control surface reloaded).
    pub fn handshake(&mut self, reply: Box<dyn ControlEndpoint>) {
        if self.phase == ChannelPhase::Terminated {
            debug!("handshake after termination ignored");
            return;
        }
        self.reply = Some(reply);
        self.phase = ChannelPhase::Ready;
    }

    /// Delivers a notification to the control surface, or drops it
    /// silently when no handle is addressable.
    pub fn notify(&self, notification: &ControlNotification) {
        match (&self.phase, &self.reply) {
            (ChannelPhase::Ready, Some(reply)) => reply.notify(notification),
            _ => debug!(phase = ?self.phase, "notification dropped: no reply handle"),
        }
    }

    /// Detaches the reply handle for good.
    pub fn terminate(&mut self) {
        self.reply = None;
        self.phase = ChannelPhase::Terminated;
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}
