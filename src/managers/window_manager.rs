//! Top-level coordinator for one browser-like window: receives
//! SyncChannel commands, mutates the surface registry and navigation
//! state, applies the window-open policy on outbound navigation, and
//! emits lifecycle events to external observers.
//!
//! Every mutating operation ends with an explicit snapshot publish to
//! the control surface; nothing is diffed or batched.

use tracing::{debug, warn};

use crate::channel::{ChannelState, ControlEndpoint, ControlMessage, ControlNotification};
use crate::config::WindowConfig;
use crate::managers::state_store::{NavigationStateStore, SignalEffect};
use crate::managers::surface_registry::{SurfaceRegistry, Viewport};
use crate::policy::{self, Disposition, FrameContext, OpenDecision};
use crate::session::{NavCaps, SessionEvent, SessionFactory, SessionOptions};
use crate::types::errors::SurfaceError;
use crate::types::tab::{Tab, TabId, TabPatch, TabsSnapshot};

/// Lifecycle events for host application code, not the control
/// surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    ControlReady,
    NewTab {
        opened_url: String,
        previous_active: Option<TabId>,
    },
    UrlUpdated {
        surface: TabId,
        href: String,
    },
    Closed,
}

pub struct BrowserLikeWindowManager {
    config: WindowConfig,
    registry: SurfaceRegistry,
    store: NavigationStateStore,
    channel: ChannelState,
    factory: Box<dyn SessionFactory>,
    observers: Vec<Box<dyn Fn(&ManagerEvent)>>,
    viewport: Viewport,
    terminated: bool,
}

impl BrowserLikeWindowManager {
    pub fn new(config: WindowConfig, factory: Box<dyn SessionFactory>) -> Self {
        let viewport = Viewport {
            width: config.width,
            height: config.height,
            control_height: config.control_height,
        };
        let store = NavigationStateStore::new(config.blank_title.clone());
        Self {
            config,
            registry: SurfaceRegistry::new(),
            store,
            channel: ChannelState::new(),
            factory,
            observers: Vec::new(),
            viewport,
            terminated: false,
        }
    }

    /// Registers an external observer for manager lifecycle events.
    pub fn subscribe(&mut self, observer: impl Fn(&ManagerEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Dispatches one control-surface command. The reply handle is
    /// captured on the `control-ready` handshake; commands arriving
    /// earlier are processed but their notifications are inert.
    pub fn handle_message(
        &mut self,
        message: ControlMessage,
        reply: Option<Box<dyn ControlEndpoint>>,
    ) {
        if self.terminated {
            debug!(?message, "command after termination ignored");
            return;
        }
        match message {
            ControlMessage::ControlReady => {
                if let Some(reply) = reply {
                    self.channel.handshake(reply);
                }
                self.emit(&ManagerEvent::ControlReady);
                let start = self.config.start_page.clone();
                let url = (!start.is_empty()).then_some(start);
                self.new_tab(url.as_deref(), None, None);
            }
            ControlMessage::UrlChange { url } => self.set_address_bar(&url),
            ControlMessage::UrlEnter { url } => self.load_url(&url),
            ControlMessage::Act { action_name } => self.perform_action(&action_name),
            ControlMessage::NewTab { url, session_options } => {
                self.new_tab(url.as_deref(), None, session_options);
            }
            ControlMessage::SwitchTab { id } => {
                self.activate(id);
                self.publish_snapshot();
            }
            ControlMessage::CloseTab { id } => self.close_tab(id),
        }
    }

    /// Applies one session lifecycle signal and republishes state.
    pub fn handle_signal(&mut self, event: SessionEvent) {
        if self.terminated || !self.store.is_wired(event.id) {
            return;
        }
        let caps = self.caps_of(event.id);
        let effect = self.store.apply(event.id, event.signal, caps);
        self.publish_snapshot();
        match effect {
            SignalEffect::UrlUpdated { href } => {
                self.emit(&ManagerEvent::UrlUpdated { surface: event.id, href });
            }
            SignalEffect::FocusSurface => {
                if let Some(session) = self.registry.session_mut(event.id) {
                    session.focus();
                }
            }
            SignalEffect::None => {}
        }
    }

    /// Decides a page's attempt to open a new window. `OpenAsNewTab`
    /// creates the tab here, synchronously, spliced immediately after
    /// the opener; the caller must still deny the original request.
    pub fn on_new_window(
        &mut self,
        url: &str,
        disposition: Disposition,
        ctx: FrameContext,
    ) -> OpenDecision {
        let decision = match &self.config.open_policy {
            Some(custom) => custom(url, disposition, &ctx),
            None => policy::decide(url, disposition, &ctx),
        };
        if decision == OpenDecision::OpenAsNewTab {
            self.new_tab(Some(url), ctx.opener, None);
        }
        decision
    }

    /// Creates a content surface: initial record with the configured
    /// blank title, spliced into the order, activated, and — when a
    /// URL is given — navigated.
    pub fn new_tab(
        &mut self,
        url: Option<&str>,
        insert_after: Option<TabId>,
        session_options: Option<SessionOptions>,
    ) -> TabId {
        let previous_active = self.registry.active();
        let options = session_options.unwrap_or_else(|| self.config.session_options.clone());
        let id = self
            .registry
            .create(self.factory.as_mut(), &options, insert_after);
        self.store.init(id);
        self.activate(id);
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.load_url(url);
        }
        self.emit(&ManagerEvent::NewTab {
            opened_url: url.unwrap_or_default().to_string(),
            previous_active,
        });
        self.publish_snapshot();
        id
    }

    /// Activates `id`: detaches the previous surface, attaches and
    /// lays out the new one, and notifies the control surface.
    pub fn activate(&mut self, id: TabId) {
        self.registry.activate(id, self.viewport);
        self.channel.notify(&ControlNotification::ActiveUpdate { id });
    }

    /// Closes `id`, reassigning activation first when it is the
    /// active surface. Closing the sole remaining tab replaces it
    /// with a fresh blank one.
    pub fn close_tab(&mut self, id: TabId) {
        if !self.registry.contains(id) {
            // Stale id: drop any leftover record and session, leave
            // the order and active pointer untouched.
            self.registry.destroy(id);
            self.store.remove(id);
            self.publish_snapshot();
            return;
        }
        if self.registry.active() == Some(id) {
            if let Some(next) = self.registry.successor_of(id) {
                self.activate(next);
            }
        }
        self.registry.remove_from_order(id);
        self.registry.destroy(id);
        self.store.remove(id);
        if self.registry.is_empty() {
            let blank = self.config.blank_page.clone();
            let url = (!blank.is_empty()).then_some(blank);
            self.new_tab(url.as_deref(), None, None);
        } else {
            self.publish_snapshot();
        }
    }

    /// Navigates the active surface, wiring its lifecycle bindings on
    /// the first navigation only.
    pub fn load_url(&mut self, target: &str) {
        if target.is_empty() {
            return;
        }
        let Some(active) = self.registry.active() else {
            return;
        };
        if self.store.mark_wired(active) {
            debug!(surface = %active, "wired navigation bindings");
        }
        if let Some(session) = self.registry.session_mut(active) {
            session.navigate(target);
        }
    }

    /// Forwards a named control action to the active surface.
    /// Unsupported names are logged and skipped; a missing active
    /// surface is a benign race and is ignored.
    pub fn perform_action(&mut self, name: &str) {
        let Some(session) = self.registry.active_session_mut() else {
            debug!(action = name, "no active surface for action");
            return;
        };
        match name {
            "back" => session.go_back(),
            "forward" => session.go_forward(),
            "reload" => {
                // Reloading a session that never loaded anything
                // would reload it into a blank state.
                if session.current_url().filter(|u| !u.is_empty()).is_some() {
                    session.reload();
                }
            }
            "stop" => session.stop(),
            other => warn!(action = other, "unsupported control action"),
        }
    }

    /// Updates the active tab's address-bar value only.
    fn set_address_bar(&mut self, url: &str) {
        let Some(active) = self.registry.active() else {
            return;
        };
        let caps = self.caps_of(active);
        self.store.merge(
            active,
            TabPatch { url: Some(url.to_string()), ..TabPatch::default() },
            caps,
        );
        self.publish_snapshot();
    }

    /// Window resize: reassigns geometry to the active surface.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport.width = width;
        self.viewport.height = height;
        self.registry.layout_active(self.viewport);
    }

    /// Window closed: detaches the channel, destroys every live
    /// surface, and emits `Closed`. Irreversible.
    pub fn shutdown(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.channel.terminate();
        for id in self.registry.session_ids() {
            self.registry.destroy(id);
            self.registry.remove_from_order(id);
            self.store.remove(id);
        }
        self.registry.clear_active();
        self.emit(&ManagerEvent::Closed);
    }

    pub fn active(&self) -> Option<TabId> {
        self.registry.active()
    }

    pub fn tab_order(&self) -> &[TabId] {
        self.registry.order()
    }

    pub fn snapshot(&self) -> TabsSnapshot {
        self.store.snapshot(self.registry.order())
    }

    /// One tab's navigation-state record, for host application code.
    pub fn tab(&self, id: TabId) -> Result<&Tab, SurfaceError> {
        if self.terminated {
            return Err(SurfaceError::Terminated);
        }
        self.store.get(id).ok_or(SurfaceError::NotFound(id.0))
    }

    pub fn is_wired(&self, id: TabId) -> bool {
        self.store.is_wired(id)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn caps_of(&self, id: TabId) -> NavCaps {
        self.registry
            .session(id)
            .map(|s| s.caps())
            .unwrap_or_default()
    }

    fn publish_snapshot(&mut self) {
        let snapshot = self.store.snapshot(self.registry.order());
        self.channel
            .notify(&ControlNotification::tabs_update(snapshot));
    }

    fn emit(&self, event: &ManagerEvent) {
        for observer in &self.observers {
            observer(event);
        }
    }
}
