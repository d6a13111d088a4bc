//! Sole writer of `Tab` records.
//!
//! Partial updates are merged onto the existing record (creating one
//! if absent), and `canGoBack`/`canGoForward` are refreshed from the
//! live session on every merge — even when the incoming patch does not
//! target them — so stale capability flags never persist.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::session::{NavCaps, SessionSignal};
use crate::types::tab::{Tab, TabId, TabPatch, TabsSnapshot};

/// What the manager should do after a merge, beyond republishing.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalEffect {
    None,
    /// The surface's actual location changed; observers are told.
    UrlUpdated { href: String },
    /// The document is ready; the surface should take input focus.
    FocusSurface,
}

pub struct NavigationStateStore {
    confs: HashMap<TabId, Tab>,
    /// Surfaces whose lifecycle signals are wired. Signals from
    /// unwired surfaces are dropped, and wiring happens at most once
    /// per surface, so same-tab URL re-entry never doubles listeners.
    wired: HashSet<TabId>,
    blank_title: String,
}

impl NavigationStateStore {
    pub fn new(blank_title: impl Into<String>) -> Self {
        Self {
            confs: HashMap::new(),
            wired: HashSet::new(),
            blank_title: blank_title.into(),
        }
    }

    /// Creates the initial record for a freshly created surface.
    pub fn init(&mut self, id: TabId) {
        self.confs.insert(
            id,
            Tab {
                title: self.blank_title.clone(),
                ..Tab::default()
            },
        );
    }

    /// Marks `id` as wired. Returns `true` only the first time.
    pub fn mark_wired(&mut self, id: TabId) -> bool {
        self.wired.insert(id)
    }

    pub fn is_wired(&self, id: TabId) -> bool {
        self.wired.contains(&id)
    }

    /// Merges a partial update, creating the record if absent, and
    /// refreshes capability flags from `caps` unconditionally.
    pub fn merge(&mut self, id: TabId, patch: TabPatch, caps: NavCaps) -> &Tab {
        let tab = self.confs.entry(id).or_default();
        if let Some(url) = patch.url {
            tab.url = url;
        }
        if let Some(href) = patch.href {
            tab.href = href;
        }
        if let Some(title) = patch.title {
            tab.title = title;
        }
        if let Some(favicon) = patch.favicon {
            tab.favicon = favicon;
        }
        if let Some(is_loading) = patch.is_loading {
            tab.is_loading = is_loading;
        }
        tab.can_go_back = caps.can_go_back;
        tab.can_go_forward = caps.can_go_forward;
        tab
    }

    /// Applies one lifecycle signal for a wired surface.
    ///
    /// Returns the follow-up effect for the manager. Signals for
    /// unwired surfaces are dropped.
    pub fn apply(&mut self, id: TabId, signal: SessionSignal, caps: NavCaps) -> SignalEffect {
        if !self.is_wired(id) {
            debug!(%id, ?signal, "signal for unwired surface dropped");
            return SignalEffect::None;
        }
        match signal {
            SessionSignal::LoadStarted => {
                self.merge(id, TabPatch { is_loading: Some(true), ..TabPatch::default() }, caps);
                SignalEffect::None
            }
            SessionSignal::Navigated { url, is_main_frame } => {
                if !is_main_frame {
                    // Sub-frame navigations never touch the record,
                    // but capability flags may still have shifted.
                    self.merge(id, TabPatch::default(), caps);
                    return SignalEffect::None;
                }
                self.merge(
                    id,
                    TabPatch {
                        url: Some(url.clone()),
                        href: Some(url.clone()),
                        ..TabPatch::default()
                    },
                    caps,
                );
                SignalEffect::UrlUpdated { href: url }
            }
            SessionSignal::Redirected { url } => {
                self.merge(
                    id,
                    TabPatch {
                        url: Some(url.clone()),
                        href: Some(url.clone()),
                        ..TabPatch::default()
                    },
                    caps,
                );
                SignalEffect::UrlUpdated { href: url }
            }
            SessionSignal::TitleChanged { title } => {
                self.merge(id, TabPatch { title: Some(title), ..TabPatch::default() }, caps);
                SignalEffect::None
            }
            SessionSignal::FaviconsUpdated { candidates } => {
                let favicon = candidates.into_iter().next().unwrap_or_default();
                self.merge(id, TabPatch { favicon: Some(favicon), ..TabPatch::default() }, caps);
                SignalEffect::None
            }
            SessionSignal::LoadFinished => {
                self.merge(id, TabPatch { is_loading: Some(false), ..TabPatch::default() }, caps);
                SignalEffect::None
            }
            SessionSignal::DocumentReady => SignalEffect::FocusSurface,
        }
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.confs.get(&id)
    }

    /// Drops the record and wiring marker for a destroyed surface.
    pub fn remove(&mut self, id: TabId) {
        self.confs.remove(&id);
        self.wired.remove(&id);
    }

    /// Full snapshot against the given tab order.
    pub fn snapshot(&self, order: &[TabId]) -> TabsSnapshot {
        let confs: BTreeMap<TabId, Tab> = self
            .confs
            .iter()
            .map(|(id, tab)| (*id, tab.clone()))
            .collect();
        TabsSnapshot { confs, tabs: order.to_vec() }
    }
}
