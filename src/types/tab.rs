use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for one content surface, equal to its underlying page
/// session's identifier. Never recycled within a process lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Navigation-state record for one content surface.
///
/// `url` is the address-bar value (may be edited ahead of actual
/// navigation); `href` is the actual current location of the loaded
/// document. Field names are camelCased on the wire because the
/// control surface consumes them directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub url: String,
    pub href: String,
    pub title: String,
    pub favicon: String,
    pub is_loading: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

/// Partial update merged onto an existing `Tab` record.
///
/// `can_go_back`/`can_go_forward` are deliberately absent: they are
/// refreshed from the live session on every merge, never patched.
#[derive(Debug, Clone, Default)]
pub struct TabPatch {
    pub url: Option<String>,
    pub href: Option<String>,
    pub title: Option<String>,
    pub favicon: Option<String>,
    pub is_loading: Option<bool>,
}

/// The full `(records, order)` pair pushed to the control surface on
/// every state change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabsSnapshot {
    pub confs: BTreeMap<TabId, Tab>,
    pub tabs: Vec<TabId>,
}
