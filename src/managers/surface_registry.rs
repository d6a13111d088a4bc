//! Owns the set of live content surfaces, the tab order, and the
//! single "currently active" pointer, and assigns geometry to the
//! active surface relative to the control surface.

use std::collections::HashMap;

use tracing::warn;

use crate::session::{PageSession, SessionFactory, SessionOptions, SurfaceBounds};
use crate::types::tab::TabId;

/// Window geometry the registry lays surfaces out against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Height of the fixed control surface at the top of the window.
    pub control_height: u32,
}

impl Viewport {
    /// Geometry of the content area: full width, everything below the
    /// control surface.
    pub fn content_bounds(&self) -> SurfaceBounds {
        SurfaceBounds {
            x: 0,
            y: self.control_height as i32,
            width: self.width,
            height: self.height.saturating_sub(self.control_height),
        }
    }
}

/// Registry of live content surfaces.
pub struct SurfaceRegistry {
    sessions: HashMap<TabId, Box<dyn PageSession>>,
    tab_order: Vec<TabId>,
    active: Option<TabId>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            tab_order: Vec::new(),
            active: None,
        }
    }

    /// Allocates a new surface and inserts it into the tab order:
    /// appended, or spliced immediately after `insert_after` when that
    /// id is still present.
    pub fn create(
        &mut self,
        factory: &mut dyn SessionFactory,
        options: &SessionOptions,
        insert_after: Option<TabId>,
    ) -> TabId {
        let session = factory.create(options);
        let id = session.id();
        self.sessions.insert(id, session);
        match insert_after.and_then(|after| self.order_index(after)) {
            Some(index) => self.tab_order.insert(index + 1, id),
            None => self.tab_order.push(id),
        }
        id
    }

    /// Detaches the previously active surface, attaches the surface
    /// for `id` with fresh layout, and moves the active pointer.
    ///
    /// Tolerates `id` referencing an already-destroyed surface: the
    /// pointer still updates, nothing is attached. Close relies on
    /// this during its activate-then-remove sequence.
    pub fn activate(&mut self, id: TabId, viewport: Viewport) {
        if let Some(previous) = self.active.filter(|prev| *prev != id) {
            if let Some(session) = self.sessions.get_mut(&previous) {
                session.set_visible(false);
            }
        }
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.set_bounds(viewport.content_bounds());
                session.set_visible(true);
            }
            None => warn!(%id, "activated surface has no live session"),
        }
        self.active = Some(id);
    }

    /// Reassigns geometry to the active surface (window resize).
    pub fn layout_active(&mut self, viewport: Viewport) {
        if let Some(session) = self.active.and_then(|id| self.sessions.get_mut(&id)) {
            session.set_bounds(viewport.content_bounds());
        }
    }

    /// Tears down the session for `id`. Idempotent: destroying an
    /// already-absent id is a no-op.
    pub fn destroy(&mut self, id: TabId) {
        if let Some(mut session) = self.sessions.remove(&id) {
            session.destroy();
        }
    }

    /// Removes `id` from the tab order without touching the session.
    pub fn remove_from_order(&mut self, id: TabId) {
        self.tab_order.retain(|entry| *entry != id);
    }

    /// The surface to activate when closing `id`: its immediate
    /// successor in order, wrapping to the first entry when `id` is
    /// last. For a sole remaining entry this is the entry itself.
    pub fn successor_of(&self, id: TabId) -> Option<TabId> {
        let index = self.order_index(id)?;
        let next = (index + 1) % self.tab_order.len();
        Some(self.tab_order[next])
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.tab_order.contains(&id)
    }

    pub fn has_session(&self, id: TabId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn order(&self) -> &[TabId] {
        &self.tab_order
    }

    pub fn active(&self) -> Option<TabId> {
        self.active
    }

    pub fn clear_active(&mut self) {
        self.active = None;
    }

    pub fn session(&self, id: TabId) -> Option<&dyn PageSession> {
        self.sessions.get(&id).map(|s| s.as_ref())
    }

    pub fn session_mut(&mut self, id: TabId) -> Option<&mut dyn PageSession> {
        match self.sessions.get_mut(&id) {
            Some(session) => Some(session.as_mut()),
            None => None,
        }
    }

    pub fn active_session_mut(&mut self) -> Option<&mut dyn PageSession> {
        let id = self.active?;
        self.session_mut(id)
    }

    /// Ids of every live session, for teardown.
    pub fn session_ids(&self) -> Vec<TabId> {
        self.sessions.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tab_order.is_empty()
    }

    fn order_index(&self, id: TabId) -> Option<usize> {
        self.tab_order.iter().position(|entry| *entry == id)
    }
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
