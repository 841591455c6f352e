//! Selection controller — flags nodes, reconciles host-supplied identities,
//! and coalesces rapid selection gestures into one debounced notification.

use bevy::prelude::*;

use crate::core::graph::{GraphModel, NodeId};

/// Quiet window before a selection gesture is reported downstream.
pub const SELECTION_DEBOUNCE_SECS: f32 = 0.1;

/// Payload of a coalesced selection notification: the most-recently-selected
/// node id, or None when the selection was cleared.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct SelectionChanged(pub Option<NodeId>);

/// Selection policy and the pending debounced notification. The selected set
/// itself is derived state: it lives in the node flags, never here.
#[derive(Resource)]
pub struct SelectionController {
    /// Single-selection by default; the interface stays additive-capable.
    pub multi_select: bool,
    pending: Option<Option<NodeId>>,
    timer: f32,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self { multi_select: false, pending: None, timer: 0.0 }
    }
}

impl SelectionController {
    /// Flag the node with the given id. Non-additive (or single-select
    /// policy) clears the prior selection first. Unknown ids are ignored.
    pub fn select(&mut self, graph: &mut GraphModel, id: &str, additive: bool) {
        if graph.index_of(id).is_none() {
            return;
        }
        if !additive || !self.multi_select {
            for node in graph.nodes_mut() {
                node.selected = false;
            }
        }
        for node in graph.nodes_mut() {
            if node.id == id {
                node.selected = true;
            }
        }
        self.queue(Some(id.to_string()));
    }

    /// Unflag everything and queue a cleared notification.
    pub fn clear(&mut self, graph: &mut GraphModel) {
        for node in graph.nodes_mut() {
            node.selected = false;
        }
        self.queue(None);
    }

    /// Pull externally-known selection back into local flags: a node is
    /// selected iff its id is in `external`. Returns whether any flag
    /// changed. No notification is queued — the change originated outside,
    /// so echoing it back would loop.
    pub fn reconcile(&self, graph: &mut GraphModel, external: &[NodeId]) -> bool {
        let mut changed = false;
        for node in graph.nodes_mut() {
            let should = external.iter().any(|id| *id == node.id);
            if node.selected != should {
                node.selected = should;
                changed = true;
            }
        }
        changed
    }

    /// A new gesture inside the debounce window replaces the pending one.
    fn queue(&mut self, payload: Option<NodeId>) {
        self.pending = Some(payload);
        self.timer = SELECTION_DEBOUNCE_SECS;
    }

    /// Advance the debounce timer; emits the coalesced payload once the
    /// quiet window elapses.
    pub fn tick(&mut self, dt: f32) -> Option<Option<NodeId>> {
        self.pending.as_ref()?;
        self.timer -= dt;
        if self.timer <= 0.0 {
            self.pending.take()
        } else {
            None
        }
    }
}
