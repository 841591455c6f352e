//! Host boundary — tagged update requests from the embedding application,
//! the dispatch that orders merge → convert → re-seed → redraw, and the
//! persistence callback channel.

use bevy::prelude::*;
use serde_json::Value;

use crate::convert::{convert, ColumnRoles};
use crate::core::graph::GraphModel;
use crate::core::settings::{merge, Settings};
use crate::core::view_state::ViewState;
use crate::selection::{SelectionChanged, SelectionController};
use crate::sim::Simulation;

/// One host update, tagged with which facets changed. Facets left `None`
/// are untouched. Several requests in one frame coalesce facet by facet:
/// for each facet the latest request that carries it wins.
#[derive(Message, Debug, Clone, Default)]
pub struct UpdateRequest {
    pub rows: Option<Vec<Value>>,
    pub config: Option<Value>,
    pub viewport: Option<Vec2>,
}

/// Monotonic data generation. Bumped on every reconversion so stale
/// simulation ticks cannot write into a replaced model.
#[derive(Resource, Default)]
pub struct DataGeneration(pub u64);

/// The most recent host rows, kept so a `max_node_count` change can
/// reconvert without waiting for the host to resend data.
#[derive(Resource, Default)]
pub struct SourceRows(pub Vec<Value>);

/// The host's persisted configuration layer, merged under every incoming
/// configuration. Possibly stale or absent.
#[derive(Resource, Default)]
pub struct PersistedConfig(pub Value);

/// The latest incoming configuration, cached so the persisted layer is
/// applied even by updates that carry no fresh configuration.
#[derive(Resource, Default)]
pub struct IncomingConfig(pub Value);

/// View state restored by the host before the first data load. The selection
/// part is consumed when data first arrives; camera and search are consumed
/// by their own systems.
#[derive(Resource, Default)]
pub struct PendingViewState(pub Option<ViewState>);

/// Cheap redraw entry points, distinct from a full redraw. Set on every
/// update cycle; consumed by the render systems.
#[derive(Resource, Default)]
pub struct RedrawFlags {
    pub selection: bool,
    pub labels: bool,
}

impl RedrawFlags {
    /// Repaint highlight state without recomputing layout or labels.
    pub fn redraw_selection(&mut self) {
        self.selection = true;
    }

    /// Recompute label placement/text without touching node positions.
    pub fn redraw_labels(&mut self) {
        self.labels = true;
    }
}

/// What a selection notification asks the host to persist: either merge a
/// filter property in, or remove it. Mutually exclusive per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistRequest {
    Merge { filter: String },
    Remove,
}

/// Host-installed property-persistence callback. Fire-and-forget: the engine
/// never retries, and a missing sink is a no-op.
#[derive(Resource, Default)]
pub struct PersistenceSink(pub Option<Box<dyn Fn(&PersistRequest) + Send + Sync>>);

/// Processes the frame's coalesced [`UpdateRequest`]s in the fixed order
/// settings merge → data conversion → simulation re-seed/reheat → redraw
/// flags. A refresh that keeps the node-id set unchanged reheats the layout
/// with reduced energy instead of restarting it.
pub fn host_update_system(
    mut requests: MessageReader<UpdateRequest>,
    mut graph: ResMut<GraphModel>,
    mut settings: ResMut<Settings>,
    mut sim: ResMut<Simulation>,
    mut generation: ResMut<DataGeneration>,
    mut source_rows: ResMut<SourceRows>,
    mut incoming: ResMut<IncomingConfig>,
    mut pending: ResMut<PendingViewState>,
    mut flags: ResMut<RedrawFlags>,
    persisted: Res<PersistedConfig>,
    roles: Res<ColumnRoles>,
    controller: Res<SelectionController>,
) {
    // Coalesce facet by facet: the latest request carrying a facet wins,
    // but an earlier rows write survives a later config-only request.
    let mut request = UpdateRequest::default();
    let mut queued = false;
    for message in requests.read() {
        queued = true;
        if message.rows.is_some() {
            request.rows = message.rows.clone();
        }
        if message.config.is_some() {
            request.config = message.config.clone();
        }
        if message.viewport.is_some() {
            request.viewport = message.viewport;
        }
    }
    if !queued {
        return;
    }

    // Settings merge first: it decides whether data must be reconverted.
    // The persisted layer applies even when no fresh configuration arrived.
    if let Some(config) = request.config {
        incoming.0 = config;
    }
    let (effective, outcome) = merge(&settings, &persisted.0, &incoming.0);
    if *settings != effective {
        *settings = effective;
    }
    let reload_data = outcome.reload_data;
    let relayout = outcome.layout_changed;

    if let Some(size) = request.viewport {
        sim.resize(size.x, size.y);
    }

    let fresh_rows = request.rows.is_some();
    if let Some(rows) = request.rows {
        source_rows.0 = rows;
    }

    if fresh_rows || reload_data {
        let (nodes, links) = convert(&source_rows.0, &roles, &settings.layout);
        let same_nodes = nodes.len() == graph.nodes().len()
            && nodes.iter().all(|node| graph.index_of(&node.id).is_some());
        graph.set_data(nodes, links);
        if same_nodes && !relayout {
            // Same identities: perturb the converged layout, do not restart.
            sim.reheat();
        } else {
            generation.0 += 1;
            sim.reseed(generation.0);
        }
        info!(
            "[UPDATE] generation {}: {} node(s), {} link(s)",
            generation.0,
            graph.nodes().len(),
            graph.links().len()
        );

        // First data after a restore: pull the saved selection into flags.
        if let Some(state) = pending.0.as_mut() {
            if !state.selected.is_empty() {
                let selected = std::mem::take(&mut state.selected);
                controller.reconcile(&mut graph, &selected);
            }
        }
    } else if relayout {
        sim.reseed(generation.0);
    }

    if !settings.layout.animate {
        let current = generation.0;
        sim.settle(&mut graph, &settings.layout, current);
    }

    flags.redraw_selection();
    flags.redraw_labels();
}

/// Advances the physics one tick per frame while the layout is hot.
pub fn sim_tick_system(
    mut sim: ResMut<Simulation>,
    mut graph: ResMut<GraphModel>,
    settings: Res<Settings>,
    generation: Res<DataGeneration>,
) {
    if !settings.layout.animate {
        return;
    }
    sim.step(&mut graph, &settings.layout, generation.0);
}

/// Flushes the debounced selection notification: emits [`SelectionChanged`]
/// and asks the host to persist the clicked node's filter (or remove it on
/// clear).
pub fn selection_flush_system(
    time: Res<Time>,
    graph: Res<GraphModel>,
    mut controller: ResMut<SelectionController>,
    sink: Res<PersistenceSink>,
    mut changed: MessageWriter<SelectionChanged>,
) {
    let Some(payload) = controller.tick(time.delta_secs()) else {
        return;
    };

    let request = payload
        .as_ref()
        .and_then(|id| graph.node_by_id(id))
        .and_then(|node| node.filter_key.clone())
        .map(|filter| PersistRequest::Merge { filter })
        .unwrap_or(PersistRequest::Remove);

    if let Some(callback) = &sink.0 {
        callback(&request);
    }
    info!("[SELECT] notify {:?}", payload);
    changed.write(SelectionChanged(payload));
}

/// Snapshot the live interaction state for the host's save lifecycle.
/// `camera` is (pan, zoom) when a camera exists.
pub fn capture_view_state(
    graph: &GraphModel,
    settings: &Settings,
    camera: Option<(Vec2, f32)>,
) -> ViewState {
    ViewState {
        selected: graph.selected_ids(),
        zoom: camera.map(|(_, zoom)| zoom),
        pan: camera.map(|(pan, _)| crate::core::view_state::Pan { x: pan.x, y: pan.y }),
        search: if settings.search.filter_text.is_empty() {
            None
        } else {
            Some(settings.search.filter_text.clone())
        },
    }
}

/// Applies a restored snapshot. Selection waits for data (or reconciles
/// immediately if data already loaded); search lands in the effective
/// settings; camera is consumed later by the input layer.
pub fn restore_view_state(
    state: ViewState,
    graph: &mut GraphModel,
    settings: &mut Settings,
    controller: &SelectionController,
    pending: &mut PendingViewState,
) {
    if let Some(search) = &state.search {
        settings.search.filter_text = search.clone();
    }
    if !graph.is_empty() && !state.selected.is_empty() {
        controller.reconcile(graph, &state.selected);
        let mut rest = state;
        rest.selected = Vec::new();
        pending.0 = Some(rest);
    } else {
        pending.0 = Some(state);
    }
}
