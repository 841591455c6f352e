//! Netnav — an interactive network navigator: a force-directed node-link
//! graph driven by host-supplied table rows, with selection, search, and
//! view-state persistence. Library for embedding and testing.

pub mod convert;
pub mod core;
pub mod host;
pub mod input;
pub mod io;
pub mod render;
pub mod selection;
pub mod sim;
pub mod ui;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::input::egui_wants_any_pointer_input;
use bevy_egui::EguiPlugin;
use serde_json::Value;

use convert::ColumnRoles;
use crate::core::graph::GraphModel;
use crate::core::settings::Settings;
use crate::core::view_state::ViewState;
use host::{
    host_update_system, selection_flush_system, sim_tick_system, DataGeneration, IncomingConfig,
    PendingViewState, PersistedConfig, PersistenceSink, RedrawFlags, SourceRows, UpdateRequest,
};
use input::camera::{apply_restored_camera_system, camera_pan_system, camera_zoom_system, MainCamera};
use input::pick::mouse_pick_system;
use io::export::{headless_export_system, HeadlessConfig};
use render::draw::{draw_links_system, draw_nodes_system};
use render::labels::sync_labels_system;
use selection::{SelectionChanged, SelectionController};
use sim::Simulation;
use ui::search::{search_bar_ui_system, update_search_matches_system, SearchMatches};

/// The navigator engine: data model, settings merger, simulation, selection,
/// and host-update dispatch. Carries no windowing or egui dependency, so
/// headless test apps can use it with `MinimalPlugins`.
pub struct NavigatorPlugin;

impl Plugin for NavigatorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GraphModel>()
            .init_resource::<Settings>()
            .init_resource::<Simulation>()
            .init_resource::<SelectionController>()
            .init_resource::<DataGeneration>()
            .init_resource::<SourceRows>()
            .init_resource::<PersistedConfig>()
            .init_resource::<IncomingConfig>()
            .init_resource::<PendingViewState>()
            .init_resource::<RedrawFlags>()
            .init_resource::<PersistenceSink>()
            .init_resource::<ColumnRoles>()
            .init_resource::<SearchMatches>()
            .add_message::<UpdateRequest>()
            .add_message::<SelectionChanged>()
            .add_systems(
                Update,
                // One update cycle is strictly merge -> convert -> re-seed ->
                // tick -> notify; the next host update waits for the next frame.
                (
                    host_update_system,
                    update_search_matches_system,
                    sim_tick_system,
                    selection_flush_system,
                )
                    .chain(),
            );
    }
}

/// What the binary passes down from the command line and stdin.
pub struct RunOptions {
    pub headless: bool,
    /// Initial table rows from the demo host.
    pub rows: Vec<Value>,
    /// Incoming host configuration, if any.
    pub config: Option<Value>,
    /// Persisted view-state snapshot to restore before the first data load.
    pub snapshot: Option<Value>,
}

/// Startup payload handed from [`run`] to the seeding system.
#[derive(Resource)]
struct StartupPayload {
    rows: Vec<Value>,
    config: Option<Value>,
    snapshot: Option<Value>,
}

/// Build and run the navigator app.
pub fn run(options: RunOptions) {
    let rc = crate::core::config::load_config();

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Network Navigator".to_string(),
            visible: !options.headless,
            ..default()
        }),
        ..default()
    }))
    .insert_resource(ClearColor(rc.bg_color()))
    .insert_resource(rc)
    .insert_resource(HeadlessConfig { is_headless: options.headless })
    .insert_resource(StartupPayload {
        rows: options.rows,
        config: options.config,
        snapshot: options.snapshot,
    })
    .add_plugins(EguiPlugin::default())
    .add_plugins(NavigatorPlugin)
    .add_systems(Startup, (setup_camera, seed_host_update))
    .add_systems(
        Update,
        (
            track_viewport_system,
            apply_restored_camera_system,
            headless_export_system,
        ),
    )
    .add_systems(
        Update,
        (camera_zoom_system, camera_pan_system, mouse_pick_system)
            .run_if(not(egui_wants_any_pointer_input)),
    )
    .add_systems(
        Update,
        (draw_links_system, draw_nodes_system, sync_labels_system).chain(),
    )
    .add_systems(bevy_egui::EguiPrimaryContextPass, search_bar_ui_system);

    app.run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2d, MainCamera));
}

/// Restores the persisted snapshot (if any) and sends the first host update.
fn seed_host_update(
    payload: Res<StartupPayload>,
    mut graph: ResMut<GraphModel>,
    mut settings: ResMut<Settings>,
    controller: Res<SelectionController>,
    mut pending: ResMut<PendingViewState>,
    mut requests: MessageWriter<UpdateRequest>,
    window_q: Query<&Window, With<PrimaryWindow>>,
) {
    if let Some(snapshot) = &payload.snapshot {
        let state = ViewState::from_value(snapshot);
        host::restore_view_state(state, &mut graph, &mut settings, &controller, &mut pending);
    }

    let viewport = window_q
        .single()
        .ok()
        .map(|window| Vec2::new(window.width(), window.height()));
    requests.write(UpdateRequest {
        rows: Some(payload.rows.clone()),
        config: payload.config.clone(),
        viewport,
    });
}

/// Keeps the simulation's centering target and boundary clamp in step with
/// the window. Physics constants are untouched by a resize.
fn track_viewport_system(
    window_q: Query<&Window, With<PrimaryWindow>>,
    mut sim: ResMut<Simulation>,
) {
    let Ok(window) = window_q.single() else {
        return;
    };
    sim.resize(window.width(), window.height());
}
