//! Mouse picking — clicking a node selects it, clicking empty canvas clears.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::core::graph::GraphModel;
use crate::host::RedrawFlags;
use crate::input::camera::MainCamera;
use crate::selection::SelectionController;

/// Hit slop around the node circle (world units).
const PICK_PAD: f32 = 2.0;

fn cursor_world_pos(
    window_q: &Query<&Window, With<PrimaryWindow>>,
    camera_q: &Query<(&Camera, &GlobalTransform), With<MainCamera>>,
) -> Option<Vec2> {
    let window = window_q.single().ok()?;
    let cursor = window.cursor_position()?;
    let (camera, cam_transform) = camera_q.single().ok()?;
    camera.viewport_to_world_2d(cam_transform, cursor).ok()
}

/// Left-click selection. Shift+click is the additive gesture (honored only
/// when the controller's multi-select policy allows it). Clicking empty
/// canvas clears the selection; Space+click is reserved for panning.
pub fn mouse_pick_system(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    window_q: Query<&Window, With<PrimaryWindow>>,
    camera_q: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mut graph: ResMut<GraphModel>,
    mut controller: ResMut<SelectionController>,
    mut flags: ResMut<RedrawFlags>,
) {
    if !mouse_buttons.just_pressed(MouseButton::Left) {
        return;
    }
    if keys.pressed(KeyCode::Space) {
        return;
    }
    let Some(world_pos) = cursor_world_pos(&window_q, &camera_q) else {
        return;
    };

    let additive = keys.pressed(KeyCode::ShiftLeft) || keys.pressed(KeyCode::ShiftRight);

    // Later nodes draw over earlier ones, so hit-test back to front.
    let hit = graph
        .nodes()
        .iter()
        .rev()
        .find(|node| node.pos.distance(world_pos) <= node.radius() + PICK_PAD)
        .map(|node| node.id.clone());

    match hit {
        Some(id) => {
            info!("[SELECT] {:?} (additive: {})", id, additive);
            controller.select(&mut graph, &id, additive);
        }
        None => {
            if graph.selected_ids().is_empty() {
                return;
            }
            info!("[SELECT] cleared");
            controller.clear(&mut graph);
        }
    }

    flags.redraw_selection();
    flags.redraw_labels();
}
