//! Camera controls — zoom clamped to the configured range, drag panning,
//! and one-shot application of a restored camera pose.

use bevy::prelude::*;

use crate::core::settings::Settings;
use crate::host::PendingViewState;

/// Marker for the primary 2D camera.
#[derive(Component)]
pub struct MainCamera;

/// Scroll-wheel zoom: adjusts the orthographic scale of the main camera.
/// The scale range is the inverse of the configured zoom range, so
/// `max_zoom` bounds how far in the user can magnify.
pub fn camera_zoom_system(
    mut mouse_wheel: MessageReader<bevy::input::mouse::MouseWheel>,
    settings: Res<Settings>,
    mut proj_q: Query<&mut Projection, With<MainCamera>>,
) {
    let Ok(mut proj) = proj_q.single_mut() else {
        return;
    };
    let (scale_min, scale_max) = scale_range(&settings);
    for event in mouse_wheel.read() {
        let Projection::Orthographic(ortho) = proj.as_mut() else {
            continue;
        };
        let delta = match event.unit {
            bevy::input::mouse::MouseScrollUnit::Line => event.y * 0.10,
            bevy::input::mouse::MouseScrollUnit::Pixel => event.y * 0.001,
        };
        ortho.scale = (ortho.scale * (1.0 - delta)).clamp(scale_min, scale_max);
    }
}

/// Pan: middle-click drag or Space+left-drag. Translate the camera opposite
/// to mouse movement, scale-aware so one pixel of motion is one viewport pixel.
pub fn camera_pan_system(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    mut mouse_motion: MessageReader<bevy::input::mouse::MouseMotion>,
    mut camera_q: Query<(&mut Transform, &Projection), With<MainCamera>>,
) {
    let space = keys.pressed(KeyCode::Space);
    let panning = mouse_buttons.pressed(MouseButton::Middle)
        || (space && mouse_buttons.pressed(MouseButton::Left));

    if !panning {
        for _ in mouse_motion.read() {}
        return;
    }

    let Ok((mut cam_transform, projection)) = camera_q.single_mut() else {
        return;
    };
    let scale = match projection {
        Projection::Orthographic(ortho) => ortho.scale,
        _ => 1.0,
    };

    for motion in mouse_motion.read() {
        cam_transform.translation.x -= motion.delta.x * scale;
        cam_transform.translation.y += motion.delta.y * scale;
    }
}

/// Applies the zoom/pan part of a restored view state once the camera
/// exists. Leaves the rest of the pending snapshot for its own consumers.
pub fn apply_restored_camera_system(
    mut pending: ResMut<PendingViewState>,
    settings: Res<Settings>,
    mut camera_q: Query<(&mut Transform, &mut Projection), With<MainCamera>>,
) {
    let Some(state) = pending.0.as_mut() else {
        return;
    };
    if state.zoom.is_none() && state.pan.is_none() {
        return;
    }
    let Ok((mut transform, mut proj)) = camera_q.single_mut() else {
        return;
    };

    if let Some(pan) = state.pan.take() {
        transform.translation.x = pan.x;
        transform.translation.y = pan.y;
    }
    if let Some(zoom) = state.zoom.take() {
        if let Projection::Orthographic(ortho) = proj.as_mut() {
            let (scale_min, scale_max) = scale_range(&settings);
            ortho.scale = (1.0 / zoom).clamp(scale_min, scale_max);
        }
    }
    info!("[RESTORE] camera pose applied");
}

fn scale_range(settings: &Settings) -> (f32, f32) {
    let layout = &settings.layout;
    (1.0 / layout.max_zoom.max(0.01), 1.0 / layout.min_zoom.max(0.01))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_range_inverts_zoom_bounds() {
        let settings = Settings::default();
        let (min, max) = scale_range(&settings);
        assert!(min < max);
        assert!((min - 1.0 / settings.layout.max_zoom).abs() < 1.0e-6);
        assert!((max - 1.0 / settings.layout.min_zoom).abs() < 1.0e-6);
    }
}
