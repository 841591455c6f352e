//! Overlay UI via bevy_egui.

pub mod search;
