//! User input — camera zoom/pan and node picking.

pub mod camera;
pub mod pick;
