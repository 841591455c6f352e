//! Drawing systems for links, nodes, and labels.

pub mod draw;
pub mod labels;
