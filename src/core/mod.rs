//! Core types and state shared across the navigator engine.

pub mod config;
pub mod graph;
pub mod settings;
pub mod view_state;
