//! Layout export for headless runs.

pub mod export;
