//! Appearance configuration loaded from `~/.netnavrc`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Canvas and shape colours, in hex. These sit outside the host-merged
/// settings because they describe the embedding surface, not the graph.
#[derive(Debug, Clone, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct NavRcConfig {
    /// Canvas background (e.g. "#181c24").
    pub background_color: String,
    /// Node ring colour.
    pub node_color: String,
    /// Selection highlight ring colour.
    pub selection_color: String,
    /// Ring colour for search-matched nodes.
    pub match_color: String,
    /// Link line colour.
    pub link_color: String,
}

impl Default for NavRcConfig {
    fn default() -> Self {
        Self {
            background_color: "#181c24".to_string(),
            node_color: "#7fa8d9".to_string(),
            selection_color: "#f2c97d".to_string(),
            match_color: "#8fd9a8".to_string(),
            link_color: "#2e4a6b".to_string(),
        }
    }
}

impl NavRcConfig {
    pub fn bg_color(&self) -> Color {
        hex_color(&self.background_color, Srgba::new(0.09, 0.11, 0.14, 1.0))
    }

    pub fn node_color(&self) -> Color {
        hex_color(&self.node_color, Srgba::new(0.50, 0.66, 0.85, 1.0))
    }

    pub fn selection_color(&self) -> Color {
        hex_color(&self.selection_color, Srgba::new(0.95, 0.79, 0.49, 1.0))
    }

    pub fn match_color(&self) -> Color {
        hex_color(&self.match_color, Srgba::new(0.56, 0.85, 0.66, 1.0))
    }

    pub fn link_color(&self) -> Color {
        hex_color(&self.link_color, Srgba::new(0.18, 0.29, 0.42, 1.0))
    }
}

/// Parse a hex colour string, falling back when invalid.
pub fn hex_color(hex: &str, fallback: Srgba) -> Color {
    Srgba::hex(hex).unwrap_or(fallback).into()
}

/// Attempts to load the configuration from `~/.netnavrc`.
/// Falls back to default if the file is missing or invalid.
pub fn load_config() -> NavRcConfig {
    if let Ok(home) = env::var("HOME") {
        let path = PathBuf::from(home).join(".netnavrc");
        if let Ok(contents) = fs::read_to_string(path) {
            match toml::from_str(&contents) {
                Ok(config) => return config,
                Err(err) => {
                    eprintln!("Failed to parse ~/.netnavrc: {}", err);
                }
            }
        }
    }
    NavRcConfig::default()
}
