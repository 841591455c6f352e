//! Settings merger — layers defaults, persisted, and incoming configuration
//! into one effective, clamped settings value.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared [min, max] clamp range per numeric `layout` key. Every merged
/// value for one of these keys is clamped before being applied.
pub const LAYOUT_CLAMPS: &[(&str, f64, f64)] = &[
    ("charge", -1000.0, -1.0),
    ("link_distance", 10.0, 500.0),
    ("link_strength", 0.05, 5.0),
    ("gravity", 0.0, 1.0),
    ("min_zoom", 0.01, 1.0),
    ("max_zoom", 1.0, 100.0),
    ("label_font_size", 6.0, 40.0),
    ("max_label_count", 0.0, 500.0),
    ("max_node_count", 0.0, 5000.0),
];

/// Numeric simulation/rendering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// When false the layout runs to convergence synchronously instead of
    /// animating tick by tick.
    pub animate: bool,
    /// 0 means unlimited. Changing this changes which nodes exist, so it
    /// forces a data reload rather than a mere re-layout.
    pub max_node_count: usize,
    pub charge: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub gravity: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub label_font_size: f32,
    pub max_label_count: usize,
    pub label_color: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            animate: true,
            max_node_count: 0,
            charge: -120.0,
            link_distance: 120.0,
            link_strength: 1.0,
            gravity: 0.08,
            min_zoom: 0.1,
            max_zoom: 8.0,
            label_font_size: 12.0,
            max_label_count: 40,
            label_color: "#d8dee9".to_string(),
        }
    }
}

/// Free-text node filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub filter_text: String,
    pub case_insensitive: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { filter_text: String::new(), case_insensitive: true }
    }
}

/// The effective configuration applied to simulation and rendering.
/// Always complete: produced only by [`merge`], never partially updated.
#[derive(Resource, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub layout: LayoutSettings,
    pub search: SearchSettings,
}

/// What a merge changed, so the caller can decide what work to redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Any `layout` value differs from the previous effective settings;
    /// the simulation must be re-seeded.
    pub layout_changed: bool,
    /// `max_node_count` changed; the source rows must be reconverted,
    /// not just re-laid-out.
    pub reload_data: bool,
}

/// Deep-merges `defaults -> persisted -> incoming` (incoming wins), clamps
/// every declared layout key, and reports what changed relative to
/// `previous`. Pure: no inputs are mutated.
pub fn merge(previous: &Settings, persisted: &Value, incoming: &Value) -> (Settings, MergeOutcome) {
    let mut merged = serde_json::to_value(Settings::default()).unwrap_or(Value::Null);
    deep_merge(&mut merged, persisted);
    deep_merge(&mut merged, incoming);
    clamp_layout(&mut merged);

    // Sections deserialize independently so one malformed section never
    // discards the other.
    let layout = merged
        .get("layout")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_else(|| previous.layout.clone());
    let search = merged
        .get("search")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_else(|| previous.search.clone());

    let effective = Settings { layout, search };
    let outcome = MergeOutcome {
        layout_changed: effective.layout != previous.layout,
        reload_data: effective.layout.max_node_count != previous.layout.max_node_count,
    };
    (effective, outcome)
}

/// Recursive key-by-key object merge. Nulls in the overlay are treated as
/// absent, so a stale persisted layer cannot blank out a default.
pub fn deep_merge(target: &mut Value, overlay: &Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => {
            for (key, value) in overlay {
                if value.is_null() {
                    continue;
                }
                match target.get_mut(key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overlay) => {
            if !overlay.is_null() {
                *target = overlay.clone();
            }
        }
    }
}

fn clamp_layout(merged: &mut Value) {
    let Some(layout) = merged.get_mut("layout").and_then(Value::as_object_mut) else {
        return;
    };
    for &(key, min, max) in LAYOUT_CLAMPS {
        let Some(n) = layout.get(key).and_then(Value::as_f64) else {
            continue;
        };
        let clamped = n.clamp(min, max);
        if clamped != n {
            // Integral results stay integers so count fields still deserialize.
            let num = if clamped.fract() == 0.0 {
                Some(serde_json::Number::from(clamped as i64))
            } else {
                serde_json::Number::from_f64(clamped)
            };
            if let Some(num) = num {
                layout.insert(key.to_string(), Value::Number(num));
            }
        }
    }
}
