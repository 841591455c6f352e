//! View-state bridge — the slice of interaction state that survives a
//! save/reload cycle, independent of how the host actually persists it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::graph::NodeId;

/// Serializable snapshot of {selection, zoom/pan, search text}.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub selected: Vec<NodeId>,
    /// Magnification factor; 1.0 is unzoomed. None = no restore.
    pub zoom: Option<f32>,
    /// Camera centre in world units.
    pub pan: Option<Pan>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pan {
    pub x: f32,
    pub y: f32,
}

impl ViewState {
    pub fn is_empty(&self) -> bool {
        self == &ViewState::default()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Field-tolerant restore: each field is read independently, so a
    /// missing or malformed field means "no restore for that field" and
    /// never fails the whole snapshot. Selected ids may arrive as strings
    /// or numbers (host identity keys canonicalize to strings).
    pub fn from_value(value: &Value) -> ViewState {
        let mut state = ViewState::default();
        let Some(obj) = value.as_object() else {
            return state;
        };

        if let Some(items) = obj.get("selected").and_then(Value::as_array) {
            state.selected = items.iter().filter_map(id_from_value).collect();
        }
        if let Some(zoom) = obj.get("zoom").and_then(Value::as_f64) {
            if zoom.is_finite() && zoom > 0.0 {
                state.zoom = Some(zoom as f32);
            }
        }
        if let Some(pan) = obj.get("pan") {
            let x = pan.get("x").and_then(Value::as_f64);
            let y = pan.get("y").and_then(Value::as_f64);
            if let (Some(x), Some(y)) = (x, y) {
                if x.is_finite() && y.is_finite() {
                    state.pan = Some(Pan { x: x as f32, y: y as f32 });
                }
            }
        }
        if let Some(search) = obj.get("search").and_then(Value::as_str) {
            if !search.is_empty() {
                state.search = Some(search.to_string());
            }
        }
        state
    }
}

fn id_from_value(value: &Value) -> Option<NodeId> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_through_value() {
        let state = ViewState {
            selected: vec!["a".into(), "b".into()],
            zoom: Some(1.5),
            pan: Some(Pan { x: 10.0, y: -20.0 }),
            search: Some("srv".into()),
        };
        assert_eq!(ViewState::from_value(&state.to_value()), state);
    }

    #[test]
    fn numeric_identities_canonicalize_to_strings() {
        let state = ViewState::from_value(&json!({ "selected": [2], "zoom": 1.5 }));
        assert_eq!(state.selected, vec!["2".to_string()]);
        assert_eq!(state.zoom, Some(1.5));
    }

    #[test]
    fn missing_fields_mean_no_restore() {
        let state = ViewState::from_value(&json!({ "zoom": 2.0 }));
        assert!(state.selected.is_empty());
        assert_eq!(state.zoom, Some(2.0));
        assert!(state.pan.is_none());
        assert!(state.search.is_none());
    }

    #[test]
    fn malformed_snapshot_never_fails() {
        for garbage in [
            json!(null),
            json!("not an object"),
            json!(17),
            json!({ "selected": "nope", "zoom": "big", "pan": [1, 2], "search": 5 }),
            json!({ "zoom": f64::NAN.to_string() }),
            json!({ "zoom": -3.0 }),
        ] {
            let state = ViewState::from_value(&garbage);
            assert!(state.is_empty(), "expected empty restore for {garbage}");
        }
    }

    #[test]
    fn partial_pan_is_ignored() {
        let state = ViewState::from_value(&json!({ "pan": { "x": 5.0 } }));
        assert!(state.pan.is_none());
    }
}
