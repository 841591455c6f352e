//! Headless export: run the layout to convergence with no visible window,
//! then write the settled positions and view state to stdout as JSON.

use bevy::prelude::*;
use serde::Serialize;
use serde_json::Value;

use crate::core::graph::GraphModel;
use crate::core::settings::Settings;
use crate::host::capture_view_state;
use crate::input::camera::MainCamera;
use crate::sim::Simulation;

/// CLI configuration for headless mode.
#[derive(Resource, Default)]
pub struct HeadlessConfig {
    pub is_headless: bool,
}

/// Upper bound on frames before a headless run exports regardless of
/// convergence, so a hot layout cannot hang the process.
const MAX_HEADLESS_FRAMES: u32 = 1500;

#[derive(Serialize)]
struct ExportNode {
    id: String,
    label: String,
    weight: f32,
    x: f32,
    y: f32,
    selected: bool,
}

#[derive(Serialize)]
struct ExportLink {
    source: String,
    target: String,
    weight: f32,
}

#[derive(Serialize)]
struct LayoutExport {
    nodes: Vec<ExportNode>,
    links: Vec<ExportLink>,
    view: Value,
}

/// Snapshot the settled graph for export.
pub fn layout_export(graph: &GraphModel, settings: &Settings, camera: Option<(Vec2, f32)>) -> Value {
    let export = LayoutExport {
        nodes: graph
            .nodes()
            .iter()
            .map(|n| ExportNode {
                id: n.id.clone(),
                label: n.label.clone(),
                weight: n.weight,
                x: n.pos.x,
                y: n.pos.y,
                selected: n.selected,
            })
            .collect(),
        links: graph
            .links()
            .iter()
            .map(|l| ExportLink {
                source: graph.nodes()[l.source].id.clone(),
                target: graph.nodes()[l.target].id.clone(),
                weight: l.weight,
            })
            .collect(),
        view: capture_view_state(graph, settings, camera).to_value(),
    };
    serde_json::to_value(&export).unwrap_or(Value::Null)
}

/// Waits for the simulation to go idle (a few frames minimum so the first
/// host update lands), prints the export, and exits.
pub fn headless_export_system(
    mut frames: Local<u32>,
    config: Res<HeadlessConfig>,
    sim: Res<Simulation>,
    graph: Res<GraphModel>,
    settings: Res<Settings>,
    camera_q: Query<(&Transform, &Projection), With<MainCamera>>,
) {
    if !config.is_headless {
        return;
    }
    *frames += 1;
    if *frames < 3 {
        return;
    }
    if sim.is_active() && *frames < MAX_HEADLESS_FRAMES {
        return;
    }

    let camera = camera_q.single().ok().map(|(transform, proj)| {
        let scale = match proj {
            Projection::Orthographic(o) => o.scale,
            _ => 1.0,
        };
        (transform.translation.truncate(), 1.0 / scale.max(1.0e-6))
    });

    let export = layout_export(&graph, &settings, camera);
    match serde_json::to_string_pretty(&export) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("Failed to serialize layout export: {}", err),
    }
    info!("[HEADLESS] export complete, exiting");
    std::process::exit(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::{LinkSpec, Node};

    #[test]
    fn export_covers_nodes_links_and_view() {
        let mut graph = GraphModel::default();
        graph.set_data(
            vec![Node::new("a"), Node::new("b")],
            vec![LinkSpec { source: "a".into(), target: "b".into(), weight: 2.0 }],
        );
        graph.nodes_mut()[0].selected = true;

        let value = layout_export(&graph, &Settings::default(), Some((Vec2::ZERO, 1.5)));
        assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["links"][0]["source"], "a");
        assert!(value["nodes"][0]["selected"].as_bool().unwrap());
        assert_eq!(value["view"]["selected"][0], "a");
        assert_eq!(value["view"]["zoom"].as_f64().unwrap(), 1.5);
    }

    #[test]
    fn empty_graph_exports_cleanly() {
        let value = layout_export(&GraphModel::default(), &Settings::default(), None);
        assert_eq!(value["nodes"].as_array().unwrap().len(), 0);
        assert!(value["view"]["zoom"].is_null());
    }
}
