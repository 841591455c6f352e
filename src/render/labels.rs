//! Label rendering — retained Text2d entities for the visible subset of
//! nodes, rebuilt only when the label redraw flag is raised.

use bevy::prelude::*;
use std::collections::HashSet;

use crate::core::config::{hex_color, NavRcConfig};
use crate::core::graph::{GraphModel, NodeId};
use crate::core::settings::Settings;
use crate::host::RedrawFlags;
use crate::ui::search::SearchMatches;

/// Marker on a node's floating text label.
#[derive(Component)]
pub struct NodeLabel {
    pub id: NodeId,
}

/// Vertical gap between the node edge and its label baseline.
const LABEL_GAP: f32 = 6.0;

/// Which nodes get a label: every selected node, every search match, then
/// the heaviest remaining nodes up to the label budget. Bounds draw cost on
/// dense graphs.
pub fn visible_label_ids(
    graph: &GraphModel,
    settings: &Settings,
    matches: &HashSet<NodeId>,
) -> HashSet<NodeId> {
    let mut visible: HashSet<NodeId> = graph
        .nodes()
        .iter()
        .filter(|n| n.selected || matches.contains(&n.id))
        .map(|n| n.id.clone())
        .collect();

    let budget = settings.layout.max_label_count;
    let mut by_weight: Vec<_> = graph.nodes().iter().collect();
    by_weight.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    for node in by_weight {
        if visible.len() >= budget {
            break;
        }
        visible.insert(node.id.clone());
    }
    visible
}

/// Rebuilds the label entity set when the labels flag is raised; otherwise
/// only follows node positions and, on the selection flag, re-tints. Both
/// cheap paths leave node positions and the label set untouched.
pub fn sync_labels_system(
    mut commands: Commands,
    graph: Res<GraphModel>,
    settings: Res<Settings>,
    rc: Res<NavRcConfig>,
    matches: Res<SearchMatches>,
    mut flags: ResMut<RedrawFlags>,
    mut labels: Query<(Entity, &NodeLabel, &mut Transform, &mut TextColor)>,
) {
    let label_color = hex_color(&settings.layout.label_color, Srgba::new(0.85, 0.87, 0.91, 1.0));
    let selection_color = rc.selection_color();

    if flags.labels {
        flags.labels = false;
        flags.selection = false;

        for (entity, _, _, _) in &labels {
            commands.entity(entity).despawn();
        }
        let visible = visible_label_ids(&graph, &settings, &matches.ids);
        for node in graph.nodes() {
            if !visible.contains(&node.id) {
                continue;
            }
            let color = if node.selected { selection_color } else { label_color };
            commands.spawn((
                Text2d::new(node.label.clone()),
                TextFont { font_size: settings.layout.label_font_size, ..default() },
                TextColor(color),
                Transform::from_translation(label_pos(node.pos, node.radius()).extend(1.0)),
                NodeLabel { id: node.id.clone() },
            ));
        }
        return;
    }

    let retint = flags.selection;
    flags.selection = false;

    for (entity, label, mut transform, mut color) in &mut labels {
        let Some(node) = graph.node_by_id(&label.id) else {
            commands.entity(entity).despawn();
            continue;
        };
        transform.translation = label_pos(node.pos, node.radius()).extend(1.0);
        if retint {
            color.0 = if node.selected { selection_color } else { label_color };
        }
    }
}

/// Place the label above the node shape so it never overlaps it.
fn label_pos(pos: Vec2, radius: f32) -> Vec2 {
    pos + Vec2::new(0.0, radius + LABEL_GAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::Node;

    fn graph_with_weights(weights: &[(&str, f32)]) -> GraphModel {
        let mut model = GraphModel::default();
        model.set_data(
            weights
                .iter()
                .map(|(id, w)| {
                    let mut n = Node::new(*id);
                    n.weight = *w;
                    n
                })
                .collect(),
            vec![],
        );
        model
    }

    #[test]
    fn budget_picks_the_heaviest_nodes() {
        let graph = graph_with_weights(&[("a", 1.0), ("b", 10.0), ("c", 5.0)]);
        let mut settings = Settings::default();
        settings.layout.max_label_count = 2;
        let visible = visible_label_ids(&graph, &settings, &HashSet::new());
        assert!(visible.contains("b"));
        assert!(visible.contains("c"));
        assert!(!visible.contains("a"));
    }

    #[test]
    fn selected_and_matched_nodes_always_get_labels() {
        let mut graph = graph_with_weights(&[("a", 1.0), ("b", 10.0), ("c", 5.0)]);
        let mut settings = Settings::default();
        settings.layout.max_label_count = 0;
        let ctl = crate::selection::SelectionController::default();
        ctl.reconcile(&mut graph, &["a".into()]);

        let matches: HashSet<NodeId> = ["c".to_string()].into_iter().collect();
        let visible = visible_label_ids(&graph, &settings, &matches);
        assert!(visible.contains("a"), "selected node labelled past the budget");
        assert!(visible.contains("c"), "matched node labelled past the budget");
        assert!(!visible.contains("b"));
    }

    #[test]
    fn empty_graph_yields_no_labels() {
        let graph = GraphModel::default();
        let visible = visible_label_ids(&graph, &Settings::default(), &HashSet::new());
        assert!(visible.is_empty());
    }

    #[test]
    fn label_sits_above_the_shape() {
        let pos = Vec2::new(10.0, 20.0);
        let p = label_pos(pos, 8.0);
        assert!(p.y > pos.y + 8.0);
        assert_eq!(p.x, pos.x);
    }
}
