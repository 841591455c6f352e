//! Gizmo rendering for links and node shapes.

use bevy::prelude::*;

use crate::core::config::NavRcConfig;
use crate::core::graph::GraphModel;
use crate::ui::search::SearchMatches;

/// Extra radius of the highlight ring around selected nodes.
const SELECTION_RING_PAD: f32 = 4.0;
/// Extra radius of the ring around search-matched nodes.
const MATCH_RING_PAD: f32 = 2.5;

/// Links as lines between endpoint positions, heavier links more opaque.
pub fn draw_links_system(mut gizmos: Gizmos, graph: Res<GraphModel>, rc: Res<NavRcConfig>) {
    let base = rc.link_color().to_srgba();
    for link in graph.links() {
        let source = graph.nodes()[link.source].pos;
        let target = graph.nodes()[link.target].pos;
        let alpha = (0.35 + 0.15 * link.weight.max(0.0).sqrt()).min(1.0);
        gizmos.line_2d(source, target, Color::from(base.with_alpha(alpha)));
    }
}

/// Nodes as circles sized from their weight, with highlight rings for the
/// selection flag and search matches. Runs over the live simulation state,
/// so it draws nothing (and errors nothing) for an empty model.
pub fn draw_nodes_system(
    mut gizmos: Gizmos,
    graph: Res<GraphModel>,
    rc: Res<NavRcConfig>,
    matches: Res<SearchMatches>,
) {
    let node_color = rc.node_color();
    let selection_color = rc.selection_color();
    let match_color = rc.match_color();

    for node in graph.nodes() {
        let r = node.radius();
        gizmos.circle_2d(Isometry2d::from_translation(node.pos), r, node_color);
        if node.selected {
            gizmos.circle_2d(
                Isometry2d::from_translation(node.pos),
                r + SELECTION_RING_PAD,
                selection_color,
            );
        } else if matches.ids.contains(&node.id) {
            gizmos.circle_2d(
                Isometry2d::from_translation(node.pos),
                r + MATCH_RING_PAD,
                match_color,
            );
        }
    }
}
