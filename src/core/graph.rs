//! Graph data model — typed nodes/links with stable identity and geometric state.

use bevy::prelude::*;
use std::collections::HashMap;

/// Canonical opaque key distinguishing one node from another across refreshes.
pub type NodeId = String;

/// Smallest rendered node radius (world units).
pub const MIN_RADIUS: f32 = 6.0;
/// Largest rendered node radius.
pub const MAX_RADIUS: f32 = 28.0;
/// Radius gained per unit of sqrt(weight).
const RADIUS_PER_WEIGHT: f32 = 3.0;

/// A node owned by a [`GraphModel`].
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    /// Accumulated weight from the source rows; drives the rendered radius.
    pub weight: f32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub selected: bool,
    /// Opaque filter payload the host turns a click into a persisted query filter with.
    pub filter_key: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>) -> Self {
        let id: NodeId = id.into();
        Self {
            label: id.clone(),
            id,
            weight: 1.0,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            selected: false,
            filter_key: None,
        }
    }

    /// Rendered radius derived from weight.
    pub fn radius(&self) -> f32 {
        (MIN_RADIUS + self.weight.max(0.0).sqrt() * RADIUS_PER_WEIGHT).min(MAX_RADIUS)
    }
}

/// Link endpoints by identity, as produced by the converter.
/// Validated into index-based [`Link`]s when handed to the model.
#[derive(Debug, Clone)]
pub struct LinkSpec {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f32,
}

/// A validated link. Endpoints index into the owning model's node list,
/// so a dangling link cannot exist past construction.
#[derive(Debug, Clone, Copy)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub weight: f32,
}

/// Owns the node and link sets exclusively. Replaced wholesale on every full
/// data refresh; only positions, velocities, and selection flags are mutated
/// in place between refreshes.
#[derive(Resource, Default)]
pub struct GraphModel {
    nodes: Vec<Node>,
    links: Vec<Link>,
    index: HashMap<NodeId, usize>,
}

impl GraphModel {
    /// Replace the model wholesale. Nodes whose id matches a node in the
    /// previous model keep their position, velocity, and selected flag;
    /// everything else is seeded fresh. Links with endpoints not present in
    /// the new node set are dropped, not kept dangling.
    pub fn set_data(&mut self, nodes: Vec<Node>, links: Vec<LinkSpec>) {
        let previous: HashMap<NodeId, (Vec2, Vec2, bool)> = self
            .nodes
            .drain(..)
            .map(|n| (n.id, (n.pos, n.vel, n.selected)))
            .collect();

        self.links.clear();
        self.index.clear();

        for mut node in nodes {
            if self.index.contains_key(&node.id) {
                warn!("[DATA] duplicate node id {:?} skipped", node.id);
                continue;
            }
            let i = self.nodes.len();
            match previous.get(&node.id) {
                Some(&(pos, vel, selected)) => {
                    node.pos = pos;
                    node.vel = vel;
                    node.selected = selected;
                }
                None => {
                    node.pos = seed_position(i);
                    node.vel = Vec2::ZERO;
                }
            }
            self.index.insert(node.id.clone(), i);
            self.nodes.push(node);
        }

        for spec in links {
            let (Some(&source), Some(&target)) =
                (self.index.get(&spec.source), self.index.get(&spec.target))
            else {
                warn!("[DATA] dangling link {:?} -> {:?} dropped", spec.source, spec.target);
                continue;
            };
            self.links.push(Link { source, target, weight: spec.weight });
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Ids of all currently flagged nodes, in insertion order.
    pub fn selected_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Resets any node whose position or velocity went non-finite back to its
    /// seeded spot. Returns how many nodes were reset.
    pub fn reset_degenerate(&mut self) -> usize {
        let mut reset = 0;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            if !node.pos.is_finite() || !node.vel.is_finite() {
                node.pos = seed_position(i);
                node.vel = Vec2::ZERO;
                reset += 1;
            }
        }
        reset
    }
}

/// Deterministic spiral placement for freshly seeded nodes. Spreads nodes out
/// so no two fresh nodes start coincident (which would stall the repulsion force).
pub fn seed_position(i: usize) -> Vec2 {
    // Golden-angle spiral.
    let angle = i as f32 * 2.399_963;
    let r = 40.0 + 14.0 * (i as f32).sqrt();
    Vec2::new(angle.cos(), angle.sin()) * r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(source: &str, target: &str) -> LinkSpec {
        LinkSpec { source: source.into(), target: target.into(), weight: 1.0 }
    }

    #[test]
    fn set_data_round_trips_identities_and_endpoints() {
        let mut model = GraphModel::default();
        model.set_data(
            vec![Node::new("a"), Node::new("b"), Node::new("c")],
            vec![link("a", "b"), link("b", "c")],
        );

        let ids: Vec<_> = model.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(model.links().len(), 2);
        let l = model.links()[0];
        assert_eq!(model.nodes()[l.source].id, "a");
        assert_eq!(model.nodes()[l.target].id, "b");
    }

    #[test]
    fn refresh_carries_over_matching_nodes() {
        let mut model = GraphModel::default();
        model.set_data(vec![Node::new("a"), Node::new("b")], vec![]);

        let pos = Vec2::new(123.0, -45.0);
        model.nodes_mut()[0].pos = pos;
        model.nodes_mut()[0].selected = true;

        model.set_data(vec![Node::new("a"), Node::new("c")], vec![]);
        let a = model.node_by_id("a").unwrap();
        assert_eq!(a.pos, pos);
        assert!(a.selected);
        // "c" is new: seeded fresh, not selected.
        let c = model.node_by_id("c").unwrap();
        assert!(!c.selected);
        assert_ne!(c.pos, pos);
        assert!(model.node_by_id("b").is_none());
    }

    #[test]
    fn dangling_links_are_dropped() {
        let mut model = GraphModel::default();
        model.set_data(
            vec![Node::new("a")],
            vec![link("a", "missing"), link("ghost", "a")],
        );
        assert!(model.links().is_empty());
        assert_eq!(model.nodes().len(), 1);
    }

    #[test]
    fn duplicate_ids_collapse_to_first() {
        let mut model = GraphModel::default();
        let mut heavy = Node::new("a");
        heavy.weight = 99.0;
        model.set_data(vec![Node::new("a"), heavy], vec![link("a", "a")]);
        assert_eq!(model.nodes().len(), 1);
        assert_eq!(model.nodes()[0].weight, 1.0);
        assert_eq!(model.links().len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_model() {
        let mut model = GraphModel::default();
        model.set_data(vec![Node::new("a")], vec![]);
        model.set_data(vec![], vec![]);
        assert!(model.is_empty());
        assert!(model.links().is_empty());
        assert!(model.selected_ids().is_empty());
    }

    #[test]
    fn degenerate_positions_are_reset() {
        let mut model = GraphModel::default();
        model.set_data(vec![Node::new("a"), Node::new("b")], vec![]);
        model.nodes_mut()[1].pos = Vec2::new(f32::NAN, 0.0);
        model.nodes_mut()[1].vel = Vec2::new(f32::INFINITY, 0.0);

        assert_eq!(model.reset_degenerate(), 1);
        assert!(model.nodes()[1].pos.is_finite());
        assert_eq!(model.nodes()[1].vel, Vec2::ZERO);
        assert_eq!(model.reset_degenerate(), 0);
    }

    #[test]
    fn seed_positions_are_distinct() {
        let a = seed_position(0);
        let b = seed_position(1);
        let c = seed_position(2);
        assert!(a.distance(b) > 1.0);
        assert!(b.distance(c) > 1.0);
    }

    #[test]
    fn radius_grows_with_weight_and_caps() {
        let mut n = Node::new("a");
        let base = n.radius();
        n.weight = 16.0;
        assert!(n.radius() > base);
        n.weight = 1.0e9;
        assert_eq!(n.radius(), MAX_RADIUS);
    }
}
