//! Force-directed layout simulation — charge repulsion, spring attraction
//! along links, a centering pull, and velocity damping, ticked once per frame
//! until the layout converges.

use bevy::prelude::*;

use crate::core::graph::GraphModel;
use crate::core::settings::LayoutSettings;

/// Min distance to avoid division by zero.
const MIN_DIST: f32 = 1.0;
/// Max distance for repulsion (avoid tiny forces from far nodes).
const MAX_REP_DIST: f32 = 900.0;
/// Velocity kept per tick.
const DAMPING: f32 = 0.85;
/// Integration step.
const DT: f32 = 1.0 / 60.0;
/// Cooling per tick.
const ALPHA_DECAY: f32 = 0.985;
/// Below this the cooling term no longer moves anything.
const ALPHA_MIN: f32 = 0.005;
/// Average per-node speed below which the layout counts as converged.
const CONVERGED_SPEED: f32 = 0.4;
/// Hard cap on ticks per (re)seed, so a pathological graph still settles.
const MAX_TICKS: u32 = 900;

/// Energy for a full re-seed (data or physics constants changed).
const ALPHA_FULL: f32 = 1.0;
/// Reduced energy for a reheat: converged positions get perturbed, not reset.
const ALPHA_REHEAT: f32 = 0.3;

/// The live physics loop. One per navigator; owns no graph data, only
/// kinetic state and the viewport it centres into.
#[derive(Resource)]
pub struct Simulation {
    alpha: f32,
    ticks: u32,
    center: Vec2,
    bounds: Vec2,
    /// Data generation this run was seeded for. A tick never writes into a
    /// model from a different generation, so stale loops cancel themselves.
    generation: u64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            ticks: 0,
            center: Vec2::ZERO,
            bounds: Vec2::new(500.0, 500.0),
            generation: 0,
        }
    }
}

impl Simulation {
    /// Full restart for the given data generation. Node positions are kept
    /// as the starting point; only accumulated kinetic state is dropped.
    pub fn reseed(&mut self, generation: u64) {
        self.alpha = ALPHA_FULL;
        self.ticks = 0;
        self.generation = generation;
    }

    /// Soft restart: perturb the existing layout with reduced energy.
    pub fn reheat(&mut self) {
        self.alpha = self.alpha.max(ALPHA_REHEAT);
        self.ticks = 0;
    }

    /// Viewport change moves only the centering target and boundary clamp.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.bounds = Vec2::new(width, height);
        }
    }

    pub fn is_active(&self) -> bool {
        self.alpha > ALPHA_MIN
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advance one tick. Returns false without touching the model when the
    /// run is idle or was seeded for a different data generation.
    pub fn step(&mut self, graph: &mut GraphModel, layout: &LayoutSettings, generation: u64) -> bool {
        if self.generation != generation || !self.is_active() || graph.is_empty() {
            return false;
        }

        let n = graph.nodes().len();
        let positions: Vec<Vec2> = graph.nodes().iter().map(|node| node.pos).collect();
        let mut forces = vec![Vec2::ZERO; n];

        // Repulsion: each pair, inverse-square, scaled by the charge constant.
        let repulsion = -layout.charge * self.alpha;
        for i in 0..n {
            for j in (i + 1)..n {
                let delta = positions[j] - positions[i];
                let d = delta.length().max(MIN_DIST);
                if d > MAX_REP_DIST {
                    continue;
                }
                let dir = delta.normalize_or_zero();
                let f = repulsion / (d * d);
                forces[i] -= dir * f;
                forces[j] += dir * f;
            }
        }

        // Attraction: spring along each link toward its rest length.
        for link in graph.links() {
            let delta = positions[link.target] - positions[link.source];
            let d = delta.length().max(MIN_DIST);
            let dir = delta.normalize_or_zero();
            let f = layout.link_strength * self.alpha * (d - layout.link_distance)
                * link.weight.max(0.1).sqrt();
            forces[link.source] += dir * f;
            forces[link.target] -= dir * f;
        }

        // Centering pull toward the viewport centre.
        for (i, pos) in positions.iter().enumerate() {
            forces[i] += (self.center - *pos) * layout.gravity * self.alpha;
        }

        let half = self.bounds * 0.5;
        let mut total_speed = 0.0;
        for (i, node) in graph.nodes_mut().iter_mut().enumerate() {
            node.vel = (node.vel + forces[i]) * DAMPING;
            node.pos += node.vel * DT * 60.0 * self.alpha.min(1.0);
            node.pos.x = node.pos.x.clamp(self.center.x - half.x, self.center.x + half.x);
            node.pos.y = node.pos.y.clamp(self.center.y - half.y, self.center.y + half.y);
            total_speed += node.vel.length();
        }

        let reset = graph.reset_degenerate();
        if reset > 0 {
            warn!("[SIM] reset {} degenerate node position(s)", reset);
        }

        self.alpha *= ALPHA_DECAY;
        self.ticks += 1;
        if total_speed / n as f32 <= CONVERGED_SPEED || self.ticks >= MAX_TICKS {
            self.alpha = 0.0;
        }
        true
    }

    /// Run the current generation to convergence in one call. Used when the
    /// animate option is off and by headless hosts.
    pub fn settle(&mut self, graph: &mut GraphModel, layout: &LayoutSettings, generation: u64) {
        while self.step(graph, layout, generation) {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::{LinkSpec, Node};

    fn graph(ids: &[&str], links: &[(&str, &str)]) -> GraphModel {
        let mut model = GraphModel::default();
        model.set_data(
            ids.iter().map(|id| Node::new(*id)).collect(),
            links
                .iter()
                .map(|(s, t)| LinkSpec { source: (*s).into(), target: (*t).into(), weight: 1.0 })
                .collect(),
        );
        model
    }

    #[test]
    fn settles_and_goes_idle() {
        let mut model = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let mut sim = Simulation::default();
        sim.reseed(1);
        sim.settle(&mut model, &LayoutSettings::default(), 1);
        assert!(!sim.is_active());
        assert!(!sim.step(&mut model, &LayoutSettings::default(), 1));
    }

    #[test]
    fn isolated_node_does_not_coincide_with_linked_pair() {
        let mut model = graph(&["1", "2", "3"], &[("1", "2")]);
        let mut sim = Simulation::default();
        sim.reseed(1);
        sim.settle(&mut model, &LayoutSettings::default(), 1);

        let p1 = model.node_by_id("1").unwrap().pos;
        let p2 = model.node_by_id("2").unwrap().pos;
        let p3 = model.node_by_id("3").unwrap().pos;
        assert!(p3.distance(p1) > 1.0, "isolated node sits on node 1");
        assert!(p3.distance(p2) > 1.0, "isolated node sits on node 2");
    }

    #[test]
    fn linked_nodes_pull_toward_rest_length() {
        let mut model = graph(&["a", "b"], &[("a", "b")]);
        model.nodes_mut()[0].pos = Vec2::new(-400.0, 0.0);
        model.nodes_mut()[1].pos = Vec2::new(400.0, 0.0);
        let layout = LayoutSettings::default();
        let mut sim = Simulation::default();
        sim.resize(2000.0, 2000.0);
        sim.reseed(1);
        sim.settle(&mut model, &layout, 1);

        let d = model.nodes()[0].pos.distance(model.nodes()[1].pos);
        assert!(d < 800.0, "spring never pulled the pair together (d = {d})");
    }

    #[test]
    fn stale_generation_never_writes() {
        let mut model = graph(&["a", "b"], &[]);
        let before: Vec<_> = model.nodes().iter().map(|n| n.pos).collect();
        let mut sim = Simulation::default();
        sim.reseed(1);
        // The model has since moved to generation 2.
        assert!(!sim.step(&mut model, &LayoutSettings::default(), 2));
        let after: Vec<_> = model.nodes().iter().map(|n| n.pos).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn reheat_keeps_positions_with_reduced_energy() {
        let mut model = graph(&["a", "b", "c"], &[("a", "b")]);
        let mut sim = Simulation::default();
        sim.reseed(1);
        sim.settle(&mut model, &LayoutSettings::default(), 1);
        let settled: Vec<_> = model.nodes().iter().map(|n| n.pos).collect();

        sim.reheat();
        assert!(sim.is_active());
        sim.settle(&mut model, &LayoutSettings::default(), 1);
        for (node, old) in model.nodes().iter().zip(&settled) {
            assert!(node.pos.distance(*old) < 200.0, "reheat reset the layout");
        }
    }

    #[test]
    fn nan_position_is_recovered_not_propagated() {
        let mut model = graph(&["a", "b"], &[("a", "b")]);
        model.nodes_mut()[0].pos = Vec2::new(f32::NAN, f32::NAN);
        let mut sim = Simulation::default();
        sim.reseed(1);
        sim.step(&mut model, &LayoutSettings::default(), 1);
        assert!(model.nodes()[0].pos.is_finite());
        assert!(model.nodes()[1].pos.is_finite());
    }

    #[test]
    fn positions_stay_inside_viewport_bounds() {
        let mut model = graph(&["a", "b", "c", "d"], &[]);
        let mut sim = Simulation::default();
        sim.resize(200.0, 120.0);
        sim.reseed(1);
        sim.settle(&mut model, &LayoutSettings::default(), 1);
        for node in model.nodes() {
            assert!(node.pos.x.abs() <= 100.0 + f32::EPSILON);
            assert!(node.pos.y.abs() <= 60.0 + f32::EPSILON);
        }
    }
}
