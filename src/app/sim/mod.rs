mod forces;
mod quadtree;
mod vec;

use std::collections::HashMap;

pub(in crate::app) use quadtree::QuadtreeCell;
pub(in crate::app) use vec::{Vec2, vec2};

use crate::network::NetworkSnapshot;
use forces::{
    LINK_DISTANCE, RepulsionModel, apply_centering, apply_link_forces, resolve_collisions,
};
use quadtree::{QuadNode, collect_quadtree_cells};

const ALPHA_MIN: f64 = 0.001;
/// 1 - 0.001^(1/300): exponential cooling toward the alpha target.
const ALPHA_DECAY: f64 = 0.022_762_785;
const VELOCITY_DECAY: f64 = 0.6;
const INITIAL_RADIUS: f64 = 10.0;

pub(in crate::app) struct SimNode {
    pub id: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub pin: Option<Vec2>,
    pub radius: f64,
}

pub(in crate::app) struct SimEdge {
    pub source: usize,
    pub target: usize,
    pub strength: f64,
    pub bias: f64,
    pub length: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum SimPhase {
    Idle,
    Running,
    Cooling,
    Converged,
}

impl SimPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Cooling => "cooling",
            Self::Converged => "converged",
        }
    }
}

#[derive(Default)]
struct SimScratch {
    positions: Vec<Vec2>,
    kicks: Vec<Vec2>,
}

/// Frame-driven force simulation over one loaded snapshot. Owns all mutable
/// layout state; replaced wholesale (after `dispose`) when a new snapshot
/// arrives.
pub(in crate::app) struct Simulation {
    nodes: Vec<SimNode>,
    edges: Vec<SimEdge>,
    index_by_id: HashMap<String, usize>,
    repulsion: RepulsionModel,
    alpha: f64,
    alpha_target: f64,
    phase: SimPhase,
    disposed: bool,
    scratch: SimScratch,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            index_by_id: HashMap::new(),
            repulsion: RepulsionModel::Exact,
            alpha: 0.0,
            alpha_target: 0.0,
            phase: SimPhase::Idle,
            disposed: false,
            scratch: SimScratch::default(),
        }
    }
}

/// Deterministic phyllotaxis seed: reproducible layouts across runs without
/// a random source.
fn seeded_position(index: usize) -> Vec2 {
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    let radius = INITIAL_RADIUS * (0.5 + index as f64).sqrt();
    let angle = index as f64 * golden_angle;
    vec2(radius * angle.cos(), radius * angle.sin())
}

impl Simulation {
    pub fn new(snapshot: &NetworkSnapshot) -> Self {
        let mut simulation = Self::default();
        simulation.load(snapshot);
        simulation
    }

    /// Replaces all particle state from a validated snapshot and restarts
    /// the cooling schedule at full energy.
    pub fn load(&mut self, snapshot: &NetworkSnapshot) {
        if self.disposed {
            return;
        }

        let mut degrees = vec![0usize; snapshot.node_count()];
        let mut edge_indices = Vec::with_capacity(snapshot.edge_count());
        for edge in &snapshot.edges {
            let (Some(source), Some(target)) = (
                snapshot.index_of(&edge.source),
                snapshot.index_of(&edge.target),
            ) else {
                continue;
            };
            degrees[source] += 1;
            degrees[target] += 1;
            edge_indices.push((source, target));
        }

        self.nodes = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(index, entity)| SimNode {
                id: entity.id.clone(),
                position: seeded_position(index),
                velocity: Vec2::ZERO,
                pin: None,
                radius: entity.category.radius(),
            })
            .collect();

        self.index_by_id = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();

        self.edges = edge_indices
            .into_iter()
            .map(|(source, target)| {
                let source_degree = degrees[source].max(1) as f64;
                let target_degree = degrees[target].max(1) as f64;
                SimEdge {
                    source,
                    target,
                    strength: 1.0 / source_degree.min(target_degree),
                    bias: source_degree / (source_degree + target_degree),
                    length: LINK_DISTANCE,
                }
            })
            .collect();

        self.repulsion = RepulsionModel::for_node_count(self.nodes.len());
        self.alpha = 1.0;
        self.alpha_target = 0.0;
        self.phase = SimPhase::Running;
    }

    /// One discrete step: forces, integration, collision relaxation, then
    /// alpha decay. Returns whether the layout may still be moving; a
    /// disposed or converged simulation is a no-op returning false.
    pub fn tick(&mut self) -> bool {
        if self.disposed || matches!(self.phase, SimPhase::Idle | SimPhase::Converged) {
            return false;
        }

        let alpha = self.alpha;
        let count = self.nodes.len();
        if count > 0 {
            self.scratch.positions.clear();
            self.scratch
                .positions
                .extend(self.nodes.iter().map(|node| node.position));
            self.scratch.kicks.resize(count, Vec2::ZERO);
            self.scratch.kicks.fill(Vec2::ZERO);

            self.repulsion
                .accumulate(&self.scratch.positions, alpha, &mut self.scratch.kicks);
            for (node, kick) in self.nodes.iter_mut().zip(&self.scratch.kicks) {
                node.velocity += *kick;
            }

            apply_link_forces(&mut self.nodes, &self.edges, alpha);

            for node in &mut self.nodes {
                if let Some(pin) = node.pin {
                    node.position = pin;
                    node.velocity = Vec2::ZERO;
                    continue;
                }

                node.velocity = node.velocity * VELOCITY_DECAY;
                node.position += node.velocity;
            }

            resolve_collisions(&mut self.nodes);
            apply_centering(&mut self.nodes);
        }

        self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
        if self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN {
            self.phase = SimPhase::Converged;
            return false;
        }

        self.phase = if self.alpha_target >= ALPHA_MIN {
            SimPhase::Running
        } else {
            SimPhase::Cooling
        };
        true
    }

    /// Raises the alpha target so the layout keeps responding during a
    /// gesture; restarts a converged simulation.
    pub fn reheat(&mut self, target: f64) {
        if self.disposed {
            return;
        }

        self.alpha_target = target.clamp(0.0, 1.0);
        if self.alpha_target >= ALPHA_MIN && self.phase != SimPhase::Idle {
            self.phase = SimPhase::Running;
        }
    }

    /// Restarts the cooling schedule at full energy over the current
    /// positions.
    pub fn restart(&mut self) {
        if self.disposed || self.nodes.is_empty() {
            return;
        }

        self.alpha = 1.0;
        self.alpha_target = 0.0;
        self.phase = SimPhase::Running;
    }

    /// Drops the alpha target back to zero so the layout settles.
    pub fn settle(&mut self) {
        if self.disposed {
            return;
        }
        self.alpha_target = 0.0;
    }

    /// Fixes a node at `position`. Unknown ids are an expected race with
    /// snapshot replacement and are silently ignored.
    pub fn pin(&mut self, id: &str, position: Vec2) {
        if self.disposed {
            return;
        }

        let Some(&index) = self.index_by_id.get(id) else {
            log::debug!("ignoring pin for unknown node {id:?}");
            return;
        };

        let node = &mut self.nodes[index];
        node.pin = Some(position);
        node.position = position;
        node.velocity = Vec2::ZERO;
    }

    pub fn unpin(&mut self, id: &str) {
        if self.disposed {
            return;
        }

        let Some(&index) = self.index_by_id.get(id) else {
            log::debug!("ignoring unpin for unknown node {id:?}");
            return;
        };

        self.nodes[index].pin = None;
    }

    /// Permanently stops the simulation. Any later tick or mutation is a
    /// guarded no-op, so stale frame callbacks cannot touch freed state.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    /// Debug overlay support: the Barnes-Hut cells over current positions.
    pub fn quadtree_cells(&self, cells: &mut Vec<QuadtreeCell>) {
        cells.clear();
        let positions = self
            .nodes
            .iter()
            .map(|node| node.position)
            .collect::<Vec<_>>();
        let Some(quadtree) = QuadNode::build(&positions) else {
            return;
        };
        collect_quadtree_cells(&quadtree, 0, cells);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};

    use crate::network::{
        EntityEdge, EntityNode, NetworkSnapshot, NodeCategory, RelationshipKind,
    };

    use super::*;

    fn snapshot(
        nodes: &[(&str, NodeCategory)],
        edges: &[(&str, &str, RelationshipKind)],
    ) -> NetworkSnapshot {
        let nodes = nodes
            .iter()
            .map(|(id, category)| EntityNode {
                id: (*id).to_owned(),
                category: *category,
                risk_score: 0.5,
                label: (*id).to_owned(),
                metadata: BTreeMap::new(),
            })
            .collect();
        let edges = edges
            .iter()
            .map(|(source, target, kind)| EntityEdge {
                source: (*source).to_owned(),
                target: (*target).to_owned(),
                kind: *kind,
                weight: 1.0,
                metadata: BTreeMap::new(),
            })
            .collect();

        NetworkSnapshot::new(nodes, edges, HashSet::new(), false).expect("test snapshot is valid")
    }

    fn pair_snapshot() -> NetworkSnapshot {
        snapshot(
            &[
                ("a", NodeCategory::Account),
                ("b", NodeCategory::Device),
                ("c", NodeCategory::Merchant),
            ],
            &[
                ("a", "b", RelationshipKind::SharedDevice),
                ("a", "c", RelationshipKind::Transaction),
            ],
        )
    }

    #[test]
    fn load_produces_finite_state_for_any_size() {
        for node_count in [0usize, 1, 5] {
            let descriptors = (0..node_count)
                .map(|index| format!("node-{index}"))
                .collect::<Vec<_>>();
            let nodes = descriptors
                .iter()
                .map(|id| (id.as_str(), NodeCategory::Device))
                .collect::<Vec<_>>();
            let simulation = Simulation::new(&snapshot(&nodes, &[]));

            assert_eq!(simulation.nodes().len(), node_count);
            for node in simulation.nodes() {
                assert!(node.position.is_finite());
                assert!(node.velocity.is_finite());
            }
        }
    }

    #[test]
    fn ticking_tiny_graphs_never_produces_nan() {
        for node_count in [0usize, 1, 2] {
            let descriptors = (0..node_count)
                .map(|index| format!("node-{index}"))
                .collect::<Vec<_>>();
            let nodes = descriptors
                .iter()
                .map(|id| (id.as_str(), NodeCategory::Account))
                .collect::<Vec<_>>();
            let mut simulation = Simulation::new(&snapshot(&nodes, &[]));

            for _ in 0..50 {
                simulation.tick();
            }
            for node in simulation.nodes() {
                assert!(node.position.is_finite());
                assert!(node.velocity.is_finite());
            }
        }
    }

    #[test]
    fn seeding_is_deterministic() {
        let snapshot = pair_snapshot();
        let first = Simulation::new(&snapshot);
        let second = Simulation::new(&snapshot);

        for (left, right) in first.nodes().iter().zip(second.nodes()) {
            assert_eq!(left.position, right.position);
        }
    }

    #[test]
    fn pinned_node_never_moves_until_unpinned() {
        let mut simulation = Simulation::new(&pair_snapshot());
        let pin_position = vec2(200.0, -150.0);
        simulation.pin("a", pin_position);

        for _ in 0..40 {
            simulation.tick();
            let index = simulation.node_index("a").expect("node exists");
            assert_eq!(simulation.nodes()[index].position, pin_position);
        }

        simulation.unpin("a");
        simulation.reheat(0.5);
        simulation.tick();

        let index = simulation.node_index("a").expect("node exists");
        assert_ne!(simulation.nodes()[index].position, pin_position);
    }

    #[test]
    fn alpha_decreases_monotonically_and_converges_once() {
        let mut simulation = Simulation::new(&pair_snapshot());
        let mut previous_alpha = simulation.alpha();
        let mut convergence_transitions = 0usize;

        for _ in 0..2_000 {
            let was_converged = simulation.phase() == SimPhase::Converged;
            simulation.tick();
            let alpha = simulation.alpha();
            assert!(alpha < previous_alpha || was_converged);
            previous_alpha = alpha;

            if !was_converged && simulation.phase() == SimPhase::Converged {
                convergence_transitions += 1;
            }
        }

        assert_eq!(convergence_transitions, 1);
        assert_eq!(simulation.phase(), SimPhase::Converged);
        assert!(!simulation.tick());
    }

    #[test]
    fn reheat_raises_alpha_and_restarts() {
        let mut simulation = Simulation::new(&pair_snapshot());
        while simulation.phase() != SimPhase::Converged {
            simulation.tick();
        }

        let floor = simulation.alpha();
        simulation.reheat(0.3);
        assert_eq!(simulation.phase(), SimPhase::Running);

        simulation.tick();
        assert!(simulation.alpha() > floor);

        simulation.settle();
        let peak = simulation.alpha();
        simulation.tick();
        assert!(simulation.alpha() < peak);
    }

    #[test]
    fn stale_pin_is_silently_ignored() {
        let mut simulation = Simulation::new(&pair_snapshot());
        simulation.pin("removed-node", vec2(10.0, 10.0));
        simulation.unpin("removed-node");

        assert!(simulation.nodes().iter().all(|node| node.pin.is_none()));
    }

    #[test]
    fn disposed_simulation_is_inert() {
        let mut simulation = Simulation::new(&pair_snapshot());
        simulation.tick();
        let positions_before = simulation
            .nodes()
            .iter()
            .map(|node| node.position)
            .collect::<Vec<_>>();

        simulation.dispose();

        assert!(!simulation.tick());
        simulation.pin("a", vec2(999.0, 999.0));
        simulation.reheat(1.0);
        simulation.load(&pair_snapshot());

        let positions_after = simulation
            .nodes()
            .iter()
            .map(|node| node.position)
            .collect::<Vec<_>>();
        assert_eq!(positions_before, positions_after);
        assert_eq!(simulation.alpha_target, 0.0);
    }

    #[test]
    fn layout_settles_to_small_displacements() {
        let mut simulation = Simulation::new(&pair_snapshot());

        let mut last_displacement = f64::INFINITY;
        for _ in 0..400 {
            let before = simulation
                .nodes()
                .iter()
                .map(|node| node.position)
                .collect::<Vec<_>>();
            if !simulation.tick() {
                break;
            }
            last_displacement = simulation
                .nodes()
                .iter()
                .zip(&before)
                .map(|(node, previous)| (node.position - *previous).length())
                .fold(0.0_f64, f64::max);
        }

        assert!(last_displacement < 1.0);
    }
}
