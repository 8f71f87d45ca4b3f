use super::quadtree::QuadNode;
use super::vec::{Vec2, vec2};
use super::{SimEdge, SimNode};

/// Spring rest length for every relationship edge, in world units.
pub(super) const LINK_DISTANCE: f64 = 100.0;
/// Charge strength for the n-body force; negative repels.
pub(super) const REPULSION_STRENGTH: f64 = -300.0;
pub(super) const BARNES_HUT_THETA: f64 = 0.9;
pub(super) const DISTANCE_EPSILON: f64 = 1e-6;
pub(super) const COLLISION_TOLERANCE: f64 = 0.5;

const BARNES_HUT_CUTOFF: usize = 50;
const CENTER_PULL: f64 = 0.05;
const COLLISION_ITERATIONS: usize = 8;

/// Deterministic unit direction used to split exactly coincident points.
pub(super) fn separation_direction(from: usize, to: usize) -> Vec2 {
    let angle =
        ((from as f64) * 0.618_034 + (to as f64) * 0.414_214) * std::f64::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Velocity increment one body receives from a charge of `mass` at offset
/// `delta` (pointing from the charge toward the body). Magnitude follows
/// `strength * mass * alpha / distance²`; the negative default strength makes
/// this repulsive.
pub(super) fn repulsion_increment(delta: Vec2, mass: f64, alpha: f64) -> Vec2 {
    let distance_sq = delta.length_sq().max(DISTANCE_EPSILON);
    let distance = distance_sq.sqrt();
    (delta / distance) * (-REPULSION_STRENGTH * mass * alpha / distance_sq)
}

/// How pairwise repulsion is evaluated. Both variants compute the same force
/// law; `BarnesHut` approximates distant clusters through the quadtree and is
/// selected for larger graphs, while `Exact` stays available as the
/// reference implementation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum RepulsionModel {
    Exact,
    BarnesHut { theta: f64 },
}

impl RepulsionModel {
    pub(super) fn for_node_count(count: usize) -> Self {
        if count > BARNES_HUT_CUTOFF {
            Self::BarnesHut {
                theta: BARNES_HUT_THETA,
            }
        } else {
            Self::Exact
        }
    }

    pub(super) fn accumulate(self, positions: &[Vec2], alpha: f64, velocities: &mut [Vec2]) {
        match self {
            Self::Exact => exact_repulsion(positions, alpha, velocities),
            Self::BarnesHut { theta } => {
                let Some(quadtree) = QuadNode::build(positions) else {
                    return;
                };
                for (index, velocity) in velocities.iter_mut().enumerate() {
                    quadtree.accumulate_repulsion(index, positions, alpha, theta, velocity);
                }
            }
        }
    }
}

fn exact_repulsion(positions: &[Vec2], alpha: f64, velocities: &mut [Vec2]) {
    for index in 0..positions.len() {
        for other in 0..positions.len() {
            if other == index {
                continue;
            }

            let mut delta = positions[index] - positions[other];
            if delta.length_sq() < DISTANCE_EPSILON {
                delta = separation_direction(index, other);
            }
            velocities[index] += repulsion_increment(delta, 1.0, alpha);
        }
    }
}

/// Spring force along every edge, d3-style: stiffness scaled by the lower
/// endpoint degree and the correction split by the degree bias so hub nodes
/// absorb less of it.
pub(super) fn apply_link_forces(nodes: &mut [SimNode], edges: &[SimEdge], alpha: f64) {
    for edge in edges {
        let (source, target) = (edge.source, edge.target);
        let mut delta = (nodes[target].position + nodes[target].velocity)
            - (nodes[source].position + nodes[source].velocity);
        if delta.length_sq() < DISTANCE_EPSILON {
            delta = separation_direction(source, target);
        }

        let distance = delta.length();
        let scale = (distance - edge.length) / distance * alpha * edge.strength;
        let correction = delta * scale;

        nodes[target].velocity -= correction * edge.bias;
        nodes[source].velocity += correction * (1.0 - edge.bias);
    }
}

/// Pulls the centroid of the layout gently toward the origin. Pinned nodes
/// keep their position; the result is a slow re-centering that does not
/// distort local structure.
pub(super) fn apply_centering(nodes: &mut [SimNode]) {
    if nodes.is_empty() {
        return;
    }

    let mut centroid = Vec2::ZERO;
    for node in nodes.iter() {
        centroid += node.position;
    }
    centroid = centroid / nodes.len() as f64;

    let shift = centroid * CENTER_PULL;
    if shift.length_sq() < DISTANCE_EPSILON {
        return;
    }

    for node in nodes.iter_mut() {
        if node.pin.is_none() {
            node.position -= shift;
        }
    }
}

/// Post-integration circle-circle overlap relaxation. Overlapping pairs are
/// displaced apart, split by radius share; pinned nodes never move, so their
/// counterpart takes the full displacement.
pub(super) fn resolve_collisions(nodes: &mut [SimNode]) {
    for _ in 0..COLLISION_ITERATIONS {
        let mut any_overlap = false;

        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let min_distance = nodes[i].radius + nodes[j].radius;
                let mut delta = nodes[i].position - nodes[j].position;
                if delta.length_sq() < DISTANCE_EPSILON {
                    delta = separation_direction(i, j) * DISTANCE_EPSILON.sqrt();
                }

                let distance = delta.length();
                if distance >= min_distance - COLLISION_TOLERANCE {
                    continue;
                }

                let overlap = min_distance - distance;
                let direction = delta / distance;
                let i_free = nodes[i].pin.is_none();
                let j_free = nodes[j].pin.is_none();

                match (i_free, j_free) {
                    (true, true) => {
                        let i_share = nodes[j].radius / min_distance;
                        nodes[i].position += direction * (overlap * i_share);
                        nodes[j].position -= direction * (overlap * (1.0 - i_share));
                    }
                    (true, false) => {
                        nodes[i].position += direction * overlap;
                    }
                    (false, true) => {
                        nodes[j].position -= direction * overlap;
                    }
                    (false, false) => continue,
                }
                any_overlap = true;
            }
        }

        if !any_overlap {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{SimEdge, SimNode};
    use super::*;

    fn free_node(id: &str, x: f64, y: f64, radius: f64) -> SimNode {
        SimNode {
            id: id.to_owned(),
            position: vec2(x, y),
            velocity: Vec2::ZERO,
            pin: None,
            radius,
        }
    }

    #[test]
    fn exact_repulsion_pushes_pairs_apart() {
        let positions = vec![vec2(-5.0, 0.0), vec2(5.0, 0.0)];
        let mut velocities = vec![Vec2::ZERO; 2];
        RepulsionModel::Exact.accumulate(&positions, 1.0, &mut velocities);

        assert!(velocities[0].x < 0.0);
        assert!(velocities[1].x > 0.0);
        assert!((velocities[0].x + velocities[1].x).abs() < 1e-9);
    }

    #[test]
    fn coincident_nodes_repel_without_nan() {
        let positions = vec![vec2(3.0, 3.0), vec2(3.0, 3.0)];
        let mut velocities = vec![Vec2::ZERO; 2];
        RepulsionModel::Exact.accumulate(&positions, 1.0, &mut velocities);

        for velocity in &velocities {
            assert!(velocity.is_finite());
            assert!(velocity.length_sq() > 0.0);
        }
    }

    #[test]
    fn link_force_pulls_stretched_edge_together() {
        let mut nodes = vec![
            free_node("a", 0.0, 0.0, 15.0),
            free_node("b", 300.0, 0.0, 15.0),
        ];
        let edges = vec![SimEdge {
            source: 0,
            target: 1,
            strength: 1.0,
            bias: 0.5,
            length: LINK_DISTANCE,
        }];

        apply_link_forces(&mut nodes, &edges, 1.0);

        // 300 apart with rest length 100: endpoints accelerate toward each
        // other.
        assert!(nodes[0].velocity.x > 0.0);
        assert!(nodes[1].velocity.x < 0.0);
    }

    #[test]
    fn link_force_pushes_compressed_edge_apart() {
        let mut nodes = vec![
            free_node("a", 0.0, 0.0, 15.0),
            free_node("b", 10.0, 0.0, 15.0),
        ];
        let edges = vec![SimEdge {
            source: 0,
            target: 1,
            strength: 1.0,
            bias: 0.5,
            length: LINK_DISTANCE,
        }];

        apply_link_forces(&mut nodes, &edges, 1.0);

        assert!(nodes[0].velocity.x < 0.0);
        assert!(nodes[1].velocity.x > 0.0);
    }

    #[test]
    fn collision_resolution_separates_overlapping_disks() {
        let mut nodes = vec![
            free_node("a", 0.0, 0.0, 20.0),
            free_node("b", 4.0, 0.0, 15.0),
            free_node("c", -3.0, 2.0, 15.0),
        ];

        resolve_collisions(&mut nodes);

        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let distance = (nodes[i].position - nodes[j].position).length();
                let min_distance = nodes[i].radius + nodes[j].radius;
                assert!(
                    distance >= min_distance - COLLISION_TOLERANCE,
                    "pair ({i}, {j}) still overlaps: {distance} < {min_distance}"
                );
            }
        }
    }

    #[test]
    fn collision_resolution_never_moves_pinned_nodes() {
        let mut pinned = free_node("a", 0.0, 0.0, 20.0);
        pinned.pin = Some(vec2(0.0, 0.0));
        let mut nodes = vec![pinned, free_node("b", 5.0, 0.0, 20.0)];

        resolve_collisions(&mut nodes);

        assert_eq!(nodes[0].position, vec2(0.0, 0.0));
        let distance = (nodes[0].position - nodes[1].position).length();
        assert!(distance >= 40.0 - COLLISION_TOLERANCE);
    }

    #[test]
    fn centering_shifts_centroid_toward_origin() {
        let mut nodes = vec![
            free_node("a", 100.0, 100.0, 15.0),
            free_node("b", 140.0, 100.0, 15.0),
        ];
        let centroid_before = (nodes[0].position + nodes[1].position) / 2.0;

        apply_centering(&mut nodes);

        let centroid_after = (nodes[0].position + nodes[1].position) / 2.0;
        assert!(centroid_after.length() < centroid_before.length());
    }

    #[test]
    fn strategy_selection_switches_on_graph_size() {
        assert_eq!(RepulsionModel::for_node_count(10), RepulsionModel::Exact);
        assert_eq!(RepulsionModel::for_node_count(50), RepulsionModel::Exact);
        assert_eq!(
            RepulsionModel::for_node_count(51),
            RepulsionModel::BarnesHut {
                theta: BARNES_HUT_THETA
            }
        );
    }
}
