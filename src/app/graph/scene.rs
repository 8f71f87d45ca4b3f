use std::collections::HashSet;

use eframe::egui::Color32;

use crate::network::NetworkSnapshot;

use super::super::render_utils::{
    DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH, RING_STROKE_COLOR, RING_STROKE_WIDTH,
    SELECTED_STROKE_COLOR, dim_color, node_fill, relationship_color,
};
use super::super::sim::{Simulation, Vec2};

const SELECTED_STROKE_WIDTH: f32 = 3.5;
const DIM_FACTOR: f32 = 0.45;

/// Per-frame render record for one node: everything the painter needs,
/// nothing it has to derive.
pub(in crate::app) struct NodeSprite {
    pub index: usize,
    pub position: Vec2,
    pub radius: f64,
    pub fill: Color32,
    pub stroke_color: Color32,
    pub stroke_width: f32,
    pub emphasized: bool,
}

pub(in crate::app) struct EdgeSprite {
    pub source: Vec2,
    pub target: Vec2,
    pub color: Color32,
    pub width: f32,
    pub emphasized: bool,
}

pub(in crate::app) struct Scene {
    pub nodes: Vec<NodeSprite>,
    pub edges: Vec<EdgeSprite>,
}

/// Derives the frame's render records from simulation positions, snapshot
/// attributes, and the current selection. Ring membership always wins the
/// stroke; an active selection dims everything outside its neighborhood.
pub(in crate::app) fn build_scene(
    snapshot: &NetworkSnapshot,
    simulation: &Simulation,
    selected: Option<&str>,
) -> Scene {
    let selected = selected.filter(|id| snapshot.index_of(id).is_some());
    let neighbors = selected
        .map(|id| snapshot.neighbor_indices(id))
        .unwrap_or_else(HashSet::new);
    let selected_index = selected.and_then(|id| snapshot.index_of(id));
    let selection_active = selected_index.is_some();

    let nodes = simulation
        .nodes()
        .iter()
        .zip(&snapshot.nodes)
        .enumerate()
        .map(|(index, (sim_node, entity))| {
            let is_selected = selected_index == Some(index);
            let emphasized = is_selected || neighbors.contains(&index);
            let ring_member = snapshot.is_ring_member(&entity.id);

            let mut fill = node_fill(entity.category, entity.risk_score);
            if selection_active && !emphasized {
                fill = dim_color(fill, DIM_FACTOR);
            }

            let (stroke_color, stroke_width) = if ring_member {
                (RING_STROKE_COLOR, RING_STROKE_WIDTH)
            } else if is_selected {
                (SELECTED_STROKE_COLOR, SELECTED_STROKE_WIDTH)
            } else {
                (DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH)
            };

            NodeSprite {
                index,
                position: sim_node.position,
                radius: sim_node.radius,
                fill,
                stroke_color,
                stroke_width,
                emphasized,
            }
        })
        .collect();

    let edges = snapshot
        .edges
        .iter()
        .filter_map(|edge| {
            let source = snapshot.index_of(&edge.source)?;
            let target = snapshot.index_of(&edge.target)?;
            let source_position = simulation.nodes().get(source)?.position;
            let target_position = simulation.nodes().get(target)?.position;

            let emphasized = selected_index
                .is_some_and(|index| index == source || index == target);
            let mut color = relationship_color(edge.kind);
            if selection_active && !emphasized {
                color = dim_color(color, DIM_FACTOR);
            }

            Some(EdgeSprite {
                source: source_position,
                target: target_position,
                color,
                width: (edge.weight.sqrt() * 2.0) as f32,
                emphasized,
            })
        })
        .collect();

    Scene { nodes, edges }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};

    use crate::network::{EntityEdge, EntityNode, NodeCategory, RelationshipKind};

    use super::*;

    fn ring_snapshot() -> NetworkSnapshot {
        let node = |id: &str, category: NodeCategory| EntityNode {
            id: id.to_owned(),
            category,
            risk_score: 0.5,
            label: id.to_owned(),
            metadata: BTreeMap::new(),
        };
        let edge = |source: &str, target: &str| EntityEdge {
            source: source.to_owned(),
            target: target.to_owned(),
            kind: RelationshipKind::SharedDevice,
            weight: 1.0,
            metadata: BTreeMap::new(),
        };

        NetworkSnapshot::new(
            vec![
                node("A", NodeCategory::Account),
                node("B", NodeCategory::Device),
                node("C", NodeCategory::Device),
                node("D", NodeCategory::Account),
            ],
            vec![edge("A", "B"), edge("D", "C")],
            HashSet::from(["A".to_owned(), "D".to_owned()]),
            true,
        )
        .expect("ring snapshot is valid")
    }

    #[test]
    fn converged_ring_scenario_highlights_ring_members() {
        let snapshot = ring_snapshot();
        let mut simulation = Simulation::new(&snapshot);

        let mut displacement = f64::INFINITY;
        for _ in 0..2_000 {
            let before = simulation
                .nodes()
                .iter()
                .map(|node| node.position)
                .collect::<Vec<_>>();
            if !simulation.tick() {
                break;
            }
            displacement = simulation
                .nodes()
                .iter()
                .zip(&before)
                .map(|(node, previous)| (node.position - *previous).length())
                .fold(0.0_f64, f64::max);
        }
        assert!(displacement < 0.5, "layout did not converge: {displacement}");

        let scene = build_scene(&snapshot, &simulation, None);
        assert_eq!(scene.nodes.len(), 4);
        assert_eq!(scene.edges.len(), 2);

        for sprite in &scene.nodes {
            assert!(sprite.position.is_finite());
        }

        // A (index 0) and D (index 3) carry the ring stroke; B and C do not.
        for index in [0usize, 3] {
            assert_eq!(scene.nodes[index].stroke_color, RING_STROKE_COLOR);
            assert_eq!(scene.nodes[index].stroke_width, RING_STROKE_WIDTH);
        }
        for index in [1usize, 2] {
            assert_eq!(scene.nodes[index].stroke_color, DEFAULT_STROKE_COLOR);
            assert_eq!(scene.nodes[index].stroke_width, DEFAULT_STROKE_WIDTH);
        }

        for sprite in &scene.edges {
            assert_eq!(sprite.color, relationship_color(RelationshipKind::SharedDevice));
            assert_eq!(sprite.width, 2.0);
        }
    }

    #[test]
    fn selection_emphasizes_its_neighborhood() {
        let snapshot = ring_snapshot();
        let simulation = Simulation::new(&snapshot);

        let scene = build_scene(&snapshot, &simulation, Some("A"));

        assert!(scene.nodes[0].emphasized);
        assert!(scene.nodes[1].emphasized);
        assert!(!scene.nodes[2].emphasized);
        assert!(!scene.nodes[3].emphasized);

        assert!(scene.edges[0].emphasized);
        assert!(!scene.edges[1].emphasized);
        // The un-emphasized edge is dimmed.
        assert_ne!(
            scene.edges[1].color,
            relationship_color(RelationshipKind::SharedDevice)
        );
    }

    #[test]
    fn stale_selection_is_ignored() {
        let snapshot = ring_snapshot();
        let simulation = Simulation::new(&snapshot);

        let scene = build_scene(&snapshot, &simulation, Some("gone"));
        assert!(scene.nodes.iter().all(|sprite| !sprite.emphasized));
    }
}
