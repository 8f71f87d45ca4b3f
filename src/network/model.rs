use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    Account,
    Merchant,
    Device,
    IpAddress,
}

impl NodeCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Merchant => "merchant",
            Self::Device => "device",
            Self::IpAddress => "ip address",
        }
    }

    /// Disk radius in world units, used for collision and hit-testing.
    pub fn radius(self) -> f64 {
        match self {
            Self::Account => 20.0,
            _ => 15.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    Transaction,
    SharedDevice,
    SharedIp,
}

impl RelationshipKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::SharedDevice => "shared device",
            Self::SharedIp => "shared IP",
        }
    }
}

#[derive(Clone, Debug)]
pub struct EntityNode {
    pub id: String,
    pub category: NodeCategory,
    pub risk_score: f64,
    pub label: String,
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Clone, Debug)]
pub struct EntityEdge {
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
    pub weight: f64,
    pub metadata: BTreeMap<String, Value>,
}

/// A snapshot failed structural validation. Loading never replaces existing
/// state when this is returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MalformedGraph {
    DuplicateNode { id: String },
    DanglingEdge { edge: usize, missing: String },
}

impl fmt::Display for MalformedGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode { id } => write!(f, "duplicate node id {id:?}"),
            Self::DanglingEdge { edge, missing } => {
                write!(f, "edge {edge} references missing node {missing:?}")
            }
        }
    }
}

impl std::error::Error for MalformedGraph {}

/// One immutable loaded graph: entities, relationships, and the ring flags
/// computed upstream. Replaced wholesale on reload, never patched.
#[derive(Clone, Debug)]
pub struct NetworkSnapshot {
    pub nodes: Vec<EntityNode>,
    pub edges: Vec<EntityEdge>,
    pub ring_members: HashSet<String>,
    pub fraud_ring_detected: bool,
    index_by_id: HashMap<String, usize>,
}

impl NetworkSnapshot {
    pub fn new(
        nodes: Vec<EntityNode>,
        edges: Vec<EntityEdge>,
        ring_members: HashSet<String>,
        fraud_ring_detected: bool,
    ) -> Result<Self, MalformedGraph> {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            if index_by_id.insert(node.id.clone(), index).is_some() {
                return Err(MalformedGraph::DuplicateNode {
                    id: node.id.clone(),
                });
            }
        }

        for (edge_index, edge) in edges.iter().enumerate() {
            for endpoint in [&edge.source, &edge.target] {
                if !index_by_id.contains_key(endpoint) {
                    return Err(MalformedGraph::DanglingEdge {
                        edge: edge_index,
                        missing: endpoint.clone(),
                    });
                }
            }
        }

        // Ring membership is a display attribute; ids that no longer resolve
        // are dropped rather than rejected.
        let mut ring_members = ring_members;
        ring_members.retain(|id| {
            let known = index_by_id.contains_key(id);
            if !known {
                log::warn!("dropping unknown ring member id {id:?}");
            }
            known
        });

        Ok(Self {
            nodes,
            edges,
            ring_members,
            fraud_ring_detected,
            index_by_id,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&EntityNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn is_ring_member(&self, id: &str) -> bool {
        self.ring_members.contains(id)
    }

    /// Indices of nodes sharing an edge with `id`, in either direction.
    pub fn neighbor_indices(&self, id: &str) -> HashSet<usize> {
        let mut neighbors = HashSet::new();
        for edge in &self.edges {
            if edge.source == id {
                if let Some(index) = self.index_of(&edge.target) {
                    neighbors.insert(index);
                }
            } else if edge.target == id {
                if let Some(index) = self.index_of(&edge.source) {
                    neighbors.insert(index);
                }
            }
        }
        neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, category: NodeCategory) -> EntityNode {
        EntityNode {
            id: id.to_owned(),
            category,
            risk_score: 0.5,
            label: id.to_owned(),
            metadata: BTreeMap::new(),
        }
    }

    fn edge(source: &str, target: &str) -> EntityEdge {
        EntityEdge {
            source: source.to_owned(),
            target: target.to_owned(),
            kind: RelationshipKind::Transaction,
            weight: 1.0,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn accepts_well_formed_snapshot() {
        let snapshot = NetworkSnapshot::new(
            vec![node("a", NodeCategory::Account), node("b", NodeCategory::Device)],
            vec![edge("a", "b")],
            HashSet::from(["a".to_owned()]),
            true,
        )
        .expect("snapshot is valid");

        assert_eq!(snapshot.node_count(), 2);
        assert_eq!(snapshot.edge_count(), 1);
        assert!(snapshot.is_ring_member("a"));
        assert!(!snapshot.is_ring_member("b"));
        assert_eq!(snapshot.neighbor_indices("a"), HashSet::from([1]));
    }

    #[test]
    fn rejects_dangling_edge_endpoint() {
        let result = NetworkSnapshot::new(
            vec![node("a", NodeCategory::Account)],
            vec![edge("a", "ghost")],
            HashSet::new(),
            false,
        );

        assert_eq!(
            result.unwrap_err(),
            MalformedGraph::DanglingEdge {
                edge: 0,
                missing: "ghost".to_owned(),
            }
        );
    }

    #[test]
    fn rejects_duplicate_node_id() {
        let result = NetworkSnapshot::new(
            vec![node("a", NodeCategory::Account), node("a", NodeCategory::Device)],
            Vec::new(),
            HashSet::new(),
            false,
        );

        assert_eq!(
            result.unwrap_err(),
            MalformedGraph::DuplicateNode { id: "a".to_owned() }
        );
    }

    #[test]
    fn drops_unknown_ring_members() {
        let snapshot = NetworkSnapshot::new(
            vec![node("a", NodeCategory::Account)],
            Vec::new(),
            HashSet::from(["a".to_owned(), "ghost".to_owned()]),
            true,
        )
        .expect("unknown ring members are not fatal");

        assert!(snapshot.is_ring_member("a"));
        assert!(!snapshot.is_ring_member("ghost"));
    }

    #[test]
    fn category_radii_match_display_contract() {
        assert_eq!(NodeCategory::Account.radius(), 20.0);
        assert_eq!(NodeCategory::Merchant.radius(), 15.0);
        assert_eq!(NodeCategory::Device.radius(), 15.0);
        assert_eq!(NodeCategory::IpAddress.radius(), 15.0);
    }
}
