use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use super::model::{
    EntityEdge, EntityNode, NetworkSnapshot, NodeCategory, RelationshipKind,
};

const MIN_EDGE_WEIGHT: f64 = 0.1;

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawNode {
    pub(super) id: String,
    #[serde(rename = "type")]
    pub(super) category: String,
    #[serde(default)]
    pub(super) risk_score: f64,
    #[serde(default)]
    pub(super) label: String,
    #[serde(default)]
    pub(super) metadata: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawEdge {
    pub(super) source: String,
    pub(super) target: String,
    pub(super) relationship: String,
    #[serde(default)]
    pub(super) weight: f64,
    #[serde(default)]
    pub(super) metadata: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawNetwork {
    pub(super) nodes: Vec<RawNode>,
    pub(super) edges: Vec<RawEdge>,
    #[serde(default)]
    pub(super) fraud_ring_detected: bool,
    #[serde(default)]
    pub(super) ring_members: Vec<String>,
}

fn parse_category(raw: &str) -> Result<NodeCategory> {
    match raw {
        "account" => Ok(NodeCategory::Account),
        "merchant" => Ok(NodeCategory::Merchant),
        "device" => Ok(NodeCategory::Device),
        "ip" | "ip_address" => Ok(NodeCategory::IpAddress),
        other => Err(anyhow!("unknown node category {other:?}")),
    }
}

fn parse_relationship(raw: &str) -> Result<RelationshipKind> {
    match raw {
        "transaction" => Ok(RelationshipKind::Transaction),
        "shared_device" => Ok(RelationshipKind::SharedDevice),
        "shared_ip" => Ok(RelationshipKind::SharedIp),
        other => Err(anyhow!("unknown relationship kind {other:?}")),
    }
}

pub(super) fn parse_snapshot(raw: &str) -> Result<NetworkSnapshot> {
    let parsed: RawNetwork =
        serde_json::from_str(raw).context("invalid network snapshot JSON")?;

    let mut nodes = Vec::with_capacity(parsed.nodes.len());
    for raw_node in parsed.nodes {
        let category = parse_category(&raw_node.category)
            .with_context(|| format!("node {:?}", raw_node.id))?;
        let label = if raw_node.label.is_empty() {
            raw_node.id.clone()
        } else {
            raw_node.label
        };

        nodes.push(EntityNode {
            id: raw_node.id,
            category,
            risk_score: raw_node.risk_score.clamp(0.0, 1.0),
            label,
            metadata: raw_node.metadata,
        });
    }

    let mut edges = Vec::with_capacity(parsed.edges.len());
    for (index, raw_edge) in parsed.edges.into_iter().enumerate() {
        let kind = parse_relationship(&raw_edge.relationship)
            .with_context(|| format!("edge {index}"))?;

        edges.push(EntityEdge {
            source: raw_edge.source,
            target: raw_edge.target,
            kind,
            weight: if raw_edge.weight > 0.0 {
                raw_edge.weight
            } else {
                MIN_EDGE_WEIGHT
            },
            metadata: raw_edge.metadata,
        });
    }

    let ring_members = parsed.ring_members.into_iter().collect::<HashSet<_>>();

    NetworkSnapshot::new(nodes, edges, ring_members, parsed.fraud_ring_detected)
        .map_err(anyhow::Error::from)
}
