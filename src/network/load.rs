use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::NetworkSnapshot;
use super::parse::parse_snapshot;

/// Reads and validates a network snapshot from a JSON file. The file format
/// is the fraud-ring API response: nodes, edges, ring membership, and the
/// ring-detected flag. Fetching that payload is the host's concern; this
/// viewer only consumes the saved document.
pub fn load_snapshot(path: &str) -> Result<NetworkSnapshot> {
    let raw = fs::read_to_string(Path::new(path))
        .with_context(|| format!("failed to read network snapshot from {path}"))?;

    let snapshot = parse_snapshot(&raw)
        .with_context(|| format!("failed to parse network snapshot {path}"))?;

    log::info!(
        "loaded snapshot {path}: {} nodes, {} edges, ring detected: {}",
        snapshot.node_count(),
        snapshot.edge_count(),
        snapshot.fraud_ring_detected
    );

    Ok(snapshot)
}
