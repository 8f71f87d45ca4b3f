mod load;
mod model;
mod parse;

pub use load::load_snapshot;
pub use model::{
    EntityEdge, EntityNode, MalformedGraph, NetworkSnapshot, NodeCategory, RelationshipKind,
};
