//! Read-only graph views.
//!
//! Separated from the model so the wire shape can evolve independently of
//! the in-memory representation. Snapshots serialize deterministically:
//! nodes in id order, connections in insertion order — the equality tests
//! for command atomicity depend on that.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{
    BlueprintGraph, NodeId, NodePosition, PinDirection, PinKind, PinRef, PropertyMap,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinView {
    pub name: String,
    pub direction: PinDirection,
    pub kind: PinKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub node_type: String,
    pub position: NodePosition,
    pub pins: Vec<PinView>,
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionView {
    pub source: PinRef,
    pub dest: PinRef,
}

/// A complete read-only view of one graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub graph_id: Uuid,
    pub name: String,
    pub generation: u64,
    pub nodes: Vec<NodeView>,
    pub connections: Vec<ConnectionView>,
}

impl BlueprintGraph {
    /// Capture the current state as a serializable view.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            graph_id: self.id(),
            name: self.name().to_string(),
            generation: self.generation(),
            nodes: self
                .nodes()
                .map(|n| NodeView {
                    id: n.id,
                    node_type: n.node_type.clone(),
                    position: n.position,
                    pins: n
                        .pins
                        .values()
                        .map(|p| PinView {
                            name: p.name.clone(),
                            direction: p.direction,
                            kind: p.kind,
                        })
                        .collect(),
                    properties: n.properties.clone(),
                })
                .collect(),
            connections: self
                .connections()
                .iter()
                .map(|c| ConnectionView {
                    source: c.source.clone(),
                    dest: c.dest.clone(),
                })
                .collect(),
        }
    }
}
