//! Graph model — the in-memory Blueprint document and its consistency rules.
//!
//! Split into:
//! - `model`: data structures (blueprint, graphs, nodes, pins, connections)
//! - `catalog`: the closed node-type registry
//! - `ops`: validate-then-commit mutations
//! - `snapshot`: read-only serializable views
//! - `persistence`: on-disk save/load

pub mod catalog;
pub mod model;
pub mod ops;
pub mod persistence;
pub mod snapshot;

pub use catalog::{NodeCatalog, NodeSpec, PinSpec};
pub use model::{
    Blueprint, BlueprintGraph, Connection, Node, NodeId, NodePosition, Pin, PinDirection,
    PinKind, PinRef, PropertyMap, ValueType, DEFAULT_GRAPH,
};
pub use snapshot::{ConnectionView, GraphSnapshot, NodeView, PinView};
