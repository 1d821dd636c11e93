//! Graph mutations.
//!
//! Every operation validates completely before touching any state, so a
//! failed call leaves the graph byte-for-byte unchanged. The generation
//! counter moves exactly once per accepted mutation.

use serde_json::Value;

use crate::error::GraphError;

use super::catalog::NodeCatalog;
use super::model::{
    BlueprintGraph, Connection, Node, NodeId, NodePosition, Pin, PinDirection, PinKind,
    PinRef, PropertyMap,
};

impl BlueprintGraph {
    /// Instantiate a node of a catalog type. Properties named `x`/`y` set
    /// the display position; the rest land in the property map.
    pub fn add_node(
        &mut self,
        catalog: &NodeCatalog,
        node_type: &str,
        mut properties: PropertyMap,
    ) -> Result<NodeId, GraphError> {
        let spec = catalog
            .get(node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(node_type.to_string()))?;

        let id = NodeId(self.next_node_id);

        let pins = spec
            .pins
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    Pin {
                        name: p.name.clone(),
                        direction: p.direction,
                        kind: p.kind,
                    },
                )
            })
            .collect();

        let mut position = NodePosition::default();
        if let Some(x) = properties.remove("x").and_then(|v| v.as_f64()) {
            position.x = x;
        }
        if let Some(y) = properties.remove("y").and_then(|v| v.as_f64()) {
            position.y = y;
        }

        self.nodes.insert(
            id,
            Node {
                id,
                node_type: node_type.to_string(),
                pins,
                position,
                properties,
            },
        );
        self.next_node_id += 1;
        self.generation += 1;

        Ok(id)
    }

    /// Remove a node, cascading away every connection that touches it.
    /// Returns how many connections were removed.
    pub fn remove_node(&mut self, id: NodeId) -> Result<usize, GraphError> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }

        let before = self.connections.len();
        self.connections
            .retain(|c| c.source.node != id && c.dest.node != id);
        let removed = before - self.connections.len();

        self.nodes.remove(&id);
        self.generation += 1;

        Ok(removed)
    }

    /// Connect an output pin to an input pin.
    pub fn connect(&mut self, source: PinRef, dest: PinRef) -> Result<(), GraphError> {
        let source_pin = self
            .resolve_pin(&source)
            .ok_or_else(|| GraphError::PinNotFound(source.clone()))?;
        let dest_pin = self
            .resolve_pin(&dest)
            .ok_or_else(|| GraphError::PinNotFound(dest.clone()))?;

        if source_pin.direction != PinDirection::Output
            || dest_pin.direction != PinDirection::Input
        {
            return Err(GraphError::DirectionMismatch {
                source_pin: source,
                dest_pin: dest,
            });
        }

        if !source_pin.kind.connectable_to(dest_pin.kind) {
            return Err(GraphError::TypeMismatch {
                source_kind: source_pin.kind.to_string(),
                dest_kind: dest_pin.kind.to_string(),
                source_pin: source,
                dest_pin: dest,
            });
        }

        // A second identical connection is never meaningful.
        if self
            .connections
            .iter()
            .any(|c| c.source == source && c.dest == dest)
        {
            return Err(GraphError::InputAlreadyBound(dest));
        }

        // Value inputs take a single incoming connection; the caller must
        // disconnect first. Exec pins and value outputs fan out freely.
        if matches!(dest_pin.kind, PinKind::Value(_)) && self.incoming_count(&dest) > 0 {
            return Err(GraphError::InputAlreadyBound(dest));
        }

        self.connections.push(Connection { source, dest });
        self.generation += 1;

        Ok(())
    }

    /// Remove one existing connection.
    pub fn disconnect(&mut self, source: &PinRef, dest: &PinRef) -> Result<(), GraphError> {
        if self.resolve_pin(source).is_none() {
            return Err(GraphError::PinNotFound(source.clone()));
        }
        if self.resolve_pin(dest).is_none() {
            return Err(GraphError::PinNotFound(dest.clone()));
        }

        let idx = self
            .connections
            .iter()
            .position(|c| &c.source == source && &c.dest == dest)
            .ok_or_else(|| GraphError::ConnectionNotFound {
                source_pin: source.clone(),
                dest_pin: dest.clone(),
            })?;

        self.connections.remove(idx);
        self.generation += 1;

        Ok(())
    }

    /// Set a node property. `x`/`y` with numeric values update the display
    /// position instead of the property map.
    pub fn set_property(
        &mut self,
        id: NodeId,
        key: &str,
        value: Value,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound(id))?;

        match (key, value.as_f64()) {
            ("x", Some(x)) => node.position.x = x,
            ("y", Some(y)) => node.position.y = y,
            _ => {
                node.properties.insert(key.to_string(), value);
            }
        }
        self.generation += 1;

        Ok(())
    }
}
