//! Core Blueprint data structures.
//!
//! A `Blueprint` is the owning document; it holds named `BlueprintGraph`s
//! (an event graph by default, plus any function graphs). Graphs hold nodes,
//! pins and connections. Nothing here mutates — all structural edits go
//! through the operations in `ops.rs` so the validate-then-commit discipline
//! has a single home.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GraphError;

/// Name of the graph every fresh blueprint starts with.
pub const DEFAULT_GRAPH: &str = "EventGraph";

/// Free-form node properties (defaults, literals, display hints).
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// Identifier of a node, stable for the graph's lifetime and never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of one pin on one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    pub node: NodeId,
    pub pin: String,
}

impl PinRef {
    pub fn new(node: NodeId, pin: impl Into<String>) -> Self {
        Self {
            node,
            pin: pin.into(),
        }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.pin)
    }
}

/// Direction of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDirection {
    Input,
    Output,
}

/// Data types a value pin can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Boolean,
    Integer,
    Float,
    String,
    Vector,
}

impl ValueType {
    /// Whether a value of `self` may drive a pin of type `dest`.
    /// Equal types always; integers widen to floats.
    pub fn assignable_to(self, dest: ValueType) -> bool {
        self == dest || (self == ValueType::Integer && dest == ValueType::Float)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Vector => "vector",
        };
        f.write_str(s)
    }
}

/// What flows through a pin: control flow or a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinKind {
    Exec,
    Value(ValueType),
}

impl PinKind {
    /// Whether a connection from a `source` pin of this kind into `dest` is
    /// type-correct.
    pub fn connectable_to(self, dest: PinKind) -> bool {
        match (self, dest) {
            (PinKind::Exec, PinKind::Exec) => true,
            (PinKind::Value(s), PinKind::Value(d)) => s.assignable_to(d),
            _ => false,
        }
    }
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinKind::Exec => f.write_str("exec"),
            PinKind::Value(t) => write!(f, "{}", t),
        }
    }
}

/// A typed connection point on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub name: String,
    pub direction: PinDirection,
    pub kind: PinKind,
}

/// Display-only node placement. Carries no semantics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
}

/// A unit of computation or control in a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Catalog tag, e.g. `"branch"` or `"print_string"`.
    pub node_type: String,
    pub pins: BTreeMap<String, Pin>,
    pub position: NodePosition,
    pub properties: PropertyMap,
}

impl Node {
    /// Look up a pin by name.
    pub fn pin(&self, name: &str) -> Option<&Pin> {
        self.pins.get(name)
    }
}

/// An ordered source -> destination pin pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub source: PinRef,
    pub dest: PinRef,
}

/// One node-graph inside a blueprint.
///
/// Nodes are keyed by id; ids are allocated monotonically, so iteration
/// order is insertion order. The generation counter increases on every
/// accepted mutation and never moves on a rejected one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintGraph {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) generation: u64,
    pub(crate) next_node_id: u64,
}

impl BlueprintGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            nodes: BTreeMap::new(),
            connections: Vec::new(),
            generation: 0,
            next_node_id: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Resolve a pin reference to its pin, if both node and pin exist.
    pub fn resolve_pin(&self, pin_ref: &PinRef) -> Option<&Pin> {
        self.nodes.get(&pin_ref.node)?.pin(&pin_ref.pin)
    }

    /// Connections whose source or destination sits on the given node.
    pub fn connections_touching(&self, node: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(move |c| c.source.node == node || c.dest.node == node)
    }

    /// Number of connections arriving at the given pin.
    pub fn incoming_count(&self, pin_ref: &PinRef) -> usize {
        self.connections.iter().filter(|c| &c.dest == pin_ref).count()
    }
}

/// The owning document: a named set of graphs.
///
/// Blueprints are created or loaded once per editing session by the asset
/// layer; the bridge core only ever mutates the graphs inside one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    id: Uuid,
    name: String,
    graphs: BTreeMap<String, BlueprintGraph>,
}

impl Blueprint {
    /// Create a blueprint with the default event graph.
    pub fn new(name: impl Into<String>) -> Self {
        let mut graphs = BTreeMap::new();
        graphs.insert(
            DEFAULT_GRAPH.to_string(),
            BlueprintGraph::new(DEFAULT_GRAPH),
        );
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            graphs,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self, name: &str) -> Result<&BlueprintGraph, GraphError> {
        self.graphs
            .get(name)
            .ok_or_else(|| GraphError::GraphNotFound(name.to_string()))
    }

    pub fn graph_mut(&mut self, name: &str) -> Result<&mut BlueprintGraph, GraphError> {
        self.graphs
            .get_mut(name)
            .ok_or_else(|| GraphError::GraphNotFound(name.to_string()))
    }

    /// Add an empty function graph. Replaces nothing; a second graph with
    /// the same name is an error at the asset layer, not here.
    pub fn create_graph(&mut self, name: impl Into<String>) -> &mut BlueprintGraph {
        let name = name.into();
        self.graphs
            .entry(name.clone())
            .or_insert_with(|| BlueprintGraph::new(name))
    }

    pub fn graphs(&self) -> impl Iterator<Item = &BlueprintGraph> {
        self.graphs.values()
    }

    /// Swap a graph wholesale. Used by multi-step edits that build the new
    /// state on a scratch copy and commit it only on full success.
    pub(crate) fn replace_graph(&mut self, name: &str, graph: BlueprintGraph) {
        self.graphs.insert(name.to_string(), graph);
    }
}
