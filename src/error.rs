//! Error types for the bridge.
//!
//! Two layers: `GraphError` is the validation taxonomy raised by the graph
//! model (no partial mutation ever accompanies one), and `GantryError` is the
//! top-level taxonomy the dispatcher and server surface to clients.

use std::time::Duration;

use thiserror::Error;

use crate::graph::{NodeId, PinRef};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GantryError>;

/// Validation failures raised by graph operations.
///
/// Every variant is recoverable: the graph is byte-for-byte unchanged when
/// one of these comes back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("graph not found: {0}")]
    GraphNotFound(String),

    #[error("pin not found: {0}")]
    PinNotFound(PinRef),

    #[error("direction mismatch: {source_pin} is not an output or {dest_pin} is not an input")]
    DirectionMismatch { source_pin: PinRef, dest_pin: PinRef },

    #[error("type mismatch: cannot connect {source_pin} ({source_kind}) to {dest_pin} ({dest_kind})")]
    TypeMismatch {
        source_pin: PinRef,
        source_kind: String,
        dest_pin: PinRef,
        dest_kind: String,
    },

    #[error("input already bound: {0}")]
    InputAlreadyBound(PinRef),

    #[error("connection not found: {source_pin} -> {dest_pin}")]
    ConnectionNotFound { source_pin: PinRef, dest_pin: PinRef },
}

/// Top-level error taxonomy.
#[derive(Debug, Error)]
pub enum GantryError {
    /// Validation failure from the graph model, surfaced verbatim.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Request payload was not valid JSON or was structurally wrong.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Request carried a command tag outside the catalog.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The owning thread did not service the call within the deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The owning thread is gone; the server cannot continue.
    #[error("graph host is no longer running")]
    HostUnavailable,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Persistence encode/decode failure.
    #[error("serialization error: {0}")]
    Serialize(String),
}

impl GantryError {
    /// Stable wire tag for the `error.kind` field.
    pub fn wire_kind(&self) -> &'static str {
        match self {
            GantryError::Graph(g) => match g {
                GraphError::UnknownNodeType(_) => "unknown_node_type",
                GraphError::NodeNotFound(_) => "node_not_found",
                GraphError::GraphNotFound(_) => "graph_not_found",
                GraphError::PinNotFound(_) => "pin_not_found",
                GraphError::DirectionMismatch { .. } => "direction_mismatch",
                GraphError::TypeMismatch { .. } => "type_mismatch",
                GraphError::InputAlreadyBound(_) => "input_already_bound",
                GraphError::ConnectionNotFound { .. } => "connection_not_found",
            },
            GantryError::MalformedPayload(_) => "malformed_payload",
            GantryError::UnknownCommand(_) => "unknown_command",
            GantryError::Timeout(_) => "timeout",
            GantryError::HostUnavailable => "host_unavailable",
            GantryError::Io(_) => "io_error",
            GantryError::Serialize(_) => "serialize_error",
        }
    }
}
