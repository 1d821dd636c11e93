//! # Gantry
//!
//! Remote Blueprint editing for MCP agents.
//!
//! Gantry exposes a visual node-graph program ("Blueprint") held by a host
//! process to external automation clients over a newline-framed JSON
//! protocol. Loosely-typed commands become validated, atomic graph edits;
//! every accepted edit is compiled and the diagnostics travel back on the
//! response.
//!
//! ## Key properties
//!
//! - **Closed command set**: decode failures are answered, never fatal
//! - **Validate-then-commit**: a rejected command leaves the graph
//!   byte-for-byte unchanged
//! - **Single owner**: one thread owns the graph; network threads marshal
//!   calls to it with a deadline
//! - **Non-blocking compiles**: a failing compile reports, it does not
//!   roll the edit back
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gantry::rpc::{default_dispatcher, BridgeServer, GraphHost};
//! use gantry::{Blueprint, ServerSettings};
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = ServerSettings::default();
//!     let dispatcher = default_dispatcher(Blueprint::new("MyActor"));
//!     let (_host, handle) = GraphHost::spawn(dispatcher, settings.dispatch_timeout())?;
//!     BridgeServer::bind(&settings, handle)?.run()
//! }
//! ```

pub mod compile;
pub mod config;
pub mod error;
pub mod graph;
pub mod rpc;

// Re-exports for convenience
pub use error::{GantryError, GraphError, Result};

pub use compile::{
    CompileReport, Diagnostic, GraphCompiler, NullCompiler, Severity, StructuralCompiler,
};
pub use config::ServerSettings;
pub use graph::{
    Blueprint, BlueprintGraph, GraphSnapshot, NodeCatalog, NodeId, PinRef, ValueType,
    DEFAULT_GRAPH,
};
