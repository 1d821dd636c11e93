//! Compilation gateway.
//!
//! The real compiler belongs to the host editor; the bridge only needs a
//! narrow seam to hand a graph over and translate whatever comes back into
//! the protocol's diagnostic shape. `StructuralCompiler` is the built-in
//! implementation used when no host compiler is wired in.
//!
//! A failed compile does not roll the preceding edit back: automation
//! clients routinely wire up multi-command edits through intermediate
//! states that do not compile yet.

pub mod structural;

use serde::{Deserialize, Serialize};

use crate::graph::{BlueprintGraph, NodeId};

pub use structural::StructuralCompiler;

/// Severity of a compiler-reported issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A compiler-reported issue, attributed to a graph element when possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub node: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pin: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            node: None,
            pin: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            node: None,
            pin: None,
        }
    }

    pub fn at_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn at_pin(mut self, node: NodeId, pin: impl Into<String>) -> Self {
        self.node = Some(node);
        self.pin = Some(pin.into());
        self
    }
}

/// Outcome of one compile pass. `ok` means no error-severity diagnostics;
/// warnings may still be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileReport {
    pub ok: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileReport {
    /// A clean pass.
    pub fn clean() -> Self {
        Self {
            ok: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let ok = !diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error);
        Self { ok, diagnostics }
    }
}

/// The seam to the host's compiler service.
pub trait GraphCompiler: Send {
    fn compile(&self, graph: &BlueprintGraph) -> CompileReport;
}

/// Compiler that accepts everything. Useful for tests and for hosts that
/// defer compilation entirely.
#[derive(Debug, Default)]
pub struct NullCompiler;

impl GraphCompiler for NullCompiler {
    fn compile(&self, _graph: &BlueprintGraph) -> CompileReport {
        CompileReport::clean()
    }
}
