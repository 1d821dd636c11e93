//! Node type catalog — the closed set of node kinds the host understands.
//!
//! Each entry is a template: the type tag plus the pins every instance of
//! that type carries. The built-in set covers the node surface the editor
//! plugin exposes (events, branch, print, delay, typed literals); hosts
//! register additional specs before the server starts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::{PinDirection, PinKind, ValueType};

/// Template for one pin on a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinSpec {
    pub name: String,
    pub direction: PinDirection,
    pub kind: PinKind,
    /// Required value inputs produce an error diagnostic when left
    /// unconnected at compile time.
    pub required: bool,
}

impl PinSpec {
    pub fn exec_in(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction: PinDirection::Input,
            kind: PinKind::Exec,
            required: false,
        }
    }

    pub fn exec_out(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction: PinDirection::Output,
            kind: PinKind::Exec,
            required: false,
        }
    }

    pub fn value_in(name: &str, ty: ValueType) -> Self {
        Self {
            name: name.to_string(),
            direction: PinDirection::Input,
            kind: PinKind::Value(ty),
            required: false,
        }
    }

    pub fn value_out(name: &str, ty: ValueType) -> Self {
        Self {
            name: name.to_string(),
            direction: PinDirection::Output,
            kind: PinKind::Value(ty),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Template for one node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub type_tag: String,
    pub pins: Vec<PinSpec>,
    /// Event nodes are exec-flow roots: reachability analysis starts here.
    pub is_event: bool,
}

impl NodeSpec {
    pub fn new(type_tag: &str, pins: Vec<PinSpec>) -> Self {
        Self {
            type_tag: type_tag.to_string(),
            pins,
            is_event: false,
        }
    }

    pub fn event(type_tag: &str, pins: Vec<PinSpec>) -> Self {
        Self {
            type_tag: type_tag.to_string(),
            pins,
            is_event: true,
        }
    }
}

/// Closed registry of node specs, keyed by type tag.
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    specs: BTreeMap<String, NodeSpec>,
}

impl NodeCatalog {
    /// An empty catalog. Mostly useful in tests.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in node set.
    pub fn builtin() -> Self {
        let mut catalog = Self::default();

        catalog.register(NodeSpec::event(
            "begin_play",
            vec![PinSpec::exec_out("exec_out")],
        ));
        catalog.register(NodeSpec::event(
            "event_tick",
            vec![
                PinSpec::exec_out("exec_out"),
                PinSpec::value_out("delta_seconds", ValueType::Float),
            ],
        ));
        catalog.register(NodeSpec::new(
            "branch",
            vec![
                PinSpec::exec_in("exec_in"),
                PinSpec::value_in("condition", ValueType::Boolean),
                PinSpec::exec_out("then"),
                PinSpec::exec_out("else"),
            ],
        ));
        catalog.register(NodeSpec::new(
            "print_string",
            vec![
                PinSpec::exec_in("exec_in"),
                PinSpec::exec_out("exec_out"),
                PinSpec::value_in("in_string", ValueType::String),
            ],
        ));
        catalog.register(NodeSpec::new(
            "delay",
            vec![
                PinSpec::exec_in("exec_in"),
                PinSpec::exec_out("exec_out"),
                PinSpec::value_in("duration", ValueType::Float),
            ],
        ));
        catalog.register(NodeSpec::new(
            "string_literal",
            vec![PinSpec::value_out("value", ValueType::String)],
        ));
        catalog.register(NodeSpec::new(
            "integer_literal",
            vec![PinSpec::value_out("value", ValueType::Integer)],
        ));
        catalog.register(NodeSpec::new(
            "float_literal",
            vec![PinSpec::value_out("value", ValueType::Float)],
        ));

        catalog
    }

    /// Register a spec, replacing any previous spec with the same tag.
    pub fn register(&mut self, spec: NodeSpec) {
        self.specs.insert(spec.type_tag.clone(), spec);
    }

    pub fn get(&self, type_tag: &str) -> Option<&NodeSpec> {
        self.specs.get(type_tag)
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.specs.contains_key(type_tag)
    }

    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_contents() {
        let catalog = NodeCatalog::builtin();
        assert!(catalog.contains("begin_play"));
        assert!(catalog.contains("branch"));
        assert!(catalog.contains("print_string"));
        assert!(!catalog.contains("frobnicate"));

        let branch = catalog.get("branch").unwrap();
        assert!(!branch.is_event);
        assert_eq!(branch.pins.len(), 4);

        let begin_play = catalog.get("begin_play").unwrap();
        assert!(begin_play.is_event);
    }

    #[test]
    fn test_register_replaces() {
        let mut catalog = NodeCatalog::empty();
        catalog.register(NodeSpec::new("custom", vec![PinSpec::exec_in("exec_in")]));
        catalog.register(NodeSpec::new(
            "custom",
            vec![
                PinSpec::exec_in("exec_in"),
                PinSpec::exec_out("exec_out"),
            ],
        ));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("custom").unwrap().pins.len(), 2);
    }
}
