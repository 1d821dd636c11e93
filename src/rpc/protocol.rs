//! Wire protocol — request/response types and the codec.
//!
//! One JSON object per line. Requests carry a correlation id, a command tag
//! and an `args` object; responses echo the id and carry either `result` or
//! `error`. Decoding distinguishes syntactically broken payloads
//! (`malformed_payload`) from structurally valid requests whose tag is not
//! in the catalog (`unknown_command`); neither ends the session.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::compile::{CompileReport, Diagnostic};
use crate::error::GantryError;
use crate::graph::{GraphSnapshot, NodeId, PinRef, PropertyMap};

// ─── Requests ──────────────────────────────────────────────────────

/// Arguments for `create_node`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNodeArgs {
    pub node_type: String,
    #[serde(default)]
    pub properties: PropertyMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<String>,
}

/// Arguments for `delete_node`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteNodeArgs {
    pub node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<String>,
}

/// Arguments for `connect` and `disconnect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectArgs {
    pub source_pin: PinRef,
    pub dest_pin: PinRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<String>,
}

/// Arguments for `set_property`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPropertyArgs {
    pub node_id: NodeId,
    pub key: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<String>,
}

/// One node of an `edit_graph` batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeToAdd {
    pub node_type: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// One connection of an `edit_graph` batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionToAdd {
    pub source_pin: PinRef,
    pub dest_pin: PinRef,
}

/// Arguments for `edit_graph` — a batch applied all-or-nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditGraphArgs {
    #[serde(default)]
    pub nodes_to_add: Vec<NodeToAdd>,
    #[serde(default)]
    pub connections_to_add: Vec<ConnectionToAdd>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<String>,
}

/// Arguments for commands that only pick a graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<String>,
}

/// The closed command set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum Command {
    Ping,
    Describe,
    CreateNode(CreateNodeArgs),
    DeleteNode(DeleteNodeArgs),
    Connect(ConnectArgs),
    Disconnect(ConnectArgs),
    SetProperty(SetPropertyArgs),
    EditGraph(EditGraphArgs),
    QueryGraph(GraphArgs),
    Compile(GraphArgs),
}

impl Command {
    /// Wire tag of this command.
    pub fn tag(&self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::Describe => "describe",
            Command::CreateNode(_) => "create_node",
            Command::DeleteNode(_) => "delete_node",
            Command::Connect(_) => "connect",
            Command::Disconnect(_) => "disconnect",
            Command::SetProperty(_) => "set_property",
            Command::EditGraph(_) => "edit_graph",
            Command::QueryGraph(_) => "query_graph",
            Command::Compile(_) => "compile",
        }
    }

    fn from_parts(tag: &str, args: Value) -> Result<Self, GantryError> {
        fn parse<T: serde::de::DeserializeOwned>(
            tag: &str,
            args: Value,
        ) -> Result<T, GantryError> {
            serde_json::from_value(args)
                .map_err(|e| GantryError::MalformedPayload(format!("{} args: {}", tag, e)))
        }

        match tag {
            "ping" => Ok(Command::Ping),
            "describe" => Ok(Command::Describe),
            "create_node" => Ok(Command::CreateNode(parse(tag, args)?)),
            "delete_node" => Ok(Command::DeleteNode(parse(tag, args)?)),
            "connect" => Ok(Command::Connect(parse(tag, args)?)),
            "disconnect" => Ok(Command::Disconnect(parse(tag, args)?)),
            "set_property" => Ok(Command::SetProperty(parse(tag, args)?)),
            "edit_graph" => Ok(Command::EditGraph(parse(tag, args)?)),
            "query_graph" => Ok(Command::QueryGraph(parse(tag, args)?)),
            "compile" => Ok(Command::Compile(parse(tag, args)?)),
            other => Err(GantryError::UnknownCommand(other.to_string())),
        }
    }
}

/// A decoded request: correlation id plus command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub id: Value,
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    pub fn new(id: impl Into<Value>, command: Command) -> Self {
        Self {
            id: id.into(),
            command,
        }
    }

    /// Decode one request line.
    pub fn decode(line: &str) -> Result<Self, GantryError> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| GantryError::MalformedPayload(e.to_string()))?;
        let obj = value
            .as_object()
            .ok_or_else(|| GantryError::MalformedPayload("request must be an object".into()))?;

        let id = obj.get("id").cloned().unwrap_or(Value::Null);
        let tag = obj
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| GantryError::MalformedPayload("missing command field".into()))?;
        let args = obj.get("args").cloned().unwrap_or_else(|| json!({}));

        let command = Command::from_parts(tag, args)?;
        Ok(Self { id, command })
    }

    /// Best-effort extraction of the correlation id from a raw line, so
    /// decode failures can still be matched to their request.
    pub fn peek_id(line: &str) -> Value {
        serde_json::from_str::<Value>(line)
            .ok()
            .and_then(|v| v.get("id").cloned())
            .unwrap_or(Value::Null)
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ─── Responses ─────────────────────────────────────────────────────

/// Description of one command, for `describe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    pub args_schema: Value,
}

/// Successful command outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandResult {
    Pong {
        version: String,
    },
    Commands {
        commands: Vec<CommandDescriptor>,
    },
    NodeCreated {
        node_id: NodeId,
        generation: u64,
        compile: CompileReport,
    },
    NodeDeleted {
        node_id: NodeId,
        removed_connections: usize,
        generation: u64,
        compile: CompileReport,
    },
    Connected {
        generation: u64,
        compile: CompileReport,
    },
    Disconnected {
        generation: u64,
        compile: CompileReport,
    },
    PropertySet {
        node_id: NodeId,
        key: String,
        generation: u64,
        compile: CompileReport,
    },
    GraphEdited {
        node_ids: Vec<NodeId>,
        connections_added: usize,
        generation: u64,
        compile: CompileReport,
    },
    Graph {
        snapshot: GraphSnapshot,
    },
    Compiled {
        compile: CompileReport,
    },
}

/// Error payload of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Vec<Diagnostic>>,
}

/// A response line: the echoed id plus result or error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Ok { id: Value, result: CommandResult },
    Error { id: Value, error: ErrorBody },
}

impl Response {
    pub fn ok(id: Value, result: CommandResult) -> Self {
        Response::Ok { id, result }
    }

    pub fn failure(id: Value, err: &GantryError) -> Self {
        Response::Error {
            id,
            error: ErrorBody {
                kind: err.wire_kind().to_string(),
                message: err.to_string(),
                diagnostics: None,
            },
        }
    }

    pub fn id(&self) -> &Value {
        match self {
            Response::Ok { id, .. } => id,
            Response::Error { id, .. } => id,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(line: &str) -> Result<Self, GantryError> {
        serde_json::from_str(line).map_err(|e| GantryError::MalformedPayload(e.to_string()))
    }
}

// ─── Command catalog for `describe` ────────────────────────────────

/// Return descriptors for every command, with JSON schemas for their args.
pub fn describe_commands() -> Vec<CommandDescriptor> {
    let pin_ref = json!({
        "type": "object",
        "properties": {
            "node": { "type": "integer" },
            "pin": { "type": "string" }
        },
        "required": ["node", "pin"]
    });
    let graph = json!({
        "type": "string",
        "description": "Target graph name (default: EventGraph)"
    });

    vec![
        CommandDescriptor {
            name: "ping".to_string(),
            description: "Check that the bridge is alive.".to_string(),
            args_schema: json!({ "type": "object", "properties": {} }),
        },
        CommandDescriptor {
            name: "describe".to_string(),
            description: "List every command with its argument schema.".to_string(),
            args_schema: json!({ "type": "object", "properties": {} }),
        },
        CommandDescriptor {
            name: "create_node".to_string(),
            description: "Add a node of a catalog type. Properties 'x'/'y' place it."
                .to_string(),
            args_schema: json!({
                "type": "object",
                "properties": {
                    "node_type": { "type": "string" },
                    "properties": { "type": "object" },
                    "graph": graph.clone()
                },
                "required": ["node_type"]
            }),
        },
        CommandDescriptor {
            name: "delete_node".to_string(),
            description: "Remove a node and every connection touching it.".to_string(),
            args_schema: json!({
                "type": "object",
                "properties": {
                    "node_id": { "type": "integer" },
                    "graph": graph.clone()
                },
                "required": ["node_id"]
            }),
        },
        CommandDescriptor {
            name: "connect".to_string(),
            description: "Connect an output pin to an input pin.".to_string(),
            args_schema: json!({
                "type": "object",
                "properties": {
                    "source_pin": pin_ref.clone(),
                    "dest_pin": pin_ref.clone(),
                    "graph": graph.clone()
                },
                "required": ["source_pin", "dest_pin"]
            }),
        },
        CommandDescriptor {
            name: "disconnect".to_string(),
            description: "Remove one existing connection.".to_string(),
            args_schema: json!({
                "type": "object",
                "properties": {
                    "source_pin": pin_ref.clone(),
                    "dest_pin": pin_ref.clone(),
                    "graph": graph.clone()
                },
                "required": ["source_pin", "dest_pin"]
            }),
        },
        CommandDescriptor {
            name: "set_property".to_string(),
            description: "Set one node property ('x'/'y' move the node).".to_string(),
            args_schema: json!({
                "type": "object",
                "properties": {
                    "node_id": { "type": "integer" },
                    "key": { "type": "string" },
                    "value": {},
                    "graph": graph.clone()
                },
                "required": ["node_id", "key", "value"]
            }),
        },
        CommandDescriptor {
            name: "edit_graph".to_string(),
            description: "Apply a batch of node/connection additions atomically."
                .to_string(),
            args_schema: json!({
                "type": "object",
                "properties": {
                    "nodes_to_add": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "node_type": { "type": "string" },
                                "properties": { "type": "object" }
                            },
                            "required": ["node_type"]
                        }
                    },
                    "connections_to_add": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "source_pin": pin_ref.clone(),
                                "dest_pin": pin_ref.clone()
                            },
                            "required": ["source_pin", "dest_pin"]
                        }
                    },
                    "graph": graph.clone()
                }
            }),
        },
        CommandDescriptor {
            name: "query_graph".to_string(),
            description: "Read a full snapshot of a graph. Never mutates.".to_string(),
            args_schema: json!({
                "type": "object",
                "properties": { "graph": graph.clone() }
            }),
        },
        CommandDescriptor {
            name: "compile".to_string(),
            description: "Compile a graph and report diagnostics. Never mutates."
                .to_string(),
            args_schema: json!({
                "type": "object",
                "properties": { "graph": graph.clone() }
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::Severity;

    #[test]
    fn test_decode_create_node() {
        let line = r#"{"id": 7, "command": "create_node", "args": {"node_type": "branch"}}"#;
        let req = Request::decode(line).unwrap();
        assert_eq!(req.id, json!(7));
        match req.command {
            Command::CreateNode(args) => {
                assert_eq!(args.node_type, "branch");
                assert!(args.properties.is_empty());
                assert!(args.graph.is_none());
            }
            other => panic!("wrong command: {:?}", other),
        }
    }

    #[test]
    fn test_decode_args_optional_for_unit_commands() {
        let req = Request::decode(r#"{"id": "a", "command": "ping"}"#).unwrap();
        assert_eq!(req.command, Command::Ping);

        let req = Request::decode(r#"{"id": 1, "command": "query_graph"}"#).unwrap();
        assert_eq!(req.command, Command::QueryGraph(GraphArgs::default()));
    }

    #[test]
    fn test_decode_malformed_payload() {
        let err = Request::decode("{not json").unwrap_err();
        assert_eq!(err.wire_kind(), "malformed_payload");

        let err = Request::decode(r#"[1, 2, 3]"#).unwrap_err();
        assert_eq!(err.wire_kind(), "malformed_payload");

        let err = Request::decode(r#"{"id": 1}"#).unwrap_err();
        assert_eq!(err.wire_kind(), "malformed_payload");

        // Right tag, broken args: still a payload problem, not an unknown command.
        let err =
            Request::decode(r#"{"id": 1, "command": "delete_node", "args": {}}"#).unwrap_err();
        assert_eq!(err.wire_kind(), "malformed_payload");
    }

    #[test]
    fn test_decode_unknown_command() {
        let err = Request::decode(r#"{"id": 1, "command": "reticulate"}"#).unwrap_err();
        assert_eq!(err.wire_kind(), "unknown_command");
    }

    #[test]
    fn test_peek_id_fallback() {
        assert_eq!(Request::peek_id(r#"{"id": 42, "command": 3}"#), json!(42));
        assert_eq!(Request::peek_id("{broken"), Value::Null);
    }

    #[test]
    fn test_request_encode_decode_roundtrip() {
        let req = Request::new(
            json!(9),
            Command::Connect(ConnectArgs {
                source_pin: PinRef::new(NodeId(0), "exec_out"),
                dest_pin: PinRef::new(NodeId(1), "exec_in"),
                graph: None,
            }),
        );
        let line = req.encode().unwrap();
        assert_eq!(Request::decode(&line).unwrap(), req);
    }

    #[test]
    fn test_response_roundtrip_every_variant() {
        let compile = CompileReport::from_diagnostics(vec![Diagnostic {
            severity: Severity::Warning,
            message: "node 2 (delay) is never executed".to_string(),
            node: Some(NodeId(2)),
            pin: None,
        }]);
        let snapshot = {
            let catalog = crate::graph::NodeCatalog::builtin();
            let mut g = crate::graph::BlueprintGraph::new("EventGraph");
            g.add_node(&catalog, "begin_play", Default::default()).unwrap();
            g.snapshot()
        };

        let results = vec![
            CommandResult::Pong {
                version: "0.1.0".to_string(),
            },
            CommandResult::Commands {
                commands: describe_commands(),
            },
            CommandResult::NodeCreated {
                node_id: NodeId(3),
                generation: 4,
                compile: compile.clone(),
            },
            CommandResult::NodeDeleted {
                node_id: NodeId(3),
                removed_connections: 2,
                generation: 5,
                compile: compile.clone(),
            },
            CommandResult::Connected {
                generation: 6,
                compile: compile.clone(),
            },
            CommandResult::Disconnected {
                generation: 7,
                compile: compile.clone(),
            },
            CommandResult::PropertySet {
                node_id: NodeId(1),
                key: "in_string".to_string(),
                generation: 8,
                compile: compile.clone(),
            },
            CommandResult::GraphEdited {
                node_ids: vec![NodeId(4), NodeId(5)],
                connections_added: 1,
                generation: 11,
                compile: compile.clone(),
            },
            CommandResult::Graph { snapshot },
            CommandResult::Compiled { compile },
        ];

        for result in results {
            let response = Response::ok(json!(1), result);
            let line = response.encode().unwrap();
            assert_eq!(Response::decode(&line).unwrap(), response);
        }

        let errors = vec![
            GantryError::MalformedPayload("bad".into()),
            GantryError::UnknownCommand("reticulate".into()),
            GantryError::Timeout(std::time::Duration::from_secs(30)),
            GantryError::HostUnavailable,
            GantryError::Graph(crate::error::GraphError::NodeNotFound(NodeId(9))),
        ];
        for err in errors {
            let response = Response::failure(json!("x"), &err);
            let line = response.encode().unwrap();
            assert_eq!(Response::decode(&line).unwrap(), response);
        }
    }
}
