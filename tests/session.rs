//! End-to-end session tests: a real bridge on an ephemeral TCP port,
//! driven through raw JSON lines the way an MCP client would.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use serde_json::{json, Value};

use gantry::rpc::{default_dispatcher, BridgeServer, GraphHost};
use gantry::{Blueprint, ServerSettings};

fn start_bridge() -> SocketAddr {
    let settings = ServerSettings {
        port: 0,
        ..Default::default()
    };
    let dispatcher = default_dispatcher(Blueprint::new("SessionTest"));
    let (_host, handle) = GraphHost::spawn(dispatcher, Duration::from_secs(5)).unwrap();
    let server = BridgeServer::bind(&settings, handle).unwrap();
    let addr = server.local_addr().unwrap();
    std::thread::spawn(move || server.run());
    addr
}

struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .unwrap();
        Self {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
        }
    }

    fn send_raw(&mut self, line: &str) -> Value {
        writeln!(self.writer, "{}", line).unwrap();
        let mut response = String::new();
        self.reader.read_line(&mut response).unwrap();
        serde_json::from_str(&response).unwrap()
    }

    fn send(&mut self, request: Value) -> Value {
        self.send_raw(&request.to_string())
    }
}

#[test]
fn test_scenario_wire_event_to_branch() {
    let addr = start_bridge();
    let mut client = Client::connect(addr);

    let pong = client.send(json!({ "id": 1, "command": "ping" }));
    assert_eq!(pong["id"], json!(1));
    assert_eq!(pong["result"]["kind"], json!("pong"));

    let created = client.send(json!({
        "id": 2,
        "command": "create_node",
        "args": { "node_type": "begin_play", "properties": { "x": 0, "y": 0 } }
    }));
    assert_eq!(created["result"]["kind"], json!("node_created"));
    let event = created["result"]["node_id"].clone();

    let created = client.send(json!({
        "id": 3,
        "command": "create_node",
        "args": { "node_type": "branch", "properties": { "x": 250, "y": 0 } }
    }));
    let branch = created["result"]["node_id"].clone();
    assert_ne!(event, branch);

    let connected = client.send(json!({
        "id": 4,
        "command": "connect",
        "args": {
            "source_pin": { "node": event, "pin": "exec_out" },
            "dest_pin": { "node": branch, "pin": "exec_in" }
        }
    }));
    assert_eq!(connected["id"], json!(4));
    assert_eq!(connected["result"]["kind"], json!("connected"));
    assert_eq!(connected["result"]["compile"]["ok"], json!(true));

    let queried = client.send(json!({ "id": 5, "command": "query_graph" }));
    let snapshot = &queried["result"]["snapshot"];
    assert_eq!(snapshot["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(snapshot["connections"].as_array().unwrap().len(), 1);
    assert_eq!(snapshot["generation"], json!(3));
}

#[test]
fn test_type_mismatch_leaves_generation_untouched() {
    let addr = start_bridge();
    let mut client = Client::connect(addr);

    client.send(json!({
        "id": 1, "command": "create_node", "args": { "node_type": "string_literal" }
    }));
    client.send(json!({
        "id": 2, "command": "create_node", "args": { "node_type": "branch" }
    }));

    let failed = client.send(json!({
        "id": 3,
        "command": "connect",
        "args": {
            "source_pin": { "node": 0, "pin": "value" },
            "dest_pin": { "node": 1, "pin": "condition" }
        }
    }));
    assert_eq!(failed["id"], json!(3));
    assert_eq!(failed["error"]["kind"], json!("type_mismatch"));
    assert!(failed.get("result").is_none());

    let queried = client.send(json!({ "id": 4, "command": "query_graph" }));
    assert_eq!(queried["result"]["snapshot"]["generation"], json!(2));
    assert_eq!(
        queried["result"]["snapshot"]["connections"]
            .as_array()
            .unwrap()
            .len(),
        0
    );
}

#[test]
fn test_delete_missing_node_reports_not_found() {
    let addr = start_bridge();
    let mut client = Client::connect(addr);

    let failed = client.send(json!({
        "id": 9, "command": "delete_node", "args": { "node_id": 12 }
    }));
    assert_eq!(failed["id"], json!(9));
    assert_eq!(failed["error"]["kind"], json!("node_not_found"));
}

#[test]
fn test_decode_errors_do_not_end_the_session() {
    let addr = start_bridge();
    let mut client = Client::connect(addr);

    let failed = client.send_raw("{this is not json");
    assert_eq!(failed["error"]["kind"], json!("malformed_payload"));
    assert_eq!(failed["id"], Value::Null);

    let failed = client.send(json!({ "id": 5, "command": "reticulate_splines" }));
    assert_eq!(failed["error"]["kind"], json!("unknown_command"));
    assert_eq!(failed["id"], json!(5), "decode failures keep the correlation id");

    // The same connection still services commands.
    let pong = client.send(json!({ "id": 6, "command": "ping" }));
    assert_eq!(pong["result"]["kind"], json!("pong"));
}

#[test]
fn test_correlation_ids_echo_verbatim() {
    let addr = start_bridge();
    let mut client = Client::connect(addr);

    let pong = client.send(json!({ "id": "req-abc-123", "command": "ping" }));
    assert_eq!(pong["id"], json!("req-abc-123"));

    let described = client.send(json!({ "id": { "n": 2 }, "command": "describe" }));
    assert_eq!(described["id"], json!({ "n": 2 }));
    let commands = described["result"]["commands"].as_array().unwrap();
    assert!(commands.iter().any(|c| c["name"] == json!("create_node")));
}

#[test]
fn test_same_connection_requests_are_ordered() {
    let addr = start_bridge();
    let mut client = Client::connect(addr);

    for i in 0..5 {
        let created = client.send(json!({
            "id": i,
            "command": "create_node",
            "args": { "node_type": "print_string" }
        }));
        assert_eq!(created["id"], json!(i));
        assert_eq!(created["result"]["node_id"], json!(i));
        assert_eq!(created["result"]["generation"], json!(i + 1));
    }
}

#[test]
fn test_commands_from_two_connections_both_land() {
    let addr = start_bridge();
    let mut first = Client::connect(addr);
    let mut second = Client::connect(addr);

    first.send(json!({
        "id": 1, "command": "create_node", "args": { "node_type": "begin_play" }
    }));
    second.send(json!({
        "id": 1, "command": "create_node", "args": { "node_type": "event_tick" }
    }));

    let queried = first.send(json!({ "id": 2, "command": "query_graph" }));
    assert_eq!(
        queried["result"]["snapshot"]["nodes"]
            .as_array()
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn test_edit_graph_batch_over_wire() {
    let addr = start_bridge();
    let mut client = Client::connect(addr);

    let edited = client.send(json!({
        "id": 1,
        "command": "edit_graph",
        "args": {
            "nodes_to_add": [
                { "node_type": "begin_play" },
                { "node_type": "print_string", "properties": { "x": 300, "y": 0 } }
            ],
            "connections_to_add": [
                {
                    "source_pin": { "node": 0, "pin": "exec_out" },
                    "dest_pin": { "node": 1, "pin": "exec_in" }
                }
            ]
        }
    }));
    assert_eq!(edited["result"]["kind"], json!("graph_edited"));
    assert_eq!(edited["result"]["node_ids"], json!([0, 1]));
    assert_eq!(edited["result"]["compile"]["ok"], json!(true));

    // A batch with a bad step leaves nothing behind.
    let failed = client.send(json!({
        "id": 2,
        "command": "edit_graph",
        "args": {
            "nodes_to_add": [{ "node_type": "branch" }],
            "connections_to_add": [
                {
                    "source_pin": { "node": 2, "pin": "then" },
                    "dest_pin": { "node": 77, "pin": "exec_in" }
                }
            ]
        }
    }));
    assert_eq!(failed["error"]["kind"], json!("pin_not_found"));

    let queried = client.send(json!({ "id": 3, "command": "query_graph" }));
    assert_eq!(
        queried["result"]["snapshot"]["nodes"]
            .as_array()
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn test_compile_command_reports_unreachable_node() {
    let addr = start_bridge();
    let mut client = Client::connect(addr);

    client.send(json!({
        "id": 1, "command": "create_node", "args": { "node_type": "begin_play" }
    }));
    client.send(json!({
        "id": 2, "command": "create_node", "args": { "node_type": "delay" }
    }));

    let compiled = client.send(json!({ "id": 3, "command": "compile" }));
    assert_eq!(compiled["result"]["kind"], json!("compiled"));
    assert_eq!(compiled["result"]["compile"]["ok"], json!(true));
    let diagnostics = compiled["result"]["compile"]["diagnostics"]
        .as_array()
        .unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0]["severity"], json!("warning"));
    assert_eq!(diagnostics[0]["node"], json!(1));
}
