//! Command dispatcher — maps decoded commands onto graph operations.
//!
//! Each command resolves to one graph-model call, or for `edit_graph` to a
//! sequence applied on a scratch copy and swapped in only on full success,
//! so every command is all-or-nothing. Mutating commands run the compile
//! gateway before the response goes out; query-class commands touch nothing.

use std::sync::mpsc::Sender;

use tracing::debug;
use uuid::Uuid;

use crate::compile::{CompileReport, GraphCompiler};
use crate::error::Result;
use crate::graph::{Blueprint, NodeCatalog, DEFAULT_GRAPH};

use super::protocol::{describe_commands, Command, CommandResult};

/// Emitted to subscribers after every accepted mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphChanged {
    pub blueprint: Uuid,
    pub graph: String,
    pub generation: u64,
}

/// Owns the blueprint and everything needed to service commands against it.
///
/// A dispatcher lives on exactly one thread (see `host`); it is never shared.
pub struct Dispatcher {
    blueprint: Blueprint,
    catalog: NodeCatalog,
    compiler: Box<dyn GraphCompiler>,
    subscribers: Vec<Sender<GraphChanged>>,
}

fn target(graph: &Option<String>) -> &str {
    graph.as_deref().unwrap_or(DEFAULT_GRAPH)
}

impl Dispatcher {
    pub fn new(
        blueprint: Blueprint,
        catalog: NodeCatalog,
        compiler: Box<dyn GraphCompiler>,
    ) -> Self {
        Self {
            blueprint,
            catalog,
            compiler,
            subscribers: Vec::new(),
        }
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    /// Register a change-notification subscriber. Disconnected subscribers
    /// are pruned on the next emission.
    pub fn subscribe(&mut self, tx: Sender<GraphChanged>) {
        self.subscribers.push(tx);
    }

    /// Handle one command to completion, compile step included.
    pub fn handle(&mut self, command: Command) -> Result<CommandResult> {
        debug!(command = command.tag(), "dispatching");

        match command {
            Command::Ping => Ok(CommandResult::Pong {
                version: env!("CARGO_PKG_VERSION").to_string(),
            }),

            Command::Describe => Ok(CommandResult::Commands {
                commands: describe_commands(),
            }),

            Command::CreateNode(args) => {
                let name = target(&args.graph);
                let node_id = self.blueprint.graph_mut(name)?.add_node(
                    &self.catalog,
                    &args.node_type,
                    args.properties,
                )?;
                let (generation, compile) = self.after_mutation(name)?;
                Ok(CommandResult::NodeCreated {
                    node_id,
                    generation,
                    compile,
                })
            }

            Command::DeleteNode(args) => {
                let name = target(&args.graph);
                let removed_connections =
                    self.blueprint.graph_mut(name)?.remove_node(args.node_id)?;
                let (generation, compile) = self.after_mutation(name)?;
                Ok(CommandResult::NodeDeleted {
                    node_id: args.node_id,
                    removed_connections,
                    generation,
                    compile,
                })
            }

            Command::Connect(args) => {
                let name = target(&args.graph);
                self.blueprint
                    .graph_mut(name)?
                    .connect(args.source_pin, args.dest_pin)?;
                let (generation, compile) = self.after_mutation(name)?;
                Ok(CommandResult::Connected {
                    generation,
                    compile,
                })
            }

            Command::Disconnect(args) => {
                let name = target(&args.graph);
                self.blueprint
                    .graph_mut(name)?
                    .disconnect(&args.source_pin, &args.dest_pin)?;
                let (generation, compile) = self.after_mutation(name)?;
                Ok(CommandResult::Disconnected {
                    generation,
                    compile,
                })
            }

            Command::SetProperty(args) => {
                let name = target(&args.graph);
                self.blueprint.graph_mut(name)?.set_property(
                    args.node_id,
                    &args.key,
                    args.value,
                )?;
                let (generation, compile) = self.after_mutation(name)?;
                Ok(CommandResult::PropertySet {
                    node_id: args.node_id,
                    key: args.key,
                    generation,
                    compile,
                })
            }

            Command::EditGraph(args) => {
                let name = target(&args.graph).to_string();

                if args.nodes_to_add.is_empty() && args.connections_to_add.is_empty() {
                    let graph = self.blueprint.graph(&name)?;
                    let generation = graph.generation();
                    let compile = self.compiler.compile(graph);
                    return Ok(CommandResult::GraphEdited {
                        node_ids: Vec::new(),
                        connections_added: 0,
                        generation,
                        compile,
                    });
                }

                // Build the edit on a scratch copy; the live graph is only
                // replaced once every step has validated.
                let mut scratch = self.blueprint.graph(&name)?.clone();
                let connections_added = args.connections_to_add.len();

                let mut node_ids = Vec::with_capacity(args.nodes_to_add.len());
                for node in args.nodes_to_add {
                    node_ids.push(scratch.add_node(
                        &self.catalog,
                        &node.node_type,
                        node.properties,
                    )?);
                }
                for conn in args.connections_to_add {
                    scratch.connect(conn.source_pin, conn.dest_pin)?;
                }

                self.blueprint.replace_graph(&name, scratch);
                let (generation, compile) = self.after_mutation(&name)?;
                Ok(CommandResult::GraphEdited {
                    node_ids,
                    connections_added,
                    generation,
                    compile,
                })
            }

            Command::QueryGraph(args) => {
                let snapshot = self.blueprint.graph(target(&args.graph))?.snapshot();
                Ok(CommandResult::Graph { snapshot })
            }

            Command::Compile(args) => {
                let graph = self.blueprint.graph(target(&args.graph))?;
                let compile = self.compiler.compile(graph);
                Ok(CommandResult::Compiled { compile })
            }
        }
    }

    /// Post-mutation tail shared by every mutating command: notify
    /// subscribers, then run the compile gateway. The edit stands even when
    /// the compile fails; the report rides back on the response.
    fn after_mutation(&mut self, graph_name: &str) -> Result<(u64, CompileReport)> {
        let graph = self.blueprint.graph(graph_name)?;
        let generation = graph.generation();
        let compile = self.compiler.compile(graph);

        let event = GraphChanged {
            blueprint: self.blueprint.id(),
            graph: graph_name.to_string(),
            generation,
        };
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());

        debug!(
            graph = graph_name,
            generation,
            compile_ok = compile.ok,
            "mutation applied"
        );
        Ok((generation, compile))
    }
}

/// Convenience constructor used by the CLI and tests: built-in catalog and
/// structural compiler around a blueprint.
pub fn default_dispatcher(blueprint: Blueprint) -> Dispatcher {
    let catalog = NodeCatalog::builtin();
    let compiler = crate::compile::StructuralCompiler::new(catalog.clone());
    Dispatcher::new(blueprint, catalog, Box::new(compiler))
}
