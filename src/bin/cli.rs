//! Gantry CLI - remote Blueprint editing bridge.
//!
//! Usage:
//!   gantry serve                 # Start the bridge server
//!   gantry ping                  # Check that a bridge is alive
//!   gantry describe              # List commands and their schemas
//!   gantry query                 # Dump a graph snapshot
//!   gantry compile               # Compile a graph, print diagnostics

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gantry::rpc::protocol::GraphArgs;
use gantry::rpc::{default_dispatcher, send_request, BridgeServer, Command, GraphHost, Request};
use gantry::{Blueprint, ServerSettings};

#[derive(Parser)]
#[command(name = "gantry")]
#[command(about = "Gantry - remote Blueprint editing for MCP agents", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, default_value = "gantry.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bridge server
    Serve {
        /// Blueprint asset to load and to save on shutdown
        /// (a fresh blueprint is created when absent)
        #[arg(short, long)]
        blueprint: Option<PathBuf>,

        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check that a bridge is alive
    Ping {
        /// Bridge address
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        addr: String,
    },

    /// List the bridge's commands and their argument schemas
    Describe {
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        addr: String,
    },

    /// Dump a graph snapshot
    Query {
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        addr: String,

        /// Graph name (default: EventGraph)
        #[arg(short, long)]
        graph: Option<String>,
    },

    /// Compile a graph and print diagnostics
    Compile {
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        addr: String,

        /// Graph name (default: EventGraph)
        #[arg(short, long)]
        graph: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { blueprint, port } => serve(&cli.config, blueprint, port),
        Commands::Ping { addr } => client(&addr, Command::Ping),
        Commands::Describe { addr } => client(&addr, Command::Describe),
        Commands::Query { addr, graph } => {
            client(&addr, Command::QueryGraph(GraphArgs { graph }))
        }
        Commands::Compile { addr, graph } => {
            client(&addr, Command::Compile(GraphArgs { graph }))
        }
    }
}

fn serve(config: &Path, blueprint_path: Option<PathBuf>, port: Option<u16>) -> Result<()> {
    let mut settings = ServerSettings::load_or_default(config)?;
    if let Some(port) = port {
        settings.port = port;
    }

    let blueprint = match &blueprint_path {
        Some(path) if path.exists() => Blueprint::load(path)?,
        Some(path) => {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled");
            info!(path = %path.display(), "no asset yet, starting a fresh blueprint");
            Blueprint::new(name)
        }
        None => Blueprint::new("Untitled"),
    };

    let dispatcher = default_dispatcher(blueprint);
    let (host, handle) = GraphHost::spawn(dispatcher, settings.dispatch_timeout())?;
    let server = BridgeServer::bind(&settings, handle.clone())?;
    server.run()?;

    // The listener loop only ends when the socket dies; save on the way out.
    handle.shutdown();
    let dispatcher = host.join()?;
    if let Some(path) = blueprint_path {
        dispatcher.blueprint().save(&path)?;
    }
    Ok(())
}

fn client(addr: &str, command: Command) -> Result<()> {
    let request = Request::new(json!(1), command);
    let response = send_request(addr, &request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
