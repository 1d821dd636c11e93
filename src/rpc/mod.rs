//! RPC layer — protocol codec, dispatcher, owning-thread marshaling, and
//! the TCP session loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │              MCP client                   │
//! │  {"id", "command", "args"} per line       │
//! └───────────────────────────────────────────┘
//!           ▲ TCP, newline-framed JSON
//!           ▼
//! ┌───────────────────────────────────────────┐
//! │  server: one thread per connection        │
//! │  protocol: decode -> Command              │
//! └───────────────────────────────────────────┘
//!           ▲ mpsc marshaling (with deadline)
//!           ▼
//! ┌───────────────────────────────────────────┐
//! │  host: the one thread owning the graph    │
//! │  dispatch: Command -> graph ops -> compile│
//! └───────────────────────────────────────────┘
//! ```

pub mod dispatch;
pub mod host;
pub mod protocol;
pub mod server;

pub use dispatch::{default_dispatcher, Dispatcher, GraphChanged};
pub use host::{GraphHost, HostHandle};
pub use protocol::{
    describe_commands, Command, CommandDescriptor, CommandResult, ErrorBody, Request, Response,
};
pub use server::{send_request, BridgeServer};
