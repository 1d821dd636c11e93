//! Graph host — the single execution context that owns the graph.
//!
//! The host's graph and compiler APIs are not thread-safe, so the dispatcher
//! lives on one dedicated thread and every network thread marshals its calls
//! over a channel, blocking until the reply arrives or the deadline expires.
//! Commands from different connections serialize here in arrival order;
//! per-connection ordering is the session loop's job.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use super::dispatch::{Dispatcher, GraphChanged};
use super::protocol::{Command, CommandResult};
use crate::error::{GantryError, Result};

enum HostCall {
    Dispatch {
        command: Command,
        reply: SyncSender<Result<CommandResult>>,
    },
    Subscribe {
        tx: Sender<GraphChanged>,
    },
    Shutdown,
}

/// Cloneable handle network threads use to reach the owning thread.
#[derive(Clone)]
pub struct HostHandle {
    tx: Sender<HostCall>,
    timeout: Duration,
}

impl HostHandle {
    pub(crate) fn new(tx: Sender<HostCall>, timeout: Duration) -> Self {
        Self { tx, timeout }
    }

    /// Marshal one command onto the owning thread and wait for its result.
    ///
    /// The marshaled call itself is atomic: on `Timeout` the graph is, from
    /// this caller's perspective, unchanged-or-consistently-changed, never
    /// half-edited.
    pub fn dispatch(&self, command: Command) -> Result<CommandResult> {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        self.tx
            .send(HostCall::Dispatch {
                command,
                reply: reply_tx,
            })
            .map_err(|_| GantryError::HostUnavailable)?;

        match reply_rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(GantryError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(GantryError::HostUnavailable),
        }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> Result<Receiver<GraphChanged>> {
        let (tx, rx) = mpsc::channel();
        self.tx
            .send(HostCall::Subscribe { tx })
            .map_err(|_| GantryError::HostUnavailable)?;
        Ok(rx)
    }

    /// Ask the owning thread to stop after draining queued calls.
    pub fn shutdown(&self) {
        let _ = self.tx.send(HostCall::Shutdown);
    }
}

/// The owning thread itself.
pub struct GraphHost {
    thread: thread::JoinHandle<Dispatcher>,
}

impl GraphHost {
    /// Spawn the owning thread around a dispatcher.
    pub fn spawn(dispatcher: Dispatcher, timeout: Duration) -> Result<(Self, HostHandle)> {
        let (tx, rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("graph-host".to_string())
            .spawn(move || run(dispatcher, rx))?;
        Ok((Self { thread }, HostHandle::new(tx, timeout)))
    }

    /// Wait for the host thread to finish and take the dispatcher back,
    /// e.g. to save the blueprint on shutdown.
    pub fn join(self) -> Result<Dispatcher> {
        self.thread
            .join()
            .map_err(|_| GantryError::HostUnavailable)
    }
}

fn run(mut dispatcher: Dispatcher, rx: Receiver<HostCall>) -> Dispatcher {
    info!("graph host running");
    while let Ok(call) = rx.recv() {
        match call {
            HostCall::Dispatch { command, reply } => {
                let result = dispatcher.handle(command);
                // A caller that timed out and went away is not an error here.
                let _ = reply.send(result);
            }
            HostCall::Subscribe { tx } => dispatcher.subscribe(tx),
            HostCall::Shutdown => break,
        }
    }
    debug!("graph host stopped");
    dispatcher
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Blueprint;
    use crate::rpc::dispatch::default_dispatcher;
    use serde_json::json;

    #[test]
    fn test_dispatch_roundtrip() {
        let dispatcher = default_dispatcher(Blueprint::new("Test"));
        let (host, handle) = GraphHost::spawn(dispatcher, Duration::from_secs(5)).unwrap();

        let result = handle.dispatch(Command::Ping).unwrap();
        assert!(matches!(result, CommandResult::Pong { .. }));

        handle.shutdown();
        host.join().unwrap();
    }

    #[test]
    fn test_dispatch_times_out_when_unserviced() {
        // A channel nobody reads stands in for a wedged owning thread.
        let (tx, _rx) = mpsc::channel();
        let handle = HostHandle::new(tx, Duration::from_millis(50));

        let err = handle.dispatch(Command::Ping).unwrap_err();
        assert!(matches!(err, GantryError::Timeout(_)));
    }

    #[test]
    fn test_dispatch_after_shutdown_is_host_unavailable() {
        let dispatcher = default_dispatcher(Blueprint::new("Test"));
        let (host, handle) = GraphHost::spawn(dispatcher, Duration::from_secs(5)).unwrap();

        handle.shutdown();
        host.join().unwrap();

        let err = handle.dispatch(Command::Ping).unwrap_err();
        assert!(matches!(err, GantryError::HostUnavailable));
    }

    #[test]
    fn test_subscribers_see_mutations() {
        let dispatcher = default_dispatcher(Blueprint::new("Test"));
        let (host, handle) = GraphHost::spawn(dispatcher, Duration::from_secs(5)).unwrap();

        let events = handle.subscribe().unwrap();

        let request = crate::rpc::protocol::Request::decode(
            &json!({
                "id": 1,
                "command": "create_node",
                "args": { "node_type": "begin_play" }
            })
            .to_string(),
        )
        .unwrap();
        handle.dispatch(request.command).unwrap();

        let event = events.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.graph, "EventGraph");
        assert_eq!(event.generation, 1);

        handle.shutdown();
        host.join().unwrap();
    }
}
