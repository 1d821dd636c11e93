//! Bridge server — TCP listener that services MCP clients.
//!
//! One thread per connection, one JSON line per command. A command is fully
//! handled — compile step included — before the next line on the same
//! connection is read, so per-connection ordering is guaranteed. Decode
//! failures are answered and the session continues; only a vanished graph
//! host ends a connection early.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::ServerSettings;
use crate::error::GantryError;

use super::host::HostHandle;
use super::protocol::{Request, Response};

/// The listening half of the bridge.
pub struct BridgeServer {
    listener: TcpListener,
    handle: HostHandle,
    max_clients: usize,
}

impl BridgeServer {
    /// Bind the listener. Port 0 binds an ephemeral port; read it back via
    /// [`BridgeServer::local_addr`].
    pub fn bind(settings: &ServerSettings, handle: HostHandle) -> Result<Self> {
        let listener = TcpListener::bind((settings.bind.as_str(), settings.port))?;
        info!(addr = %listener.local_addr()?, "bridge listening");
        Ok(Self {
            listener,
            handle,
            max_clients: settings.max_clients,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the process ends.
    pub fn run(self) -> Result<()> {
        let active = Arc::new(AtomicUsize::new(0));

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    if active.load(Ordering::SeqCst) >= self.max_clients {
                        warn!(max = self.max_clients, "refusing client over connection cap");
                        refuse_client(stream);
                        continue;
                    }

                    let active = Arc::clone(&active);
                    active.fetch_add(1, Ordering::SeqCst);
                    let handle = self.handle.clone();

                    thread::spawn(move || {
                        if let Err(e) = handle_client(stream, &handle) {
                            debug!(error = %e, "client handler error");
                        }
                        active.fetch_sub(1, Ordering::SeqCst);
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept error");
                }
            }
        }

        Ok(())
    }
}

/// Handle a single client connection.
fn handle_client(stream: TcpStream, handle: &HostHandle) -> Result<()> {
    let peer = stream.peer_addr()?;
    debug!(peer = %peer, "client connected");

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let response = match Request::decode(&line) {
            Ok(request) => {
                let id = request.id.clone();
                match handle.dispatch(request.command) {
                    Ok(result) => Response::ok(id, result),
                    Err(err) => Response::failure(id, &err),
                }
            }
            Err(err) => Response::failure(Request::peek_id(&line), &err),
        };

        let host_gone = matches!(
            &response,
            Response::Error { error, .. } if error.kind == "host_unavailable"
        );

        writeln!(writer, "{}", response.encode()?)?;

        if host_gone {
            warn!(peer = %peer, "graph host gone, dropping connection");
            break;
        }
    }

    debug!(peer = %peer, "client disconnected");
    Ok(())
}

/// Tell a client over the connection cap why it is being dropped.
fn refuse_client(stream: TcpStream) {
    let mut writer = stream;
    let err = GantryError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "too many clients",
    ));
    if let Ok(encoded) = Response::failure(Value::Null, &err).encode() {
        let _ = writeln!(writer, "{}", encoded);
    }
}

/// Send a single request to a running bridge and wait for its response.
pub fn send_request(
    addr: impl ToSocketAddrs,
    request: &Request,
) -> crate::error::Result<Response> {
    let mut stream = TcpStream::connect(addr)?;
    let encoded = request
        .encode()
        .map_err(|e| GantryError::Serialize(e.to_string()))?;
    writeln!(stream, "{}", encoded)?;

    let mut reader = BufReader::new(stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line)?;

    Response::decode(&response_line)
}
