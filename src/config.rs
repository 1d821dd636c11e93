//! Server settings — TOML-backed configuration with sensible defaults.
//!
//! Defaults mirror the editor plugin this bridge fronts: port 8080, ten
//! simultaneous clients, a 30 second dispatch deadline.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Settings for the bridge server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind the TCP listener on.
    pub bind: String,

    /// Port for the listener (the plugin's historical default is 8080).
    pub port: u16,

    /// Maximum simultaneous client connections; excess connections are
    /// refused with an error line.
    pub max_clients: usize,

    /// Deadline for a marshaled call onto the graph-owning thread.
    pub dispatch_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            max_clients: 10,
            dispatch_timeout_secs: 30,
        }
    }
}

impl ServerSettings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&raw)
            .map_err(|e| crate::error::GantryError::MalformedPayload(format!("settings: {}", e)))?;
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no settings file, using defaults");
            Ok(Self::default())
        }
    }

    /// Dispatch deadline as a `Duration`.
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = ServerSettings::default();
        assert_eq!(s.port, 8080);
        assert_eq!(s.max_clients, 10);
        assert_eq!(s.dispatch_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let s: ServerSettings = toml::from_str("port = 9000").unwrap();
        assert_eq!(s.port, 9000);
        assert_eq!(s.bind, "127.0.0.1");
        assert_eq!(s.max_clients, 10);
    }
}
