//! Blueprint persistence — save and load documents to/from disk.
//!
//! Documents are stored as JSON: node properties are free-form JSON values,
//! which rules out non-self-describing binary formats. Atomic writes
//! (write to .tmp, then rename) prevent corruption from crashes.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GantryError, Result};

use super::model::Blueprint;

/// Bump when the on-disk layout changes incompatibly.
const FORMAT_VERSION: u32 = 1;

/// On-disk envelope around a blueprint.
#[derive(Serialize, Deserialize)]
struct SavedBlueprint {
    format_version: u32,
    saved_at: DateTime<Utc>,
    blueprint: Blueprint,
}

impl Blueprint {
    /// Save the blueprint to a binary file.
    ///
    /// Uses atomic write: writes to a `.tmp` file first, then renames.
    /// This prevents corruption if the process is interrupted mid-write.
    pub fn save(&self, path: &Path) -> Result<()> {
        info!(path = %path.display(), blueprint = %self.name(), "saving blueprint");

        let envelope = SavedBlueprint {
            format_version: FORMAT_VERSION,
            saved_at: Utc::now(),
            blueprint: self.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| GantryError::Serialize(e.to_string()))?;

        let tmp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        debug!(bytes = bytes.len(), "blueprint saved");
        Ok(())
    }

    /// Load a blueprint from a binary file.
    pub fn load(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "loading blueprint");

        let bytes = fs::read(path)?;
        let envelope: SavedBlueprint = serde_json::from_slice(&bytes)
            .map_err(|e| GantryError::Serialize(e.to_string()))?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(GantryError::Serialize(format!(
                "unsupported format version {} (expected {})",
                envelope.format_version, FORMAT_VERSION
            )));
        }

        debug!(
            blueprint = %envelope.blueprint.name(),
            graphs = envelope.blueprint.graphs().count(),
            "blueprint loaded"
        );

        Ok(envelope.blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeCatalog, PinRef, DEFAULT_GRAPH};
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let catalog = NodeCatalog::builtin();
        let mut blueprint = Blueprint::new("TestActor");

        let graph = blueprint.graph_mut(DEFAULT_GRAPH).unwrap();
        let event = graph
            .add_node(&catalog, "begin_play", Default::default())
            .unwrap();
        let print = graph
            .add_node(&catalog, "print_string", Default::default())
            .unwrap();
        graph
            .connect(
                PinRef::new(event, "exec_out"),
                PinRef::new(print, "exec_in"),
            )
            .unwrap();

        let dir = tempdir().unwrap();
        let save_path = dir.path().join("actor.blueprint");

        blueprint.save(&save_path).unwrap();
        assert!(save_path.exists());

        let loaded = Blueprint::load(&save_path).unwrap();
        assert_eq!(loaded, blueprint);

        let loaded_graph = loaded.graph(DEFAULT_GRAPH).unwrap();
        assert_eq!(loaded_graph.node_count(), 2);
        assert_eq!(loaded_graph.connections().len(), 1);
        assert_eq!(loaded_graph.generation(), 3);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Blueprint::load(std::path::Path::new("/nonexistent/actor.blueprint"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.blueprint");
        fs::write(&path, b"not a blueprint").unwrap();
        assert!(Blueprint::load(&path).is_err());
    }
}
