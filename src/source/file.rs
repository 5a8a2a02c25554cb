use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::model::{GraphSnapshot, NodeDetails, Taxonomy};
use super::service::GraphService;

/// Directory-backed implementation of [`GraphService`]:
/// `graph.json` and `taxonomy.json` at the root, optional
/// `details/<node id>.json` records, renames written back to
/// `graph.json`.
pub struct FileGraphService {
    data_dir: PathBuf,
}

impl FileGraphService {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn graph_path(&self) -> PathBuf {
        self.data_dir.join("graph.json")
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
    }
}

impl GraphService for FileGraphService {
    fn fetch_snapshot(&self) -> Result<GraphSnapshot> {
        Self::read_json(&self.graph_path())
    }

    fn fetch_taxonomy(&self) -> Result<Taxonomy> {
        Self::read_json(&self.data_dir.join("taxonomy.json"))
    }

    fn fetch_node_details(&self, node_id: &str) -> Result<Option<NodeDetails>> {
        // Node ids are opaque; refuse anything that could escape the
        // details directory.
        if node_id.contains(['/', '\\']) || node_id == ".." {
            return Ok(None);
        }

        let path = self.data_dir.join("details").join(format!("{node_id}.json"));
        if !path.exists() {
            return Ok(None);
        }

        Self::read_json(&path).map(Some)
    }

    fn rename_node(&self, node_id: &str, new_label: &str) -> Result<()> {
        let new_label = new_label.trim();
        if new_label.is_empty() {
            return Err(anyhow!("node label must not be empty"));
        }

        let path = self.graph_path();
        let mut snapshot: GraphSnapshot = Self::read_json(&path)?;
        if !snapshot.apply_rename(node_id, new_label) {
            return Err(anyhow!("node {node_id} does not exist in {}", path.display()));
        }

        let serialized =
            serde_json::to_string_pretty(&snapshot).context("failed to serialize graph")?;
        fs::write(&path, serialized)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}
