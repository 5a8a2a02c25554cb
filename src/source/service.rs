use anyhow::Result;

use super::model::{GraphSnapshot, NodeDetails, Taxonomy};

/// Boundary to the surrounding research platform. Every call may block;
/// the app runs them on background workers and applies results on the
/// next frame.
pub trait GraphService: Send + Sync {
    fn fetch_snapshot(&self) -> Result<GraphSnapshot>;

    fn fetch_taxonomy(&self) -> Result<Taxonomy>;

    /// Descriptive record for the details panel. `Ok(None)` means the
    /// platform has nothing extra for this node.
    fn fetch_node_details(&self, node_id: &str) -> Result<Option<NodeDetails>>;

    /// Persists a new label. Callers must not touch local state unless
    /// this returns `Ok`.
    fn rename_node(&self, node_id: &str, new_label: &str) -> Result<()>;
}
