use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_weight() -> f32 {
    1.0
}

/// One entity in the knowledge graph, immutable per snapshot except for
/// confirmed label renames.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GraphEdge {
    #[serde(rename = "sourceId")]
    pub source_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Patches a confirmed rename into the snapshot. Returns false when
    /// the node no longer exists.
    pub fn apply_rename(&mut self, node_id: &str, new_label: &str) -> bool {
        match self.nodes.iter_mut().find(|node| node.id == node_id) {
            Some(node) => {
                node.label = new_label.to_owned();
                true
            }
            None => false,
        }
    }
}

/// One entry of the externally edited taxonomy. `color` is a `#rrggbb`
/// hex string; `definition` and `example` feed the help surface only.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TaxonomyStyle {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub example: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Taxonomy {
    #[serde(default, rename = "nodeStyles")]
    pub node_styles: Vec<TaxonomyStyle>,
    #[serde(default, rename = "edgeStyles")]
    pub edge_styles: Vec<TaxonomyStyle>,
}

/// Free-form descriptive record enriching the details panel. Absence is
/// not an error; selection never blocks on it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NodeDetails {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}
