use std::collections::{HashMap, HashSet};

use crate::source::GraphSnapshot;

/// User-facing filter state driving working-set derivation. Type sets
/// hold case-folded names, matching the taxonomy's lookup contract.
#[derive(Clone, Debug)]
pub(in crate::app) struct FilterParams {
    pub allowed_node_types: HashSet<String>,
    pub allowed_edge_types: HashSet<String>,
    pub min_degree: usize,
    pub search: String,
}

impl FilterParams {
    pub fn allows_node_type(&self, type_name: &str) -> bool {
        self.allowed_node_types.contains(&type_name.to_lowercase())
    }

    pub fn allows_edge_type(&self, type_name: &str) -> bool {
        self.allowed_edge_types.contains(&type_name.to_lowercase())
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            allowed_node_types: HashSet::new(),
            allowed_edge_types: HashSet::new(),
            min_degree: 1,
            search: String::new(),
        }
    }
}

/// Index-based view into a snapshot: the nodes and edges that survive
/// filtering, plus each survivor's degree in the filtered edge set.
#[derive(Clone, Debug, Default)]
pub(in crate::app) struct FilteredSubgraph {
    pub node_indices: Vec<usize>,
    pub edge_indices: Vec<usize>,
    pub degree_by_node: HashMap<usize, usize>,
}

/// Derives the working set from a snapshot. Pure function of its
/// inputs; edges whose endpoints are missing from the snapshot are
/// dropped silently.
pub(in crate::app) fn filter_subgraph(
    snapshot: &GraphSnapshot,
    params: &FilterParams,
) -> FilteredSubgraph {
    let search = params.search.trim().to_lowercase();

    // Step 1: label search. An empty query matches everything.
    let searched = snapshot
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| search.is_empty() || node.label.to_lowercase().contains(&search))
        .map(|(index, _)| index)
        .collect::<Vec<_>>();
    let mut surviving_ids = searched
        .iter()
        .map(|&index| snapshot.nodes[index].id.as_str())
        .collect::<HashSet<_>>();

    // Step 2: edge type filter, both endpoints must have survived the
    // search. This is also where dangling references fall out.
    let edge_survives = |edge_index: usize| {
        let edge = &snapshot.edges[edge_index];
        params.allows_edge_type(&edge.edge_type)
            && surviving_ids.contains(edge.source_id.as_str())
            && surviving_ids.contains(edge.target_id.as_str())
    };
    let mut edge_indices = (0..snapshot.edges.len())
        .filter(|&index| edge_survives(index))
        .collect::<Vec<_>>();

    // Step 3: degree over the filtered edge set.
    let mut degree_by_id: HashMap<&str, usize> = HashMap::new();
    for &edge_index in &edge_indices {
        let edge = &snapshot.edges[edge_index];
        *degree_by_id.entry(edge.source_id.as_str()).or_default() += 1;
        *degree_by_id.entry(edge.target_id.as_str()).or_default() += 1;
    }

    // Step 4: node type filter plus the min-degree threshold. The
    // threshold is skipped for edgeless snapshots, where it could never
    // be satisfied.
    let apply_degree_filter = !snapshot.edges.is_empty();
    let node_indices = searched
        .into_iter()
        .filter(|&index| {
            let node = &snapshot.nodes[index];
            if !params.allows_node_type(&node.node_type) {
                return false;
            }
            if apply_degree_filter {
                let degree = degree_by_id.get(node.id.as_str()).copied().unwrap_or(0);
                if degree < params.min_degree {
                    return false;
                }
            }
            true
        })
        .collect::<Vec<_>>();

    // Step 5: re-filter edges against the final node set, then recount
    // degrees so they describe the emitted edge set.
    surviving_ids = node_indices
        .iter()
        .map(|&index| snapshot.nodes[index].id.as_str())
        .collect();
    edge_indices.retain(|&edge_index| {
        let edge = &snapshot.edges[edge_index];
        surviving_ids.contains(edge.source_id.as_str())
            && surviving_ids.contains(edge.target_id.as_str())
    });

    degree_by_id.clear();
    for &edge_index in &edge_indices {
        let edge = &snapshot.edges[edge_index];
        *degree_by_id.entry(edge.source_id.as_str()).or_default() += 1;
        *degree_by_id.entry(edge.target_id.as_str()).or_default() += 1;
    }

    let degree_by_node = node_indices
        .iter()
        .map(|&index| {
            let id = snapshot.nodes[index].id.as_str();
            (index, degree_by_id.get(id).copied().unwrap_or(0))
        })
        .collect();

    FilteredSubgraph {
        node_indices,
        edge_indices,
        degree_by_node,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{GraphEdge, GraphNode, GraphSnapshot};

    fn node(id: &str, label: &str, node_type: &str) -> GraphNode {
        GraphNode {
            id: id.to_owned(),
            label: label.to_owned(),
            node_type: node_type.to_owned(),
            metadata: Default::default(),
        }
    }

    fn edge(source: &str, target: &str, edge_type: &str) -> GraphEdge {
        GraphEdge {
            source_id: source.to_owned(),
            target_id: target.to_owned(),
            edge_type: edge_type.to_owned(),
            weight: 1.0,
        }
    }

    fn sample_snapshot() -> GraphSnapshot {
        GraphSnapshot {
            nodes: vec![
                node("a", "Alpha", "concept"),
                node("b", "Beta", "organization"),
                node("c", "Gamma", "concept"),
            ],
            edges: vec![edge("a", "b", "supports"), edge("b", "c", "supports")],
        }
    }

    fn sample_params() -> FilterParams {
        FilterParams {
            allowed_node_types: ["concept", "organization"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            allowed_edge_types: ["supports"].into_iter().map(str::to_owned).collect(),
            min_degree: 1,
            search: String::new(),
        }
    }

    fn ids<'a>(snapshot: &'a GraphSnapshot, result: &FilteredSubgraph) -> Vec<&'a str> {
        result
            .node_indices
            .iter()
            .map(|&index| snapshot.nodes[index].id.as_str())
            .collect()
    }

    fn degree_of(snapshot: &GraphSnapshot, result: &FilteredSubgraph, id: &str) -> usize {
        let index = snapshot.nodes.iter().position(|n| n.id == id).unwrap();
        result.degree_by_node[&index]
    }

    #[test]
    fn full_graph_survives_permissive_filter() {
        let snapshot = sample_snapshot();
        let result = filter_subgraph(&snapshot, &sample_params());

        assert_eq!(ids(&snapshot, &result), vec!["a", "b", "c"]);
        assert_eq!(result.edge_indices.len(), 2);
        assert_eq!(degree_of(&snapshot, &result, "a"), 1);
        assert_eq!(degree_of(&snapshot, &result, "b"), 2);
        assert_eq!(degree_of(&snapshot, &result, "c"), 1);
    }

    #[test]
    fn min_degree_two_keeps_only_the_hub() {
        let snapshot = sample_snapshot();
        let mut params = sample_params();
        params.min_degree = 2;

        let result = filter_subgraph(&snapshot, &params);
        assert_eq!(ids(&snapshot, &result), vec!["b"]);
        assert!(result.edge_indices.is_empty());
        assert_eq!(degree_of(&snapshot, &result, "b"), 0);
    }

    #[test]
    fn search_restricts_nodes_and_orphans_their_edges() {
        let snapshot = sample_snapshot();
        let mut params = sample_params();
        params.search = "b".to_owned();

        let result = filter_subgraph(&snapshot, &params);
        // Only Beta survives the search; both edges lose an endpoint,
        // so Beta's degree drops below the threshold too.
        assert!(result.edge_indices.is_empty());
        assert!(result.node_indices.is_empty());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let snapshot = sample_snapshot();
        let mut params = sample_params();
        params.search = "ALPH".to_owned();
        params.min_degree = 0;

        let result = filter_subgraph(&snapshot, &params);
        assert_eq!(ids(&snapshot, &result), vec!["a"]);
    }

    #[test]
    fn dangling_edges_are_dropped_silently() {
        let mut snapshot = sample_snapshot();
        snapshot.edges.push(edge("a", "ghost", "supports"));
        snapshot.edges.push(edge("ghost", "b", "supports"));

        let result = filter_subgraph(&snapshot, &sample_params());
        assert_eq!(result.edge_indices.len(), 2);
        assert_eq!(degree_of(&snapshot, &result, "a"), 1);
    }

    #[test]
    fn edgeless_snapshot_skips_the_degree_threshold() {
        let snapshot = GraphSnapshot {
            nodes: vec![node("a", "Alpha", "concept"), node("b", "Beta", "concept")],
            edges: Vec::new(),
        };
        let mut params = sample_params();
        params.min_degree = 3;

        let result = filter_subgraph(&snapshot, &params);
        assert_eq!(ids(&snapshot, &result), vec!["a", "b"]);
    }

    #[test]
    fn disallowed_types_are_dropped() {
        let snapshot = sample_snapshot();
        let mut params = sample_params();
        params.allowed_node_types.remove("organization");

        let result = filter_subgraph(&snapshot, &params);
        assert!(!ids(&snapshot, &result).contains(&"b"));
        assert!(result.edge_indices.is_empty());

        let mut params = sample_params();
        params.allowed_edge_types.clear();
        let result = filter_subgraph(&snapshot, &params);
        assert!(result.edge_indices.is_empty());
    }

    #[test]
    fn emitted_edges_reference_only_emitted_nodes() {
        let mut snapshot = sample_snapshot();
        snapshot.nodes.push(node("d", "Delta", "event"));
        snapshot.edges.push(edge("c", "d", "supports"));

        let result = filter_subgraph(&snapshot, &sample_params());
        let emitted = ids(&snapshot, &result).into_iter().collect::<Vec<_>>();
        for &edge_index in &result.edge_indices {
            let edge = &snapshot.edges[edge_index];
            assert!(emitted.contains(&edge.source_id.as_str()));
            assert!(emitted.contains(&edge.target_id.as_str()));
        }
    }
}
