use std::collections::HashMap;

use eframe::egui::Vec2;

use crate::source::GraphSnapshot;
use crate::util::stable_jitter;

use super::filter::FilteredSubgraph;
use super::taxonomy::TaxonomyCache;
use super::{SimEdge, SimNode, WorkingSet};

const NODE_RADIUS_MIN: f32 = 6.0;
const NODE_RADIUS_MAX: f32 = 24.0;
const SEED_JITTER: f32 = 32.0;

fn node_radius(degree: usize) -> f32 {
    (NODE_RADIUS_MIN + (degree as f32).sqrt() * 4.0).clamp(NODE_RADIUS_MIN, NODE_RADIUS_MAX)
}

/// Materializes the simulation arena for a filter result. Prior
/// position/velocity state is deliberately discarded: the arena is
/// rebuilt, never patched, so derived state can never go stale against
/// the snapshot or taxonomy. New nodes seed near `layout_center` with a
/// deterministic per-id jitter.
pub(in crate::app) fn build_working_set(
    snapshot: &GraphSnapshot,
    filtered: &FilteredSubgraph,
    taxonomy: &mut TaxonomyCache,
    layout_center: Vec2,
) -> WorkingSet {
    let mut nodes = Vec::with_capacity(filtered.node_indices.len());
    let mut index_by_id = HashMap::with_capacity(filtered.node_indices.len());

    for &snapshot_index in &filtered.node_indices {
        let node = &snapshot.nodes[snapshot_index];
        let degree = filtered
            .degree_by_node
            .get(&snapshot_index)
            .copied()
            .unwrap_or(0);
        let (jx, jy) = stable_jitter(&node.id);

        index_by_id.insert(node.id.clone(), nodes.len());
        nodes.push(SimNode {
            id: node.id.clone(),
            label: node.label.clone(),
            node_type: node.node_type.clone(),
            pos: layout_center + Vec2::new(jx, jy) * SEED_JITTER,
            vel: Vec2::ZERO,
            pinned: None,
            degree,
            radius: node_radius(degree),
            color: taxonomy.node_color(&node.node_type),
        });
    }

    let mut edges = Vec::with_capacity(filtered.edge_indices.len());
    for &edge_index in &filtered.edge_indices {
        let edge = &snapshot.edges[edge_index];
        let (Some(&source), Some(&target)) = (
            index_by_id.get(&edge.source_id),
            index_by_id.get(&edge.target_id),
        ) else {
            continue;
        };

        edges.push(SimEdge {
            source,
            target,
            edge_type: edge.edge_type.clone(),
            weight: edge.weight.max(f32::MIN_POSITIVE),
            color: taxonomy.edge_color(&edge.edge_type),
        });
    }

    WorkingSet {
        nodes,
        edges,
        index_by_id,
        layout_center,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::filter::{FilterParams, filter_subgraph};
    use crate::source::{GraphEdge, GraphNode, Taxonomy, TaxonomyStyle};
    use crate::app::taxonomy::FALLBACK_COLOR;
    use eframe::egui::{Color32, vec2};

    fn snapshot() -> GraphSnapshot {
        let node = |id: &str, label: &str, node_type: &str| GraphNode {
            id: id.to_owned(),
            label: label.to_owned(),
            node_type: node_type.to_owned(),
            metadata: Default::default(),
        };
        let edge = |source: &str, target: &str| GraphEdge {
            source_id: source.to_owned(),
            target_id: target.to_owned(),
            edge_type: "supports".to_owned(),
            weight: 4.0,
        };

        GraphSnapshot {
            nodes: vec![
                node("a", "Alpha", "Concept"),
                node("b", "Beta", "organization"),
                node("c", "Gamma", "concept"),
            ],
            edges: vec![edge("a", "b"), edge("b", "c")],
        }
    }

    fn params() -> FilterParams {
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

    fn taxonomy_cache() -> TaxonomyCache {
        TaxonomyCache::new(&Taxonomy {
            node_styles: vec![TaxonomyStyle {
                name: "concept".to_owned(),
                color: "#2266aa".to_owned(),
                definition: String::new(),
                example: String::new(),
            }],
            edge_styles: Vec::new(),
        })
    }

    #[test]
    fn arena_carries_degrees_labels_and_resolved_colors() {
        let snapshot = snapshot();
        let filtered = filter_subgraph(&snapshot, &params());
        let mut taxonomy = taxonomy_cache();

        let ws = build_working_set(&snapshot, &filtered, &mut taxonomy, Vec2::ZERO);

        assert_eq!(ws.nodes.len(), 3);
        assert_eq!(ws.edges.len(), 2);

        let hub = &ws.nodes[ws.index_by_id["b"]];
        assert_eq!(hub.degree, 2);
        assert_eq!(hub.label, "Beta");
        // "organization" has no style, "Concept" matches case-folded.
        assert_eq!(hub.color, FALLBACK_COLOR);
        assert_eq!(
            ws.nodes[ws.index_by_id["a"]].color,
            Color32::from_rgb(0x22, 0x66, 0xaa)
        );
    }

    #[test]
    fn edges_reference_arena_indices() {
        let snapshot = snapshot();
        let filtered = filter_subgraph(&snapshot, &params());
        let mut taxonomy = taxonomy_cache();

        let ws = build_working_set(&snapshot, &filtered, &mut taxonomy, Vec2::ZERO);
        for edge in &ws.edges {
            assert!(edge.source < ws.nodes.len());
            assert!(edge.target < ws.nodes.len());
            assert_eq!(edge.weight, 4.0);
        }
    }

    #[test]
    fn seeding_jitters_around_the_layout_center() {
        let snapshot = snapshot();
        let filtered = filter_subgraph(&snapshot, &params());
        let mut taxonomy = taxonomy_cache();
        let center = vec2(400.0, 300.0);

        let ws = build_working_set(&snapshot, &filtered, &mut taxonomy, center);
        assert_eq!(ws.layout_center, center);
        for node in &ws.nodes {
            assert!((node.pos - center).length() <= SEED_JITTER * 1.5);
            assert_eq!(node.vel, Vec2::ZERO);
            assert!(node.pinned.is_none());
        }
    }

    #[test]
    fn radius_is_clamped_for_isolated_and_hub_nodes() {
        assert_eq!(node_radius(0), NODE_RADIUS_MIN);
        assert!(node_radius(2) > NODE_RADIUS_MIN);
        assert_eq!(node_radius(500), NODE_RADIUS_MAX);
    }
}
