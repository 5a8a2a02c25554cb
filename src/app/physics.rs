use eframe::egui::Vec2;

use super::WorkingSet;

/// Tunable force constants. Every force is scaled by the same `alpha`;
/// there is no cooling schedule, so the layout stays perpetually live.
#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct LayoutConfig {
    pub alpha: f32,
    pub center_strength: f32,
    pub repulsion: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub damping: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            center_strength: 0.01,
            repulsion: 120.0,
            link_distance: 150.0,
            link_strength: 0.08,
            damping: 0.95,
        }
    }
}

/// Advances the simulation by one step: pin snapping, centering,
/// cutoff-bounded pairwise repulsion, per-edge springs, then damped
/// velocity integration.
pub(in crate::app) fn step_layout(working_set: &mut WorkingSet, config: &LayoutConfig) {
    let node_count = working_set.nodes.len();
    if node_count == 0 {
        return;
    }

    let center = working_set.layout_center;

    for node in &mut working_set.nodes {
        if let Some(pin) = node.pinned {
            node.pos = pin;
        }
        node.vel += (center - node.pos) * config.center_strength * config.alpha;
    }

    // Pairwise repulsion, cut off beyond 5x the repulsion constant so
    // the O(n^2) pass stays cheap on sparse layouts. Coincident nodes
    // hit the distance floor and are pushed apart along a fixed axis.
    let cutoff = config.repulsion * 5.0;
    let cutoff_sq = cutoff * cutoff;
    for i in 0..node_count {
        for j in (i + 1)..node_count {
            let delta = working_set.nodes[i].pos - working_set.nodes[j].pos;
            let distance_sq = delta.length_sq();
            if distance_sq > cutoff_sq {
                continue;
            }

            let distance = distance_sq.sqrt().max(1.0);
            let direction = if distance_sq > f32::EPSILON {
                delta / distance
            } else {
                Vec2::RIGHT
            };
            let push = direction * (config.repulsion / distance) * config.alpha;
            working_set.nodes[i].vel += push;
            working_set.nodes[j].vel -= push;
        }
    }

    // Springs: attractive when stretched past the link distance,
    // repulsive when compressed.
    for edge in &working_set.edges {
        let (source, target) = (edge.source, edge.target);
        if source == target || source >= node_count || target >= node_count {
            continue;
        }

        let delta = working_set.nodes[target].pos - working_set.nodes[source].pos;
        let distance = delta.length().max(1.0);
        let direction = delta / distance;
        let stretch = distance - config.link_distance;
        let pull = direction * stretch * config.link_strength * config.alpha;

        working_set.nodes[source].vel += pull;
        working_set.nodes[target].vel -= pull;
    }

    for node in &mut working_set.nodes {
        node.vel *= config.damping;
        if node.pinned.is_none() {
            node.pos += node.vel;
        }
    }
}
