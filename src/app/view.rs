use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Stroke, Ui, vec2};

use crate::util::truncate_label;

use super::ViewModel;
use super::build::build_working_set;
use super::filter::filter_subgraph;
use super::physics::step_layout;
use super::transform::ViewTransform;

const EDGE_ALPHA: u8 = 140;
const SEARCH_RING_COLOR: Color32 = Color32::from_rgb(110, 200, 255);
const SELECTION_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const LABEL_COLOR: Color32 = Color32::from_gray(225);

impl ViewModel {
    /// Rebuilds the working set from the current snapshot, filter, and
    /// taxonomy. Always runs to completion before the next layout step,
    /// so a stale filter can never be observed against a new snapshot.
    fn rebuild_working_set(&mut self, rect: Rect) {
        let layout_center = self.transform.to_sim(rect.center());
        let filtered = filter_subgraph(&self.snapshot, &self.filter);
        self.working_set =
            build_working_set(&self.snapshot, &filtered, &mut self.taxonomy, layout_center);
        self.graph_dirty = false;
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.transform);

        if self.graph_dirty {
            self.rebuild_working_set(rect);
        }

        self.handle_zoom(ui, rect, &response);
        let hovered = self.handle_pointer(ui, &response);

        if self.working_set.nodes.is_empty() {
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes match the current filters.",
                FontId::proportional(14.0),
                Color32::from_gray(170),
            );
            return;
        }

        // One simulation step per frame; the layout never settles into
        // a frozen state, so keep the frame loop running while mounted.
        step_layout(&mut self.working_set, &self.layout);
        ui.ctx().request_repaint();

        let transform = self.transform;
        let selected_index = self
            .selected
            .as_ref()
            .and_then(|id| self.working_set.index_by_id.get(id))
            .copied();
        let search = self.filter.search.trim().to_lowercase();

        let mut visible_edges = 0usize;
        for edge in &self.working_set.edges {
            let start = transform.to_screen(self.working_set.nodes[edge.source].pos);
            let end = transform.to_screen(self.working_set.nodes[edge.target].pos);
            if !edge_visible(rect, start, end) {
                continue;
            }

            let width = (edge.weight.sqrt() * transform.scale).clamp(0.5, 6.0);
            let [r, g, b, _] = edge.color.to_array();
            painter.line_segment(
                [start, end],
                Stroke::new(width, Color32::from_rgba_unmultiplied(r, g, b, EDGE_ALPHA)),
            );
            visible_edges += 1;

            let touches_selection = selected_index
                .is_some_and(|index| edge.source == index || edge.target == index);
            if touches_selection {
                painter.text(
                    start + (end - start) * 0.5,
                    Align2::CENTER_CENTER,
                    edge.edge_type.as_str(),
                    FontId::proportional(11.0),
                    edge.color,
                );
            }
        }
        self.visible_edge_count = visible_edges;

        let mut visible_nodes = 0usize;
        let mut selection_animating = false;
        let mut deferred_labels = Vec::new();
        for (index, node) in self.working_set.nodes.iter().enumerate() {
            let position = transform.to_screen(node.pos);
            let radius = node.radius * transform.scale;
            if !circle_visible(rect, position, radius) {
                continue;
            }
            visible_nodes += 1;

            let is_selected = selected_index == Some(index);
            let is_hovered = hovered == Some(index);
            let search_match = !search.is_empty() && node.label.to_lowercase().contains(&search);

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("node-selection", node.id.as_str())),
                is_selected,
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }

            let mut fill = blend_color(node.color, SELECTION_COLOR, selection_mix);
            if is_hovered {
                fill = blend_color(fill, Color32::WHITE, 0.25);
            }

            if selection_mix > 0.0 {
                // Soft glow behind the selected node.
                let halo_alpha = (40.0 + selection_mix * 110.0) as u8;
                let [r, g, b, _] = SELECTION_COLOR.to_array();
                painter.circle_filled(
                    position,
                    radius + 5.0 + (1.0 - selection_mix) * 4.0,
                    Color32::from_rgba_unmultiplied(r, g, b, halo_alpha),
                );
            }

            painter.circle_filled(position, radius, fill);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );
            if search_match {
                painter.circle_stroke(position, radius + 3.0, Stroke::new(2.0, SEARCH_RING_COLOR));
            }

            deferred_labels.push((position + vec2(0.0, radius + 4.0), truncate_label(&node.label)));
        }
        self.visible_node_count = visible_nodes;

        // Labels go on top of every circle, not just their own node's.
        for (anchor, label) in deferred_labels {
            painter.text(
                anchor,
                Align2::CENTER_TOP,
                label,
                FontId::proportional(12.0),
                LABEL_COLOR,
            );
        }

        if selection_animating {
            ui.ctx().request_repaint();
        }

        if let Some(hovered_index) = hovered
            && let Some(node) = self.working_set.nodes.get(hovered_index)
        {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {}  |  degree {}", node.label, node.node_type, node.degree),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}

fn draw_background(painter: &Painter, rect: Rect, transform: ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(21, 24, 30));

    let step = (64.0 * transform.scale.clamp(0.5, 2.0)).max(24.0);
    let mut x = transform.offset.x.rem_euclid(step) + rect.left().rem_euclid(step);
    let grid_stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(58, 66, 78, 60));
    while x < rect.right() {
        if x >= rect.left() {
            painter.line_segment(
                [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                grid_stroke,
            );
        }
        x += step;
    }

    let mut y = transform.offset.y.rem_euclid(step) + rect.top().rem_euclid(step);
    while y < rect.bottom() {
        if y >= rect.top() {
            painter.line_segment(
                [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
                grid_stroke,
            );
        }
        y += step;
    }
}

fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Conservative bounding-box cull; the painter clips exact geometry.
fn edge_visible(rect: Rect, start: Pos2, end: Pos2) -> bool {
    let min_x = start.x.min(end.x);
    let max_x = start.x.max(end.x);
    let min_y = start.y.min(end.y);
    let max_y = start.y.max(end.y);
    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ViewModel;
    use crate::source::{
        GraphEdge, GraphNode, GraphService, GraphSnapshot, NodeDetails, Taxonomy,
    };
    use anyhow::Result;
    use eframe::egui::{self, RawInput, Shape, epaint::ClippedShape, pos2};
    use std::sync::Arc;

    struct StaticService;

    impl GraphService for StaticService {
        fn fetch_snapshot(&self) -> Result<GraphSnapshot> {
            Ok(GraphSnapshot::default())
        }

        fn fetch_taxonomy(&self) -> Result<Taxonomy> {
            Ok(Taxonomy::default())
        }

        fn fetch_node_details(&self, _node_id: &str) -> Result<Option<NodeDetails>> {
            Ok(None)
        }

        fn rename_node(&self, _node_id: &str, _new_label: &str) -> Result<()> {
            Ok(())
        }
    }

    fn model() -> ViewModel {
        let node = |id: &str, label: &str| GraphNode {
            id: id.to_owned(),
            label: label.to_owned(),
            node_type: "concept".to_owned(),
            metadata: Default::default(),
        };
        let snapshot = GraphSnapshot {
            nodes: vec![node("a", "Alpha"), node("b", "Beta")],
            edges: vec![GraphEdge {
                source_id: "a".to_owned(),
                target_id: "b".to_owned(),
                edge_type: "supports".to_owned(),
                weight: 1.0,
            }],
        };
        ViewModel::new(Arc::new(StaticService), snapshot, &Taxonomy::default())
    }

    fn shape_kinds(shapes: &[ClippedShape]) -> Vec<&'static str> {
        fn visit(shape: &Shape, out: &mut Vec<&'static str>) {
            match shape {
                Shape::Vec(children) => {
                    for child in children {
                        visit(child, out);
                    }
                }
                Shape::Circle(_) => out.push("circle"),
                Shape::Text(_) => out.push("text"),
                _ => {}
            }
        }

        let mut kinds = Vec::new();
        for clipped in shapes {
            visit(&clipped.shape, &mut kinds);
        }
        kinds
    }

    #[test]
    fn labels_paint_after_every_node_circle() {
        let mut model = model();
        let ctx = egui::Context::default();
        let input = RawInput {
            screen_rect: Some(Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0))),
            ..Default::default()
        };

        let output = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| model.draw_graph(ui));
        });

        let kinds = shape_kinds(&output.shapes);
        let last_circle = kinds.iter().rposition(|&kind| kind == "circle");
        let first_text = kinds.iter().position(|&kind| kind == "text");
        let (Some(last_circle), Some(first_text)) = (last_circle, first_text) else {
            panic!("expected node circles and labels, got {kinds:?}");
        };
        assert!(
            last_circle < first_text,
            "a node circle painted over a label: {kinds:?}"
        );
    }
}
