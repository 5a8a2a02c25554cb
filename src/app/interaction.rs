use eframe::egui::{self, CursorIcon, Rect, Response, Ui, Vec2};

use super::{PanAnchor, SimNode, ViewModel};

/// Wheel notches map to a fixed zoom step, anchored at the pointer.
const ZOOM_STEP: f32 = 1.1;

/// First node in snapshot order whose circle contains `sim_point`.
pub(in crate::app) fn hit_node(nodes: &[SimNode], sim_point: Vec2) -> Option<usize> {
    nodes
        .iter()
        .position(|node| (node.pos - sim_point).length() <= node.radius)
}

impl ViewModel {
    pub(in crate::app) fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let factor = if scroll > 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
        let anchor = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        self.transform.zoom_around(factor, anchor);
    }

    /// Pan begins only when the press missed every node; dragging a
    /// node is indistinguishable from clicking it. Returns the arena
    /// index under the pointer for hover rendering.
    pub(in crate::app) fn handle_pointer(&mut self, ui: &Ui, response: &Response) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered = pointer
            .filter(|_| self.pan_anchor.is_none())
            .and_then(|screen| hit_node(&self.working_set.nodes, self.transform.to_sim(screen)));

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(press) = response.interact_pointer_pos()
            && hit_node(&self.working_set.nodes, self.transform.to_sim(press)).is_none()
        {
            self.pan_anchor = Some(PanAnchor {
                press_screen: press,
                offset_at_press: self.transform.offset,
            });
        }

        if let Some(anchor) = self.pan_anchor {
            if response.dragged_by(egui::PointerButton::Primary) {
                if let Some(current) = response.interact_pointer_pos() {
                    self.transform.offset =
                        anchor.offset_at_press + (current - anchor.press_screen);
                }
            }
            if response.drag_stopped() || !response.hovered() {
                self.pan_anchor = None;
            }
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(click) = response.interact_pointer_pos()
        {
            let selection = hit_node(&self.working_set.nodes, self.transform.to_sim(click))
                .map(|index| self.working_set.nodes[index].id.clone());
            self.set_selected(selection);
        }

        let cursor = if self.pan_anchor.is_some() {
            CursorIcon::Grabbing
        } else if hovered.is_some() {
            CursorIcon::PointingHand
        } else {
            CursorIcon::Grab
        };
        if response.hovered() || self.pan_anchor.is_some() {
            ui.output_mut(|output| output.cursor_icon = cursor);
        }

        hovered
    }
}
