use eframe::egui::{self, RichText, Ui, vec2};

use super::super::ViewModel;
use super::super::export::export_working_set_png;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        let mut changed = false;

        ui.label("Search node labels");
        let search_response = ui
            .text_edit_singleline(&mut self.filter.search)
            .on_hover_text("Case-insensitive substring match; matching nodes get a highlight ring.");
        changed |= search_response.changed();

        ui.separator();

        ui.label(RichText::new("Node types").strong());
        let mut node_toggles = Vec::new();
        for entry in &self.node_types {
            let mut allowed = self.filter.allowed_node_types.contains(&entry.key);
            let swatch = self.taxonomy.node_swatch(&entry.key);

            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(vec2(10.0, 10.0), egui::Sense::hover());
                ui.painter().circle_filled(rect.center(), 4.0, swatch);
                if ui.checkbox(&mut allowed, entry.display.as_str()).changed() {
                    node_toggles.push((entry.key.clone(), allowed));
                }
            });
        }
        for (key, allowed) in node_toggles {
            if allowed {
                self.filter.allowed_node_types.insert(key);
            } else {
                self.filter.allowed_node_types.remove(&key);
            }
            changed = true;
        }

        ui.add_space(4.0);
        ui.label(RichText::new("Edge types").strong());
        let mut edge_toggles = Vec::new();
        for entry in &self.edge_types {
            let mut allowed = self.filter.allowed_edge_types.contains(&entry.key);
            if ui.checkbox(&mut allowed, entry.display.as_str()).changed() {
                edge_toggles.push((entry.key.clone(), allowed));
            }
        }
        for (key, allowed) in edge_toggles {
            if allowed {
                self.filter.allowed_edge_types.insert(key);
            } else {
                self.filter.allowed_edge_types.remove(&key);
            }
            changed = true;
        }

        ui.separator();

        let min_degree_slider = ui
            .add(egui::Slider::new(&mut self.filter.min_degree, 1..=10).text("Min degree"))
            .on_hover_text("Hide nodes with fewer connections in the filtered graph.");
        changed |= min_degree_slider.changed();

        ui.collapsing("Layout tuning", |ui| {
            ui.add(
                egui::Slider::new(&mut self.layout.repulsion, 20.0..=400.0)
                    .text("Repulsion")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("How strongly nodes push away from each other.");
            ui.add(
                egui::Slider::new(&mut self.layout.link_distance, 60.0..=320.0)
                    .text("Link distance")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Preferred separation between connected nodes.");
            ui.add(
                egui::Slider::new(&mut self.layout.damping, 0.80..=0.99)
                    .text("Damping")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("How quickly node movement slows each frame.");
        });

        ui.checkbox(&mut self.show_fps, "FPS readout");

        ui.separator();

        ui.horizontal(|ui| {
            if ui
                .button("Reseed layout")
                .on_hover_text("Rebuild the working set and scatter nodes near the view center.")
                .clicked()
            {
                self.graph_dirty = true;
            }

            let taxonomy_button = ui
                .add_enabled(
                    self.taxonomy_rx.is_none(),
                    egui::Button::new("Refresh taxonomy"),
                )
                .on_hover_text(
                    "Re-fetch type colors and definitions; keeps the current set on failure.",
                );
            if taxonomy_button.clicked() {
                self.request_taxonomy_refresh();
            }
        });

        if ui
            .button("Export PNG")
            .on_hover_text("Save the current working set as an image in the working directory.")
            .clicked()
        {
            self.status = Some(match export_working_set_png(&self.working_set) {
                Ok(path) => format!("Exported {}", path.display()),
                Err(error) => format!("Export failed: {error:#}"),
            });
        }

        if changed {
            self.graph_dirty = true;
        }
    }
}
