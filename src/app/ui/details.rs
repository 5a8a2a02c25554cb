use eframe::egui::{self, Color32, RichText, Ui, vec2};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Click a node in the graph to inspect it.");
            return;
        };

        let Some(node) = self.snapshot.node_by_id(&selected_id) else {
            ui.label("Selected node no longer exists in the snapshot.");
            return;
        };

        let label = node.label.clone();
        let node_type = node.node_type.clone();
        let metadata = node.metadata.clone();

        ui.label(RichText::new(label).strong());
        ui.small(selected_id.as_str());
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), egui::Sense::hover());
            ui.painter()
                .circle_filled(rect.center(), 5.0, self.taxonomy.node_swatch(&node_type));
            ui.label(format!("Type: {node_type}"));
        });

        if let Some(style) = self.taxonomy.node_style(&node_type) {
            if !style.definition.is_empty() {
                ui.small(style.definition.clone());
            }
            if !style.example.is_empty() {
                ui.small(format!("e.g. {}", style.example));
            }
        }

        if let Some(&index) = self.working_set.index_by_id.get(&selected_id) {
            ui.label(format!(
                "Degree in view: {}",
                self.working_set.nodes[index].degree
            ));
        } else {
            ui.label("Hidden by the current filters.");
        }

        if !metadata.is_empty() {
            ui.separator();
            ui.label(RichText::new("Metadata").strong());
            for (key, value) in &metadata {
                ui.label(format!("{key}: {value}"));
            }
        }

        ui.separator();
        ui.label(RichText::new("Details").strong());
        match &self.details {
            Some(selection) if selection.node_id == selected_id => match &selection.details {
                Some(details) => {
                    if !details.summary.is_empty() {
                        ui.label(details.summary.clone());
                    }
                    for (key, value) in &details.fields {
                        ui.label(format!("{key}: {value}"));
                    }
                    if details.summary.is_empty() && details.fields.is_empty() {
                        ui.label("No additional details available.");
                    }
                }
                None => {
                    ui.label("No additional details available.");
                }
            },
            _ if self.details_rx.is_some() => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Fetching details...");
                });
            }
            _ => {
                ui.label("No additional details available.");
            }
        }

        ui.separator();
        ui.label(RichText::new("Rename").strong());
        ui.text_edit_singleline(&mut self.rename_field);

        let rename_in_flight = self.rename_rx.is_some();
        let current_label = self
            .snapshot
            .node_by_id(&selected_id)
            .map(|node| node.label.clone())
            .unwrap_or_default();
        let can_apply = !rename_in_flight
            && !self.rename_field.trim().is_empty()
            && self.rename_field.trim() != current_label;

        ui.horizontal(|ui| {
            if ui
                .add_enabled(can_apply, egui::Button::new("Apply"))
                .on_hover_text("Persist the new label; the graph only updates on success.")
                .clicked()
            {
                self.request_rename();
            }
            if rename_in_flight {
                ui.spinner();
            }
        });

        if let Some(error) = &self.rename_error {
            ui.colored_label(Color32::from_rgb(235, 110, 100), error.as_str());
        }
    }
}
