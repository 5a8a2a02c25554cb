use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;

use eframe::egui::{self, Align, Context, Layout};

use crate::source::{GraphService, GraphSnapshot, Taxonomy};
use crate::util::truncate_label;

use super::super::filter::FilterParams;
use super::super::physics::LayoutConfig;
use super::super::taxonomy::TaxonomyCache;
use super::super::transform::ViewTransform;
use super::super::{RenameOutcome, SelectionDetails, TypeEntry, ViewModel, WorkingSet};

impl ViewModel {
    pub(in crate::app) fn new(
        service: Arc<dyn GraphService>,
        snapshot: GraphSnapshot,
        taxonomy_doc: &Taxonomy,
    ) -> Self {
        let mut model = Self {
            service,
            snapshot,
            taxonomy: TaxonomyCache::new(taxonomy_doc),
            filter: FilterParams::default(),
            layout: LayoutConfig::default(),
            transform: ViewTransform::default(),
            working_set: WorkingSet::empty(),
            graph_dirty: true,
            selected: None,
            pan_anchor: None,
            node_types: Vec::new(),
            edge_types: Vec::new(),
            details: None,
            details_rx: None,
            rename_field: String::new(),
            rename_rx: None,
            rename_error: None,
            taxonomy_rx: None,
            status: None,
            show_fps: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
            visible_node_count: 0,
            visible_edge_count: 0,
        };
        model.refresh_type_lists();
        model
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        self.poll_workers();
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("graphlens");
                    ui.separator();
                    ui.label(format!("snapshot: {} nodes", self.snapshot.node_count()));
                    ui.label(format!("{} edges", self.snapshot.edge_count()));
                    if let Some(selected) = &self.selected {
                        ui.label(format!("selected: {selected}"));
                    }

                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }

                    if let Some(status) = &self.status {
                        ui.separator();
                        ui.label(status.as_str());
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "visible: {} nodes / {} edges",
                            self.visible_node_count, self.visible_edge_count
                        ));
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_reloading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading knowledge graph...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected == selected {
            return;
        }

        self.selected = selected;
        self.details = None;
        self.details_rx = None;
        self.rename_error = None;
        self.rename_field = self
            .selected
            .as_ref()
            .and_then(|id| self.snapshot.node_by_id(id))
            .map(|node| node.label.clone())
            .unwrap_or_default();

        if let Some(node_id) = self.selected.clone() {
            self.spawn_details_fetch(node_id);
        }
    }

    /// Union of the types present in the snapshot and the types the
    /// taxonomy styles, case-folded. New keys default to allowed so a
    /// refreshed taxonomy never silently hides nodes.
    pub(in crate::app) fn refresh_type_lists(&mut self) {
        let mut node_names: HashMap<String, String> = HashMap::new();
        let mut edge_names: HashMap<String, String> = HashMap::new();

        for node in &self.snapshot.nodes {
            node_names
                .entry(node.node_type.to_lowercase())
                .or_insert_with(|| node.node_type.clone());
        }
        for edge in &self.snapshot.edges {
            edge_names
                .entry(edge.edge_type.to_lowercase())
                .or_insert_with(|| edge.edge_type.clone());
        }
        // Taxonomy casing wins for display names.
        for name in self.taxonomy.node_type_names() {
            node_names.insert(name.to_lowercase(), name);
        }
        for name in self.taxonomy.edge_type_names() {
            edge_names.insert(name.to_lowercase(), name);
        }

        let known_node_keys = node_names.keys().cloned().collect::<HashSet<_>>();
        let known_edge_keys = edge_names.keys().cloned().collect::<HashSet<_>>();
        let previously_known = |entries: &[TypeEntry], key: &str| {
            entries.iter().any(|entry| entry.key == key)
        };

        for key in &known_node_keys {
            if !previously_known(&self.node_types, key) {
                self.filter.allowed_node_types.insert(key.clone());
            }
        }
        for key in &known_edge_keys {
            if !previously_known(&self.edge_types, key) {
                self.filter.allowed_edge_types.insert(key.clone());
            }
        }
        self.filter
            .allowed_node_types
            .retain(|key| known_node_keys.contains(key));
        self.filter
            .allowed_edge_types
            .retain(|key| known_edge_keys.contains(key));

        let into_entries = |names: HashMap<String, String>| {
            let mut entries = names
                .into_iter()
                .map(|(key, display)| TypeEntry { display, key })
                .collect::<Vec<_>>();
            entries.sort_by(|a, b| a.key.cmp(&b.key));
            entries
        };
        self.node_types = into_entries(node_names);
        self.edge_types = into_entries(edge_names);
    }

    pub(in crate::app) fn request_taxonomy_refresh(&mut self) {
        if self.taxonomy_rx.is_some() {
            return;
        }

        let service = Arc::clone(&self.service);
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = service.fetch_taxonomy().map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });
        self.taxonomy_rx = Some(rx);
    }

    pub(in crate::app) fn request_rename(&mut self) {
        if self.rename_rx.is_some() {
            return;
        }
        let Some(node_id) = self.selected.clone() else {
            return;
        };

        let new_label = self.rename_field.trim().to_owned();
        let service = Arc::clone(&self.service);
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = service
                .rename_node(&node_id, &new_label)
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(RenameOutcome {
                node_id,
                new_label,
                result,
            });
        });
        self.rename_rx = Some(rx);
        self.rename_error = None;
    }

    fn spawn_details_fetch(&mut self, node_id: String) {
        let service = Arc::clone(&self.service);
        let (tx, rx) = mpsc::channel();
        let worker_id = node_id.clone();
        thread::spawn(move || {
            let result = service
                .fetch_node_details(&worker_id)
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });
        self.details_rx = Some((node_id, rx));
    }

    fn poll_workers(&mut self) {
        if let Some(rx) = self.taxonomy_rx.take() {
            match rx.try_recv() {
                Ok(Ok(taxonomy)) => {
                    self.taxonomy.replace(&taxonomy);
                    self.refresh_type_lists();
                    self.graph_dirty = true;
                    self.status = Some("Taxonomy refreshed".to_owned());
                }
                Ok(Err(error)) => {
                    // Stale-but-available: keep rendering with the
                    // previous styles.
                    log::warn!("taxonomy refresh failed: {error}");
                    self.status = Some(format!("Taxonomy refresh failed: {error}"));
                }
                Err(TryRecvError::Empty) => self.taxonomy_rx = Some(rx),
                Err(TryRecvError::Disconnected) => {
                    self.status = Some("Taxonomy worker disconnected".to_owned());
                }
            }
        }

        if let Some((node_id, rx)) = self.details_rx.take() {
            match rx.try_recv() {
                Ok(result) => {
                    if let Err(error) = &result {
                        log::warn!("details fetch for {node_id} failed: {error}");
                    }
                    // Discard results for a selection that changed while
                    // the fetch was in flight.
                    if self.selected.as_deref() == Some(node_id.as_str()) {
                        self.details = Some(SelectionDetails {
                            node_id,
                            details: result.ok().flatten(),
                        });
                    }
                }
                Err(TryRecvError::Empty) => self.details_rx = Some((node_id, rx)),
                Err(TryRecvError::Disconnected) => {}
            }
        }

        if let Some(rx) = self.rename_rx.take() {
            match rx.try_recv() {
                Ok(outcome) => match outcome.result {
                    Ok(()) => {
                        self.apply_confirmed_rename(&outcome.node_id, &outcome.new_label);
                        self.status =
                            Some(format!("Renamed to {}", truncate_label(&outcome.new_label)));
                    }
                    Err(error) => {
                        // No optimistic update: the displayed label still
                        // matches the last confirmed server state.
                        log::warn!("rename of {} rejected: {error}", outcome.node_id);
                        self.rename_error = Some(error);
                    }
                },
                Err(TryRecvError::Empty) => self.rename_rx = Some(rx),
                Err(TryRecvError::Disconnected) => {
                    self.rename_error = Some("Rename worker disconnected".to_owned());
                }
            }
        }
    }

    /// Patches a confirmed rename into both the snapshot and the live
    /// arena entry. Never triggers a re-derivation.
    fn apply_confirmed_rename(&mut self, node_id: &str, new_label: &str) {
        self.snapshot.apply_rename(node_id, new_label);
        if let Some(&index) = self.working_set.index_by_id.get(node_id) {
            self.working_set.nodes[index].label = new_label.to_owned();
        }
        if self.selected.as_deref() == Some(node_id) {
            self.rename_field = new_label.to_owned();
        }
    }
}
