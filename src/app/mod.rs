use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2, Vec2};

use crate::source::{GraphService, GraphSnapshot, NodeDetails, Taxonomy};

mod build;
mod export;
mod filter;
mod interaction;
mod physics;
mod taxonomy;
mod transform;
mod ui;
mod view;

use filter::FilterParams;
use physics::LayoutConfig;
use taxonomy::TaxonomyCache;
use transform::ViewTransform;

type LoadResult = Result<(GraphSnapshot, Taxonomy), String>;

pub struct GraphLensApp {
    service: Arc<dyn GraphService>,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

/// Live view state for one loaded snapshot. Replaced wholesale on
/// reload; replacement drops the worker receivers, so late results from
/// a torn-down view are discarded rather than applied.
struct ViewModel {
    service: Arc<dyn GraphService>,
    snapshot: GraphSnapshot,
    taxonomy: TaxonomyCache,
    filter: FilterParams,
    layout: LayoutConfig,
    transform: ViewTransform,
    working_set: WorkingSet,
    graph_dirty: bool,
    selected: Option<String>,
    pan_anchor: Option<PanAnchor>,
    node_types: Vec<TypeEntry>,
    edge_types: Vec<TypeEntry>,
    details: Option<SelectionDetails>,
    details_rx: Option<(String, Receiver<Result<Option<NodeDetails>, String>>)>,
    rename_field: String,
    rename_rx: Option<Receiver<RenameOutcome>>,
    rename_error: Option<String>,
    taxonomy_rx: Option<Receiver<Result<Taxonomy, String>>>,
    status: Option<String>,
    show_fps: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
    visible_node_count: usize,
    visible_edge_count: usize,
}

/// Mutable simulation arena derived from the snapshot; rebuilt (never
/// patched) whenever the snapshot, filter, or taxonomy changes. Only a
/// confirmed rename touches an existing entry, and then only `label`.
struct WorkingSet {
    nodes: Vec<SimNode>,
    edges: Vec<SimEdge>,
    index_by_id: std::collections::HashMap<String, usize>,
    layout_center: Vec2,
}

impl WorkingSet {
    fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            index_by_id: std::collections::HashMap::new(),
            layout_center: Vec2::ZERO,
        }
    }
}

struct SimNode {
    id: String,
    label: String,
    node_type: String,
    pos: Vec2,
    vel: Vec2,
    /// When set, the layout step clamps `pos` here each frame. No
    /// default gesture sets this; it backs a possible drag-to-fix
    /// feature.
    pinned: Option<Vec2>,
    degree: usize,
    radius: f32,
    color: egui::Color32,
}

struct SimEdge {
    source: usize,
    target: usize,
    edge_type: String,
    weight: f32,
    color: egui::Color32,
}

/// Press position and the offset captured when a background pan began.
#[derive(Clone, Copy)]
struct PanAnchor {
    press_screen: Pos2,
    offset_at_press: Vec2,
}

/// One toggleable type in the controls panel: the display name next to
/// the case-folded key the filter stores.
struct TypeEntry {
    display: String,
    key: String,
}

struct SelectionDetails {
    node_id: String,
    details: Option<NodeDetails>,
}

struct RenameOutcome {
    node_id: String,
    new_label: String,
    result: Result<(), String>,
}

impl GraphLensApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, service: Arc<dyn GraphService>) -> Self {
        let state = AppState::Loading {
            rx: Self::spawn_load(Arc::clone(&service)),
        };
        Self {
            service,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(service: Arc<dyn GraphService>) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = service
                .fetch_snapshot()
                .and_then(|snapshot| service.fetch_taxonomy().map(|taxonomy| (snapshot, taxonomy)))
                .map_err(|error| format!("{error:#}"));
            if let Err(error) = &result {
                log::error!("graph load failed: {error}");
            }
            let _ = tx.send(result);
        });

        rx
    }
}

impl eframe::App for GraphLensApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok((snapshot, taxonomy)) => AppState::Ready(Box::new(ViewModel::new(
                            Arc::clone(&self.service),
                            snapshot,
                            &taxonomy,
                        ))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the knowledge graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(AppState::Loading {
                            rx: Self::spawn_load(Arc::clone(&self.service)),
                        });
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(Arc::clone(&self.service)));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok((snapshot, taxonomy))) => {
                            transition = Some(AppState::Ready(Box::new(ViewModel::new(
                                Arc::clone(&self.service),
                                snapshot,
                                &taxonomy,
                            ))));
                        }
                        Ok(Err(error)) => {
                            // Keep the current view usable; reloading is
                            // retryable from the top bar.
                            model.status = Some(format!("Reload failed: {error}"));
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            model.status = Some("Reload worker disconnected".to_owned());
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
