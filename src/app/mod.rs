use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};

use crate::network::{NetworkSnapshot, load_snapshot};

mod graph;
mod render_utils;
mod sim;
mod ui;

use graph::{Camera, DragController};
use sim::{QuadtreeCell, Simulation};

pub struct RingLensApp {
    snapshot_path: String,
    state: AppState,
    reload_rx: Option<Receiver<Result<NetworkSnapshot, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<NetworkSnapshot, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

/// Notifications emitted by the interaction layer. Drained once per frame;
/// panels read the authoritative state directly.
#[derive(Clone, Debug, PartialEq)]
enum GraphEvent {
    SelectionChanged(Option<String>),
    ViewChanged { zoom: f32, pan: egui::Vec2 },
}

struct ViewModel {
    snapshot: NetworkSnapshot,
    simulation: Simulation,
    camera: Camera,
    drag: DragController,
    selected: Option<String>,
    events: Vec<GraphEvent>,
    show_labels: bool,
    show_quadtree_overlay: bool,
    quadtree_cells: Vec<QuadtreeCell>,
    visible_node_count: usize,
    visible_edge_count: usize,
}

impl Drop for ViewModel {
    fn drop(&mut self) {
        self.simulation.dispose();
    }
}

impl RingLensApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, snapshot_path: String) -> Self {
        let state = Self::start_load(snapshot_path.clone());
        Self {
            snapshot_path,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(snapshot_path: String) -> Receiver<Result<NetworkSnapshot, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_snapshot(&snapshot_path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(snapshot_path: String) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(snapshot_path),
        }
    }
}

impl eframe::App for RingLensApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(snapshot) => AppState::Ready(Box::new(ViewModel::new(snapshot))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading entity network...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load entity network");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.snapshot_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.snapshot_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.snapshot_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(snapshot) => {
                                    AppState::Ready(Box::new(ViewModel::new(snapshot)))
                                }
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
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
