use eframe::egui::{self, Align, Color32, Context, Layout, RichText, Ui};

use crate::network::{NetworkSnapshot, NodeCategory, RelationshipKind};

use super::super::graph::{Camera, DragController};
use super::super::render_utils::{RING_STROKE_COLOR, category_color, relationship_color};
use super::super::sim::Simulation;
use super::super::{GraphEvent, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(snapshot: NetworkSnapshot) -> Self {
        let simulation = Simulation::new(&snapshot);

        Self {
            snapshot,
            simulation,
            camera: Camera::default(),
            drag: DragController::default(),
            selected: None,
            events: Vec::new(),
            show_labels: true,
            show_quadtree_overlay: false,
            quadtree_cells: Vec::new(),
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        snapshot_path: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("ring-lens");
                    ui.separator();
                    ui.label(format!("snapshot: {snapshot_path}"));
                    ui.label(format!("nodes: {}", self.snapshot.node_count()));
                    ui.label(format!("edges: {}", self.snapshot.edge_count()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if self.snapshot.fraud_ring_detected {
                        ui.label(
                            RichText::new(format!(
                                "fraud ring detected ({} members)",
                                self.snapshot.ring_members.len()
                            ))
                            .color(RING_STROKE_COLOR)
                            .strong(),
                        );
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "layout: {}  alpha {:.3}",
                            self.simulation.phase().label(),
                            self.simulation.alpha()
                        ));
                        ui.label(format!(
                            "visible: {} nodes / {} edges",
                            self.visible_node_count, self.visible_edge_count
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Loading entity network...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });

        self.drain_events();
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("View");
        ui.add_space(6.0);

        ui.checkbox(&mut self.show_labels, "Node labels");
        ui.checkbox(&mut self.show_quadtree_overlay, "Quadtree overlay");

        if ui.button("Restart layout").clicked() {
            self.simulation.restart();
        }
        if ui.button("Reset view").clicked() {
            self.camera = Camera::default();
        }

        ui.separator();
        ui.heading("Legend");
        ui.add_space(6.0);

        for category in [
            NodeCategory::Account,
            NodeCategory::Merchant,
            NodeCategory::Device,
            NodeCategory::IpAddress,
        ] {
            Self::legend_row(ui, category_color(category), category.label());
        }

        ui.add_space(4.0);
        for kind in [
            RelationshipKind::Transaction,
            RelationshipKind::SharedDevice,
            RelationshipKind::SharedIp,
        ] {
            Self::legend_row(ui, relationship_color(kind), kind.label());
        }

        ui.add_space(4.0);
        Self::legend_row(ui, RING_STROKE_COLOR, "fraud ring member");
    }

    fn legend_row(ui: &mut Ui, color: Color32, label: &str) {
        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
            ui.painter().circle_filled(rect.center(), 5.0, color);
            ui.label(label);
        });
    }

    fn drain_events(&mut self) {
        for event in self.events.drain(..) {
            match event {
                GraphEvent::SelectionChanged(selected) => {
                    log::debug!("selection changed: {selected:?}");
                }
                GraphEvent::ViewChanged { zoom, pan } => {
                    log::debug!(
                        "view changed: zoom {zoom:.2} pan ({:.1}, {:.1})",
                        pan.x,
                        pan.y
                    );
                }
            }
        }
    }
}
