use eframe::egui::{self, RichText, Ui};

use crate::util::{format_metadata_value, format_risk};

use super::super::render_utils::{RING_STROKE_COLOR, category_color, risk_tier_color};
use super::super::{GraphEvent, ViewModel};

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Select a node in the graph.");
            return;
        };

        let Some(index) = self.snapshot.index_of(&selected_id) else {
            ui.label("Selected node no longer exists in the snapshot.");
            return;
        };

        let node = &self.snapshot.nodes[index];
        let label = node.label.clone();
        let category = node.category;
        let risk_score = node.risk_score;
        let metadata = node.metadata.clone();
        let is_ring_member = self.snapshot.is_ring_member(&selected_id);

        ui.label(RichText::new(label).strong());
        ui.small(selected_id.as_str());
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            ui.label("Category:");
            ui.label(RichText::new(category.label()).color(category_color(category)));
        });
        ui.horizontal(|ui| {
            ui.label("Risk score:");
            ui.label(RichText::new(format_risk(risk_score)).color(risk_tier_color(risk_score)));
        });
        if is_ring_member {
            ui.label(
                RichText::new("Member of detected fraud ring")
                    .color(RING_STROKE_COLOR)
                    .strong(),
            );
        }

        if !metadata.is_empty() {
            ui.separator();
            ui.label(RichText::new("Attributes").strong());
            for (key, value) in &metadata {
                ui.label(format!("{key}: {}", format_metadata_value(value)));
            }
        }

        ui.separator();
        ui.label(RichText::new("Connections").strong());

        let mut neighbor_ids = self
            .snapshot
            .neighbor_indices(&selected_id)
            .into_iter()
            .filter_map(|neighbor| self.snapshot.nodes.get(neighbor))
            .map(|neighbor| (neighbor.label.clone(), neighbor.id.clone()))
            .collect::<Vec<_>>();
        neighbor_ids.sort();

        if neighbor_ids.is_empty() {
            ui.label("No connected entities.");
            return;
        }

        egui::ScrollArea::vertical()
            .id_salt("connections_scroll")
            .max_height(320.0)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (neighbor_label, neighbor_id) in &neighbor_ids {
                    if ui
                        .link(neighbor_label)
                        .on_hover_text(neighbor_id.as_str())
                        .clicked()
                    {
                        self.selected = Some(neighbor_id.clone());
                        self.events
                            .push(GraphEvent::SelectionChanged(self.selected.clone()));
                    }
                }
            });
    }
}
