use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};

use crate::util::format_risk;

use super::super::render_utils::{circle_visible, draw_background, edge_visible};
use super::super::sim;
use super::super::{GraphEvent, ViewModel};
use super::interaction::hit_node;
use super::scene::build_scene;

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.camera.pan, self.camera.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pointer(ui, rect, &response);

        let simulating = self.simulation.tick();
        if simulating || self.drag.is_active() {
            ui.ctx().request_repaint();
        }

        let scene = build_scene(&self.snapshot, &self.simulation, self.selected.as_deref());
        let zoom = self.camera.zoom;

        let mut visible_edge_count = 0usize;
        for edge in &scene.edges {
            let start = self.camera.world_to_screen(rect, edge.source);
            let end = self.camera.world_to_screen(rect, edge.target);
            if !edge_visible(rect, start, end, 4.0) {
                continue;
            }

            let mut width = (edge.width * zoom.sqrt()).clamp(0.6, 8.0);
            if edge.emphasized {
                width *= 1.5;
            }
            painter.line_segment([start, end], Stroke::new(width, edge.color));
            visible_edge_count += 1;
        }
        self.visible_edge_count = visible_edge_count;

        let hovered = response
            .hover_pos()
            .and_then(|pointer| hit_node(&self.simulation, &self.camera, rect, pointer));
        if self.drag.dragged_node().is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::Grabbing;
            });
        } else if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let mut visible_node_count = 0usize;
        for sprite in &scene.nodes {
            let position = self.camera.world_to_screen(rect, sprite.position);
            let radius = sprite.radius as f32 * zoom;
            if !circle_visible(rect, position, radius + sprite.stroke_width) {
                continue;
            }

            painter.circle_filled(position, radius, sprite.fill);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(sprite.stroke_width, sprite.stroke_color),
            );

            if hovered == Some(sprite.index) {
                painter.circle_stroke(
                    position,
                    radius + 3.0,
                    Stroke::new(1.5, Color32::from_rgba_unmultiplied(255, 255, 255, 120)),
                );
            }

            let draw_label = self.show_labels
                && (sprite.emphasized || hovered == Some(sprite.index) || zoom > 1.1);
            if draw_label
                && let Some(entity) = self.snapshot.nodes.get(sprite.index)
            {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    &entity.label,
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }

            visible_node_count += 1;
        }
        self.visible_node_count = visible_node_count;

        if self.show_quadtree_overlay {
            self.draw_quadtree_overlay(&painter, rect);
        }

        if let Some(index) = hovered
            && let Some(entity) = self.snapshot.nodes.get(index)
        {
            let info = format!(
                "{}  |  {}  |  risk {}",
                entity.label,
                entity.category.label(),
                format_risk(entity.risk_score)
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                info,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }

    fn handle_graph_zoom(&mut self, ui: &Ui, rect: egui::Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());

        if self.camera.zoom_at(rect, pointer, scroll) {
            self.events.push(GraphEvent::ViewChanged {
                zoom: self.camera.zoom,
                pan: self.camera.pan,
            });
        }
    }

    fn handle_graph_pointer(&mut self, ui: &Ui, rect: egui::Rect, response: &egui::Response) {
        let primary_pressed = ui.input(|input| input.pointer.primary_pressed());
        if primary_pressed
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let node = hit_node(&self.simulation, &self.camera, rect, pointer)
                .and_then(|index| self.snapshot.nodes.get(index))
                .map(|entity| entity.id.clone());
            self.drag.pointer_down(node, pointer);
        }

        if self.drag.is_active()
            && let Some(pointer) = ui.input(|input| input.pointer.latest_pos())
        {
            self.drag.pointer_move(
                pointer,
                rect,
                &mut self.camera,
                &mut self.simulation,
                &mut self.events,
            );
        }

        if ui.input(|input| input.pointer.primary_released()) {
            self.drag
                .pointer_up(&mut self.selected, &mut self.simulation, &mut self.events);
        }
    }

    fn draw_quadtree_overlay(&mut self, painter: &egui::Painter, rect: egui::Rect) {
        self.simulation.quadtree_cells(&mut self.quadtree_cells);

        for cell in &self.quadtree_cells {
            let min = cell.center - sim::vec2(cell.half_extent, cell.half_extent);
            let max = cell.center + sim::vec2(cell.half_extent, cell.half_extent);
            let top_left = self.camera.world_to_screen(rect, min);
            let top_right = self.camera.world_to_screen(rect, sim::vec2(max.x, min.y));
            let bottom_right = self.camera.world_to_screen(rect, max);
            let bottom_left = self.camera.world_to_screen(rect, sim::vec2(min.x, max.y));

            let alpha = if cell.is_leaf { 110 } else { 55 };
            let line_width = (1.4_f32 - (cell.depth as f32 * 0.09_f32)).clamp(0.45_f32, 1.4_f32);
            let stroke = Stroke::new(
                line_width,
                Color32::from_rgba_unmultiplied(106, 198, 255, alpha),
            );

            painter.line_segment([top_left, top_right], stroke);
            painter.line_segment([top_right, bottom_right], stroke);
            painter.line_segment([bottom_right, bottom_left], stroke);
            painter.line_segment([bottom_left, top_left], stroke);
        }
    }
}
