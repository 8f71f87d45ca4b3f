use eframe::egui::{self, Pos2, Rect};

use super::super::GraphEvent;
use super::super::sim::{Simulation, Vec2, vec2};

pub(in crate::app) const ZOOM_MIN: f32 = 0.5;
pub(in crate::app) const ZOOM_MAX: f32 = 3.0;
/// Pointer travel below this many pixels before release is a click, not a
/// drag.
pub(in crate::app) const CLICK_DRAG_THRESHOLD: f32 = 4.0;
/// Alpha target while a node is being dragged, so the layout keeps
/// responding to the gesture.
pub(in crate::app) const DRAG_ALPHA_TARGET: f64 = 0.3;

/// The view transform: screen = rect.center() + pan + world * zoom. Updated
/// atomically per input event; the renderer only ever reads a consistent
/// pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Camera {
    pub pan: egui::Vec2,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: egui::Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn world_to_screen(&self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.pan + egui::vec2(world.x as f32, world.y as f32) * self.zoom
    }

    pub fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        let offset = (screen - rect.center() - self.pan) / self.zoom;
        vec2(offset.x as f64, offset.y as f64)
    }

    /// Wheel zoom anchored at the pointer. Scale stays clamped to
    /// [ZOOM_MIN, ZOOM_MAX]; returns whether the transform changed.
    pub fn zoom_at(&mut self, rect: Rect, pointer: Pos2, scroll: f32) -> bool {
        if scroll.abs() <= f32::EPSILON {
            return false;
        }

        let world_before = self.screen_to_world(rect, pointer);
        let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        let next_zoom = (self.zoom * factor).clamp(ZOOM_MIN, ZOOM_MAX);
        if next_zoom == self.zoom {
            return false;
        }

        self.zoom = next_zoom;
        self.pan = pointer
            - rect.center()
            - egui::vec2(world_before.x as f32, world_before.y as f32) * self.zoom;
        true
    }

    pub fn pan_by(&mut self, delta: egui::Vec2) -> bool {
        if delta == egui::Vec2::ZERO {
            return false;
        }
        self.pan += delta;
        true
    }
}

/// Nearest node whose disk covers the pointer, hit-tested in world
/// coordinates through the inverse view transform.
pub(in crate::app) fn hit_node(
    simulation: &Simulation,
    camera: &Camera,
    rect: Rect,
    pointer: Pos2,
) -> Option<usize> {
    let world = camera.screen_to_world(rect, pointer);
    simulation
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let distance = (node.position - world).length();
            (distance <= node.radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _distance)| index)
}

struct Press {
    node: Option<String>,
    last: Pos2,
    travelled: f32,
    dragging: bool,
}

/// Press/move/release state machine disambiguating clicks from drags.
/// Clicks toggle the selection; drags on a node pin it under the pointer
/// while the simulation reheats; drags on empty canvas pan the camera.
#[derive(Default)]
pub(in crate::app) struct DragController {
    press: Option<Press>,
}

impl DragController {
    pub fn pointer_down(&mut self, node: Option<String>, screen: Pos2) {
        self.press = Some(Press {
            node,
            last: screen,
            travelled: 0.0,
            dragging: false,
        });
    }

    pub fn pointer_move(
        &mut self,
        screen: Pos2,
        rect: Rect,
        camera: &mut Camera,
        simulation: &mut Simulation,
        events: &mut Vec<GraphEvent>,
    ) {
        let Some(press) = self.press.as_mut() else {
            return;
        };

        let delta = screen - press.last;
        press.travelled += delta.length();

        if !press.dragging && press.travelled >= CLICK_DRAG_THRESHOLD {
            press.dragging = true;
            if press.node.is_some() {
                simulation.reheat(DRAG_ALPHA_TARGET);
            }
        }

        if press.dragging {
            match &press.node {
                Some(id) => {
                    let world = camera.screen_to_world(rect, screen);
                    simulation.pin(id, world);
                }
                None => {
                    if camera.pan_by(delta) {
                        events.push(GraphEvent::ViewChanged {
                            zoom: camera.zoom,
                            pan: camera.pan,
                        });
                    }
                }
            }
        }

        press.last = screen;
    }

    pub fn pointer_up(
        &mut self,
        selection: &mut Option<String>,
        simulation: &mut Simulation,
        events: &mut Vec<GraphEvent>,
    ) {
        let Some(press) = self.press.take() else {
            return;
        };

        if press.dragging {
            if let Some(id) = &press.node {
                simulation.unpin(id);
                simulation.settle();
            }
            return;
        }

        let next = match press.node {
            Some(id) if selection.as_deref() == Some(id.as_str()) => None,
            Some(id) => Some(id),
            None => None,
        };
        if *selection != next {
            *selection = next;
            events.push(GraphEvent::SelectionChanged(selection.clone()));
        }
    }

    pub fn dragged_node(&self) -> Option<&str> {
        self.press
            .as_ref()
            .filter(|press| press.dragging)
            .and_then(|press| press.node.as_deref())
    }

    pub fn is_active(&self) -> bool {
        self.press.is_some()
    }
}
