use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::network::{NodeCategory, RelationshipKind};

/// Risk score above which a node counts as high risk and its fill darkens.
pub(super) const HIGH_RISK_THRESHOLD: f64 = 0.7;
const MEDIUM_RISK_THRESHOLD: f64 = 0.3;

pub(super) const RING_STROKE_COLOR: Color32 = Color32::from_rgb(0xdc, 0x26, 0x26);
pub(super) const RING_STROKE_WIDTH: f32 = 4.0;
pub(super) const DEFAULT_STROKE_COLOR: Color32 = Color32::WHITE;
pub(super) const DEFAULT_STROKE_WIDTH: f32 = 2.0;
pub(super) const SELECTED_STROKE_COLOR: Color32 = Color32::from_rgb(245, 206, 93);

pub(super) fn category_color(category: NodeCategory) -> Color32 {
    match category {
        NodeCategory::Account => Color32::from_rgb(0x3b, 0x82, 0xf6),
        NodeCategory::Merchant => Color32::from_rgb(0x8b, 0x5c, 0xf6),
        NodeCategory::Device => Color32::from_rgb(0x10, 0xb9, 0x81),
        NodeCategory::IpAddress => Color32::from_rgb(0xf5, 0x9e, 0x0b),
    }
}

pub(super) fn relationship_color(kind: RelationshipKind) -> Color32 {
    match kind {
        RelationshipKind::Transaction => Color32::from_rgb(0x6b, 0x72, 0x80),
        RelationshipKind::SharedDevice => Color32::from_rgb(0xdc, 0x26, 0x26),
        RelationshipKind::SharedIp => Color32::from_rgb(0xf5, 0x9e, 0x0b),
    }
}

/// Category fill, darkened for high-risk entities.
pub(super) fn node_fill(category: NodeCategory, risk_score: f64) -> Color32 {
    let base = category_color(category);
    if risk_score > HIGH_RISK_THRESHOLD {
        darken(base, 0.65)
    } else {
        base
    }
}

/// Tier color for risk readouts: red above 0.7, amber above 0.3, green below.
pub(super) fn risk_tier_color(risk_score: f64) -> Color32 {
    if risk_score > HIGH_RISK_THRESHOLD {
        Color32::from_rgb(239, 68, 68)
    } else if risk_score > MEDIUM_RISK_THRESHOLD {
        Color32::from_rgb(250, 204, 21)
    } else {
        Color32::from_rgb(74, 222, 128)
    }
}

fn darken(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgb(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(18, 18, 18));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 60)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 60)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let top_left = rect.left_top();
    let top_right = rect.right_top();
    let bottom_left = rect.left_bottom();
    let bottom_right = rect.right_bottom();

    segments_intersect(start, end, top_left, top_right)
        || segments_intersect(start, end, top_right, bottom_right)
        || segments_intersect(start, end, bottom_right, bottom_left)
        || segments_intersect(start, end, bottom_left, top_left)
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let a_min_x = a1.x.min(a2.x);
    let a_max_x = a1.x.max(a2.x);
    let a_min_y = a1.y.min(a2.y);
    let a_max_y = a1.y.max(a2.y);
    let b_min_x = b1.x.min(b2.x);
    let b_max_x = b1.x.max(b2.x);
    let b_min_y = b1.y.min(b2.y);
    let b_max_y = b1.y.max(b2.y);

    if a_max_x < b_min_x || b_max_x < a_min_x || a_max_y < b_min_y || b_max_y < a_min_y {
        return false;
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}
