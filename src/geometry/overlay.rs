use egui::{Pos2, Rect, Vec2};

use super::{DockDropTarget, DockLayoutMap};
use crate::model::{DockZone, SplitDirection};

/// Thickness of insertion lines, in points.
const INDICATOR_THICKNESS: f32 = 2.0;

/// A thin insertion line.
///
/// `axis` is the axis the line runs across: `Row` for a vertical line between two tabs or
/// along a left/right edge, `Col` for a horizontal line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DockDropIndicator {
    pub rect: Rect,
    pub axis: SplitDirection,
}

/// Highlight rect for `target`: the half of the group a split would give the panel, the
/// content area for a center drop, or the tab bar.
///
/// `None` when the target's group is not in `layout`.
pub fn compute_drop_overlay(target: &DockDropTarget, layout: &DockLayoutMap) -> Option<Rect> {
    let group = layout.group(&target.group_id)?;
    let rect = group.rect;
    let center = rect.center();
    Some(match target.zone {
        DockZone::Left => Rect::from_min_max(rect.min, Pos2::new(center.x, rect.max.y)),
        DockZone::Right => Rect::from_min_max(Pos2::new(center.x, rect.min.y), rect.max),
        DockZone::Top => Rect::from_min_max(rect.min, Pos2::new(rect.max.x, center.y)),
        DockZone::Bottom => Rect::from_min_max(Pos2::new(rect.min.x, center.y), rect.max),
        DockZone::Center => group.content_rect,
        DockZone::Tabbar => group.tab_bar_rect,
    })
}

/// Insertion line for `target`, `None` for center drops and unknown groups.
pub fn compute_drop_indicator(
    target: &DockDropTarget,
    layout: &DockLayoutMap,
) -> Option<DockDropIndicator> {
    let group = layout.group(&target.group_id)?;
    let rect = group.rect;
    let half = INDICATOR_THICKNESS * 0.5;

    let vertical_at = |x: f32, span: Rect| DockDropIndicator {
        rect: Rect::from_center_size(
            Pos2::new(x, span.center().y),
            Vec2::new(INDICATOR_THICKNESS, span.height()),
        ),
        axis: SplitDirection::Row,
    };
    let horizontal_at = |y: f32, span: Rect| DockDropIndicator {
        rect: Rect::from_center_size(
            Pos2::new(span.center().x, y),
            Vec2::new(span.width(), INDICATOR_THICKNESS),
        ),
        axis: SplitDirection::Col,
    };

    match target.zone {
        DockZone::Center => None,
        DockZone::Left => Some(vertical_at(rect.left() + half, rect)),
        DockZone::Right => Some(vertical_at(rect.right() - half, rect)),
        DockZone::Top => Some(horizontal_at(rect.top() + half, rect)),
        DockZone::Bottom => Some(horizontal_at(rect.bottom() - half, rect)),
        DockZone::Tabbar => {
            let bar = group.tab_bar_rect;
            let count = group.panel_ids.len();
            let index = target.index.unwrap_or(count).min(count);
            let x = if count == 0 {
                bar.left()
            } else {
                bar.left() + bar.width() * index as f32 / count as f32
            };
            let lo = bar.left() + half;
            let hi = (bar.right() - half).max(lo);
            Some(vertical_at(x.clamp(lo, hi), bar))
        }
    }
}
