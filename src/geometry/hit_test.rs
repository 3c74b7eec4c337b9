use egui::{Pos2, Rect};

use super::{DockGroupLayout, DockLayoutMap};
use crate::model::{DockZone, MoveTarget, NodeId};

const TABBAR_BASE_SCORE: f32 = 1.45;
const EDGE_BASE_SCORE: f32 = 1.3;
const CENTER_BASE_SCORE: f32 = 1.0;

/// Options for [`hit_test`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitTestOptions {
    /// Edge zone thickness as a fraction of the group's smaller side.
    pub edge_ratio: f32,
    pub min_edge_px: f32,
    pub max_edge_px: f32,

    /// How far the pointer may leave the previous target's rect before it is re-resolved.
    pub hysteresis_px: f32,
}

impl Default for HitTestOptions {
    fn default() -> Self {
        Self {
            edge_ratio: 0.22,
            min_edge_px: 32.0,
            max_edge_px: 80.0,
            hysteresis_px: 8.0,
        }
    }
}

impl HitTestOptions {
    /// Thickness of the edge zones of `rect`.
    pub fn edge_thickness(&self, rect: Rect) -> f32 {
        let lo = self.min_edge_px.min(self.max_edge_px).max(0.0);
        let hi = self.max_edge_px.max(lo);
        let min_dim = rect.width().min(rect.height()).max(0.0);
        (min_dim * self.edge_ratio).clamp(lo, hi)
    }
}

/// A resolved drop location.
#[derive(Clone, Debug, PartialEq)]
pub struct DockDropTarget {
    pub group_id: NodeId,
    pub zone: DockZone,

    /// The zone's rect in the layout it was resolved against. For a tab bar this is the
    /// slot of the chosen insertion boundary, not the whole strip.
    pub rect: Rect,
    pub score: f32,

    /// Tab insertion index, only for [`DockZone::Tabbar`].
    pub index: Option<usize>,
}

impl DockDropTarget {
    /// Whether both targets would produce the same move.
    pub fn same_slot(&self, other: &Self) -> bool {
        self.group_id == other.group_id && self.zone == other.zone && self.index == other.index
    }

    pub fn to_move_target(&self) -> MoveTarget {
        MoveTarget {
            group_id: self.group_id.clone(),
            zone: self.zone,
            index: self.index,
        }
    }
}

/// Resolve the drop target under `point`.
///
/// Every group offers a tab-bar zone, four edge zones and a center zone. Each zone that
/// contains the point scores `base + 1 / (1 + distance)`, where the base favours tab bars over
/// edges over centers and `distance` is measured to the zone's anchor (insertion boundary,
/// outer edge, or centroid). The best score wins.
///
/// While `point` stays within `previous.rect` grown by `hysteresis_px`, `previous` is returned
/// as is, provided its group is still in `layout`.
pub fn hit_test(
    point: Pos2,
    layout: &DockLayoutMap,
    options: &HitTestOptions,
    previous: Option<&DockDropTarget>,
) -> Option<DockDropTarget> {
    if let Some(previous) = previous {
        if layout.group(&previous.group_id).is_some()
            && previous.rect.expand(options.hysteresis_px.max(0.0)).contains(point)
        {
            return Some(previous.clone());
        }
    }

    let mut best: Option<DockDropTarget> = None;
    for group in &layout.groups {
        for candidate in group_candidates(group, point, options) {
            if best.as_ref().is_none_or(|best| candidate.score > best.score) {
                best = Some(candidate);
            }
        }
    }
    best
}

fn group_candidates(
    group: &DockGroupLayout,
    point: Pos2,
    options: &HitTestOptions,
) -> Vec<DockDropTarget> {
    let mut out = Vec::new();
    let proximity = |distance: f32| 1.0 / (1.0 + distance.max(0.0));
    let mut push = |zone: DockZone, rect: Rect, score: f32, index: Option<usize>| {
        out.push(DockDropTarget {
            group_id: group.group_id.clone(),
            zone,
            rect,
            score,
            index,
        });
    };

    let bar = group.tab_bar_rect;
    if bar.height() > 0.0 && bar.contains(point) {
        let (index, distance) = group.insertion_index(point.x);
        push(
            DockZone::Tabbar,
            group.insertion_slot(index),
            TABBAR_BASE_SCORE + proximity(distance),
            Some(index),
        );
    }

    let rect = group.rect;
    if !rect.is_positive() || !rect.contains(point) {
        return out;
    }
    let t = options.edge_thickness(rect);

    let left_band = rect.left()..=(rect.left() + t).min(rect.right());
    let right_band = (rect.right() - t).max(rect.left())..=rect.right();
    let top_band = rect.top()..=(rect.top() + t).min(rect.bottom());
    let bottom_band = (rect.bottom() - t).max(rect.top())..=rect.bottom();
    let edges = [
        (
            DockZone::Left,
            Rect::from_x_y_ranges(left_band, rect.y_range()),
            point.x - rect.left(),
        ),
        (
            DockZone::Right,
            Rect::from_x_y_ranges(right_band, rect.y_range()),
            rect.right() - point.x,
        ),
        (
            DockZone::Top,
            Rect::from_x_y_ranges(rect.x_range(), top_band),
            point.y - rect.top(),
        ),
        (
            DockZone::Bottom,
            Rect::from_x_y_ranges(rect.x_range(), bottom_band),
            rect.bottom() - point.y,
        ),
    ];
    for (zone, zone_rect, distance) in edges {
        if zone_rect.contains(point) {
            push(zone, zone_rect, EDGE_BASE_SCORE + proximity(distance), None);
        }
    }

    let center = rect.shrink(t);
    if center.is_positive() && center.contains(point) {
        push(
            DockZone::Center,
            center,
            CENTER_BASE_SCORE + proximity(point.distance(center.center())),
            None,
        );
    }

    out
}
