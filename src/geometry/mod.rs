//! Projection of a [`DockState`] onto screen rects, plus drop-target hit testing.
//!
//! Everything here is a pure function of its inputs. Nothing in this module mutates a state.

use std::collections::BTreeMap;

use egui::{Pos2, Rect, Vec2};

use crate::model::{DockState, NodeId, NodeKind, SplitDirection, WEIGHT_EPSILON, normalize_weights};

mod hit_test;
mod overlay;

#[cfg(test)]
mod hit_test_tests;

pub use hit_test::{DockDropTarget, HitTestOptions, hit_test};
pub use overlay::{DockDropIndicator, compute_drop_indicator, compute_drop_overlay};

/// Options for [`compute_layout_rects`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
    /// Height of a group's tab strip. Clamped to the group's height.
    pub tab_bar_height: f32,

    /// Thickness of the handle between two split children.
    pub splitter_size: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            tab_bar_height: 28.0,
            splitter_size: 8.0,
        }
    }
}

/// Screen geometry of one group.
#[derive(Clone, Debug, PartialEq)]
pub struct DockGroupLayout {
    pub group_id: NodeId,
    pub rect: Rect,
    pub tab_bar_rect: Rect,
    pub content_rect: Rect,

    /// Tab order.
    pub panel_ids: Vec<NodeId>,
    pub active_panel_id: Option<NodeId>,

    /// One equal-width rect per panel, parallel to `panel_ids`.
    pub tab_rects: Vec<Rect>,
}

impl DockGroupLayout {
    /// Tab insertion index closest to `x`, with its distance to that boundary.
    ///
    /// Boundaries sit at the left edge of each tab and at the right end of the strip, so the
    /// result is in `0..=panel_ids.len()`.
    pub fn insertion_index(&self, x: f32) -> (usize, f32) {
        let bar = self.tab_bar_rect;
        let count = self.panel_ids.len();
        let tab_width = if count == 0 {
            bar.width()
        } else {
            bar.width() / count as f32
        };
        if tab_width <= 0.0 {
            return (count, (x - bar.right()).abs());
        }
        let slot = ((x - bar.left()) / tab_width).round();
        let index = if slot.is_finite() && slot > 0.0 {
            (slot as usize).min(count)
        } else {
            0
        };
        let boundary = bar.left() + index as f32 * tab_width;
        (index, (x - boundary).abs())
    }

    /// The part of the tab bar that resolves to insertion boundary `index`: one tab wide,
    /// centred on the boundary and clipped to the bar.
    pub fn insertion_slot(&self, index: usize) -> Rect {
        let bar = self.tab_bar_rect;
        let count = self.panel_ids.len().max(1);
        let tab_width = bar.width() / count as f32;
        if !tab_width.is_finite() || tab_width <= 0.0 {
            return bar;
        }
        let boundary = bar.left() + index.min(self.panel_ids.len()) as f32 * tab_width;
        let left = (boundary - tab_width * 0.5).max(bar.left());
        let right = (boundary + tab_width * 0.5).min(bar.right());
        Rect::from_x_y_ranges(left..=right, bar.y_range())
    }
}

/// The draggable gap between `children[index]` and `children[index + 1]` of a split.
#[derive(Clone, Debug, PartialEq)]
pub struct DockSplitHandleLayout {
    pub split_id: NodeId,
    pub index: usize,
    pub direction: SplitDirection,
    pub rect: Rect,
}

impl DockSplitHandleLayout {
    /// Thickness along the split axis.
    pub fn thickness(&self) -> f32 {
        match self.direction {
            SplitDirection::Row => self.rect.width(),
            SplitDirection::Col => self.rect.height(),
        }
    }
}

/// Output of [`compute_layout_rects`].
#[derive(Clone, Debug, PartialEq)]
pub struct DockLayoutMap {
    pub bounds: Rect,
    pub root_id: Option<NodeId>,

    /// Rect of every laid-out node. Panels map to their group's content rect.
    pub nodes: BTreeMap<NodeId, Rect>,

    /// Groups in reading order.
    pub groups: Vec<DockGroupLayout>,

    /// Split handles, parents before children.
    pub split_handles: Vec<DockSplitHandleLayout>,
}

impl DockLayoutMap {
    pub fn rect(&self, id: &NodeId) -> Option<Rect> {
        self.nodes.get(id).copied()
    }

    pub fn group(&self, group_id: &NodeId) -> Option<&DockGroupLayout> {
        self.groups.iter().find(|group| &group.group_id == group_id)
    }

    pub fn handle(&self, split_id: &NodeId, index: usize) -> Option<&DockSplitHandleLayout> {
        self.split_handles
            .iter()
            .find(|handle| &handle.split_id == split_id && handle.index == index)
    }

    pub fn handles_for<'a>(
        &'a self,
        split_id: &'a NodeId,
    ) -> impl Iterator<Item = &'a DockSplitHandleLayout> + 'a {
        self.split_handles
            .iter()
            .filter(move |handle| &handle.split_id == split_id)
    }

    /// Topmost handle under `point`, if any.
    pub fn handle_at(&self, point: Pos2) -> Option<&DockSplitHandleLayout> {
        self.split_handles
            .iter()
            .rev()
            .find(|handle| handle.rect.contains(point))
    }
}

/// Lay out the docked tree of `state` inside `bounds`.
///
/// Splits divide their rect along their axis in proportion to their weights, with a handle
/// of `splitter_size` between neighbours. The last child absorbs rounding so the children
/// and handles tile the split exactly. Floating windows are not laid out here.
pub fn compute_layout_rects(
    state: &DockState,
    bounds: Rect,
    options: LayoutOptions,
) -> DockLayoutMap {
    let mut layout = DockLayoutMap {
        bounds,
        root_id: state.node(&state.root_id).map(|_| state.root_id.clone()),
        nodes: BTreeMap::new(),
        groups: Vec::new(),
        split_handles: Vec::new(),
    };
    let mut visited = ahash::HashSet::default();
    layout_node(state, &state.root_id, bounds, options, &mut layout, &mut visited);
    layout
}

fn layout_node(
    state: &DockState,
    id: &NodeId,
    rect: Rect,
    options: LayoutOptions,
    layout: &mut DockLayoutMap,
    visited: &mut ahash::HashSet<NodeId>,
) {
    let Some(node) = state.node(id) else {
        return;
    };
    if !visited.insert(id.clone()) {
        return;
    }
    layout.nodes.insert(id.clone(), rect);

    match &node.kind {
        NodeKind::Split { direction, weights } => {
            let children = node.children();
            for (index, (child_rect, handle_rect)) in
                split_rects(rect, *direction, weights, children.len(), options.splitter_size)
                    .into_iter()
                    .enumerate()
            {
                if let Some(handle_rect) = handle_rect {
                    layout.split_handles.push(DockSplitHandleLayout {
                        split_id: id.clone(),
                        index,
                        direction: *direction,
                        rect: handle_rect,
                    });
                }
                if let Some(child) = children.get(index) {
                    layout_node(state, child, child_rect, options, layout, visited);
                }
            }
        }
        NodeKind::Group { active_panel_id } => {
            let panel_ids = node.children().to_vec();
            let group = group_layout(id, rect, panel_ids, active_panel_id.clone(), options);
            for panel in &group.panel_ids {
                layout.nodes.insert(panel.clone(), group.content_rect);
            }
            layout.groups.push(group);
        }
        NodeKind::Panel { .. } | NodeKind::FloatRoot | NodeKind::FloatWindow { .. } => {}
    }
}

fn group_layout(
    id: &NodeId,
    rect: Rect,
    panel_ids: Vec<NodeId>,
    active_panel_id: Option<NodeId>,
    options: LayoutOptions,
) -> DockGroupLayout {
    let bar_height = options.tab_bar_height.max(0.0).min(rect.height().max(0.0));
    let tab_bar_rect = Rect::from_min_max(rect.min, Pos2::new(rect.max.x, rect.min.y + bar_height));
    let content_rect = Rect::from_min_max(Pos2::new(rect.min.x, tab_bar_rect.max.y), rect.max);

    let count = panel_ids.len();
    let tab_rects = (0..count)
        .map(|i| {
            let width = tab_bar_rect.width() / count as f32;
            let left = tab_bar_rect.min.x + width * i as f32;
            let right = if i + 1 == count {
                tab_bar_rect.max.x
            } else {
                left + width
            };
            Rect::from_x_y_ranges(left..=right, tab_bar_rect.y_range())
        })
        .collect();

    DockGroupLayout {
        group_id: id.clone(),
        rect,
        tab_bar_rect,
        content_rect,
        panel_ids,
        active_panel_id,
        tab_rects,
    }
}

/// Child rects of a split, each paired with the handle that follows it (`None` for the last).
fn split_rects(
    rect: Rect,
    direction: SplitDirection,
    weights: &[f64],
    count: usize,
    splitter_size: f32,
) -> Vec<(Rect, Option<Rect>)> {
    if count == 0 {
        return Vec::new();
    }
    let weights = normalize_weights(weights, count, WEIGHT_EPSILON);
    let (start, end) = match direction {
        SplitDirection::Row => (rect.min.x, rect.max.x),
        SplitDirection::Col => (rect.min.y, rect.max.y),
    };
    let extent = (end - start).max(0.0);
    let gaps = (count - 1) as f32;
    let handle = if gaps > 0.0 {
        splitter_size.max(0.0).min(extent / gaps)
    } else {
        0.0
    };
    let available = extent - handle * gaps;

    let span = |from: f32, to: f32| match direction {
        SplitDirection::Row => Rect::from_x_y_ranges(from..=to, rect.y_range()),
        SplitDirection::Col => Rect::from_x_y_ranges(rect.x_range(), from..=to),
    };

    let mut out = Vec::with_capacity(count);
    let mut cursor = start;
    for (i, weight) in weights.iter().enumerate() {
        let last = i + 1 == count;
        let child_end = if last {
            end.max(cursor)
        } else {
            (cursor + available * *weight as f32).min(end - handle)
        };
        let handle_rect = (!last).then(|| span(child_end, child_end + handle));
        out.push((span(cursor, child_end), handle_rect));
        cursor = child_end + handle;
    }
    out
}

/// Signed offset of `point` from `origin` along `direction`.
pub(crate) fn axis_delta(direction: SplitDirection, origin: Pos2, point: Pos2) -> f32 {
    let delta: Vec2 = point - origin;
    match direction {
        SplitDirection::Row => delta.x,
        SplitDirection::Col => delta.y,
    }
}

/// Extent of `rect` along `direction`.
pub(crate) fn axis_extent(direction: SplitDirection, rect: Rect) -> f32 {
    match direction {
        SplitDirection::Row => rect.width(),
        SplitDirection::Col => rect.height(),
    }
}
