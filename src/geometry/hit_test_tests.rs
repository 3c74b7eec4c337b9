use egui::{Pos2, Rect, Vec2};

use super::{
    DockDropTarget, DockLayoutMap, HitTestOptions, LayoutOptions, compute_layout_rects, hit_test,
};
use crate::model::{
    DockNode, DockState, DockZone, NodeId, PanelSpec, SplitDirection, create_state_from_panels,
    normalize_state,
};

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn single_group_layout() -> DockLayoutMap {
    let state = create_state_from_panels([PanelSpec::new("a", "A"), PanelSpec::new("b", "B")]);
    compute_layout_rects(
        &state,
        Rect::from_min_size(Pos2::ZERO, Vec2::new(400.0, 300.0)),
        LayoutOptions::default(),
    )
}

fn two_groups_side_by_side() -> (DockState, DockLayoutMap) {
    let mut state = create_state_from_panels([PanelSpec::new("a", "A")]);
    let left = state.root_id.clone();
    state.insert(DockNode::panel(id("b"), "B"));
    state.insert(DockNode::group(id("right"), vec![id("b")], None));
    state.insert(DockNode::split(
        id("split"),
        SplitDirection::Row,
        vec![left, id("right")],
        vec![0.5, 0.5],
    ));
    state.root_id = id("split");
    normalize_state(&mut state, Default::default());
    let layout = compute_layout_rects(
        &state,
        Rect::from_min_size(Pos2::ZERO, Vec2::new(808.0, 300.0)),
        LayoutOptions::default(),
    );
    (state, layout)
}

fn resolve(layout: &DockLayoutMap, x: f32, y: f32) -> Option<DockDropTarget> {
    hit_test(Pos2::new(x, y), layout, &HitTestOptions::default(), None)
}

#[test]
fn centroid_of_a_group_is_center() {
    let layout = single_group_layout();
    let target = resolve(&layout, 200.0, 150.0).expect("target");
    assert_eq!(target.group_id, id("group-1"));
    assert_eq!(target.zone, DockZone::Center);
    assert_eq!(target.index, None);
    assert!((target.score - 2.0).abs() < 1e-6, "score {}", target.score);
}

#[test]
fn edge_bands_resolve_to_edges() {
    let layout = single_group_layout();
    // 300 * 0.22 = 66pt bands.
    assert_eq!(resolve(&layout, 5.0, 150.0).map(|t| t.zone), Some(DockZone::Left));
    assert_eq!(resolve(&layout, 395.0, 150.0).map(|t| t.zone), Some(DockZone::Right));
    assert_eq!(resolve(&layout, 200.0, 295.0).map(|t| t.zone), Some(DockZone::Bottom));
    assert_eq!(resolve(&layout, 200.0, 40.0).map(|t| t.zone), Some(DockZone::Top));
}

#[test]
fn corner_prefers_the_nearer_edge() {
    let layout = single_group_layout();
    assert_eq!(resolve(&layout, 3.0, 280.0).map(|t| t.zone), Some(DockZone::Left));
    assert_eq!(resolve(&layout, 20.0, 297.0).map(|t| t.zone), Some(DockZone::Bottom));
}

#[test]
fn tab_bar_resolves_with_insertion_index() {
    let layout = single_group_layout();
    let target = resolve(&layout, 198.0, 14.0).expect("target");
    assert_eq!(target.zone, DockZone::Tabbar);
    assert_eq!(target.index, Some(1));
    let bar = layout.groups[0].tab_bar_rect;
    assert_eq!(target.rect, Rect::from_x_y_ranges(100.0..=300.0, bar.y_range()));

    let end = resolve(&layout, 395.0, 14.0).expect("target");
    assert_eq!(end.zone, DockZone::Tabbar);
    assert_eq!(end.index, Some(2));
    assert_eq!(end.rect, Rect::from_x_y_ranges(300.0..=400.0, bar.y_range()));
}

#[test]
fn hysteresis_on_the_tab_bar_holds_one_boundary_only() {
    let layout = single_group_layout();
    let options = HitTestOptions::default();
    let first = resolve(&layout, 10.0, 14.0).expect("first boundary");
    assert_eq!(first.index, Some(0));

    // Slot 0 covers x in 0..=100; 8pt past it is still held.
    let held = hit_test(Pos2::new(106.0, 14.0), &layout, &options, Some(&first)).expect("held");
    assert_eq!(held.index, Some(0));

    let moved = hit_test(Pos2::new(190.0, 14.0), &layout, &options, Some(&first)).expect("moved");
    assert_eq!(moved.zone, DockZone::Tabbar);
    assert_eq!(moved.index, Some(1));
}

#[test]
fn edge_thickness_is_clamped() {
    let options = HitTestOptions::default();
    let small = Rect::from_min_size(Pos2::ZERO, Vec2::new(50.0, 50.0));
    let large = Rect::from_min_size(Pos2::ZERO, Vec2::new(2000.0, 1000.0));
    assert_eq!(options.edge_thickness(small), 32.0);
    assert_eq!(options.edge_thickness(large), 80.0);
}

#[test]
fn no_groups_or_outside_point_yields_nothing() {
    let layout = single_group_layout();
    assert_eq!(resolve(&layout, -10.0, 150.0), None);

    let empty = DockLayoutMap {
        groups: Vec::new(),
        ..layout
    };
    assert_eq!(resolve(&empty, 200.0, 150.0), None);
}

#[test]
fn hysteresis_keeps_previous_target_near_its_rect() {
    let layout = single_group_layout();
    let options = HitTestOptions::default();
    let center = resolve(&layout, 200.0, 150.0).expect("center");

    // Nominally the left edge, but within 8pt of the center zone (which starts at x = 66).
    let near = Pos2::new(62.0, 150.0);
    assert_eq!(resolve(&layout, near.x, near.y).map(|t| t.zone), Some(DockZone::Left));
    let kept = hit_test(near, &layout, &options, Some(&center)).expect("kept");
    assert_eq!(kept, center);

    // Far enough out, the previous target is dropped.
    let far = hit_test(Pos2::new(50.0, 150.0), &layout, &options, Some(&center)).expect("far");
    assert_eq!(far.zone, DockZone::Left);
}

#[test]
fn hysteresis_ignores_targets_of_vanished_groups() {
    let layout = single_group_layout();
    let stale = DockDropTarget {
        group_id: id("gone"),
        zone: DockZone::Right,
        rect: Rect::from_min_size(Pos2::ZERO, Vec2::new(400.0, 300.0)),
        score: 9.0,
        index: None,
    };
    let target = hit_test(
        Pos2::new(200.0, 150.0),
        &layout,
        &HitTestOptions::default(),
        Some(&stale),
    )
    .expect("target");
    assert_eq!(target.group_id, id("group-1"));
    assert_eq!(target.zone, DockZone::Center);
}

#[test]
fn targets_resolve_per_group() {
    let (_state, layout) = two_groups_side_by_side();
    let left = resolve(&layout, 200.0, 150.0).expect("left group");
    assert_eq!(left.group_id, id("group-1"));
    assert_eq!(left.zone, DockZone::Center);

    let right = resolve(&layout, 610.0, 150.0).expect("right group");
    assert_eq!(right.group_id, id("right"));

    // Just right of the splitter: the right group's left edge.
    let edge = resolve(&layout, 410.0, 150.0).expect("edge");
    assert_eq!(edge.group_id, id("right"));
    assert_eq!(edge.zone, DockZone::Left);
    assert_eq!(
        edge.to_move_target(),
        crate::model::MoveTarget {
            group_id: id("right"),
            zone: DockZone::Left,
            index: None,
        }
    );
}
