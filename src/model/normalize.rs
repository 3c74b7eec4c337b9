use ahash::{HashMap, HashSet};
use egui::{Pos2, Rect, Vec2};
use itertools::Itertools as _;

use super::{
    DockNode, DockState, MIN_FLOAT_WINDOW_SIZE, NodeId, NodeKind, WEIGHT_EPSILON,
    WELCOME_PANEL_TITLE,
};

/// Options for [`normalize_state`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizeOptions {
    /// A weight vector whose sum is within `epsilon` of one is left untouched.
    pub epsilon: f64,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            epsilon: WEIGHT_EPSILON,
        }
    }
}

/// Restore every tree invariant in place.
///
/// Idempotent: running it on its own output changes nothing. Malformed input is repaired,
/// never rejected: dangling ids are dropped, degenerate splits collapse into their only
/// child, empty groups disappear and an empty tree gets a single welcome panel.
pub fn normalize_state(state: &mut DockState, options: NormalizeOptions) {
    sanitize_nodes(state);
    ensure_float_root(state);
    ensure_structural_root(state);
    rebuild_parents(state);

    let mut visited: HashSet<NodeId> = HashSet::default();
    let root_id = state.root_id.clone();
    state.root_id = match compress(state, &root_id, &mut visited) {
        Some(root) => root,
        None => {
            log::debug!(
                "normalize: root {root_id} compressed to nothing; synthesizing a default group"
            );
            insert_welcome_group(state)
        }
    };

    normalize_float_windows(state, &mut visited);
    prune_unreachable(state);
    rebuild_parents(state);
    let root_id = state.root_id.clone();
    if let Some(root) = state.nodes.get_mut(&root_id) {
        root.links.parent = None;
    }

    normalize_split_weights(state, options.epsilon);
}

/// Fit `weights` to `count` positive shares summing to one.
///
/// Falls back to equal shares if the length is wrong or any weight is non-finite or
/// non-positive.
pub fn normalize_weights(weights: &[f64], count: usize, epsilon: f64) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    let equal = || vec![1.0 / count as f64; count];

    if weights.len() != count || weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
        return equal();
    }
    let sum: f64 = weights.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return equal();
    }
    if (sum - 1.0).abs() <= epsilon {
        return weights.to_vec();
    }
    weights.iter().map(|w| w / sum).collect()
}

fn sanitize_nodes(state: &mut DockState) {
    for (key, node) in &mut state.nodes {
        if &node.id != key {
            node.id = key.clone();
        }
        node.links.children.retain(|child| child != key);
        if matches!(node.kind, NodeKind::Panel { .. }) {
            node.links.children.clear();
        }
    }
}

fn ensure_float_root(state: &mut DockState) {
    if matches!(state.kind(&state.float_root_id), Some(NodeKind::FloatRoot)) {
        return;
    }

    if let Some(id) = state
        .nodes
        .values()
        .find(|node| matches!(node.kind, NodeKind::FloatRoot))
        .map(|node| node.id.clone())
    {
        state.float_root_id = id;
        return;
    }

    let id = if state.float_root_id.as_str().is_empty()
        || state.nodes.contains_key(&state.float_root_id)
    {
        state.unique_id("float-root")
    } else {
        state.float_root_id.clone()
    };
    state.insert(DockNode::float_root(id.clone()));
    state.float_root_id = id;
}

fn ensure_structural_root(state: &mut DockState) {
    if state
        .kind(&state.root_id)
        .is_some_and(NodeKind::is_structural)
    {
        return;
    }

    // Prefer a container nobody claims as a child, then an unclaimed panel, then anything.
    let claimed: HashSet<&NodeId> = state
        .nodes
        .values()
        .flat_map(|node| node.links.children.iter())
        .collect();
    let structural = || state.nodes.values().filter(|node| node.kind.is_structural());
    let candidate = structural()
        .find(|node| !claimed.contains(&node.id) && !matches!(node.kind, NodeKind::Panel { .. }))
        .or_else(|| structural().find(|node| !claimed.contains(&node.id)))
        .or_else(|| structural().next())
        .map(|node| node.id.clone());

    state.root_id = match candidate {
        Some(id) => {
            log::debug!("normalize: adopting {id} as structural root");
            id
        }
        None => insert_welcome_group(state),
    };
}

/// Derive `links.parent` from forward edges. The first claimer in arena order wins.
fn rebuild_parents(state: &mut DockState) {
    let mut parent_of: HashMap<NodeId, NodeId> = HashMap::default();
    for node in state.nodes.values() {
        for child in &node.links.children {
            if child == &node.id || !state.nodes.contains_key(child) {
                continue;
            }
            parent_of
                .entry(child.clone())
                .or_insert_with(|| node.id.clone());
        }
    }
    for node in state.nodes.values_mut() {
        node.links.parent = parent_of.remove(&node.id);
    }
}

fn is_claimed_by(state: &DockState, parent: &NodeId, child: &NodeId) -> bool {
    state
        .nodes
        .get(child)
        .is_some_and(|node| node.links.parent.as_ref() == Some(parent))
}

/// Compress the subtree at `id` bottom-up, returning the id that now stands in its place.
fn compress(state: &mut DockState, id: &NodeId, visited: &mut HashSet<NodeId>) -> Option<NodeId> {
    let node = state.nodes.get(id)?;
    if !node.kind.is_structural() || !visited.insert(id.clone()) {
        return None;
    }
    let kind = node.kind.clone();
    let children = node.links.children.clone();

    match kind {
        NodeKind::Panel { .. } => Some(id.clone()),

        NodeKind::Group { active_panel_id } => {
            let panels: Vec<NodeId> = children
                .into_iter()
                .filter(|child| is_claimed_by(state, id, child) && state.is_panel(child))
                .unique()
                .filter(|child| visited.insert(child.clone()))
                .collect();
            if panels.is_empty() {
                return None;
            }
            let active = active_panel_id
                .filter(|active| panels.contains(active))
                .or_else(|| panels.first().cloned());

            let node = state.nodes.get_mut(id)?;
            node.kind = NodeKind::Group {
                active_panel_id: active,
            };
            node.links.children = panels;
            Some(id.clone())
        }

        NodeKind::Split { direction, weights } => {
            let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
            let mut kept_weights: Vec<f64> = Vec::with_capacity(children.len());
            for (index, child) in children.iter().enumerate() {
                if !is_claimed_by(state, id, child) {
                    continue;
                }
                let Some(survivor) = compress(state, child, visited) else {
                    continue;
                };
                if kept.contains(&survivor) {
                    continue;
                }
                kept.push(survivor);
                kept_weights.push(weights.get(index).copied().unwrap_or(f64::NAN));
            }

            match kept.len() {
                0 => None,
                1 => kept.pop(),
                _ => {
                    let node = state.nodes.get_mut(id)?;
                    node.kind = NodeKind::Split {
                        direction,
                        weights: kept_weights,
                    };
                    node.links.children = kept;
                    Some(id.clone())
                }
            }
        }

        NodeKind::FloatRoot | NodeKind::FloatWindow { .. } => None,
    }
}

fn insert_welcome_group(state: &mut DockState) -> NodeId {
    let panel_id = state.unique_id("panel");
    state.insert(DockNode::panel(panel_id.clone(), WELCOME_PANEL_TITLE));
    let group_id = state.unique_id("group");
    state.insert(DockNode::group(
        group_id.clone(),
        vec![panel_id.clone()],
        Some(panel_id),
    ));
    group_id
}

fn sanitize_float_rect(rect: Rect) -> Rect {
    let mut rect = if rect.is_finite() {
        rect
    } else {
        Rect::from_min_size(Pos2::new(64.0, 64.0), Vec2::new(320.0, 240.0))
    };
    rect.max.x = grow_to_min_extent(rect.min.x, rect.max.x);
    rect.max.y = grow_to_min_extent(rect.min.y, rect.max.y);
    rect
}

/// Smallest `max` (at or above the current one) with `max - min >= MIN_FLOAT_WINDOW_SIZE`.
///
/// Checked on the subtraction itself so the result passes the same test a second time.
fn grow_to_min_extent(min: f32, max: f32) -> f32 {
    if max - min >= MIN_FLOAT_WINDOW_SIZE {
        return max;
    }
    let mut max = min + MIN_FLOAT_WINDOW_SIZE;
    while max - min < MIN_FLOAT_WINDOW_SIZE && max.is_finite() {
        max += (max.abs() * f32::EPSILON).max(f32::EPSILON);
    }
    max
}

/// Every float window ends up under the float root with exactly one structural child.
fn normalize_float_windows(state: &mut DockState, visited: &mut HashSet<NodeId>) {
    let float_root_id = state.float_root_id.clone();
    let is_window = |node: &DockNode| matches!(node.kind, NodeKind::FloatWindow { .. });

    let listed = state
        .nodes
        .get(&float_root_id)
        .map(|root| root.links.children.clone())
        .unwrap_or_default();
    let candidates: Vec<NodeId> = listed
        .into_iter()
        .filter(|id| state.nodes.get(id).is_some_and(is_window))
        .chain(
            state
                .nodes
                .values()
                .filter(|node| is_window(node))
                .map(|node| node.id.clone()),
        )
        .unique()
        .collect();

    let mut windows: Vec<NodeId> = Vec::with_capacity(candidates.len());
    for window_id in candidates {
        let children = state
            .nodes
            .get(&window_id)
            .map(|node| node.links.children.clone())
            .unwrap_or_default();

        let mut content = None;
        for child in &children {
            if !is_claimed_by(state, &window_id, child) {
                continue;
            }
            if let Some(survivor) = compress(state, child, visited) {
                content = Some(survivor);
                break;
            }
        }

        let Some(content) = content else {
            log::debug!("normalize: dropping empty float window {window_id}");
            continue;
        };
        if let Some(node) = state.nodes.get_mut(&window_id) {
            if let NodeKind::FloatWindow { rect } = &mut node.kind {
                *rect = sanitize_float_rect(*rect);
            }
            node.links.children = vec![content];
        }
        windows.push(window_id);
    }

    if let Some(root) = state.nodes.get_mut(&float_root_id) {
        root.links.children = windows;
    }
}

fn prune_unreachable(state: &mut DockState) {
    let mut reachable: HashSet<NodeId> = HashSet::default();
    let mut stack = vec![state.root_id.clone(), state.float_root_id.clone()];
    while let Some(id) = stack.pop() {
        let Some(node) = state.nodes.get(&id) else {
            continue;
        };
        if !reachable.insert(id) {
            continue;
        }
        stack.extend(node.links.children.iter().cloned());
    }

    let before = state.nodes.len();
    state.nodes.retain(|id, _| reachable.contains(id));
    if state.nodes.len() != before {
        log::debug!(
            "normalize: pruned {} unreachable nodes",
            before - state.nodes.len()
        );
    }
}

fn normalize_split_weights(state: &mut DockState, epsilon: f64) {
    for node in state.nodes.values_mut() {
        let count = node.links.children.len();
        if let NodeKind::Split { weights, .. } = &mut node.kind {
            *weights = normalize_weights(weights, count, epsilon);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{DockMeta, SplitDirection, assert_invariants};

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn bare_state(root: &str, nodes: Vec<DockNode>) -> DockState {
        DockState {
            dock_meta: DockMeta::default(),
            root_id: id(root),
            float_root_id: id("float-root"),
            nodes: nodes
                .into_iter()
                .map(|node| (node.id.clone(), node))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn normalized(mut state: DockState) -> DockState {
        normalize_state(&mut state, NormalizeOptions::default());
        let issues = assert_invariants(&state);
        assert!(
            issues.is_empty(),
            "invariants failed:\n{}",
            issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
        );
        state
    }

    #[test]
    fn weights_fall_back_to_equal_shares() {
        assert_eq!(normalize_weights(&[1.0, f64::NAN], 2, 1e-6), vec![0.5, 0.5]);
        assert_eq!(normalize_weights(&[1.0, 0.0], 2, 1e-6), vec![0.5, 0.5]);
        assert_eq!(normalize_weights(&[1.0], 2, 1e-6), vec![0.5, 0.5]);
        assert_eq!(normalize_weights(&[1.0, 3.0], 2, 1e-6), vec![0.25, 0.75]);
        assert_eq!(normalize_weights(&[0.3, 0.7], 2, 1e-6), vec![0.3, 0.7]);
        assert!(normalize_weights(&[], 0, 1e-6).is_empty());
    }

    #[test]
    fn empty_state_gets_a_welcome_group() {
        let state = normalized(bare_state("nothing", Vec::new()));
        let panels = state.panel_ids();
        assert_eq!(panels.len(), 1);
        assert_eq!(state.panel_title(&panels[0]), Some(WELCOME_PANEL_TITLE));
        assert!(state.is_group(&state.root_id));
        assert!(matches!(state.kind(&state.float_root_id), Some(NodeKind::FloatRoot)));
    }

    #[test]
    fn single_child_split_collapses_into_child() {
        let state = normalized(bare_state(
            "s",
            vec![
                DockNode::split(
                    id("s"),
                    SplitDirection::Row,
                    vec![id("g"), id("ghost")],
                    vec![0.5, 0.5],
                ),
                DockNode::group(id("g"), vec![id("a")], Some(id("a"))),
                DockNode::panel(id("a"), "A"),
            ],
        ));
        assert_eq!(state.root_id, id("g"));
        assert!(state.node(&id("s")).is_none());
    }

    #[test]
    fn nested_collapse_cascades_and_keeps_weight_slot() {
        // s1 = [g1, s2], s2 = [g2, empty]; s2 collapses into g2 which takes s2's slot.
        let state = normalized(bare_state(
            "s1",
            vec![
                DockNode::split(
                    id("s1"),
                    SplitDirection::Row,
                    vec![id("g1"), id("s2")],
                    vec![0.25, 0.75],
                ),
                DockNode::split(
                    id("s2"),
                    SplitDirection::Col,
                    vec![id("g2"), id("empty")],
                    vec![0.5, 0.5],
                ),
                DockNode::group(id("g1"), vec![id("a")], None),
                DockNode::group(id("g2"), vec![id("b")], None),
                DockNode::group(id("empty"), Vec::new(), None),
                DockNode::panel(id("a"), "A"),
                DockNode::panel(id("b"), "B"),
            ],
        ));
        let root = state.node(&id("s1")).expect("root split survives");
        assert_eq!(root.children(), &[id("g1"), id("g2")]);
        assert_eq!(
            root.kind,
            NodeKind::Split {
                direction: SplitDirection::Row,
                weights: vec![0.25, 0.75]
            }
        );
        assert_eq!(state.node(&id("g2")).and_then(DockNode::parent), Some(&id("s1")));
        assert!(state.node(&id("empty")).is_none());
        assert_eq!(state.active_panel(&id("g1")), Some(&id("a")));
    }

    #[test]
    fn groups_drop_non_panel_children_and_repair_active() {
        let state = normalized(bare_state(
            "g",
            vec![
                DockNode::group(
                    id("g"),
                    vec![id("a"), id("inner"), id("b"), id("a")],
                    Some(id("zzz")),
                ),
                DockNode::group(id("inner"), vec![id("c")], None),
                DockNode::panel(id("a"), "A"),
                DockNode::panel(id("b"), "B"),
                DockNode::panel(id("c"), "C"),
            ],
        ));
        assert_eq!(state.node(&id("g")).map(DockNode::children), Some(&[id("a"), id("b")][..]));
        assert_eq!(state.active_panel(&id("g")), Some(&id("a")));
        assert!(state.node(&id("inner")).is_none());
        assert!(state.node(&id("c")).is_none());
    }

    #[test]
    fn first_claimer_wins_on_shared_children() {
        let state = normalized(bare_state(
            "s",
            vec![
                DockNode::split(
                    id("s"),
                    SplitDirection::Row,
                    vec![id("g1"), id("g2")],
                    vec![0.5, 0.5],
                ),
                DockNode::group(id("g1"), vec![id("a"), id("b")], None),
                DockNode::group(id("g2"), vec![id("b"), id("c")], None),
                DockNode::panel(id("a"), "A"),
                DockNode::panel(id("b"), "B"),
                DockNode::panel(id("c"), "C"),
            ],
        ));
        assert_eq!(state.node(&id("g1")).map(DockNode::children), Some(&[id("a"), id("b")][..]));
        assert_eq!(state.node(&id("g2")).map(DockNode::children), Some(&[id("c")][..]));
    }

    #[test]
    fn cycles_are_cut() {
        let state = normalized(bare_state(
            "s1",
            vec![
                DockNode::split(
                    id("s1"),
                    SplitDirection::Row,
                    vec![id("s2"), id("g")],
                    vec![0.5, 0.5],
                ),
                DockNode::split(
                    id("s2"),
                    SplitDirection::Col,
                    vec![id("s1"), id("h")],
                    vec![0.5, 0.5],
                ),
                DockNode::group(id("g"), vec![id("a")], None),
                DockNode::group(id("h"), vec![id("b")], None),
                DockNode::panel(id("a"), "A"),
                DockNode::panel(id("b"), "B"),
            ],
        ));
        assert_eq!(state.panel_ids().len(), 2);
    }

    #[test]
    fn missing_root_adopts_unclaimed_container() {
        let state = normalized(bare_state(
            "gone",
            vec![
                DockNode::panel(id("a"), "A"),
                DockNode::group(id("g"), vec![id("a")], None),
            ],
        ));
        assert_eq!(state.root_id, id("g"));
    }

    #[test]
    fn float_windows_are_clamped_and_reattached() {
        let state = normalized(bare_state(
            "g",
            vec![
                DockNode::group(id("g"), vec![id("a")], None),
                DockNode::panel(id("a"), "A"),
                DockNode::float_window(
                    id("w"),
                    Rect::from_min_size(Pos2::new(10.0, 10.0), Vec2::new(20.0, 400.0)),
                    id("fg"),
                ),
                DockNode::group(id("fg"), vec![id("f")], None),
                DockNode::panel(id("f"), "F"),
                DockNode::float_window(id("empty-window"), Rect::NAN, id("missing")),
            ],
        ));
        let root = state.node(&state.float_root_id).expect("float root");
        assert_eq!(root.children(), &[id("w")]);
        match state.kind(&id("w")) {
            Some(NodeKind::FloatWindow { rect }) => {
                assert_eq!(rect.min, Pos2::new(10.0, 10.0));
                assert_eq!(rect.size(), Vec2::new(60.0, 400.0));
            }
            other => panic!("expected float window, got {other:?}"),
        }
        assert!(state.node(&id("empty-window")).is_none());
        assert_eq!(state.node(&id("fg")).and_then(DockNode::parent), Some(&id("w")));
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalized(bare_state(
            "s",
            vec![
                DockNode::split(
                    id("s"),
                    SplitDirection::Col,
                    vec![id("g1"), id("g2"), id("g3")],
                    vec![2.0, 1.0, 1.0],
                ),
                DockNode::group(id("g1"), vec![id("a")], None),
                DockNode::group(id("g2"), Vec::new(), None),
                DockNode::group(id("g3"), vec![id("b"), id("c")], Some(id("c"))),
                DockNode::panel(id("a"), "A"),
                DockNode::panel(id("b"), "B"),
                DockNode::panel(id("c"), "C"),
            ],
        ));
        let mut twice = once.clone();
        normalize_state(&mut twice, NormalizeOptions::default());
        assert_eq!(once, twice);
        assert_eq!(
            once.kind(&id("s")),
            Some(&NodeKind::Split {
                direction: SplitDirection::Col,
                weights: vec![2.0 / 3.0, 1.0 / 3.0]
            })
        );
    }
}
