use ahash::{HashMap, HashSet};

use super::{DockState, MIN_FLOAT_WINDOW_SIZE, NodeId, NodeKind, WEIGHT_EPSILON};

/// A single broken invariant found by [`assert_invariants`].
#[derive(Clone, Debug, PartialEq)]
pub enum DockIssue {
    MissingRoot { root: NodeId },
    RootNotStructural { root: NodeId, kind: &'static str },
    RootHasParent { root: NodeId, parent: NodeId },
    MissingFloatRoot { float_root: NodeId },
    FloatRootWrongKind { float_root: NodeId, kind: &'static str },
    FloatRootChildNotWindow { child: NodeId },
    MissingChild { parent: NodeId, child: NodeId },
    DuplicateChild { parent: NodeId, child: NodeId },
    MultipleParents { child: NodeId, first: NodeId, second: NodeId },
    StaleParent { node: NodeId, stored: Option<NodeId>, actual: Option<NodeId> },
    Unreachable { node: NodeId },
    NonStructuralChild { parent: NodeId, child: NodeId, kind: &'static str },
    SplitTooFewChildren { split: NodeId, count: usize },
    WeightCountMismatch { split: NodeId, weights: usize, children: usize },
    InvalidWeight { split: NodeId, index: usize, weight: f64 },
    WeightSum { split: NodeId, sum: f64 },
    EmptyGroup { group: NodeId },
    GroupChildNotPanel { group: NodeId, child: NodeId },
    InvalidActivePanel { group: NodeId, active: Option<NodeId> },
    PanelHasChildren { panel: NodeId },
    FloatWindowChildCount { window: NodeId, count: usize },
    FloatWindowTooSmall { window: NodeId, width: f32, height: f32 },
}

impl std::fmt::Display for DockIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRoot { root } => write!(f, "integrity: root {root} missing"),
            Self::RootNotStructural { root, kind } => {
                write!(f, "integrity: root {root} is a {kind}, not a split/group/panel")
            }
            Self::RootHasParent { root, parent } => {
                write!(f, "integrity: root {root} has parent {parent}")
            }
            Self::MissingFloatRoot { float_root } => {
                write!(f, "integrity: float root {float_root} missing")
            }
            Self::FloatRootWrongKind { float_root, kind } => {
                write!(f, "integrity: float root {float_root} is a {kind}")
            }
            Self::FloatRootChildNotWindow { child } => {
                write!(f, "integrity: float root child {child} is not a float window")
            }
            Self::MissingChild { parent, child } => {
                write!(f, "integrity: parent {parent} references missing child {child}")
            }
            Self::DuplicateChild { parent, child } => {
                write!(f, "integrity: parent {parent} contains duplicate child {child}")
            }
            Self::MultipleParents {
                child,
                first,
                second,
            } => write!(
                f,
                "integrity: child {child} has multiple parents {first} and {second}"
            ),
            Self::StaleParent {
                node,
                stored,
                actual,
            } => write!(
                f,
                "integrity: node {node} stores parent {stored:?} but is owned by {actual:?}"
            ),
            Self::Unreachable { node } => write!(f, "integrity: node {node} is unreachable"),
            Self::NonStructuralChild { parent, child, kind } => {
                write!(f, "integrity: {parent} has {kind} child {child}")
            }
            Self::SplitTooFewChildren { split, count } => {
                write!(f, "integrity: split {split} has {count} children (needs >= 2)")
            }
            Self::WeightCountMismatch {
                split,
                weights,
                children,
            } => write!(
                f,
                "integrity: split {split} has {weights} weights for {children} children"
            ),
            Self::InvalidWeight {
                split,
                index,
                weight,
            } => write!(f, "integrity: split {split} weight[{index}] = {weight}"),
            Self::WeightSum { split, sum } => {
                write!(f, "integrity: split {split} weights sum to {sum}")
            }
            Self::EmptyGroup { group } => write!(f, "integrity: group {group} is empty"),
            Self::GroupChildNotPanel { group, child } => {
                write!(f, "integrity: group {group} child {child} is not a panel")
            }
            Self::InvalidActivePanel { group, active } => {
                write!(f, "integrity: group {group} active {active:?} not in children")
            }
            Self::PanelHasChildren { panel } => {
                write!(f, "integrity: panel {panel} has children")
            }
            Self::FloatWindowChildCount { window, count } => {
                write!(f, "integrity: float window {window} has {count} children (needs 1)")
            }
            Self::FloatWindowTooSmall {
                window,
                width,
                height,
            } => write!(f, "integrity: float window {window} is {width}x{height}"),
        }
    }
}

/// Check every tree invariant without touching the state.
///
/// Returns an empty list for any state produced by [`super::normalize_state`].
pub fn assert_invariants(state: &DockState) -> Vec<DockIssue> {
    let mut issues: Vec<DockIssue> = Vec::new();

    match state.kind(&state.root_id) {
        None => issues.push(DockIssue::MissingRoot {
            root: state.root_id.clone(),
        }),
        Some(kind) if !kind.is_structural() => issues.push(DockIssue::RootNotStructural {
            root: state.root_id.clone(),
            kind: kind.name(),
        }),
        Some(_) => {}
    }

    match state.kind(&state.float_root_id) {
        None => issues.push(DockIssue::MissingFloatRoot {
            float_root: state.float_root_id.clone(),
        }),
        Some(NodeKind::FloatRoot) => {}
        Some(kind) => issues.push(DockIssue::FloatRootWrongKind {
            float_root: state.float_root_id.clone(),
            kind: kind.name(),
        }),
    }

    let mut visited: HashSet<NodeId> = HashSet::default();
    let mut parent_of: HashMap<NodeId, NodeId> = HashMap::default();
    let mut stack: Vec<NodeId> = vec![state.root_id.clone(), state.float_root_id.clone()];

    while let Some(node_id) = stack.pop() {
        if !visited.insert(node_id.clone()) {
            continue;
        }
        let Some(node) = state.node(&node_id) else {
            continue;
        };
        let children = node.children();

        let mut local_set: HashSet<&NodeId> = HashSet::default();
        for child in children {
            if !local_set.insert(child) {
                issues.push(DockIssue::DuplicateChild {
                    parent: node_id.clone(),
                    child: child.clone(),
                });
            }
        }

        check_node_shape(state, &node_id, &node.kind, children, &mut issues);

        for child in children {
            if state.node(child).is_none() {
                issues.push(DockIssue::MissingChild {
                    parent: node_id.clone(),
                    child: child.clone(),
                });
                continue;
            }
            if child == &state.root_id {
                issues.push(DockIssue::RootHasParent {
                    root: child.clone(),
                    parent: node_id.clone(),
                });
                continue;
            }
            if let Some(prev_parent) = parent_of.insert(child.clone(), node_id.clone()) {
                if prev_parent != node_id {
                    issues.push(DockIssue::MultipleParents {
                        child: child.clone(),
                        first: prev_parent,
                        second: node_id.clone(),
                    });
                }
            }
            stack.push(child.clone());
        }
    }

    for node in state.nodes.values() {
        if !visited.contains(&node.id) {
            issues.push(DockIssue::Unreachable {
                node: node.id.clone(),
            });
            continue;
        }
        let actual = parent_of.get(&node.id);
        if node.parent() != actual {
            issues.push(DockIssue::StaleParent {
                node: node.id.clone(),
                stored: node.parent().cloned(),
                actual: actual.cloned(),
            });
        }
    }

    issues
}

fn check_node_shape(
    state: &DockState,
    node_id: &NodeId,
    kind: &NodeKind,
    children: &[NodeId],
    issues: &mut Vec<DockIssue>,
) {
    let child_kind = |child: &NodeId| state.kind(child);

    match kind {
        NodeKind::Split { weights, .. } => {
            if children.len() < 2 {
                issues.push(DockIssue::SplitTooFewChildren {
                    split: node_id.clone(),
                    count: children.len(),
                });
            }
            if weights.len() != children.len() {
                issues.push(DockIssue::WeightCountMismatch {
                    split: node_id.clone(),
                    weights: weights.len(),
                    children: children.len(),
                });
            }
            for (index, &weight) in weights.iter().enumerate() {
                if !weight.is_finite() || weight <= 0.0 {
                    issues.push(DockIssue::InvalidWeight {
                        split: node_id.clone(),
                        index,
                        weight,
                    });
                }
            }
            let sum: f64 = weights.iter().sum();
            if !weights.is_empty() && (sum - 1.0).abs() > WEIGHT_EPSILON {
                issues.push(DockIssue::WeightSum {
                    split: node_id.clone(),
                    sum,
                });
            }
            check_structural_children(node_id, children, child_kind, issues);
        }
        NodeKind::Group { active_panel_id } => {
            if children.is_empty() {
                issues.push(DockIssue::EmptyGroup {
                    group: node_id.clone(),
                });
            }
            for child in children {
                if child_kind(child).is_some_and(|k| !matches!(k, NodeKind::Panel { .. })) {
                    issues.push(DockIssue::GroupChildNotPanel {
                        group: node_id.clone(),
                        child: child.clone(),
                    });
                }
            }
            if !active_panel_id
                .as_ref()
                .is_some_and(|active| children.contains(active))
            {
                issues.push(DockIssue::InvalidActivePanel {
                    group: node_id.clone(),
                    active: active_panel_id.clone(),
                });
            }
        }
        NodeKind::Panel { .. } => {
            if !children.is_empty() {
                issues.push(DockIssue::PanelHasChildren {
                    panel: node_id.clone(),
                });
            }
        }
        NodeKind::FloatRoot => {
            for child in children {
                if child_kind(child).is_some_and(|k| !matches!(k, NodeKind::FloatWindow { .. })) {
                    issues.push(DockIssue::FloatRootChildNotWindow {
                        child: child.clone(),
                    });
                }
            }
        }
        NodeKind::FloatWindow { rect } => {
            if children.len() != 1 {
                issues.push(DockIssue::FloatWindowChildCount {
                    window: node_id.clone(),
                    count: children.len(),
                });
            }
            if !(rect.width() >= MIN_FLOAT_WINDOW_SIZE && rect.height() >= MIN_FLOAT_WINDOW_SIZE) {
                issues.push(DockIssue::FloatWindowTooSmall {
                    window: node_id.clone(),
                    width: rect.width(),
                    height: rect.height(),
                });
            }
            check_structural_children(node_id, children, child_kind, issues);
        }
    }
}

fn check_structural_children<'a>(
    parent: &NodeId,
    children: &[NodeId],
    child_kind: impl Fn(&NodeId) -> Option<&'a NodeKind>,
    issues: &mut Vec<DockIssue>,
) {
    for child in children {
        if let Some(kind) = child_kind(child).filter(|k| !k.is_structural()) {
            issues.push(DockIssue::NonStructuralChild {
                parent: parent.clone(),
                child: child.clone(),
                kind: kind.name(),
            });
        }
    }
}
