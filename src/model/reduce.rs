use super::{
    DEFAULT_PANEL_TITLE, DockNode, DockState, DockZone, IdGenerator, NodeId, NodeKind,
    NormalizeOptions, SplitDirection, WEIGHT_EPSILON, normalize_state, normalize_weights,
};

/// Where a moved panel should land.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MoveTarget {
    pub group_id: NodeId,
    pub zone: DockZone,

    /// Tab insertion boundary (0 = before the first tab) for `center`/`tabbar` drops.
    /// `None` appends.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub index: Option<usize>,
}

/// A domain mutation of a [`DockState`], applied by [`reduce_intent`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        tag = "type",
        content = "payload",
        rename_all = "kebab-case",
        rename_all_fields = "camelCase"
    )
)]
pub enum DockAction {
    /// Make `panel_id` the visible tab of `group_id`.
    ActivatePanel { group_id: NodeId, panel_id: NodeId },

    /// Reorder a panel within its group, move it to another group, or split it off
    /// next to a group (edge zones).
    MovePanel { panel_id: NodeId, target: MoveTarget },

    /// Overwrite a split's weight vector.
    ResizeSplit { split_id: NodeId, weights: Vec<f64> },

    RemovePanel { panel_id: NodeId },

    /// Create a panel in `group_id` (or the first group).
    AddPanel {
        #[cfg_attr(feature = "serde", serde(default))]
        panel_id: Option<NodeId>,
        #[cfg_attr(feature = "serde", serde(default))]
        title: Option<String>,
        #[cfg_attr(feature = "serde", serde(default))]
        group_id: Option<NodeId>,
        #[cfg_attr(feature = "serde", serde(default = "default_activate"))]
        activate: bool,
    },
}

#[cfg(feature = "serde")]
fn default_activate() -> bool {
    true
}

impl DockAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ActivatePanel { .. } => "activate-panel",
            Self::MovePanel { .. } => "move-panel",
            Self::ResizeSplit { .. } => "resize-split",
            Self::RemovePanel { .. } => "remove-panel",
            Self::AddPanel { .. } => "add-panel",
        }
    }
}

/// Apply one action to a copy of `state`.
///
/// Returns `None` when the action is rejected or has no observable effect, so callers can
/// skip the commit. Otherwise the copy is normalized and returned. `state` is never touched.
pub fn reduce_intent(
    state: &DockState,
    action: &DockAction,
    ids: &mut dyn IdGenerator,
) -> Option<DockState> {
    let mut draft = state.clone();

    let applied = match action {
        DockAction::ActivatePanel { group_id, panel_id } => {
            activate_panel(&mut draft, group_id, panel_id)
        }
        DockAction::MovePanel { panel_id, target } => move_panel(&mut draft, panel_id, target, ids),
        DockAction::ResizeSplit { split_id, weights } => {
            resize_split(&mut draft, split_id, weights)
        }
        DockAction::RemovePanel { panel_id } => remove_panel(&mut draft, panel_id),
        DockAction::AddPanel {
            panel_id,
            title,
            group_id,
            activate,
        } => {
            add_panel(
                &mut draft,
                ids,
                panel_id.as_ref(),
                title.as_deref(),
                group_id.as_ref(),
                *activate,
            );
            true
        }
    };

    if !applied {
        log::debug!("reduce: {} rejected", action.name());
        return None;
    }

    normalize_state(&mut draft, NormalizeOptions::default());
    if draft == *state {
        log::debug!("reduce: {} had no effect", action.name());
        return None;
    }
    Some(draft)
}

fn group_children_mut<'a>(
    state: &'a mut DockState,
    group_id: &NodeId,
) -> Option<&'a mut Vec<NodeId>> {
    let node = state.nodes.get_mut(group_id)?;
    matches!(node.kind, NodeKind::Group { .. }).then_some(&mut node.links.children)
}

fn set_active(state: &mut DockState, group_id: &NodeId, panel_id: Option<NodeId>) {
    if let Some(DockNode {
        kind: NodeKind::Group { active_panel_id },
        ..
    }) = state.nodes.get_mut(group_id)
    {
        *active_panel_id = panel_id;
    }
}

/// Remove `panel_id` from its group. If it was the active tab, its neighbour takes over.
fn detach_from_group(state: &mut DockState, group_id: &NodeId, panel_id: &NodeId) -> Option<usize> {
    let was_active = state.active_panel(group_id) == Some(panel_id);
    let children = group_children_mut(state, group_id)?;
    let index = children.iter().position(|child| child == panel_id)?;
    children.remove(index);
    if was_active {
        let next = children
            .get(index)
            .or_else(|| children.last())
            .cloned();
        set_active(state, group_id, next);
    }
    Some(index)
}

fn activate_panel(state: &mut DockState, group_id: &NodeId, panel_id: &NodeId) -> bool {
    let Some(children) = group_children_mut(state, group_id) else {
        return false;
    };
    if !children.contains(panel_id) || state.active_panel(group_id) == Some(panel_id) {
        return false;
    }
    set_active(state, group_id, Some(panel_id.clone()));
    true
}

fn move_panel(
    state: &mut DockState,
    panel_id: &NodeId,
    target: &MoveTarget,
    ids: &mut dyn IdGenerator,
) -> bool {
    if !state.is_panel(panel_id) || !state.is_group(&target.group_id) {
        return false;
    }
    let Some(source_group) = state.find_parent(panel_id).cloned() else {
        return false;
    };
    if !state.is_group(&source_group) {
        return false;
    }

    match target.zone.split_direction() {
        None => move_into_group(state, panel_id, &source_group, target),
        Some(direction) => split_beside_group(
            state,
            panel_id,
            &source_group,
            &target.group_id,
            direction,
            target.zone.inserts_before(),
            ids,
        ),
    }
}

fn move_into_group(
    state: &mut DockState,
    panel_id: &NodeId,
    source_group: &NodeId,
    target: &MoveTarget,
) -> bool {
    let Some(target_len) = group_children_mut(state, &target.group_id).map(|c| c.len()) else {
        return false;
    };
    let mut index = target.index.unwrap_or(target_len).min(target_len);

    if source_group == &target.group_id {
        let Some(original) = state
            .node(source_group)
            .and_then(|group| group.children().iter().position(|child| child == panel_id))
        else {
            return false;
        };
        // The boundary was measured before the panel left its slot.
        if index > original {
            index -= 1;
        }
        if index == original {
            return false;
        }
    }

    if detach_from_group(state, source_group, panel_id).is_none() {
        return false;
    }
    let Some(children) = group_children_mut(state, &target.group_id) else {
        return false;
    };
    let index = index.min(children.len());
    children.insert(index, panel_id.clone());
    set_active(state, &target.group_id, Some(panel_id.clone()));
    true
}

fn split_beside_group(
    state: &mut DockState,
    panel_id: &NodeId,
    source_group: &NodeId,
    target_group: &NodeId,
    direction: SplitDirection,
    before: bool,
    ids: &mut dyn IdGenerator,
) -> bool {
    if source_group == target_group
        && state
            .node(target_group)
            .is_some_and(|group| group.children().len() <= 1)
    {
        // Splitting a group off itself would leave nothing behind.
        return false;
    }

    let parent = state.find_parent(target_group).cloned();
    if parent.is_none() && &state.root_id != target_group {
        return false;
    }

    if detach_from_group(state, source_group, panel_id).is_none() {
        return false;
    }
    let new_group = state.fresh_id(ids, "group");
    state.insert(DockNode::group(
        new_group.clone(),
        vec![panel_id.clone()],
        Some(panel_id.clone()),
    ));

    let matching_split = parent.as_ref().filter(|parent| {
        matches!(
            state.kind(parent),
            Some(NodeKind::Split { direction: d, .. }) if *d == direction
        )
    });

    if let Some(split_id) = matching_split.cloned() {
        splice_into_split(state, &split_id, target_group, new_group, before);
        return true;
    }

    let wrapper = state.fresh_id(ids, "split");
    let children = if before {
        vec![new_group, target_group.clone()]
    } else {
        vec![target_group.clone(), new_group]
    };
    state.insert(DockNode::split(
        wrapper.clone(),
        direction,
        children,
        vec![0.5, 0.5],
    ));

    match parent {
        Some(parent) => {
            if let Some(node) = state.nodes.get_mut(&parent) {
                for child in &mut node.links.children {
                    if child == target_group {
                        *child = wrapper.clone();
                    }
                }
            }
        }
        None => state.root_id = wrapper,
    }
    true
}

/// Insert `new_child` next to `sibling` in an existing split; the two share `sibling`'s weight.
fn splice_into_split(
    state: &mut DockState,
    split_id: &NodeId,
    sibling: &NodeId,
    new_child: NodeId,
    before: bool,
) {
    let Some(node) = state.nodes.get_mut(split_id) else {
        return;
    };
    let Some(position) = node.links.children.iter().position(|child| child == sibling) else {
        return;
    };
    let count = node.links.children.len();
    if let NodeKind::Split { weights, .. } = &mut node.kind {
        let mut fitted = normalize_weights(weights, count, WEIGHT_EPSILON);
        let half = fitted[position] * 0.5;
        fitted[position] = half;
        fitted.insert(if before { position } else { position + 1 }, half);
        *weights = fitted;
    }
    node.links
        .children
        .insert(if before { position } else { position + 1 }, new_child);
}

fn resize_split(state: &mut DockState, split_id: &NodeId, weights: &[f64]) -> bool {
    let Some(node) = state.nodes.get_mut(split_id) else {
        return false;
    };
    let count = node.links.children.len();
    let NodeKind::Split {
        weights: current, ..
    } = &mut node.kind
    else {
        return false;
    };
    if count < 2 {
        return false;
    }

    let mut fitted: Vec<f64> = weights.iter().copied().take(count).collect();
    fitted.resize(count, 1.0 / count as f64);
    *current = normalize_weights(&fitted, count, WEIGHT_EPSILON);
    true
}

fn remove_panel(state: &mut DockState, panel_id: &NodeId) -> bool {
    if !state.is_panel(panel_id) {
        return false;
    }
    if let Some(parent) = state.find_parent(panel_id).cloned() {
        if detach_from_group(state, &parent, panel_id).is_none() {
            if let Some(node) = state.nodes.get_mut(&parent) {
                node.links.children.retain(|child| child != panel_id);
            }
        }
    }
    state.nodes.remove(panel_id);
    true
}

fn add_panel(
    state: &mut DockState,
    ids: &mut dyn IdGenerator,
    panel_id: Option<&NodeId>,
    title: Option<&str>,
    group_id: Option<&NodeId>,
    activate: bool,
) {
    let id = match panel_id {
        Some(id) if !state.nodes.contains_key(id) => id.clone(),
        Some(id) => {
            log::debug!("reduce: add-panel id {id} already taken; generating a fresh one");
            state.fresh_id(ids, "panel")
        }
        None => state.fresh_id(ids, "panel"),
    };
    state.insert(DockNode::panel(
        id.clone(),
        title.unwrap_or(DEFAULT_PANEL_TITLE),
    ));

    let group = group_id
        .filter(|group| state.is_group(group))
        .cloned()
        .or_else(|| state.first_group());

    match group {
        Some(group) => {
            let had_active = state.active_panel(&group).is_some();
            if let Some(children) = group_children_mut(state, &group) {
                children.push(id.clone());
            }
            if activate || !had_active {
                set_active(state, &group, Some(id));
            }
        }
        None => {
            // No group anywhere: the root is a bare panel (or nothing). Tab them together.
            let mut panels = Vec::with_capacity(2);
            if state.is_panel(&state.root_id) {
                panels.push(state.root_id.clone());
            }
            panels.push(id.clone());
            let active = if activate {
                Some(id)
            } else {
                panels.first().cloned()
            };
            let new_group = state.fresh_id(ids, "group");
            state.insert(DockNode::group(new_group.clone(), panels, active));
            state.root_id = new_group;
        }
    }
}
