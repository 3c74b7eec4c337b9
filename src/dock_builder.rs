use std::collections::BTreeMap;

use crate::model::{
    DockMeta, DockNode, DockState, NodeId, NodeKind, NormalizeOptions, PanelSpec,
    SplitDirection, normalize_state,
};

/// Side of a split with Dear ImGui `DockBuilder::SplitNode`-like semantics.
///
/// The side indicates where the *side* node is placed relative to the *main* node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DockSide {
    Left,
    Right,
    Up,
    Down,
}

/// A handle to a builder node. After [`DockBuilder::split_node`] the handle that was split
/// refers to the new split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DockNodeId(u64);

/// A builder for scripted default layouts that feels close to Dear ImGui's `DockBuilder`:
/// create empty nodes, split them, dock panels into leaf nodes, then [`Self::finish`].
///
/// Nodes go straight into a dock arena. Leaves are groups, splits are two-child splits, and
/// splitting a node wraps it in place, so content already docked never moves. Leaves left
/// empty are pruned by normalization, so "reserved" areas collapse away.
#[derive(Debug)]
pub struct DockBuilder {
    state: DockState,
    handles: BTreeMap<DockNodeId, NodeId>,
    next_serial: u64,
}

impl Default for DockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DockBuilder {
    pub fn new() -> Self {
        let float_root_id = NodeId::new("float-root");
        let mut state = DockState {
            dock_meta: DockMeta::default(),
            root_id: NodeId::new(""),
            float_root_id: float_root_id.clone(),
            nodes: BTreeMap::new(),
        };
        state.insert(DockNode::float_root(float_root_id));
        Self {
            state,
            handles: BTreeMap::new(),
            next_serial: 1,
        }
    }

    /// Next handle, plus an arena id `{prefix}-{serial}` that is not taken yet.
    fn alloc(&mut self, prefix: &str) -> (DockNodeId, NodeId) {
        loop {
            let serial = self.next_serial;
            self.next_serial = serial.saturating_add(1);
            let id = NodeId::new(format!("{prefix}-{serial}"));
            if !self.state.nodes.contains_key(&id) {
                return (DockNodeId(serial), id);
            }
        }
    }

    fn new_group(&mut self) -> (DockNodeId, NodeId) {
        let (handle, id) = self.alloc("group");
        self.state.insert(DockNode::group(id.clone(), Vec::new(), None));
        self.handles.insert(handle, id.clone());
        (handle, id)
    }

    /// Create an empty leaf node (a group).
    #[must_use]
    pub fn add_node(&mut self) -> DockNodeId {
        self.new_group().0
    }

    /// Split an existing node and return `(side, main)` (Dear ImGui semantics).
    ///
    /// A split takes the place of `node` in the tree. Its former content stays where it is and
    /// is reachable through the returned `main` handle, while `node` now names the split.
    #[must_use]
    pub fn split_node(
        &mut self,
        node: DockNodeId,
        side: DockSide,
        side_fraction: f64,
    ) -> (DockNodeId, DockNodeId) {
        debug_assert!(
            (0.0..=1.0).contains(&side_fraction),
            "side_fraction must be in 0.0..=1.0"
        );
        let side_fraction = side_fraction.clamp(0.0, 1.0);

        let existing = match self.handles.get(&node) {
            Some(id) => id.clone(),
            None => self.new_group().1,
        };
        let (side_handle, side_id) = self.new_group();
        let (main_handle, split_id) = self.alloc("split");

        let main_id = existing.clone();
        let main_fraction = 1.0 - side_fraction;
        let (direction, first, second, first_fraction) = match side {
            DockSide::Left => (SplitDirection::Row, side_id, main_id, side_fraction),
            DockSide::Right => (SplitDirection::Row, main_id, side_id, main_fraction),
            DockSide::Up => (SplitDirection::Col, side_id, main_id, side_fraction),
            DockSide::Down => (SplitDirection::Col, main_id, side_id, main_fraction),
        };

        for parent in self.state.nodes.values_mut() {
            for child in &mut parent.links.children {
                if *child == existing {
                    *child = split_id.clone();
                }
            }
        }
        self.state.insert(DockNode::split(
            split_id.clone(),
            direction,
            vec![first, second],
            vec![first_fraction, 1.0 - first_fraction],
        ));

        self.handles.insert(main_handle, existing);
        self.handles.insert(node, split_id);
        (side_handle, main_handle)
    }

    /// Dock a panel into a leaf node. A panel id that is already docked is skipped.
    pub fn dock_panel(&mut self, panel: PanelSpec, node: DockNodeId) {
        let Some(group_id) = self.handles.get(&node).cloned() else {
            panic!("dock_panel: node {node:?} does not exist");
        };
        if !self.state.is_group(&group_id) {
            panic!("dock_panel: node {node:?} is not a leaf node");
        }
        let PanelSpec { id, title } = panel;
        if self.state.nodes.contains_key(&id) {
            log::debug!("dock_builder: panel {id} docked twice; keeping the first");
            return;
        }
        self.state.insert(DockNode::panel(id.clone(), title));
        if let Some(group) = self.state.node_mut(&group_id) {
            if let NodeKind::Group { active_panel_id } = &mut group.kind {
                active_panel_id.get_or_insert_with(|| id.clone());
            }
            group.links.children.push(id);
        }
    }

    /// Dock multiple panels into a leaf node (tabbed together).
    pub fn dock_panels(&mut self, panels: impl IntoIterator<Item = PanelSpec>, node: DockNodeId) {
        for panel in panels {
            self.dock_panel(panel, node);
        }
    }

    /// Finish building and produce a normalized [`DockState`].
    ///
    /// `root` is typically the handle returned by the first `add_node()`, which names the
    /// outermost split once it has been split. Group ids are `group-N` and split ids
    /// `split-N`; panels keep their own ids.
    pub fn finish(self, root: DockNodeId) -> DockState {
        let mut state = self.state;
        if let Some(root_id) = self.handles.get(&root) {
            state.root_id = root_id.clone();
        }
        normalize_state(&mut state, NormalizeOptions::default());
        state
    }
}
