//! The canonical dock tree: an arena of [`DockNode`]s keyed by [`NodeId`].
//!
//! `links.children` is the ground truth of the tree shape. `links.parent` is a derived
//! index that [`normalize_state`] rebuilds on every pass; nothing in this crate trusts a
//! stored parent pointer.

use std::collections::BTreeMap;

use egui::Rect;

mod ids;
mod integrity;
mod migrate;
mod normalize;
mod policy;
mod reduce;


pub use ids::{IdGenerator, SequentialIds};
pub use integrity::{DockIssue, assert_invariants};
pub use migrate::migrate_state;
pub use normalize::{NormalizeOptions, normalize_state, normalize_weights};
pub use policy::{PolicyOptions, apply_policy};
pub use reduce::{DockAction, MoveTarget, reduce_intent};

/// Current persisted schema version, see [`migrate_state`].
pub const DOCK_SCHEMA_VERSION: u32 = 2;

/// Tolerance for "weights sum to one".
pub const WEIGHT_EPSILON: f64 = 1e-6;

/// Floating windows are never smaller than this (in points) along either axis.
pub const MIN_FLOAT_WINDOW_SIZE: f32 = 60.0;

/// Title given to panels that arrive without one.
pub const DEFAULT_PANEL_TITLE: &str = "Panel";

/// Title of the panel synthesized when a state has nothing renderable left.
pub const WELCOME_PANEL_TITLE: &str = "Welcome";

/// Stable identifier of a node in a [`DockState`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Main axis of a split.
///
/// `Row` lays children out left to right, `Col` top to bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SplitDirection {
    Row,
    Col,
}

/// A named drop-target region of a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DockZone {
    Center,
    Tabbar,
    Left,
    Right,
    Top,
    Bottom,
}

impl DockZone {
    /// The split orientation a drop on this zone creates, `None` for tab-style drops.
    pub fn split_direction(self) -> Option<SplitDirection> {
        match self {
            Self::Left | Self::Right => Some(SplitDirection::Row),
            Self::Top | Self::Bottom => Some(SplitDirection::Col),
            Self::Center | Self::Tabbar => None,
        }
    }

    /// Whether the new group goes before the target along the split axis.
    pub fn inserts_before(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }

    pub fn is_edge(self) -> bool {
        self.split_direction().is_some()
    }
}

/// Per-kind payload of a [`DockNode`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        tag = "kind",
        content = "data",
        rename_all = "kebab-case",
        rename_all_fields = "camelCase"
    )
)]
pub enum NodeKind {
    /// Divides its rect among its children; `weights` parallel `children` and sum to one.
    Split {
        direction: SplitDirection,
        weights: Vec<f64>,
    },

    /// A tab strip. Children are panels only.
    Group { active_panel_id: Option<NodeId> },

    /// Leaf content.
    Panel { title: String },

    /// Parent of every floating window.
    FloatRoot,

    /// A popped-out window holding exactly one structural child.
    FloatWindow { rect: Rect },
}

impl NodeKind {
    /// Split, group and panel nodes make up the docked tree.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Split { .. } | Self::Group { .. } | Self::Panel { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Split { .. } => "split",
            Self::Group { .. } => "group",
            Self::Panel { .. } => "panel",
            Self::FloatRoot => "float-root",
            Self::FloatWindow { .. } => "float-window",
        }
    }
}

/// Tree edges of a node.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Links {
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<NodeId>,

    /// Derived by normalization; never read back from persisted data.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub parent: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DockNode {
    pub id: NodeId,

    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: NodeKind,

    #[cfg_attr(feature = "serde", serde(default))]
    pub links: Links,
}

impl DockNode {
    pub fn new(id: NodeId, kind: NodeKind, children: Vec<NodeId>) -> Self {
        Self {
            id,
            kind,
            links: Links {
                children,
                parent: None,
            },
        }
    }

    pub fn panel(id: NodeId, title: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Panel { title: title.into() }, Vec::new())
    }

    pub fn group(id: NodeId, panels: Vec<NodeId>, active_panel_id: Option<NodeId>) -> Self {
        Self::new(id, NodeKind::Group { active_panel_id }, panels)
    }

    pub fn split(
        id: NodeId,
        direction: SplitDirection,
        children: Vec<NodeId>,
        weights: Vec<f64>,
    ) -> Self {
        Self::new(id, NodeKind::Split { direction, weights }, children)
    }

    pub fn float_root(id: NodeId) -> Self {
        Self::new(id, NodeKind::FloatRoot, Vec::new())
    }

    pub fn float_window(id: NodeId, rect: Rect, child: NodeId) -> Self {
        Self::new(id, NodeKind::FloatWindow { rect }, vec![child])
    }

    pub fn children(&self) -> &[NodeId] {
        &self.links.children
    }

    pub fn parent(&self) -> Option<&NodeId> {
        self.links.parent.as_ref()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DockMeta {
    pub schema_version: u32,
}

impl Default for DockMeta {
    fn default() -> Self {
        Self {
            schema_version: DOCK_SCHEMA_VERSION,
        }
    }
}

/// The whole dock layout: a structural tree under `root_id` plus a floating forest
/// under `float_root_id`, stored as a flat arena.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DockState {
    pub dock_meta: DockMeta,
    pub root_id: NodeId,
    pub float_root_id: NodeId,
    pub nodes: BTreeMap<NodeId, DockNode>,
}

impl Default for DockState {
    fn default() -> Self {
        create_state(StateInit::default())
    }
}

impl DockState {
    pub fn node(&self, id: &NodeId) -> Option<&DockNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut DockNode> {
        self.nodes.get_mut(id)
    }

    pub fn kind(&self, id: &NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|node| &node.kind)
    }

    pub fn is_group(&self, id: &NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Group { .. }))
    }

    pub fn is_panel(&self, id: &NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Panel { .. }))
    }

    pub fn panel_title(&self, id: &NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Panel { title } => Some(title),
            _ => None,
        }
    }

    pub fn active_panel(&self, group_id: &NodeId) -> Option<&NodeId> {
        match self.kind(group_id)? {
            NodeKind::Group { active_panel_id } => active_panel_id.as_ref(),
            _ => None,
        }
    }

    /// First node (in arena order) that lists `id` as a child.
    ///
    /// Scans forward edges instead of reading `links.parent`, so it is correct even on a
    /// state that has not been normalized since its last edit.
    pub fn find_parent(&self, id: &NodeId) -> Option<&NodeId> {
        self.nodes
            .values()
            .find(|node| &node.id != id && node.links.children.contains(id))
            .map(|node| &node.id)
    }

    /// Structural nodes reachable from the root, depth first, in child order.
    pub fn structural_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = ahash::HashSet::default();
        let mut stack = vec![self.root_id.clone()];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if !node.kind.is_structural() || !seen.insert(id.clone()) {
                continue;
            }
            stack.extend(node.links.children.iter().rev().cloned());
            out.push(id);
        }
        out
    }

    /// Groups of the docked tree in reading order.
    pub fn group_ids(&self) -> Vec<NodeId> {
        self.structural_ids()
            .into_iter()
            .filter(|id| self.is_group(id))
            .collect()
    }

    pub fn first_group(&self) -> Option<NodeId> {
        self.group_ids().into_iter().next()
    }

    /// Panels of the docked tree in reading order.
    pub fn panel_ids(&self) -> Vec<NodeId> {
        self.structural_ids()
            .into_iter()
            .filter(|id| self.is_panel(id))
            .collect()
    }

    /// First `prefix-N` (N = 1, 2, ...) not used by any node.
    pub fn unique_id(&self, prefix: &str) -> NodeId {
        (1..)
            .map(|n: u64| NodeId::new(format!("{prefix}-{n}")))
            .find(|id| !self.nodes.contains_key(id))
            .unwrap_or_else(|| NodeId::new(prefix))
    }

    /// Ask `ids` for a new id, skipping ids already in use.
    pub fn fresh_id(&self, ids: &mut dyn IdGenerator, prefix: &str) -> NodeId {
        const MAX_ATTEMPTS: usize = 64;
        for _ in 0..MAX_ATTEMPTS {
            let id = ids.next_id(prefix);
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
        log::debug!("id generator kept colliding for prefix {prefix:?}; scanning instead");
        self.unique_id(prefix)
    }

    pub(crate) fn insert(&mut self, node: DockNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Apply `action` and return the resulting state, `None` if nothing changed.
    ///
    /// Uses a fresh [`SequentialIds`]; see [`reduce_intent`] to inject a generator.
    pub fn reduce(&self, action: &DockAction) -> Option<Self> {
        reduce_intent(self, action, &mut SequentialIds::default())
    }
}

/// A panel to seed a state with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelSpec {
    pub id: NodeId,
    pub title: String,
}

impl PanelSpec {
    pub fn new(id: impl Into<NodeId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Seed for [`create_state`].
#[derive(Clone, Debug, Default)]
pub struct StateInit {
    /// Panels of the initial group, in tab order. Empty means a single welcome panel.
    pub panels: Vec<PanelSpec>,

    /// Initially active panel; falls back to the first panel.
    pub active_panel_id: Option<NodeId>,

    /// Id of the initial group, generated when absent.
    pub group_id: Option<NodeId>,
}

/// Build a valid state holding one group.
pub fn create_state(init: StateInit) -> DockState {
    let StateInit {
        panels,
        active_panel_id,
        group_id,
    } = init;

    let mut state = DockState {
        dock_meta: DockMeta::default(),
        root_id: NodeId::new("group-1"),
        float_root_id: NodeId::new("float-root"),
        nodes: BTreeMap::new(),
    };
    state.insert(DockNode::float_root(state.float_root_id.clone()));

    let mut panel_ids: Vec<NodeId> = Vec::with_capacity(panels.len());
    for PanelSpec { id, title } in panels {
        if state.nodes.contains_key(&id) || group_id.as_ref() == Some(&id) {
            log::debug!("create_state: skipping duplicate panel id {id}");
            continue;
        }
        panel_ids.push(id.clone());
        state.insert(DockNode::panel(id, title));
    }
    if panel_ids.is_empty() {
        let id = state.unique_id("panel");
        panel_ids.push(id.clone());
        state.insert(DockNode::panel(id, WELCOME_PANEL_TITLE));
    }

    let group_id = group_id
        .filter(|id| !state.nodes.contains_key(id))
        .unwrap_or_else(|| state.unique_id("group"));
    let active = active_panel_id
        .filter(|id| panel_ids.contains(id))
        .or_else(|| panel_ids.first().cloned());
    state.insert(DockNode::group(group_id.clone(), panel_ids, active));
    state.root_id = group_id;

    normalize_state(&mut state, NormalizeOptions::default());
    state
}

/// Build a valid state holding one group with the given panels.
pub fn create_state_from_panels(panels: impl IntoIterator<Item = PanelSpec>) -> DockState {
    create_state(StateInit {
        panels: panels.into_iter().collect(),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_a_single_welcome_panel() {
        let state = DockState::default();
        let groups = state.group_ids();
        assert_eq!(groups.len(), 1);
        let panels = state.panel_ids();
        assert_eq!(panels.len(), 1);
        assert_eq!(state.panel_title(&panels[0]), Some(WELCOME_PANEL_TITLE));
        assert_eq!(state.active_panel(&groups[0]), Some(&panels[0]));
        assert!(assert_invariants(&state).is_empty());
    }

    #[test]
    fn from_panels_keeps_order_and_drops_duplicates() {
        let state = create_state_from_panels([
            PanelSpec::new("a", "A"),
            PanelSpec::new("b", "B"),
            PanelSpec::new("a", "again"),
        ]);
        assert_eq!(state.panel_ids(), vec![NodeId::from("a"), NodeId::from("b")]);
        assert_eq!(state.panel_title(&NodeId::from("a")), Some("A"));
        assert_eq!(state.active_panel(&state.root_id), Some(&NodeId::from("a")));
    }

    #[test]
    fn explicit_active_panel_and_group_id() {
        let state = create_state(StateInit {
            panels: vec![PanelSpec::new("a", "A"), PanelSpec::new("b", "B")],
            active_panel_id: Some(NodeId::from("b")),
            group_id: Some(NodeId::from("main")),
        });
        assert_eq!(state.root_id, NodeId::from("main"));
        assert_eq!(state.active_panel(&state.root_id), Some(&NodeId::from("b")));
    }

    #[test]
    fn clone_is_deep() {
        let state = create_state_from_panels([PanelSpec::new("a", "A")]);
        let mut copy = state.clone();
        copy.nodes.clear();
        assert_eq!(state.panel_ids(), vec![NodeId::from("a")]);
    }

    #[test]
    fn find_parent_reads_forward_edges() {
        let mut state = create_state_from_panels([PanelSpec::new("a", "A")]);
        // Corrupt the derived pointer; the lookup must not care.
        if let Some(node) = state.node_mut(&NodeId::from("a")) {
            node.links.parent = Some(NodeId::from("nowhere"));
        }
        assert_eq!(state.find_parent(&NodeId::from("a")), Some(&state.root_id));
    }

    #[test]
    fn fresh_id_skips_taken_ids() {
        let state = create_state_from_panels([PanelSpec::new("group-2", "G")]);
        let mut ids = SequentialIds::default();
        // group-1 is the root group, group-2 is a panel.
        assert_eq!(state.fresh_id(&mut ids, "group"), NodeId::from("group-3"));
    }

    #[test]
    fn zone_orientation() {
        assert_eq!(DockZone::Left.split_direction(), Some(SplitDirection::Row));
        assert_eq!(DockZone::Bottom.split_direction(), Some(SplitDirection::Col));
        assert_eq!(DockZone::Tabbar.split_direction(), None);
        assert!(DockZone::Top.inserts_before());
        assert!(!DockZone::Right.inserts_before());
    }
}
