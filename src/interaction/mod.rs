//! Pointer-driven panel dragging and split resizing.
//!
//! The controller never touches a [`DockState`]: it tracks pointer sessions and hands back
//! [`DockIntent`]s, which the host runs through [`dispatch_intent`] and commits.
//!
//! At most one drag session and one resize session exist at a time. Starting a session of a
//! kind that is already active replaces it; unflushed transient state of the old one is lost.

use egui::Pos2;

use crate::geometry::{
    DockDropTarget, DockLayoutMap, HitTestOptions, axis_delta, axis_extent, hit_test,
};
use crate::model::{
    DockState, NodeId, NodeKind, SplitDirection, WEIGHT_EPSILON, normalize_weights,
};

mod intent;
mod session;


pub use intent::{DockIntent, IntentCommand, dispatch_intent};

use session::{PanelDragSession, ResizeSession, SessionSerial};

/// Resize previews closer than this to the last emitted vector are not re-emitted.
const RESIZE_DEDUPE_EPSILON: f64 = 1e-6;

/// Upper bound for [`InteractionOptions::min_resize_share`].
const MAX_MIN_RESIZE_SHARE: f64 = 0.45;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionOptions {
    pub hit_test: HitTestOptions,

    /// Smallest share a resize may leave either neighbour of the dragged handle.
    ///
    /// Clamped to `0.0..=0.45`.
    pub min_resize_share: f64,
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self {
            hit_test: HitTestOptions::default(),
            min_resize_share: 0.05,
        }
    }
}

type DropTargetCallback = Box<dyn FnMut(Option<&DockDropTarget>)>;

/// Turns pointer input into [`DockIntent`]s.
#[derive(Default)]
pub struct DockInteractionController {
    options: InteractionOptions,
    serial: SessionSerial,
    drag: Option<PanelDragSession>,
    resize: Option<ResizeSession>,
    on_drop_target_change: Option<DropTargetCallback>,
}

impl std::fmt::Debug for DockInteractionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockInteractionController")
            .field("options", &self.options)
            .field("drag", &self.drag)
            .field("resize", &self.resize)
            .field(
                "on_drop_target_change",
                &self.on_drop_target_change.is_some(),
            )
            .finish_non_exhaustive()
    }
}

impl DockInteractionController {
    pub fn new(options: InteractionOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Called whenever the resolved drop target changes, and with `None` when a drag ends.
    #[must_use]
    pub fn with_drop_target_callback(
        mut self,
        callback: impl FnMut(Option<&DockDropTarget>) + 'static,
    ) -> Self {
        self.on_drop_target_change = Some(Box::new(callback));
        self
    }

    pub fn options(&self) -> &InteractionOptions {
        &self.options
    }

    fn notify(&mut self, target: Option<&DockDropTarget>) {
        if let Some(callback) = &mut self.on_drop_target_change {
            callback(target);
        }
    }

    // ---------------------------------------------------------------------------------------
    // Panel drag

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn dragged_panel(&self) -> Option<&NodeId> {
        self.drag.as_ref().map(|drag| &drag.panel_id)
    }

    /// Current drop target of the drag session.
    pub fn drop_target(&self) -> Option<&DockDropTarget> {
        self.drag.as_ref().and_then(|drag| drag.target.as_ref())
    }

    /// Begin dragging `panel_id`. No target is resolved until the pointer moves.
    pub fn start_panel_drag(&mut self, panel_id: NodeId) {
        if let Some(previous) = self.drag.take() {
            previous.end("replaced");
        }
        let id = self.serial.next();
        self.drag = Some(PanelDragSession::start(id, panel_id));
    }

    /// Re-resolve the drop target under `point`.
    ///
    /// Returns the new target only when the resolved group, zone or index changed (the
    /// callback fires on the same condition, also for a change to "no target"). Returns
    /// `None` when nothing changed or when there is no drag.
    pub fn update_pointer(
        &mut self,
        point: Pos2,
        layout: &DockLayoutMap,
    ) -> Option<DockDropTarget> {
        let drag = self.drag.as_mut()?;
        let next = hit_test(point, layout, &self.options.hit_test, drag.target.as_ref());
        let changed = match (&drag.target, &next) {
            (Some(old), Some(new)) => !old.same_slot(new),
            (None, None) => false,
            _ => true,
        };
        drag.target.clone_from(&next);
        if !changed {
            return None;
        }
        self.notify(next.as_ref());
        next
    }

    /// Finish the drag at `point`.
    ///
    /// Returns a `move-panel` intent for the target under the pointer, or `None` when there
    /// is no target (or no drag).
    pub fn end_panel_drag(&mut self, point: Pos2, layout: &DockLayoutMap) -> Option<DockIntent> {
        let drag = self.drag.take()?;
        let target = hit_test(point, layout, &self.options.hit_test, drag.target.as_ref());
        drag.end(if target.is_some() { "drop" } else { "no-target" });
        self.notify(None);
        target.map(|target| DockIntent::move_panel(drag.panel_id, target.to_move_target()))
    }

    /// Abort the drag. Emits nothing.
    pub fn cancel_panel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            drag.end("cancel");
        }
    }

    // ---------------------------------------------------------------------------------------
    // Split resize

    pub fn is_resizing(&self) -> bool {
        self.resize.is_some()
    }

    /// Begin dragging the handle between children `handle_index` and `handle_index + 1` of
    /// `split_id`, with the pointer at `point`.
    ///
    /// Weights come from `state`, pixel extents from `layout`. If the split or handle does
    /// not exist the session still opens but never emits anything.
    pub fn start_resize(
        &mut self,
        split_id: NodeId,
        handle_index: usize,
        point: Pos2,
        state: &DockState,
        layout: &DockLayoutMap,
    ) {
        if let Some(previous) = self.resize.take() {
            previous.end("replaced");
        }

        let (direction, weights) = state
            .node(&split_id)
            .and_then(|node| match &node.kind {
                NodeKind::Split { direction, weights } => Some((
                    *direction,
                    normalize_weights(weights, node.children().len(), WEIGHT_EPSILON),
                )),
                _ => None,
            })
            .unwrap_or((SplitDirection::Row, Vec::new()));

        let handle_thickness = layout
            .handle(&split_id, handle_index)
            .map_or(0.0, |handle| handle.thickness());
        let gaps = weights.len().saturating_sub(1) as f32;
        let available = layout
            .rect(&split_id)
            .map_or(0.0, |rect| axis_extent(direction, rect) - handle_thickness * gaps)
            .max(0.0);

        let id = self.serial.next();
        log::trace!("resize session START id={id} split={split_id} handle={handle_index}");
        self.resize = Some(ResizeSession {
            id,
            split_id,
            handle_index,
            direction,
            start_point: point,
            available,
            min_share: self.options.min_resize_share.clamp(0.0, MAX_MIN_RESIZE_SHARE),
            weights: weights.clone(),
            start_weights: weights,
            emitted: false,
        });
    }

    /// Move the dragged handle to follow `point`.
    ///
    /// Only the two children next to the handle trade space; every other share stays put.
    /// Returns a transient resize intent when the weights changed, `None` otherwise.
    pub fn update_resize(&mut self, point: Pos2) -> Option<DockIntent> {
        let session = self.resize.as_mut()?;
        if !session.is_live() {
            return None;
        }

        let i = session.handle_index;
        let delta = f64::from(axis_delta(session.direction, session.start_point, point))
            / f64::from(session.available);
        let left = session.start_weights[i];
        let right = session.start_weights[i + 1];
        let pair = left + right;
        let min_left = session.min_share.min(pair * 0.5);
        let max_left = pair - min_left;

        let new_left = if delta.is_finite() {
            (left + delta).clamp(min_left, max_left)
        } else {
            left
        };
        let mut weights = session.start_weights.clone();
        weights[i] = new_left;
        weights[i + 1] = pair - new_left;
        let weights = normalize_weights(&weights, weights.len(), WEIGHT_EPSILON);

        let moved = weights
            .iter()
            .zip(&session.weights)
            .any(|(a, b)| (a - b).abs() > RESIZE_DEDUPE_EPSILON);
        if !moved {
            return None;
        }
        session.weights.clone_from(&weights);
        session.emitted = true;
        Some(DockIntent::resize(session.split_id.clone(), weights, true))
    }

    /// Finish the resize: a non-transient intent carrying the latest weights.
    pub fn end_resize(&mut self) -> Option<DockIntent> {
        let session = self.resize.take()?;
        session.end("commit");
        if !session.is_live() {
            return None;
        }
        Some(DockIntent::resize(session.split_id, session.weights, false))
    }

    /// Abort the resize.
    ///
    /// If previews were already emitted, returns a transient intent restoring the starting
    /// weights so the host can undo them.
    pub fn cancel_resize(&mut self) -> Option<DockIntent> {
        let session = self.resize.take()?;
        session.end("cancel");
        session
            .emitted
            .then(|| DockIntent::resize(session.split_id, session.start_weights, true))
    }
}
