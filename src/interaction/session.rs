use egui::Pos2;

use crate::geometry::DockDropTarget;
use crate::model::{NodeId, SplitDirection};

/// Hands out session ids, starting at 1.
#[derive(Debug, Default)]
pub(super) struct SessionSerial {
    next_id: u64,
}

impl SessionSerial {
    pub(super) fn next(&mut self) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id.saturating_add(1);
        id
    }
}

#[derive(Debug)]
pub(super) struct PanelDragSession {
    pub(super) id: u64,
    pub(super) panel_id: NodeId,
    pub(super) target: Option<DockDropTarget>,
}

impl PanelDragSession {
    pub(super) fn start(id: u64, panel_id: NodeId) -> Self {
        log::trace!("drag session START id={id} panel={panel_id}");
        Self {
            id,
            panel_id,
            target: None,
        }
    }

    pub(super) fn end(&self, outcome: &'static str) {
        log::trace!(
            "drag session END id={} panel={} outcome={outcome}",
            self.id,
            self.panel_id
        );
    }
}

#[derive(Debug)]
pub(super) struct ResizeSession {
    pub(super) id: u64,
    pub(super) split_id: NodeId,
    pub(super) handle_index: usize,
    pub(super) direction: SplitDirection,
    pub(super) start_point: Pos2,

    /// Points shared by the split's children (extent minus handles). Zero when unknown.
    pub(super) available: f32,

    /// Smallest share either neighbour of the handle can be squeezed to.
    pub(super) min_share: f64,

    pub(super) start_weights: Vec<f64>,

    /// Latest weights, emitted or not.
    pub(super) weights: Vec<f64>,

    /// Whether a transient intent has been handed out.
    pub(super) emitted: bool,
}

impl ResizeSession {
    /// Whether the handle sits between two existing children and the split has a size.
    pub(super) fn is_live(&self) -> bool {
        self.handle_index + 1 < self.start_weights.len() && self.available > 0.0
    }

    pub(super) fn end(&self, outcome: &'static str) {
        log::trace!(
            "resize session END id={} split={} handle={} outcome={outcome}",
            self.id,
            self.split_id,
            self.handle_index
        );
    }
}
