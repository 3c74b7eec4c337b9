//! `dock_core`: the headless core of a dockable-panel workspace.
//!
//! * [`model`]: the canonical dock tree ([`DockState`]), its normalizer, the pure reducer
//!   ([`reduce_intent`]) and schema migration.
//! * [`geometry`]: projecting a state onto rects and resolving drop targets under a pointer.
//! * [`interaction`]: drag and resize sessions that turn pointer input into [`DockIntent`]s.
//!
//! Rendering is left to the host. A typical frame:
//!
//! ```
//! use dock_core::{
//!     DockInteractionController, LayoutOptions, PanelSpec, compute_layout_rects,
//!     create_state_from_panels, dispatch_intent,
//! };
//! use egui::{Pos2, Rect, Vec2};
//!
//! let mut state = create_state_from_panels([
//!     PanelSpec::new("scene", "Scene"),
//!     PanelSpec::new("log", "Log"),
//! ]);
//! let bounds = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0));
//! let layout = compute_layout_rects(&state, bounds, LayoutOptions::default());
//!
//! let mut controller = DockInteractionController::default();
//! controller.start_panel_drag("log".into());
//! controller.update_pointer(Pos2::new(790.0, 300.0), &layout);
//! if let Some(intent) = controller.end_panel_drag(Pos2::new(790.0, 300.0), &layout) {
//!     let mut ids = dock_core::SequentialIds::default();
//!     if let Some(next) = dispatch_intent(&state, &intent, &mut ids) {
//!         state = next;
//!     }
//! }
//! assert_eq!(state.group_ids().len(), 2);
//! ```

#![forbid(unsafe_code)]

pub mod dock_builder;
pub mod geometry;
pub mod interaction;
pub mod model;
mod persistence;

pub use dock_builder::{DockBuilder, DockNodeId, DockSide};
pub use geometry::{
    DockDropIndicator, DockDropTarget, DockGroupLayout, DockLayoutMap, DockSplitHandleLayout,
    HitTestOptions, LayoutOptions, compute_drop_indicator, compute_drop_overlay,
    compute_layout_rects, hit_test,
};
pub use interaction::{
    DockIntent, DockInteractionController, IntentCommand, InteractionOptions, dispatch_intent,
};
pub use model::{
    DOCK_SCHEMA_VERSION, DockAction, DockIssue, DockMeta, DockNode, DockState, DockZone,
    IdGenerator, MoveTarget, NodeId, NodeKind, NormalizeOptions, PanelSpec, PolicyOptions,
    SequentialIds, SplitDirection, StateInit, apply_policy, assert_invariants, create_state,
    create_state_from_panels, migrate_state, normalize_state, normalize_weights, reduce_intent,
};
pub use persistence::DockPersistenceError;
