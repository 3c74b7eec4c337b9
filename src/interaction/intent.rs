use crate::model::{DockAction, DockState, IdGenerator, MoveTarget, NodeId, reduce_intent};

/// The command an intent carries, tagged with its wire name.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "name", content = "payload", rename_all_fields = "camelCase")
)]
pub enum IntentCommand {
    #[cfg_attr(feature = "serde", serde(rename = "dock/move-panel"))]
    MovePanel { panel_id: NodeId, target: MoveTarget },

    #[cfg_attr(feature = "serde", serde(rename = "dock/resize"))]
    Resize { split_id: NodeId, weights: Vec<f64> },
}

/// Something the interaction controller wants done to the state.
///
/// Transient intents are live previews (resize while dragging); a host may apply them
/// without recording history, then commit the final non-transient one.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DockIntent {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub command: IntentCommand,

    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "std::ops::Not::not")
    )]
    pub transient: bool,
}

impl DockIntent {
    pub fn move_panel(panel_id: NodeId, target: MoveTarget) -> Self {
        Self {
            command: IntentCommand::MovePanel { panel_id, target },
            transient: false,
        }
    }

    pub fn resize(split_id: NodeId, weights: Vec<f64>, transient: bool) -> Self {
        Self {
            command: IntentCommand::Resize { split_id, weights },
            transient,
        }
    }

    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self.command {
            IntentCommand::MovePanel { .. } => "dock/move-panel",
            IntentCommand::Resize { .. } => "dock/resize",
        }
    }

    /// The reducer action this intent stands for.
    pub fn to_action(&self) -> DockAction {
        match &self.command {
            IntentCommand::MovePanel { panel_id, target } => DockAction::MovePanel {
                panel_id: panel_id.clone(),
                target: target.clone(),
            },
            IntentCommand::Resize { split_id, weights } => DockAction::ResizeSplit {
                split_id: split_id.clone(),
                weights: weights.clone(),
            },
        }
    }
}

/// Run `intent` through the reducer. `None` means nothing to commit.
pub fn dispatch_intent(
    state: &DockState,
    intent: &DockIntent,
    ids: &mut dyn IdGenerator,
) -> Option<DockState> {
    reduce_intent(state, &intent.to_action(), ids)
}
