use std::collections::BTreeMap;

use egui::{Pos2, Rect, Vec2};
use serde_json::{Map, Value};

use super::{
    DEFAULT_PANEL_TITLE, DOCK_SCHEMA_VERSION, DockMeta, DockNode, DockState, NodeId, NodeKind,
    NormalizeOptions, SplitDirection, StateInit, create_state, normalize_state,
};

/// Schema version assumed for blobs that don't carry `dockMeta.schemaVersion`.
const LEGACY_SCHEMA_VERSION: u32 = 1;

/// Hydrate a persisted blob into a valid [`DockState`].
///
/// Total: any input, including garbage, yields a normalized state. Unknown node kinds and
/// malformed fields are dropped or replaced with defaults; an empty result becomes the
/// default single-panel state.
///
/// Version 1 blobs may store `nodes` as an array, split sizes under `data.sizes`, the active
/// tab under `data.active`, and use the kind names `tabs`/`pane`.
pub fn migrate_state(raw: &Value) -> DockState {
    let Some(obj) = raw.as_object() else {
        log::debug!("migrate: input is not an object; using the default state");
        return create_state(StateInit::default());
    };

    let version = obj
        .get("dockMeta")
        .and_then(|meta| meta.get("schemaVersion"))
        .and_then(Value::as_u64)
        .map_or(LEGACY_SCHEMA_VERSION, |v| u32::try_from(v).unwrap_or(u32::MAX));
    if version > DOCK_SCHEMA_VERSION {
        log::warn!(
            "migrate: schema {version} is newer than {DOCK_SCHEMA_VERSION}; best-effort load"
        );
    }
    let legacy = version < 2;

    let mut nodes: BTreeMap<NodeId, DockNode> = BTreeMap::new();
    match obj.get("nodes") {
        Some(Value::Object(map)) => {
            for (key, value) in map {
                if let Some(node) = hydrate_node(NodeId::new(key.as_str()), value, legacy) {
                    nodes.insert(node.id.clone(), node);
                }
            }
        }
        Some(Value::Array(list)) if legacy => {
            for value in list {
                let Some(id) = value.get("id").and_then(Value::as_str) else {
                    continue;
                };
                if let Some(node) = hydrate_node(NodeId::from(id), value, legacy) {
                    nodes.entry(node.id.clone()).or_insert(node);
                }
            }
        }
        Some(_) => log::warn!("migrate: unexpected `nodes` shape; ignoring it"),
        None => {}
    }

    let string_field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(NodeId::from)
            .unwrap_or_else(|| NodeId::new(""))
    };

    let mut state = DockState {
        dock_meta: DockMeta::default(),
        root_id: string_field("rootId"),
        float_root_id: string_field("floatRootId"),
        nodes,
    };
    normalize_state(&mut state, NormalizeOptions::default());
    state
}

fn hydrate_node(id: NodeId, value: &Value, legacy: bool) -> Option<DockNode> {
    let obj = value.as_object()?;
    let empty = Map::new();
    let data = obj.get("data").and_then(Value::as_object).unwrap_or(&empty);
    let children: Vec<NodeId> = obj
        .get("links")
        .and_then(|links| links.get("children"))
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).map(NodeId::from).collect())
        .unwrap_or_default();

    let kind = match obj.get("kind").and_then(Value::as_str)? {
        "split" => NodeKind::Split {
            direction: parse_direction(data.get("direction")),
            weights: parse_weights(
                data.get("weights")
                    .or_else(|| data.get("sizes").filter(|_| legacy)),
            ),
        },
        "group" => NodeKind::Group {
            active_panel_id: data
                .get("activePanelId")
                .or_else(|| data.get("active").filter(|_| legacy))
                .and_then(Value::as_str)
                .map(NodeId::from),
        },
        "tabs" if legacy => NodeKind::Group {
            active_panel_id: data.get("active").and_then(Value::as_str).map(NodeId::from),
        },
        "panel" => NodeKind::Panel {
            title: parse_title(data.get("title")),
        },
        "pane" if legacy => NodeKind::Panel {
            title: parse_title(data.get("title")),
        },
        "float-root" => NodeKind::FloatRoot,
        "float-window" => NodeKind::FloatWindow {
            rect: parse_rect(data.get("rect")),
        },
        other => {
            log::debug!("migrate: dropping node {id} of unknown kind {other:?}");
            return None;
        }
    };

    Some(DockNode::new(id, kind, children))
}

fn parse_direction(value: Option<&Value>) -> SplitDirection {
    match value.and_then(Value::as_str) {
        Some("col" | "column" | "vertical") => SplitDirection::Col,
        _ => SplitDirection::Row,
    }
}

/// Non-numeric entries become NaN so normalization falls back to equal shares.
fn parse_weights(value: Option<&Value>) -> Vec<f64> {
    value
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .map(|w| w.as_f64().unwrap_or(f64::NAN))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_title(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .filter(|title| !title.trim().is_empty())
        .unwrap_or(DEFAULT_PANEL_TITLE)
        .to_owned()
}

/// Accepts `{min:{x,y}, max:{x,y}}` or `{x, y, width, height}`; anything else is NaN.
fn parse_rect(value: Option<&Value>) -> Rect {
    let number = |v: Option<&Value>| v.and_then(Value::as_f64).map(|n| n as f32);
    let point = |v: Option<&Value>| {
        let v = v?;
        Some(Pos2::new(number(v.get("x"))?, number(v.get("y"))?))
    };

    let Some(value) = value else {
        return Rect::NAN;
    };
    if let (Some(min), Some(max)) = (point(value.get("min")), point(value.get("max"))) {
        return Rect::from_min_max(min, max);
    }
    match (
        number(value.get("x")),
        number(value.get("y")),
        number(value.get("width")),
        number(value.get("height")),
    ) {
        (Some(x), Some(y), Some(w), Some(h)) => {
            Rect::from_min_size(Pos2::new(x, y), Vec2::new(w, h))
        }
        _ => Rect::NAN,
    }
}
