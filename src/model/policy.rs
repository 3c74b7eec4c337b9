use super::{DockState, NodeKind, WEIGHT_EPSILON, normalize_weights};

/// Options for [`apply_policy`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolicyOptions {
    /// Smallest share any split child may have. Capped at `1 / child_count` per split.
    pub min_weight: f64,

    /// Reset every split to equal shares instead of flooring.
    pub rebalance_splits: bool,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self {
            min_weight: 0.05,
            rebalance_splits: false,
        }
    }
}

/// Enforce a weight floor (or equal shares) on every split, in place.
pub fn apply_policy(state: &mut DockState, options: PolicyOptions) {
    for node in state.nodes.values_mut() {
        let count = node.links.children.len();
        let NodeKind::Split { weights, .. } = &mut node.kind else {
            continue;
        };
        if count == 0 {
            continue;
        }
        *weights = if options.rebalance_splits {
            vec![1.0 / count as f64; count]
        } else {
            floor_weights(&normalize_weights(weights, count, WEIGHT_EPSILON), options.min_weight)
        };
    }
}

/// Pin shares below `min_weight` to the floor and scale the rest to fill the remainder.
///
/// Pinning one share can push another under the floor, so this repeats until stable
/// (at most once per share).
fn floor_weights(weights: &[f64], min_weight: f64) -> Vec<f64> {
    let count = weights.len();
    if count == 0 {
        return Vec::new();
    }
    let floor = if min_weight.is_finite() {
        min_weight.clamp(0.0, 1.0 / count as f64)
    } else {
        0.0
    };
    if floor <= 0.0 {
        return weights.to_vec();
    }

    let mut pinned = vec![false; count];
    for _ in 0..=count {
        let pinned_count = pinned.iter().filter(|&&p| p).count();
        let budget = 1.0 - floor * pinned_count as f64;
        let free_sum: f64 = weights
            .iter()
            .zip(&pinned)
            .filter(|(_, p)| !**p)
            .map(|(w, _)| w)
            .sum();
        if free_sum <= 0.0 {
            break;
        }

        let mut newly_pinned = false;
        for (weight, pin) in weights.iter().zip(pinned.iter_mut()) {
            if !*pin && weight / free_sum * budget < floor {
                *pin = true;
                newly_pinned = true;
            }
        }
        if !newly_pinned {
            return weights
                .iter()
                .zip(&pinned)
                .map(|(w, p)| if *p { floor } else { w / free_sum * budget })
                .collect();
        }
    }

    // Everything ended up pinned: the floor is exactly the equal share.
    vec![1.0 / count as f64; count]
}
