use super::NodeId;

/// Source of new node ids.
///
/// The reducer asks for ids when it creates groups, splits and panels. Hosts that want
/// random or globally unique ids plug in their own generator; tests use [`SequentialIds`].
/// Returned ids that collide with existing nodes are skipped by the caller.
pub trait IdGenerator {
    fn next_id(&mut self, prefix: &str) -> NodeId;
}

/// Deterministic `prefix-1`, `prefix-2`, ... generator.
#[derive(Clone, Debug, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    /// Start counting after `last`.
    pub fn starting_after(last: u64) -> Self {
        Self { next: last }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> NodeId {
        self.next = self.next.saturating_add(1);
        NodeId::new(format!("{prefix}-{}", self.next))
    }
}

impl<F: FnMut(&str) -> NodeId> IdGenerator for F {
    fn next_id(&mut self, prefix: &str) -> NodeId {
        self(prefix)
    }
}
