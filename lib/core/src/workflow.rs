//! Status workflow contract shared by all entity kinds.
//!
//! Each entity kind (ticket, batch, account request) has its own status enum
//! carrying a static transition table. Validation is a table lookup; the
//! side-effect timestamps attached to specific transitions (closed_at,
//! received_date, completed_at) are applied by the owning module's service,
//! written atomically with the status itself.

/// A finite-state status model.
///
/// Implementors supply the transition table; reachability and terminality
/// fall out of it. Invalid transitions must be rejected before any store
/// write.
pub trait Workflow: Copy + Eq + Sized + 'static {
    /// Statuses reachable from `self`. Empty for terminal states.
    fn allowed_targets(&self) -> &'static [Self];

    /// Whether `target` is reachable from `self` in one step.
    fn can_transition(&self, target: Self) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Whether this status is terminal (no outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.allowed_targets().is_empty()
    }
}
