//! Two-slot session state for slot-filling dialogue.
//!
//! A session is always in exactly one of three states, derived from which
//! slots hold values. The field slot is never set without the station slot.

/// The resolution state a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing resolved yet
    Empty,
    /// Station known, attribute still open
    EntityOnly,
    /// Both slots filled; a lookup is due
    Resolved,
}

/// Mutable per-session slot store. Mutated only by the router, always under
/// the session's mutex.
#[derive(Debug, Clone, Default)]
pub struct SessionSlots {
    pub station: Option<String>,
    pub field: Option<String>,
}

impl SessionSlots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the state from slot occupancy.
    #[must_use]
    pub const fn state(&self) -> SlotState {
        match (&self.station, &self.field) {
            (Some(_), Some(_)) => SlotState::Resolved,
            (Some(_), None) => SlotState::EntityOnly,
            _ => SlotState::Empty,
        }
    }

    /// Reset both slots. Called on every terminal outcome.
    pub fn clear(&mut self) {
        self.station = None;
        self.field = None;
    }
}
