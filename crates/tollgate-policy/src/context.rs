//! Collaborators and time handed to every mutating operation.

use tollgate_core::interfaces::{Controller, TokenLedger};
use tollgate_core::types::{EventLog, TimePoint};

/// Everything an operation may touch besides its own state.
///
/// The host builds one context per call, reading its clock exactly once, so
/// an operation is a function of its state, the caller, the arguments, and
/// `now`.
pub struct ProtectionContext<'a> {
    /// The host's transfer hook.
    pub controller: &'a mut dyn Controller,
    /// The host's token ledger.
    pub ledger: &'a mut dyn TokenLedger,
    /// Sink for events of committed changes.
    pub events: &'a mut EventLog,
    /// The current time point.
    pub now: TimePoint,
}

impl<'a> ProtectionContext<'a> {
    /// Bundle collaborators for a single call.
    pub fn new(
        controller: &'a mut dyn Controller,
        ledger: &'a mut dyn TokenLedger,
        events: &'a mut EventLog,
        now: TimePoint,
    ) -> Self {
        Self {
            controller,
            ledger,
            events,
            now,
        }
    }
}
