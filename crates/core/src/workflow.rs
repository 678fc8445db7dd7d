//! Visit status workflow.
//!
//! The transition rules are pure; `VisitService` composes them with the
//! Record Store writes and with the ensure-record side effect that
//! accompanies [`VisitEvent::StartProcessing`].

use klinik_types::VisitStatus;

use crate::error::{ClinicError, ClinicResult};

/// Events that move a visit through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitEvent {
    /// Doctor calls the patient in. A Patient Record is ensured for the
    /// visit as a side effect.
    StartProcessing,
    /// Admin removes the visit from the queue.
    Cancel,
    /// Clinical work finished, hand over to the cashier.
    AdvanceToPayment,
    /// Payment settled.
    MarkDone,
}

impl VisitEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitEvent::StartProcessing => "start-processing",
            VisitEvent::Cancel => "cancel",
            VisitEvent::AdvanceToPayment => "advance-to-payment",
            VisitEvent::MarkDone => "mark-done",
        }
    }
}

impl std::fmt::Display for VisitEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Apply `event` to a visit currently in `status`.
///
/// Returns the next status, or `InvalidTransition` for every pair outside
/// the legal table. Terminal statuses reject all events, and canceling is
/// only possible while the visit is still queued.
pub fn transition(status: VisitStatus, event: VisitEvent) -> ClinicResult<VisitStatus> {
    match (status, event) {
        (VisitStatus::InQueue, VisitEvent::StartProcessing) => Ok(VisitStatus::InProgress),
        (VisitStatus::InQueue, VisitEvent::Cancel) => Ok(VisitStatus::CanceledByAdmin),
        (VisitStatus::InProgress, VisitEvent::AdvanceToPayment) => {
            Ok(VisitStatus::WaitingForPayment)
        }
        (VisitStatus::WaitingForPayment, VisitEvent::MarkDone) => Ok(VisitStatus::Done),
        (status, event) => Err(ClinicError::InvalidTransition { status, event }),
    }
}
