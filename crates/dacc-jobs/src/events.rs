//! Event types for observing a day's progress.

use dacc_core::HourPosition;

use crate::job::HourlyErrorKind;

/// Events emitted by a day's completion tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// The hour's request was handed to the engine.
    Dispatched { position: HourPosition },

    /// The engine call is in flight.
    Running { position: HourPosition },

    /// The hour finished successfully.
    Succeeded { position: HourPosition },

    /// The hour failed, before or after dispatch.
    Failed {
        position: HourPosition,
        kind: HourlyErrorKind,
        error: String,
    },

    /// A completion arrived for an hour that was already terminal.
    DuplicateIgnored { position: HourPosition },

    /// Every requested hour is terminal; aggregation has been triggered.
    DayComplete { success: usize, failure: usize },
}

impl JobEvent {
    pub fn position(&self) -> Option<HourPosition> {
        match self {
            JobEvent::Dispatched { position }
            | JobEvent::Running { position }
            | JobEvent::Succeeded { position }
            | JobEvent::Failed { position, .. }
            | JobEvent::DuplicateIgnored { position } => Some(*position),
            JobEvent::DayComplete { .. } => None,
        }
    }
}
