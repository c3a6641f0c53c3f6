//! Run phase state machine
//!
//! Tracks where an unattended run is. The index only moves forward after a
//! placement's batch was acknowledged.

/// Run phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunPhase {
    /// No run since the last reset
    #[default]
    NotStarted,
    /// Dispensing the placement with this index
    Running(usize),
    /// Every placement dispensed
    Completed,
    /// Stopped between placements on request
    Cancelled,
    /// A batch failed; the machine is wherever it stopped
    Failed,
}

/// Run events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunEvent {
    /// Run started
    Begin,
    /// Current placement's batch acknowledged; `total` placements in the run
    PlacementDone { total: usize },
    /// Cancellation seen between placements
    CancelObserved,
    /// Transport or command failure
    Fault,
}

impl RunPhase {
    /// Check if a run is in progress
    pub fn is_running(&self) -> bool {
        matches!(self, RunPhase::Running(_))
    }

    /// Check if this phase ends a run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunPhase::Completed | RunPhase::Cancelled | RunPhase::Failed
        )
    }

    /// Process an event and return the next phase
    pub fn transition(self, event: RunEvent) -> Self {
        use RunEvent::*;
        use RunPhase::*;

        match (self, event) {
            (NotStarted | Completed | Cancelled | Failed, Begin) => Running(0),

            (Running(i), PlacementDone { total }) if i + 1 >= total => Completed,
            (Running(i), PlacementDone { .. }) => Running(i + 1),
            (Running(_), CancelObserved) => Cancelled,
            (Running(_), Fault) => Failed,

            // Everything else is ignored
            (phase, _) => phase,
        }
    }
}
