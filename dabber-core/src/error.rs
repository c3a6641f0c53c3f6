//! Engine error types

use core::fmt;

use dabber_protocol::CommandError;

use crate::geometry::GeometryError;
use crate::traits::{TransportError, VisionError};

/// Conditions that must hold before a procedure or run may start
///
/// A failed precondition is reported before any motion and leaves the
/// calibration model and run state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Precondition {
    /// Job has no placements
    NoPlacements,
    /// No rough or fine transform exists
    NotCalibrated,
    /// Fewer than 3 finalized fiducials
    MissingFiducials,
    /// Vision registration needs a rough transform first
    RoughRegistrationMissing,
    /// Automated replay needs at least 2 learned pad durations
    InsufficientTimingSamples,
    /// Fiducial selection needs at least 3 candidates
    NotEnoughCandidates,
    /// Placement index does not exist
    PlacementOutOfRange,
    /// Candidate index does not exist
    CandidateOutOfRange,
    /// Fiducial index does not exist
    FiducialOutOfRange,
}

impl Precondition {
    /// Short human-readable description
    pub const fn as_str(&self) -> &'static str {
        match self {
            Precondition::NoPlacements => "no placements loaded",
            Precondition::NotCalibrated => "board is not calibrated",
            Precondition::MissingFiducials => "3 fiducials are required",
            Precondition::RoughRegistrationMissing => "rough registration is required",
            Precondition::InsufficientTimingSamples => "at least 2 learned pads are required",
            Precondition::NotEnoughCandidates => "at least 3 fiducial candidates are required",
            Precondition::PlacementOutOfRange => "placement index out of range",
            Precondition::CandidateOutOfRange => "candidate index out of range",
            Precondition::FiducialOutOfRange => "fiducial index out of range",
        }
    }
}

/// Top-level error returned by engine operations
///
/// Cancellation is not an error; see [`crate::Outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    /// Operation refused before doing anything
    PreconditionFailed(Precondition),
    /// Fit could not be computed; the affected artifact is unchanged
    DegenerateGeometry(GeometryError),
    /// Controller link failed; moves already executed are not undone
    Transport(TransportError),
    /// Vision refinement failed
    Vision(VisionError),
    /// A command could not be formatted (non-finite or too long)
    Command(CommandError),
}

impl From<Precondition> for EngineError {
    fn from(value: Precondition) -> Self {
        EngineError::PreconditionFailed(value)
    }
}

impl From<GeometryError> for EngineError {
    fn from(value: GeometryError) -> Self {
        EngineError::DegenerateGeometry(value)
    }
}

impl From<TransportError> for EngineError {
    fn from(value: TransportError) -> Self {
        EngineError::Transport(value)
    }
}

impl From<VisionError> for EngineError {
    fn from(value: VisionError) -> Self {
        EngineError::Vision(value)
    }
}

impl From<CommandError> for EngineError {
    fn from(value: CommandError) -> Self {
        EngineError::Command(value)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::PreconditionFailed(p) => write!(f, "precondition failed: {}", p.as_str()),
            EngineError::DegenerateGeometry(e) => write!(f, "degenerate geometry: {:?}", e),
            EngineError::Transport(e) => write!(f, "transport failure: {:?}", e),
            EngineError::Vision(e) => write!(f, "vision failure: {:?}", e),
            EngineError::Command(e) => write!(f, "invalid command: {:?}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_precondition_converts() {
        let err: EngineError = Precondition::NotCalibrated.into();
        assert_eq!(err, EngineError::PreconditionFailed(Precondition::NotCalibrated));
    }

    #[test]
    fn test_display() {
        let err = EngineError::PreconditionFailed(Precondition::MissingFiducials);
        assert_eq!(err.to_string(), "precondition failed: 3 fiducials are required");
        let err = EngineError::Transport(TransportError::Timeout);
        assert_eq!(err.to_string(), "transport failure: Timeout");
    }
}
