//! Calibration model
//!
//! Owns the design-file points and every calibration artifact, and derives
//! the machine-space point lists the procedures and the job engine consume.

pub mod fiducial;
pub mod model;
pub mod points;

pub use fiducial::{FiducialSelection, PickResult, SelectionEvent, SelectionState};
pub use model::{CalibrationModel, CalibrationStatus, HeightMode, ToolOffset};
pub use points::{CalibratedPoint, Fiducial, Placement, PotentialFiducial};
