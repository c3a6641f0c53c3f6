//! Interactive calibration procedures
//!
//! Each procedure is fail-fast: preconditions are checked before any motion,
//! and the calibration artifact is written only after every step succeeded.
//! An operator cancel ends the procedure with [`crate::Outcome::Cancelled`]
//! and also leaves the artifact untouched.

pub mod navigate;
pub mod probe;
pub mod registration;
pub mod select;
pub mod tip_offset;
