//! Transport-agnostic core of the paste dispenser
//!
//! This crate contains everything between the design file and the G-code
//! stream that does not depend on a concrete serial port, camera, or UI:
//!
//! - Geometry kernel (affine registration, plane fit, Delaunay height mesh)
//! - Calibration model with derived machine-space placement lists
//! - Fiducial selection state machine
//! - Interactive calibration procedures (rough, vision, tip offset, probing)
//! - Job execution (learning, automated replay, unattended run)
//! - Collaborator traits (transport, vision, prompt, clock)
//! - Configuration, job files, and persisted machine calibration
//!
//! # Architecture
//!
//! ```text
//! design file ─▶ CalibrationModel ─▶ geometry ─▶ Engine (job) ─▶ Transport
//!                      ▲                            │
//!                      └──── procedures ◀───────────┘
//!                           (Prompt, Vision, Clock)
//! ```

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod calibration;
pub mod cancel;
pub mod config;
pub mod design;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod job;
pub mod jobfile;
pub mod procedures;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::CancelToken;
pub use engine::{Engine, Outcome};
pub use error::{EngineError, Precondition};
pub use job::RunReport;
