//! Dispenser G-code Protocol
//!
//! This crate defines the line-based protocol between the host engine and the
//! motion controller of the paste dispenser (Marlin-style firmware).
//!
//! # Protocol Overview
//!
//! Every command is a single ASCII line terminated by `\n`. The controller
//! answers each line with `ok` once it has been accepted, and may emit other
//! lines in between:
//!
//! ```text
//! host  → G0 X12.500 Y40.000
//! ctrl  ← echo:busy: processing
//! ctrl  ← ok
//! host  → M114
//! ctrl  ← X:12.50 Y:40.00 Z:31.50 A:0.00 B:-20.00 Count X:1000 Y:3200 Z:2520
//! ctrl  ← ok
//! ```
//!
//! Axes: X/Y move the gantry, Z lowers the tip (larger is closer to the bed),
//! B drives the paste-extrusion screw.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod gcode;
pub mod line;
pub mod response;

pub use gcode::{Axis, Batch, Command, CommandError, MAX_BATCH_LEN, MAX_COMMAND_LEN};
pub use line::{Line, LineAssembler, MAX_LINE_LEN};
pub use response::{PositionReport, Response};
