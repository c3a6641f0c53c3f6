//! G-code command construction
//!
//! Commands are built into fixed-capacity strings so the protocol layer never
//! allocates. Coordinates are always written with three decimals.

use core::fmt::Write;

use heapless::{String, Vec};

/// Maximum length of a single command line (without the trailing newline)
pub const MAX_COMMAND_LEN: usize = 64;

/// Maximum number of commands in one batch
pub const MAX_BATCH_LEN: usize = 16;

/// A single G-code command line
pub type Command = String<MAX_COMMAND_LEN>;

/// Errors that can occur while building commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Formatted command does not fit in [`MAX_COMMAND_LEN`]
    TooLong,
    /// Batch already holds [`MAX_BATCH_LEN`] commands
    BatchFull,
    /// Coordinate is NaN or infinite
    NonFinite,
}

/// Machine axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Gantry X
    X,
    /// Gantry Y
    Y,
    /// Tip height
    Z,
    /// Paste extrusion screw (degrees)
    B,
}

impl Axis {
    /// G-code letter for this axis
    pub const fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::B => 'B',
        }
    }
}

fn literal(text: &str) -> Command {
    let mut cmd = Command::new();
    // Literals are all far below MAX_COMMAND_LEN
    let _ = cmd.push_str(text);
    cmd
}

fn push_axis(cmd: &mut Command, axis: Axis, value: f64) -> Result<(), CommandError> {
    if !value.is_finite() {
        return Err(CommandError::NonFinite);
    }
    write!(cmd, " {}{:.3}", axis.letter(), value).map_err(|_| CommandError::TooLong)
}

fn motion(word: &str, axes: &[(Axis, f64)], feed: Option<u32>) -> Result<Command, CommandError> {
    let mut cmd = literal(word);
    for &(axis, value) in axes {
        push_axis(&mut cmd, axis, value)?;
    }
    if let Some(feed) = feed {
        write!(cmd, " F{}", feed).map_err(|_| CommandError::TooLong)?;
    }
    Ok(cmd)
}

/// `G90`: absolute positioning
pub fn absolute() -> Command {
    literal("G90")
}

/// `G91`: relative positioning
pub fn relative() -> Command {
    literal("G91")
}

/// `G0`: rapid move on the given axes
pub fn rapid(axes: &[(Axis, f64)]) -> Result<Command, CommandError> {
    motion("G0", axes, None)
}

/// `G1`: feed-rate controlled move on the given axes
pub fn linear(axes: &[(Axis, f64)], feed: u32) -> Result<Command, CommandError> {
    motion("G1", axes, Some(feed))
}

/// `G0 F..`: set the travel feed rate for rapid moves
pub fn travel_feedrate(feed: u32) -> Command {
    let mut cmd = literal("G0");
    // "G0 F" plus at most 10 digits
    let _ = write!(cmd, " F{}", feed);
    cmd
}

/// `G4 P..`: dwell for the given number of milliseconds
pub fn dwell(ms: u32) -> Command {
    let mut cmd = literal("G4");
    let _ = write!(cmd, " P{}", ms);
    cmd
}

/// `M410`: quick stop, discards queued moves
pub fn quick_stop() -> Command {
    literal("M410")
}

/// `M114`: report current position
pub fn report_position() -> Command {
    literal("M114")
}

/// `G92`: declare the current XY position without moving
pub fn set_position(x: f64, y: f64) -> Result<Command, CommandError> {
    motion("G92", &[(Axis::X, x), (Axis::Y, y)], None)
}

/// `M150`: ring light full white or off
pub fn ring_light(on: bool) -> Command {
    if on {
        literal("M150 P255 R255 U255 B255")
    } else {
        literal("M150 P0")
    }
}

/// Ordered group of commands sent as one unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    commands: Vec<Command, MAX_BATCH_LEN>,
}

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command
    pub fn push(&mut self, command: Command) -> Result<&mut Self, CommandError> {
        self.commands
            .push(command)
            .map_err(|_| CommandError::BatchFull)?;
        Ok(self)
    }

    /// Commands in send order
    pub fn as_slice(&self) -> &[Command] {
        &self.commands
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the batch holds no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Absolute XY move at the current height
pub fn move_xy(x: f64, y: f64) -> Result<Batch, CommandError> {
    let mut batch = Batch::new();
    batch
        .push(absolute())?
        .push(rapid(&[(Axis::X, x), (Axis::Y, y)])?)?;
    Ok(batch)
}

/// Absolute XY move followed by a Z move
///
/// Z goes last so the tip only descends once it is above the target.
pub fn move_xyz(x: f64, y: f64, z: f64) -> Result<Batch, CommandError> {
    let mut batch = move_xy(x, y)?;
    batch.push(rapid(&[(Axis::Z, z)])?)?;
    Ok(batch)
}

/// Absolute Z move
pub fn move_z(z: f64) -> Result<Batch, CommandError> {
    let mut batch = Batch::new();
    batch.push(absolute())?.push(rapid(&[(Axis::Z, z)])?)?;
    Ok(batch)
}

/// Relative XY move, restoring absolute mode afterwards
pub fn jog_xy(dx: f64, dy: f64) -> Result<Batch, CommandError> {
    let mut batch = Batch::new();
    batch
        .push(relative())?
        .push(rapid(&[(Axis::X, dx), (Axis::Y, dy)])?)?
        .push(absolute())?;
    Ok(batch)
}

/// Start continuous slow extrusion on the B axis
pub fn start_extrude(distance: f64, feed: u32) -> Result<Batch, CommandError> {
    let mut batch = Batch::new();
    batch
        .push(relative())?
        .push(linear(&[(Axis::B, -distance)], feed)?)?
        .push(absolute())?;
    Ok(batch)
}

/// Abort any extrusion in progress and restore travel speed
pub fn stop_extrude(travel_feed: u32) -> Result<Batch, CommandError> {
    let mut batch = Batch::new();
    batch
        .push(quick_stop())?
        .push(absolute())?
        .push(travel_feedrate(travel_feed))?;
    Ok(batch)
}

/// Pull the paste back and lift the tip to a safe height
pub fn retract_and_raise(retraction: f64, safe_z: f64) -> Result<Batch, CommandError> {
    let mut batch = Batch::new();
    batch
        .push(relative())?
        .push(rapid(&[(Axis::B, retraction)])?)?
        .push(absolute())?
        .push(rapid(&[(Axis::Z, safe_z)])?)?;
    Ok(batch)
}

/// Parameters of a single fire-and-forget pad dispense
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadDispense {
    /// Tip position
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Extrusion screw rotation in degrees
    pub dispense_degrees: f64,
    /// Back-rotation after dispensing in degrees
    pub retraction_degrees: f64,
    /// Pause after retraction so the paste separates from the tip
    pub dwell_ms: u32,
    /// Travel height after the pad
    pub safe_z: f64,
}

/// Full command batch for one pad: move, descend, dispense, retract, dwell, raise
pub fn dispense_pad(pad: &PadDispense) -> Result<Batch, CommandError> {
    let mut batch = move_xyz(pad.x, pad.y, pad.z)?;
    batch
        .push(relative())?
        .push(rapid(&[(Axis::B, -pad.dispense_degrees)])?)?
        .push(rapid(&[(Axis::B, pad.retraction_degrees)])?)?
        .push(absolute())?
        .push(dwell(pad.dwell_ms))?
        .push(rapid(&[(Axis::Z, pad.safe_z)])?)?;
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rapid_formats_three_decimals() {
        let cmd = rapid(&[(Axis::X, 12.5), (Axis::Y, -3.0)]).unwrap();
        assert_eq!(cmd.as_str(), "G0 X12.500 Y-3.000");
    }

    #[test]
    fn test_linear_includes_feed() {
        let cmd = linear(&[(Axis::B, -20000.0)], 2000).unwrap();
        assert_eq!(cmd.as_str(), "G1 B-20000.000 F2000");
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(
            rapid(&[(Axis::Z, f64::NAN)]),
            Err(CommandError::NonFinite)
        );
        assert_eq!(
            move_xy(f64::INFINITY, 0.0),
            Err(CommandError::NonFinite)
        );
    }

    #[test]
    fn test_too_long_rejected() {
        let huge = 1.0e40;
        let result = rapid(&[(Axis::X, huge), (Axis::Y, huge)]);
        assert_eq!(result, Err(CommandError::TooLong));
    }

    #[test]
    fn test_batch_full() {
        let mut batch = Batch::new();
        for _ in 0..MAX_BATCH_LEN {
            batch.push(absolute()).unwrap();
        }
        assert_eq!(batch.push(absolute()).err(), Some(CommandError::BatchFull));
    }

    #[test]
    fn test_jog_restores_absolute() {
        let batch = jog_xy(0.4, -1.2).unwrap();
        let lines: [&str; 3] = [
            batch.as_slice()[0].as_str(),
            batch.as_slice()[1].as_str(),
            batch.as_slice()[2].as_str(),
        ];
        assert_eq!(lines, ["G91", "G0 X0.400 Y-1.200", "G90"]);
    }

    #[test]
    fn test_dispense_pad_sequence() {
        let pad = PadDispense {
            x: 10.0,
            y: 20.0,
            z: 30.5,
            dispense_degrees: 30.0,
            retraction_degrees: 1.0,
            dwell_ms: 100,
            safe_z: 0.0,
        };
        let batch = dispense_pad(&pad).unwrap();
        let lines: heapless::Vec<&str, MAX_BATCH_LEN> =
            batch.as_slice().iter().map(|c| c.as_str()).collect();
        assert_eq!(
            lines.as_slice(),
            &[
                "G90",
                "G0 X10.000 Y20.000",
                "G0 Z30.500",
                "G91",
                "G0 B-30.000",
                "G0 B1.000",
                "G90",
                "G4 P100",
                "G0 Z0.000",
            ]
        );
    }

    #[test]
    fn test_stop_extrude() {
        let batch = stop_extrude(35000).unwrap();
        assert_eq!(batch.as_slice()[0].as_str(), "M410");
        assert_eq!(batch.as_slice()[2].as_str(), "G0 F35000");
    }
}
