//! Motion controller link trait

use core::future::Future;

use dabber_protocol::{Command, PositionReport};

use crate::geometry::Point2;

/// Errors that can occur on the controller link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// No port is open
    NotConnected,
    /// Read or write on the port failed
    Io,
    /// Port closed while waiting for a reply
    Closed,
    /// Command was not acknowledged in time
    Timeout,
    /// Controller answered with an error line
    Rejected,
    /// Position query produced no report line
    NoPositionReport,
}

/// Machine position in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachinePosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MachinePosition {
    /// Create a position
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Gantry XY part of the position
    pub const fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

impl From<PositionReport> for MachinePosition {
    fn from(report: PositionReport) -> Self {
        Self::new(report.x, report.y, report.z)
    }
}

/// Trait for the motion controller link
///
/// Implementations own the serial port (or a simulator) and the
/// acknowledgment protocol.
pub trait Transport {
    /// Send commands in order
    ///
    /// Resolves once every command has been acknowledged. Fails on the first
    /// command that is not acknowledged; later commands are not sent.
    fn send(&mut self, commands: &[Command]) -> impl Future<Output = Result<(), TransportError>>;

    /// Query the current machine position
    ///
    /// Returns `Ok(None)` when the controller answered but no position
    /// report line was found.
    fn query_position(
        &mut self,
    ) -> impl Future<Output = Result<Option<MachinePosition>, TransportError>>;
}
