//! Design-file point types

use serde::{Deserialize, Serialize};

use crate::geometry::Point2;

/// A pad to dispense on, in design-file millimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    /// Probed machine Z; `None` until probed
    #[serde(default)]
    pub z: Option<f64>,
    /// Pad area in mm², used by adaptive dispensing
    #[serde(default)]
    pub area: Option<f64>,
}

impl Placement {
    /// Unprobed placement
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            area: None,
        }
    }

    /// Unprobed placement with a pad area
    pub const fn with_area(x: f64, y: f64, area: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            area: Some(area),
        }
    }

    /// Design-space position
    pub const fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    /// Check if the placement has a probed height
    pub const fn is_probed(&self) -> bool {
        self.z.is_some()
    }
}

/// Finalized fiducial mark
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fiducial {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Fiducial {
    /// Create a fiducial at design-space `(x, y)`
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Design-space position
    pub const fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

impl From<Point2> for Fiducial {
    fn from(p: Point2) -> Self {
        Self::new(p.x, p.y)
    }
}

/// Fiducial candidate awaiting selection
pub type PotentialFiducial = Point2;

/// Point mapped to machine space with its resolved height
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibratedPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Whether the source point carries its own probed height
    pub probed: bool,
    /// Pad area carried over from the placement
    pub area: Option<f64>,
}

impl CalibratedPoint {
    /// Machine-space XY
    pub const fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}
