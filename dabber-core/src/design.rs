//! Design-file helpers
//!
//! The Gerber parser itself lives outside this crate. It hands over pad
//! positions from the paste layer and flash positions from the mask layer;
//! this module turns them into placements and fiducial candidates.

use alloc::string::String;
use alloc::vec::Vec;
use core::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::calibration::{Placement, PotentialFiducial};
use crate::geometry::{abs, Point2};

/// Mask flashes closer than this to a paste pad are pads, not fiducials (mm)
pub const MASK_ONLY_TOLERANCE: f64 = 0.001;

/// Area used when a macro aperture has no usable coordinates (mm²)
const MACRO_FALLBACK_AREA: f64 = 0.5;

/// Which side of the board the paste layer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "lowercase")]
pub enum BoardSide {
    #[default]
    Front,
    Back,
}

impl BoardSide {
    /// Detect the side from a paste-layer file name
    ///
    /// `b_`, `_back` and `-back` (any case) mean the back side.
    pub fn from_filename(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("b_") || lower.contains("_back") || lower.contains("-back") {
            BoardSide::Back
        } else {
            BoardSide::Front
        }
    }
}

/// Aperture shape from the Gerber aperture table (mm)
#[derive(Debug, Clone, PartialEq)]
pub enum ApertureShape {
    Circle { diameter: f64 },
    Rectangle { x_size: f64, y_size: f64 },
    /// Rectangle with semicircular ends
    Obround { x_size: f64, y_size: f64 },
    /// Regular polygon inscribed in `diameter`
    Polygon { diameter: f64, vertices: u32 },
    /// Aperture macro instance with its parameter values
    Macro { name: String, values: Vec<f64> },
}

/// `sin(2π/n)` for regular polygons with 3..=12 vertices
const POLYGON_SIN: [f64; 10] = [
    0.866_025_403_784_438_6,  // 3
    1.0,                      // 4
    0.951_056_516_295_153_5,  // 5
    0.866_025_403_784_438_6,  // 6
    0.781_831_482_468_029_8,  // 7
    0.707_106_781_186_547_5,  // 8
    0.642_787_609_686_539_3,  // 9
    0.587_785_252_292_473_1,  // 10
    0.540_640_817_455_597_6,  // 11
    0.5,                      // 12
];

impl ApertureShape {
    /// Pad area in mm², if the shape allows an estimate
    pub fn area(&self) -> Option<f64> {
        match self {
            ApertureShape::Circle { diameter } => {
                let r = diameter / 2.0;
                Some(PI * r * r)
            }
            ApertureShape::Rectangle { x_size, y_size } => Some(x_size * y_size),
            ApertureShape::Obround { x_size, y_size } => {
                let min = x_size.min(*y_size);
                let max = x_size.max(*y_size);
                let r = min / 2.0;
                Some((max - min) * min + PI * r * r)
            }
            ApertureShape::Polygon { diameter, vertices } => {
                let n = *vertices as usize;
                let r = diameter / 2.0;
                match POLYGON_SIN.get(n.checked_sub(3)?) {
                    Some(sin) => Some(n as f64 * r * r * sin / 2.0),
                    // Many-sided polygons are close to their circumscribed circle
                    None => Some(PI * r * r),
                }
            }
            ApertureShape::Macro { name, values } => estimate_macro_area(name, values),
        }
    }
}

/// Bounding-box area of the coordinate pairs in `values[start..end]`
fn bounding_area(values: &[f64], start: usize, end: usize, grow: f64) -> f64 {
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    let mut any = false;
    let mut i = start;
    while i + 1 < end {
        min_x = min_x.min(values[i]);
        max_x = max_x.max(values[i]);
        min_y = min_y.min(values[i + 1]);
        max_y = max_y.max(values[i + 1]);
        any = true;
        i += 2;
    }
    if !any {
        return MACRO_FALLBACK_AREA;
    }
    (abs(max_x - min_x) + grow) * (abs(max_y - min_y) + grow)
}

/// Estimate a macro aperture's area from its parameters
///
/// Parameter layouts follow the common KiCad macro names; unknown macros
/// are guessed from the parameter magnitudes.
fn estimate_macro_area(name: &str, values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let name = name.to_ascii_lowercase();
    let len = values.len();

    if name.contains("roundrect") || name.contains("roundedrect") {
        // radius, 4 corners, rotation; the rounding extends past the corners
        let radius = values[0];
        return Some(bounding_area(values, 1, len - 1, 2.0 * radius));
    }
    if name.contains("rotrect") || name.contains("rotatedrect") {
        // width, height, rotation
        return (len >= 2).then(|| abs(values[0] * values[1]));
    }

    let (start, end) = if name.contains("outline") {
        (0, len - 1)
    } else if name.contains("poly") {
        // vertex count, coordinates, rotation
        (1, len - 1)
    } else {
        let start = if abs(values[0]) < 5.0 { 1 } else { 0 };
        let end = if abs(values[len - 1]) > 50.0 { len - 1 } else { len };
        (start, end)
    };
    Some(bounding_area(values, start, end, 0.0))
}

/// Mask flashes with no paste pad within `tolerance` on both axes
pub fn find_mask_only_points(mask: &[Point2], paste: &[Point2], tolerance: f64) -> Vec<Point2> {
    mask.iter()
        .filter(|m| {
            !paste
                .iter()
                .any(|p| abs(p.x - m.x) < tolerance && abs(p.y - m.y) < tolerance)
        })
        .copied()
        .collect()
}

/// A paste pad from the design file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DesignPad {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub area: Option<f64>,
}

impl DesignPad {
    pub const fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Output of the design-file loader
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignFile {
    #[serde(default)]
    pub placements: Vec<DesignPad>,
    #[serde(default)]
    pub fiducial_candidates: Vec<Point2>,
}

impl DesignFile {
    /// Combine the paste and mask layers
    ///
    /// Every paste pad becomes a placement; mask-only flashes become
    /// fiducial candidates.
    pub fn from_layers(paste: Vec<DesignPad>, mask: &[Point2]) -> Self {
        let paste_xy: Vec<Point2> = paste.iter().map(DesignPad::xy).collect();
        let fiducial_candidates = find_mask_only_points(mask, &paste_xy, MASK_ONLY_TOLERANCE);
        Self {
            placements: paste,
            fiducial_candidates,
        }
    }

    /// Unprobed placements and the candidate list
    pub fn into_parts(self) -> (Vec<Placement>, Vec<PotentialFiducial>) {
        let placements = self
            .placements
            .into_iter()
            .map(|pad| Placement {
                x: pad.x,
                y: pad.y,
                z: None,
                area: pad.area,
            })
            .collect();
        (placements, self.fiducial_candidates)
    }
}
