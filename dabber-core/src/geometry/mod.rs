//! Geometry kernel
//!
//! Pure functions over millimeter coordinates:
//! - [`AffineTransform`]: design → machine registration from two point triples
//! - [`PlaneCoefficients`]: least-squares surface height
//! - [`HeightMesh`]: Delaunay triangulated height with barycentric interpolation

pub mod affine;
pub mod delaunay;
pub mod mesh;
pub mod plane;

use serde::{Deserialize, Serialize};

pub use affine::AffineTransform;
pub use mesh::HeightMesh;
pub use plane::PlaneCoefficients;

/// Errors from geometric fits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeometryError {
    /// Registration triangle is collinear
    DegenerateTriangle,
    /// Plane points are collinear in XY (normal has no Z component)
    DegeneratePoints,
    /// Fewer than 3 points were given
    NotEnoughPoints,
    /// Triangulation produced no usable triangles
    DegenerateTriangulation,
}

/// 2D point in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    /// Create a point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point
    pub fn distance_sq(&self, other: &Point2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// 3D point in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Create a point
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// XY projection
    pub const fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Absolute value without `std`
pub(crate) fn abs(value: f64) -> f64 {
    if value < 0.0 {
        -value
    } else {
        value
    }
}

/// Twice the signed area of triangle `a b c` (positive when counter-clockwise)
pub(crate) fn cross(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
}

/// Largest squared edge length of a triangle
pub(crate) fn max_edge_sq(a: Point2, b: Point2, c: Point2) -> f64 {
    a.distance_sq(&b).max(b.distance_sq(&c)).max(c.distance_sq(&a))
}
