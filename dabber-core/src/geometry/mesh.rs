//! Triangulated height mesh
//!
//! Built from probed points in design-file coordinates. Queries inside the
//! hull interpolate barycentrically; queries outside use the nearest triangle
//! with its weights clamped to the triangle, which keeps the height continuous
//! across the hull boundary.

use alloc::vec::Vec;

use super::{delaunay, GeometryError, Point2, Point3};

/// Barycentric inside test tolerance
const INSIDE_EPS: f64 = -1e-6;

/// Delaunay triangulation with a height per vertex
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMesh {
    vertices: Vec<Point3>,
    triangles: Vec<[usize; 3]>,
}

/// Barycentric weights of `p` in triangle `a b c`
///
/// Returns `None` for a zero-area triangle.
fn barycentric(p: Point2, a: Point2, b: Point2, c: Point2) -> Option<(f64, f64, f64)> {
    let (v0x, v0y) = (b.x - a.x, b.y - a.y);
    let (v1x, v1y) = (c.x - a.x, c.y - a.y);
    let (v2x, v2y) = (p.x - a.x, p.y - a.y);

    let dot00 = v0x * v0x + v0y * v0y;
    let dot01 = v0x * v1x + v0y * v1y;
    let dot02 = v0x * v2x + v0y * v2y;
    let dot11 = v1x * v1x + v1y * v1y;
    let dot12 = v1x * v2x + v1y * v2y;

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    let v = (dot11 * dot02 - dot01 * dot12) / denom;
    let w = (dot00 * dot12 - dot01 * dot02) / denom;
    Some((1.0 - v - w, v, w))
}

/// Clamp weights to the triangle and renormalize them to sum to 1
fn clamp_weights((u, v, w): (f64, f64, f64)) -> (f64, f64, f64) {
    let (u, v, w) = (u.max(0.0), v.max(0.0), w.max(0.0));
    let sum = u + v + w;
    (u / sum, v / sum, w / sum)
}

impl HeightMesh {
    /// Triangulate the points and keep each vertex's height
    pub fn build(points: &[Point3]) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::NotEnoughPoints);
        }
        let xy: Vec<Point2> = points.iter().map(Point3::xy).collect();
        let triangles = delaunay::triangulate(&xy)?;
        Ok(Self {
            vertices: points.to_vec(),
            triangles,
        })
    }

    /// Rebuild a mesh from stored parts
    ///
    /// Fails if a triangle refers to a missing vertex or no triangle exists.
    pub fn from_parts(
        vertices: Vec<Point3>,
        triangles: Vec<[usize; 3]>,
    ) -> Result<Self, GeometryError> {
        if triangles.is_empty() {
            return Err(GeometryError::DegenerateTriangulation);
        }
        if triangles
            .iter()
            .any(|t| t.iter().any(|&i| i >= vertices.len()))
        {
            return Err(GeometryError::DegenerateTriangulation);
        }
        Ok(Self {
            vertices,
            triangles,
        })
    }

    /// Mesh vertices with their heights
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Triangle vertex indices
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    fn corners(&self, t: &[usize; 3]) -> (Point3, Point3, Point3) {
        (
            self.vertices[t[0]],
            self.vertices[t[1]],
            self.vertices[t[2]],
        )
    }

    /// Height at a design-space point
    ///
    /// Returns `None` only if every triangle is degenerate.
    pub fn height_at(&self, x: f64, y: f64) -> Option<f64> {
        let p = Point2::new(x, y);

        for t in &self.triangles {
            let (a, b, c) = self.corners(t);
            let Some((u, v, w)) = barycentric(p, a.xy(), b.xy(), c.xy()) else {
                continue;
            };
            if u >= INSIDE_EPS && v >= INSIDE_EPS && w >= INSIDE_EPS {
                return Some(u * a.z + v * b.z + w * c.z);
            }
        }

        // Outside the hull: nearest clamped projection
        let mut best: Option<(f64, f64)> = None;
        for t in &self.triangles {
            let (a, b, c) = self.corners(t);
            let Some(weights) = barycentric(p, a.xy(), b.xy(), c.xy()) else {
                continue;
            };
            let (u, v, w) = clamp_weights(weights);
            let projected = Point2::new(u * a.x + v * b.x + w * c.x, u * a.y + v * b.y + w * c.y);
            let dist = projected.distance_sq(&p);
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, u * a.z + v * b.z + w * c.z));
            }
        }
        best.map(|(_, z)| z)
    }
}
