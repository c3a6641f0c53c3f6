//! Affine registration between design and machine coordinates

use serde::{Deserialize, Serialize};

use super::{abs, cross, max_edge_sq, GeometryError, Point2};

/// Relative tolerance for the collinearity test
///
/// Twice the triangle area must exceed this fraction of its longest squared edge.
const COLLINEAR_TOLERANCE: f64 = 1e-9;

/// Affine map `x' = a·x + b·y + c`, `y' = d·x + e·y + f`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn check_triangle(t: &[Point2; 3]) -> Result<f64, GeometryError> {
    let det = cross(t[0], t[1], t[2]);
    let extent = max_edge_sq(t[0], t[1], t[2]);
    if !det.is_finite() || extent == 0.0 || abs(det) <= COLLINEAR_TOLERANCE * extent {
        return Err(GeometryError::DegenerateTriangle);
    }
    Ok(det)
}

impl AffineTransform {
    /// The identity map
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 0.0,
        e: 1.0,
        f: 0.0,
    };

    /// Solve the map that sends each `src[i]` to `dst[i]`
    ///
    /// Fails if either triangle is collinear.
    pub fn from_triangles(src: &[Point2; 3], dst: &[Point2; 3]) -> Result<Self, GeometryError> {
        let det = check_triangle(src)?;
        check_triangle(dst)?;

        let (s0, s1, s2) = (src[0], src[1], src[2]);
        let (u1x, u1y) = (s1.x - s0.x, s1.y - s0.y);
        let (u2x, u2y) = (s2.x - s0.x, s2.y - s0.y);
        let (v1x, v1y) = (dst[1].x - dst[0].x, dst[1].y - dst[0].y);
        let (v2x, v2y) = (dst[2].x - dst[0].x, dst[2].y - dst[0].y);

        let a = (v1x * u2y - v2x * u1y) / det;
        let b = (u1x * v2x - u2x * v1x) / det;
        let d = (v1y * u2y - v2y * u1y) / det;
        let e = (u1x * v2y - u2x * v1y) / det;
        let c = dst[0].x - a * s0.x - b * s0.y;
        let f = dst[0].y - d * s0.x - e * s0.y;

        Ok(Self { a, b, c, d, e, f })
    }

    /// Map a point
    pub fn apply(&self, p: Point2) -> Point2 {
        Point2::new(
            self.a * p.x + self.b * p.y + self.c,
            self.d * p.x + self.e * p.y + self.f,
        )
    }

    /// Inverse map, or `None` if the linear part is singular
    pub fn inverse(&self) -> Option<Self> {
        let det = self.a * self.e - self.b * self.d;
        if !det.is_finite() || abs(det) < 1e-12 {
            return None;
        }
        Some(Self {
            a: self.e / det,
            b: -self.b / det,
            c: (self.b * self.f - self.e * self.c) / det,
            d: -self.d / det,
            e: self.a / det,
            f: (self.d * self.c - self.a * self.f) / det,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tri(p: [(f64, f64); 3]) -> [Point2; 3] {
        p.map(|(x, y)| Point2::new(x, y))
    }

    fn close(a: Point2, b: Point2) -> bool {
        abs(a.x - b.x) < 1e-9 && abs(a.y - b.y) < 1e-9
    }

    #[test]
    fn test_translation() {
        let src = tri([(0.0, 0.0), (100.0, 0.0), (0.0, 80.0)]);
        let dst = tri([(5.0, 5.0), (105.0, 5.0), (5.0, 85.0)]);
        let t = AffineTransform::from_triangles(&src, &dst).unwrap();
        assert!(close(t.apply(Point2::new(50.0, 50.0)), Point2::new(55.0, 55.0)));
    }

    #[test]
    fn test_rotation_and_inverse() {
        // 90° rotation plus offset
        let src = tri([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        let dst = tri([(20.0, 30.0), (20.0, 40.0), (10.0, 30.0)]);
        let t = AffineTransform::from_triangles(&src, &dst).unwrap();
        let p = Point2::new(3.0, 7.0);
        assert!(close(t.apply(p), Point2::new(13.0, 33.0)));
        let inv = t.inverse().unwrap();
        assert!(close(inv.apply(t.apply(p)), p));
    }

    #[test]
    fn test_collinear_source_rejected() {
        let src = tri([(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let dst = tri([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        assert_eq!(
            AffineTransform::from_triangles(&src, &dst),
            Err(GeometryError::DegenerateTriangle)
        );
    }

    #[test]
    fn test_collinear_destination_rejected() {
        let src = tri([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let dst = tri([(5.0, 5.0), (5.0, 5.0), (6.0, 6.0)]);
        assert_eq!(
            AffineTransform::from_triangles(&src, &dst),
            Err(GeometryError::DegenerateTriangle)
        );
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let t = AffineTransform {
            a: 1.0,
            b: 2.0,
            c: 0.0,
            d: 2.0,
            e: 4.0,
            f: 0.0,
        };
        assert!(t.inverse().is_none());
    }

    proptest! {
        #[test]
        fn prop_same_triangle_is_identity(
            x0 in -200.0f64..200.0, y0 in -200.0f64..200.0,
            w in 5.0f64..100.0, h in 5.0f64..100.0,
            px in -300.0f64..300.0, py in -300.0f64..300.0,
        ) {
            let src = tri([(x0, y0), (x0 + w, y0), (x0, y0 + h)]);
            let t = AffineTransform::from_triangles(&src, &src).unwrap();
            let p = Point2::new(px, py);
            prop_assert!(close(t.apply(p), p));
        }

        #[test]
        fn prop_uniform_shift_is_translation(
            x0 in -200.0f64..200.0, y0 in -200.0f64..200.0,
            w in 5.0f64..100.0, h in 5.0f64..100.0,
            dx in -50.0f64..50.0, dy in -50.0f64..50.0,
        ) {
            let src = tri([(x0, y0), (x0 + w, y0 + 1.0), (x0 - 2.0, y0 + h)]);
            let dst = src.map(|p| Point2::new(p.x + dx, p.y + dy));
            let t = AffineTransform::from_triangles(&src, &dst).unwrap();
            let mapped = t.apply(Point2::new(50.0, 50.0));
            prop_assert!(abs(mapped.x - (50.0 + dx)) < 1e-6);
            prop_assert!(abs(mapped.y - (50.0 + dy)) < 1e-6);
        }
    }
}
