//! Least-squares height plane

use serde::{Deserialize, Serialize};

use super::{abs, GeometryError, Point3};

/// Plane `A·x + B·y + C·z + D = 0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaneCoefficients {
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "B")]
    pub b: f64,
    #[serde(rename = "C")]
    pub c: f64,
    #[serde(rename = "D")]
    pub d: f64,
}

impl PlaneCoefficients {
    /// Fit `z = p·x + q·y + r` to the points by least squares
    ///
    /// With exactly 3 non-collinear points the plane passes through all of
    /// them. Fails when the points are collinear in XY.
    pub fn fit(points: &[Point3]) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::NotEnoughPoints);
        }

        let n = points.len() as f64;
        let (mut mx, mut my, mut mz) = (0.0, 0.0, 0.0);
        for p in points {
            mx += p.x;
            my += p.y;
            mz += p.z;
        }
        mx /= n;
        my /= n;
        mz /= n;

        // Centered second moments
        let (mut sxx, mut sxy, mut syy, mut sxz, mut syz) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for p in points {
            let dx = p.x - mx;
            let dy = p.y - my;
            let dz = p.z - mz;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
            sxz += dx * dz;
            syz += dy * dz;
        }

        let det = sxx * syy - sxy * sxy;
        let scale = sxx + syy;
        if !det.is_finite() || scale == 0.0 || abs(det) <= 1e-12 * scale * scale {
            return Err(GeometryError::DegeneratePoints);
        }

        let p = (sxz * syy - syz * sxy) / det;
        let q = (syz * sxx - sxz * sxy) / det;

        Ok(Self {
            a: p,
            b: q,
            c: -1.0,
            d: mz - p * mx - q * my,
        })
    }

    /// Surface height at `(x, y)`, or `None` for a vertical plane
    pub fn height_at(&self, x: f64, y: f64) -> Option<f64> {
        if abs(self.c) < 1e-12 {
            return None;
        }
        let z = -(self.a * x + self.b * y + self.d) / self.c;
        z.is_finite().then_some(z)
    }
}
