//! Bowyer-Watson Delaunay triangulation

use alloc::vec::Vec;

use super::{abs, cross, GeometryError, Point2};

/// Squared distance under which two input points are considered the same
const DUPLICATE_EPS_SQ: f64 = 1e-12;

/// Super triangle size relative to the point spread
const SUPER_SCALE: f64 = 1e5;

#[derive(Debug, Clone, Copy)]
struct Triangle {
    v: [usize; 3],
    center: Point2,
    radius_sq: f64,
}

impl Triangle {
    fn new(v: [usize; 3], pts: &[Point2]) -> Self {
        let (a, b, c) = (pts[v[0]], pts[v[1]], pts[v[2]]);
        let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
        if abs(d) < 1e-18 {
            // Collinear triangles are always replaced by the next insertion
            return Self {
                v,
                center: a,
                radius_sq: f64::INFINITY,
            };
        }
        let a2 = a.x * a.x + a.y * a.y;
        let b2 = b.x * b.x + b.y * b.y;
        let c2 = c.x * c.x + c.y * c.y;
        let center = Point2::new(
            (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
            (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
        );
        Self {
            v,
            center,
            radius_sq: center.distance_sq(&a),
        }
    }

    fn circumcircle_contains(&self, p: Point2) -> bool {
        self.center.distance_sq(&p) < self.radius_sq
    }

    fn has_vertex_at_or_above(&self, first_super: usize) -> bool {
        self.v.iter().any(|&i| i >= first_super)
    }
}

/// Triangulate a point set
///
/// Returns the indices (into `points`) of each triangle, counter-clockwise.
/// Points that duplicate an earlier point are skipped. Fails when fewer than
/// 3 distinct points exist or all of them are collinear.
pub fn triangulate(points: &[Point2]) -> Result<Vec<[usize; 3]>, GeometryError> {
    let mut index: Vec<usize> = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        if !p.x.is_finite() || !p.y.is_finite() {
            continue;
        }
        if index
            .iter()
            .all(|&j| points[j].distance_sq(p) > DUPLICATE_EPS_SQ)
        {
            index.push(i);
        }
    }
    if index.len() < 3 {
        return Err(GeometryError::NotEnoughPoints);
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &i in &index {
        let p = points[i];
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let span = (max_x - min_x).max(max_y - min_y);
    let mid = Point2::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);

    // Working vertex list: selected input points followed by the super triangle
    let mut pts: Vec<Point2> = index.iter().map(|&i| points[i]).collect();
    let first_super = pts.len();
    let far = SUPER_SCALE * span;
    pts.push(Point2::new(mid.x - far, mid.y - span));
    pts.push(Point2::new(mid.x + far, mid.y - span));
    pts.push(Point2::new(mid.x, mid.y + far));

    let mut triangles = Vec::new();
    triangles.push(Triangle::new([first_super, first_super + 1, first_super + 2], &pts));

    for k in 0..first_super {
        let p = pts[k];

        let mut edges: Vec<[usize; 2]> = Vec::new();
        triangles.retain(|t| {
            if !t.circumcircle_contains(p) {
                return true;
            }
            for (a, b) in [(t.v[0], t.v[1]), (t.v[1], t.v[2]), (t.v[2], t.v[0])] {
                // An edge shared by two removed triangles is interior to the cavity
                if let Some(pos) = edges
                    .iter()
                    .position(|e| (e[0] == b && e[1] == a) || (e[0] == a && e[1] == b))
                {
                    edges.swap_remove(pos);
                } else {
                    edges.push([a, b]);
                }
            }
            false
        });

        for [a, b] in edges {
            triangles.push(Triangle::new([a, b, k], &pts));
        }
    }

    let eps = 1e-12 * span * span;
    let mut local = Vec::new();
    for t in triangles {
        if t.has_vertex_at_or_above(first_super) {
            continue;
        }
        let [i, j, l] = t.v;
        let area2 = cross(pts[i], pts[j], pts[l]);
        if abs(area2) <= eps {
            continue;
        }
        local.push(if area2 > 0.0 { [i, j, l] } else { [i, l, j] });
    }

    if local.is_empty() {
        return Err(GeometryError::DegenerateTriangulation);
    }
    fill_to_hull(&pts[..first_super], &mut local, eps);
    Ok(local
        .into_iter()
        .map(|t| t.map(|i| index[i]))
        .collect())
}

/// Directed edges of counter-clockwise triangles with no opposite twin
fn boundary_edges(tris: &[[usize; 3]]) -> Vec<[usize; 2]> {
    let edges = |t: &[usize; 3]| [[t[0], t[1]], [t[1], t[2]], [t[2], t[0]]];
    let mut boundary = Vec::new();
    for t in tris {
        for [a, b] in edges(t) {
            if !tris.iter().any(|u| edges(u).contains(&[b, a])) {
                boundary.push([a, b]);
            }
        }
    }
    boundary
}

/// True if segments `a b` and `c d` cross at a point interior to both
fn segments_cross(a: Point2, b: Point2, c: Point2, d: Point2, eps: f64) -> bool {
    let d1 = cross(a, b, c);
    let d2 = cross(a, b, d);
    let d3 = cross(c, d, a);
    let d4 = cross(c, d, b);
    ((d1 > eps && d2 < -eps) || (d1 < -eps && d2 > eps))
        && ((d3 > eps && d4 < -eps) || (d3 < -eps && d4 > eps))
}

/// Close gaps between the triangulated region and the convex hull
///
/// Dropping the super triangle can leave hull edges, or whole hull points,
/// uncovered. Each round attaches one empty triangle to the outside of a
/// boundary edge until no point lies outside the region.
fn fill_to_hull(pts: &[Point2], tris: &mut Vec<[usize; 3]>, eps: f64) {
    loop {
        let boundary = boundary_edges(tris);
        // (triangle, signed squared cosine of the angle opposite the edge)
        let mut best: Option<([usize; 3], f64)> = None;

        for &[i, j] in &boundary {
            for k in 0..pts.len() {
                if k == i || k == j || cross(pts[i], pts[j], pts[k]) >= -eps {
                    continue;
                }
                let tri = [j, i, k];
                let blocked = (0..pts.len()).any(|m| {
                    !tri.contains(&m)
                        && cross(pts[j], pts[i], pts[m]) >= -eps
                        && cross(pts[i], pts[k], pts[m]) >= -eps
                        && cross(pts[k], pts[j], pts[m]) >= -eps
                });
                if blocked {
                    continue;
                }
                let crossing = boundary.iter().any(|&[u, v]| {
                    [(i, k), (k, j)].iter().any(|&(a, b)| {
                        ![a, b].contains(&u)
                            && ![a, b].contains(&v)
                            && segments_cross(pts[a], pts[b], pts[u], pts[v], eps)
                    })
                });
                if crossing {
                    continue;
                }

                // Widest angle at k gives the smallest circumcircle
                let (pi, pj, pk) = (pts[i], pts[j], pts[k]);
                let dot = (pi.x - pk.x) * (pj.x - pk.x) + (pi.y - pk.y) * (pj.y - pk.y);
                let cos_sq = dot * abs(dot) / (pk.distance_sq(&pi) * pk.distance_sq(&pj));
                if best.map_or(true, |(_, c)| cos_sq < c) {
                    best = Some((tri, cos_sq));
                }
            }
        }

        match best {
            Some((tri, _)) => {
                trace!("hull gap filled with {:?}", tri);
                tris.push(tri);
            }
            None => break,
        }
    }
}
