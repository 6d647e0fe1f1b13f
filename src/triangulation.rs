//! Delaunay triangulation snapshots
//!
//! The locator never computes topology itself. It asks a
//! [`TriangulationProvider`] for a flat half-edge triangulation of the
//! current sites and treats the result as an immutable value until the next
//! rebuild. The default provider wraps the `delaunator` crate.

/// Sentinel for "no half-edge" (hull boundary) and "no index"
pub const EMPTY: usize = delaunator::EMPTY;

/// Triangles with absolute doubled area at or below this are treated as flat
///
/// Tuned for practical robustness rather than exactness.
pub const COLLINEAR_EPSILON: f64 = 1e-10;

/// Half-edge triangulation of a flat `[x0, y0, x1, y1, ...]` site buffer
///
/// - `triangles[e]` is the site at which half-edge `e` starts; every three
///   consecutive entries form one triangle.
/// - `halfedges[e]` is the opposite half-edge in the adjacent triangle, or
///   [`EMPTY`] on the convex hull.
/// - `hull` lists the convex hull sites in boundary order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Triangulation {
    pub triangles: Vec<usize>,
    pub halfedges: Vec<usize>,
    pub hull: Vec<usize>,
}

impl Triangulation {
    /// Number of triangles
    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Source of Delaunay topology for a set of sites
///
/// Implementations must not carry state between calls: every invocation
/// triangulates `coords` from scratch.
pub trait TriangulationProvider {
    /// Triangulate a flat interleaved coordinate buffer
    fn triangulate(&self, coords: &[f64]) -> Triangulation;
}

/// Triangulation provider backed by the `delaunator` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct Delaunator;

impl TriangulationProvider for Delaunator {
    fn triangulate(&self, coords: &[f64]) -> Triangulation {
        let points: Vec<delaunator::Point> = coords
            .chunks_exact(2)
            .map(|p| delaunator::Point { x: p[0], y: p[1] })
            .collect();

        let result = delaunator::triangulate(&points);
        Triangulation {
            triangles: result.triangles,
            halfedges: result.halfedges,
            hull: result.hull,
        }
    }
}

/// Next half-edge within the same triangle
#[inline]
pub fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 {
        e - 2
    } else {
        e + 1
    }
}

/// Previous half-edge within the same triangle
#[inline]
pub fn prev_halfedge(e: usize) -> usize {
    if e % 3 == 0 {
        e + 2
    } else {
        e - 1
    }
}

/// Doubled signed area of triangle `t`
pub fn triangle_cross(triangulation: &Triangulation, coords: &[f64], t: usize) -> f64 {
    let a = 2 * triangulation.triangles[3 * t];
    let b = 2 * triangulation.triangles[3 * t + 1];
    let c = 2 * triangulation.triangles[3 * t + 2];
    (coords[c] - coords[a]) * (coords[b + 1] - coords[a + 1])
        - (coords[b] - coords[a]) * (coords[c + 1] - coords[a + 1])
}

/// True when every triangle is flat within [`COLLINEAR_EPSILON`]
///
/// Vacuously true for a triangulation without triangles, which is what a
/// provider returns for perfectly collinear input.
pub fn is_collinear(triangulation: &Triangulation, coords: &[f64]) -> bool {
    (0..triangulation.len())
        .all(|t| triangle_cross(triangulation, coords, t).abs() <= COLLINEAR_EPSILON)
}
