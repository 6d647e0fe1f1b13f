//! Nearest-site lookups over a moving site set
//!
//! [`NearestSiteLocator`] answers "which site is closest to `(x, y)`" with a
//! greedy walk over the Delaunay graph. Starting from a hint site, the walk
//! repeatedly jumps to any neighbor closer to the query and stops at a local
//! minimum, which on a Delaunay graph is the global nearest site.
//!
//! # Performance
//!
//! - Rebuild: one triangulation plus O(n) cache derivation
//! - Query: expected O(1) when the hint is the answer of a nearby query,
//!   O(n) worst case for an unrelated hint

use log::{debug, trace};

use crate::error::{Result, StippleError};
use crate::triangulation::{
    is_collinear, next_halfedge, Delaunator, Triangulation, TriangulationProvider, EMPTY,
};

/// Perturbation radius applied to collinear sites, relative to their span
///
/// Tuned for practical robustness rather than exactness.
pub const JITTER_RADIUS_SCALE: f64 = 1e-8;

/// Axis-aligned rectangle `(xmin, ymin, xmax, ymax)`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Bounds {
    /// Create validated bounds
    ///
    /// # Errors
    ///
    /// Returns `InvalidBounds` if `xmax < xmin`, `ymax < ymin`, or any
    /// extent is NaN.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Result<Self> {
        if !(xmax >= xmin) || !(ymax >= ymin) {
            return Err(StippleError::InvalidBounds { xmin, ymin, xmax, ymax });
        }
        Ok(Self { xmin, ymin, xmax, ymax })
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Topology derived from one triangulation of the sites
///
/// Built whole and replaced whole; never patched.
#[derive(Debug, Clone, Default)]
struct Topology {
    triangulation: Triangulation,
    /// Some half-edge ending at each site, hull edges preferred
    inedges: Vec<usize>,
    /// Position of each site in the hull, or EMPTY for interior sites
    hull_index: Vec<usize>,
    collinear: bool,
}

impl Topology {
    /// Triangulate `points` and derive the walk caches
    ///
    /// Perfectly collinear sites are nudged in place so a real
    /// triangulation exists.
    fn build<P: TriangulationProvider>(provider: &P, points: &mut [f64]) -> Self {
        let n = points.len() / 2;
        if n == 0 {
            return Self::default();
        }

        let mut triangulation = provider.triangulate(points);
        let collinear = triangulation.hull.len() > 2 && is_collinear(&triangulation, points);
        if collinear {
            let radius = jitter_collinear(points);
            debug!(
                "collinear sites ({}), jittered by {:e} and re-triangulated",
                n, radius
            );
            triangulation = provider.triangulate(points);
        }

        let mut inedges = vec![EMPTY; n];
        let mut hull_index = vec![EMPTY; n];

        for e in 0..triangulation.halfedges.len() {
            let Some(&p) = triangulation.triangles.get(next_halfedge(e)) else {
                continue;
            };
            if let Some(slot) = inedges.get_mut(p) {
                if triangulation.halfedges[e] == EMPTY || *slot == EMPTY {
                    *slot = e;
                }
            }
        }
        for (i, &site) in triangulation.hull.iter().enumerate() {
            if let Some(slot) = hull_index.get_mut(site) {
                *slot = i;
            }
        }

        // One or two distinct sites: no triangle exists, so fake one
        let hull_len = triangulation.hull.len();
        if (1..=2).contains(&hull_len) {
            let first = triangulation.hull[0];
            let last = triangulation.hull[hull_len - 1];
            debug!("{} distinct site(s), using synthetic topology", hull_len);
            triangulation.triangles = vec![first, last, last];
            triangulation.halfedges = vec![EMPTY; 3];
            inedges[first] = 1;
            if hull_len == 2 {
                inedges[last] = 0;
            }
        }

        Self {
            triangulation,
            inedges,
            hull_index,
            collinear,
        }
    }
}

/// Deterministically perturb every site, returning the radius used
fn jitter_collinear(points: &mut [f64]) -> f64 {
    let n = points.len() / 2;
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        points[2 * i]
            .total_cmp(&points[2 * j])
            .then(points[2 * i + 1].total_cmp(&points[2 * j + 1]))
    });

    let (e, f) = (order[0], order[n - 1]);
    let dx = points[2 * f] - points[2 * e];
    let dy = points[2 * f + 1] - points[2 * e + 1];
    let r = JITTER_RADIUS_SCALE * (dx * dx + dy * dy).sqrt();

    for p in points.chunks_exact_mut(2) {
        let (x, y) = (p[0], p[1]);
        p[0] = x + (x + y).sin() * r;
        p[1] = y + (x - y).cos() * r;
    }
    r
}

/// Point-location structure answering nearest-site queries
///
/// The locator owns the site buffer (`[x0, y0, x1, y1, ...]`). Callers move
/// sites through [`points_mut`](Self::points_mut) and then call
/// [`update`](Self::update); queries between the two see the new
/// coordinates against the old topology.
///
/// # Example
///
/// ```
/// use voronoi_stipple::*;
///
/// let sites = vec![10.0, 10.0, 90.0, 10.0, 50.0, 80.0];
/// let bounds = Bounds::new(0.0, 0.0, 100.0, 100.0).unwrap();
/// let locator = NearestSiteLocator::build(sites, bounds).unwrap();
///
/// assert_eq!(locator.find(85.0, 20.0, 0), Some(1));
/// assert_eq!(locator.find(f64::NAN, 20.0, 0), None);
/// ```
#[derive(Debug, Clone)]
pub struct NearestSiteLocator<P = Delaunator> {
    provider: P,
    points: Vec<f64>,
    bounds: Bounds,
    topology: Topology,
    generation: u64,
}

impl NearestSiteLocator<Delaunator> {
    /// Build a locator over `points` using the `delaunator` provider
    ///
    /// # Errors
    ///
    /// Returns `InvalidBounds` for inverted bounds.
    pub fn build(points: Vec<f64>, bounds: Bounds) -> Result<Self> {
        Self::with_provider(Delaunator, points, bounds)
    }
}

impl<P: TriangulationProvider> NearestSiteLocator<P> {
    /// Build a locator with a custom triangulation provider
    ///
    /// A trailing odd coordinate is ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBounds` for inverted bounds.
    pub fn with_provider(provider: P, mut points: Vec<f64>, bounds: Bounds) -> Result<Self> {
        let bounds = Bounds::new(bounds.xmin, bounds.ymin, bounds.xmax, bounds.ymax)?;
        points.truncate(points.len() / 2 * 2);
        let topology = Topology::build(&provider, &mut points);

        Ok(Self {
            provider,
            points,
            bounds,
            topology,
            generation: 0,
        })
    }

    /// Rebuild the topology against the current site positions
    pub fn update(&mut self) {
        self.topology = Topology::build(&self.provider, &mut self.points);
        self.generation += 1;
    }

    /// Index of the site nearest to `(x, y)`
    ///
    /// The walk starts at `hint` (out-of-range hints start at site 0).
    /// Returns `None` for non-finite coordinates or an empty site set.
    pub fn find(&self, x: f64, y: f64, hint: usize) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let n = self.len();
        if n == 0 {
            return None;
        }

        let start = if hint < n { hint } else { 0 };
        let mut i = start;
        let mut best = start;
        let mut best_distance = self.distance_squared(start, x, y);

        // Each productive step strictly decreases the distance; anything
        // beyond this bound means the adjacency is corrupt.
        let budget = 4 * n + 16;
        for _ in 0..budget {
            let c = self.step(i, x, y);
            if c == i || c == start {
                return Some(c);
            }
            let distance = self.distance_squared(c, x, y);
            if distance < best_distance {
                best = c;
                best_distance = distance;
            }
            i = c;
        }

        trace!("find({}, {}) exceeded {} steps", x, y, budget);
        Some(best)
    }

    /// One greedy move from site `i`
    fn step(&self, i: usize, x: f64, y: f64) -> usize {
        let n = self.len();
        let Topology {
            triangulation,
            inedges,
            hull_index,
            ..
        } = &self.topology;
        let Triangulation {
            triangles,
            halfedges,
            hull,
        } = triangulation;

        let e0 = inedges[i];
        if e0 == EMPTY {
            // Duplicate site without triangles of its own
            return (i + 1) % n;
        }

        let mut c = i;
        let mut dc = self.distance_squared(i, x, y);
        let mut e = e0;
        // A consistent fan never visits more half-edges than exist
        for _ in 0..=halfedges.len() {
            let Some(&t) = triangles.get(e) else { break };
            if t >= n {
                break;
            }
            let dt = self.distance_squared(t, x, y);
            if dt < dc {
                dc = dt;
                c = t;
            }

            e = next_halfedge(e);
            if triangles.get(e) != Some(&i) {
                // bad triangulation (or the synthetic one for two sites)
                break;
            }

            e = match halfedges.get(e) {
                Some(&opposite) => opposite,
                None => break,
            };
            if e == EMPTY {
                // Off the hull: the next hull site may still be closer
                let h = hull_index[i];
                if h == EMPTY || hull.is_empty() {
                    break;
                }
                let next = hull[(h + 1) % hull.len()];
                if next != t && next < n && self.distance_squared(next, x, y) < dc {
                    return next;
                }
                break;
            }
            if e == e0 {
                break;
            }
        }
        c
    }

    #[inline]
    fn distance_squared(&self, i: usize, x: f64, y: f64) -> f64 {
        let dx = x - self.points[2 * i];
        let dy = y - self.points[2 * i + 1];
        dx * dx + dy * dy
    }

    /// Number of sites
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len() / 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Site coordinates, interleaved
    #[inline]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Mutable site coordinates; call [`update`](Self::update) afterwards
    #[inline]
    pub fn points_mut(&mut self) -> &mut [f64] {
        &mut self.points
    }

    /// Consume the locator, returning the site buffer
    pub fn into_points(self) -> Vec<f64> {
        self.points
    }

    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Current triangulation snapshot
    #[inline]
    pub fn triangulation(&self) -> &Triangulation {
        &self.topology.triangulation
    }

    /// Number of rebuilds since construction
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the last rebuild had to jitter collinear sites
    #[inline]
    pub fn is_collinear(&self) -> bool {
        self.topology.collinear
    }
}
