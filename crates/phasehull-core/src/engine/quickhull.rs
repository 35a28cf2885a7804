//! Quickhull in `N` dimensions.
//!
//! Based on Barber, Dobkin and Huhdanpaa, "The Quickhull algorithm for convex
//! hulls", ACM Trans. on Mathematical Software 22(4), 1996. The engine is a
//! single const-generic implementation; the ternary and quaternary entry points
//! and the runtime-dimension [`quickhull_nd`] all instantiate it.

use super::config::Tolerances;
use super::error::HullError;
use super::facet::{Facet, FacetNd};
use super::geometry::{centroid, coordinate_extent, dot, hyperplane};
use std::collections::HashMap;
use tracing::{debug, instrument, trace};

/// Highest dimension accepted by [`quickhull_nd`].
pub const MAX_DIMENSION: usize = 12;

#[derive(Debug, Clone)]
struct WorkingFacet<const N: usize> {
    vertices: [usize; N],
    normal: [f64; N],
    offset: f64,
    outside: Vec<usize>,
    alive: bool,
}

impl<const N: usize> WorkingFacet<N> {
    /// Builds the facet through `vertices` with its normal pointing away from `interior`.
    fn new(
        vertices: [usize; N],
        points: &[[f64; N]],
        interior: &[f64; N],
        min_sine: f64,
    ) -> Option<Self> {
        let (plane_normal, offset) = hyperplane(points, &vertices, min_sine)?;
        let mut normal = [0.0; N];
        normal.copy_from_slice(&plane_normal);
        let mut facet = Self {
            vertices,
            normal,
            offset,
            outside: Vec::new(),
            alive: true,
        };
        if facet.signed_distance(interior) > 0.0 {
            facet.normal.iter_mut().for_each(|n| *n = -*n);
            facet.offset = -facet.offset;
        }
        Some(facet)
    }

    /// Positive when `point` lies on the outer side of the facet.
    #[inline]
    fn signed_distance(&self, point: &[f64; N]) -> f64 {
        dot(&self.normal, point) - self.offset
    }

    fn furthest_outside_point(&self, points: &[[f64; N]]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &idx in &self.outside {
            let distance = self.signed_distance(&points[idx]);
            let better = match best {
                None => true,
                Some((best_idx, best_distance)) => {
                    distance > best_distance || (distance == best_distance && idx < best_idx)
                }
            };
            if better {
                best = Some((idx, distance));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// The `N` ridges of the facet, each as a sorted list of `N - 1` vertex indices.
    fn ridges(&self) -> impl Iterator<Item = Vec<usize>> + '_ {
        (0..N).map(move |skip| {
            let mut ridge: Vec<usize> = self
                .vertices
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != skip)
                .map(|(_, &v)| v)
                .collect();
            ridge.sort_unstable();
            ridge
        })
    }

    fn into_facet(self, points: &[[f64; N]]) -> Facet<N> {
        let mut center = [0.0; N];
        center.copy_from_slice(&centroid(points, &self.vertices, N));
        Facet {
            vertices: self.vertices,
            normal: self.normal,
            centroid: center,
            offset: self.offset,
        }
    }
}

/// Computes the facets of the convex hull of `points`.
///
/// Returns an empty list when fewer than `N + 1` points are given or when no
/// `N + 1` of them are affinely independent. Points with non-finite
/// coordinates never become hull vertices. Points lying within the plane
/// tolerance of a facet are treated as inside, so coplanar points are not
/// emitted as vertices.
#[instrument(skip_all, name = "quickhull", fields(dim = N, points = points.len()))]
pub fn quickhull<const N: usize>(points: &[[f64; N]], tolerances: &Tolerances) -> Vec<Facet<N>> {
    if N < 2 || points.len() < N + 1 {
        debug!("Too few points for a full-dimensional hull.");
        return Vec::new();
    }

    let candidates: Vec<usize> = (0..points.len())
        .filter(|&i| points[i].iter().all(|c| c.is_finite()))
        .collect();
    if candidates.len() < N + 1 {
        debug!("Too few finite points for a full-dimensional hull.");
        return Vec::new();
    }

    let scale = coordinate_extent(points, N).max(1.0);
    let plane_eps = tolerances.plane_distance * scale;

    let Some(simplex) = initial_simplex(points, &candidates, tolerances.affine_rank * scale) else {
        debug!("No affinely independent initial simplex; point set is degenerate.");
        return Vec::new();
    };

    let mut interior = [0.0; N];
    interior.copy_from_slice(&centroid(points, &simplex, N));

    let mut facets: Vec<WorkingFacet<N>> = Vec::with_capacity(4 * (N + 1));
    for skip in 0..=N {
        let mut vertices = [0usize; N];
        for (slot, &v) in vertices
            .iter_mut()
            .zip(simplex.iter().enumerate().filter(|&(i, _)| i != skip).map(|(_, v)| v))
        {
            *slot = v;
        }
        match WorkingFacet::new(vertices, points, &interior, tolerances.affine_rank) {
            Some(facet) => facets.push(facet),
            None => {
                debug!("Initial simplex has a degenerate facet.");
                return Vec::new();
            }
        }
    }

    let remaining: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|idx| !simplex.contains(idx))
        .collect();
    assign_outside(&mut facets, 0, &remaining, points, plane_eps);

    let mut degenerate = 0usize;
    while let Some(facet_idx) = facets
        .iter()
        .position(|f| f.alive && !f.outside.is_empty())
    {
        let Some(apex) = facets[facet_idx].furthest_outside_point(points) else {
            break;
        };
        let apex_point = &points[apex];

        let visible: Vec<usize> = facets
            .iter()
            .enumerate()
            .filter(|(_, f)| f.alive && f.signed_distance(apex_point) > plane_eps)
            .map(|(i, _)| i)
            .collect();

        let horizon = horizon_ridges(&facets, &visible);

        let mut orphans = Vec::new();
        for &i in &visible {
            facets[i].alive = false;
            orphans.append(&mut facets[i].outside);
        }
        orphans.retain(|&p| p != apex);

        let first_new = facets.len();
        for ridge in &horizon {
            let mut vertices = [0usize; N];
            vertices[..N - 1].copy_from_slice(ridge);
            vertices[N - 1] = apex;
            match WorkingFacet::new(vertices, points, &interior, tolerances.affine_rank) {
                Some(facet) => facets.push(facet),
                None => {
                    degenerate += 1;
                    debug!(apex, ?ridge, "Skipping degenerate cone facet.");
                }
            }
        }
        assign_outside(&mut facets, first_new, &orphans, points, plane_eps);

        // Facets hold no cross references, so dead ones can be dropped in place.
        let dead = facets.iter().filter(|f| !f.alive).count();
        if dead > facets.len() - dead {
            facets.retain(|f| f.alive);
        }

        trace!(
            apex,
            visible = visible.len(),
            horizon = horizon.len(),
            "Extended hull to new apex."
        );
    }

    let result: Vec<Facet<N>> = facets
        .into_iter()
        .filter(|f| f.alive)
        .map(|f| f.into_facet(points))
        .collect();
    debug!(facets = result.len(), degenerate, "Quickhull finished.");
    result
}

/// Ternary systems: hull of 3D points (two composition axes plus energy).
pub fn compute_quickhull_triangles(points: &[[f64; 3]], tolerances: &Tolerances) -> Vec<Facet<3>> {
    quickhull::<3>(points, tolerances)
}

/// Quaternary systems: hull of 4D points (three composition axes plus energy).
pub fn compute_quickhull_4d(points: &[[f64; 4]], tolerances: &Tolerances) -> Vec<Facet<4>> {
    quickhull::<4>(points, tolerances)
}

/// Runtime-dimension hull for point sets whose dimension is only known at run time.
///
/// Fails when the points disagree on dimensionality or the dimension is
/// outside `2..=MAX_DIMENSION`. An empty point set yields an empty hull.
pub fn quickhull_nd(points: &[Vec<f64>], tolerances: &Tolerances) -> Result<Vec<FacetNd>, HullError> {
    let Some(dim) = common_dimension(points)? else {
        return Ok(Vec::new());
    };

    fn run<const N: usize>(points: &[Vec<f64>], tolerances: &Tolerances) -> Vec<FacetNd> {
        let fixed: Vec<[f64; N]> = points
            .iter()
            .map(|p| std::array::from_fn(|i| p[i]))
            .collect();
        quickhull::<N>(&fixed, tolerances)
            .into_iter()
            .map(FacetNd::from)
            .collect()
    }

    macro_rules! dispatch {
        ($($n:literal),*) => {
            match dim {
                $($n => Ok(run::<$n>(points, tolerances)),)*
                _ => Err(HullError::UnsupportedDimension {
                    dimension: dim,
                    max: MAX_DIMENSION,
                }),
            }
        };
    }

    dispatch!(2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12)
}

/// Shared dimensionality of a point set, or `None` when it is empty.
pub(crate) fn common_dimension<P: AsRef<[f64]>>(points: &[P]) -> Result<Option<usize>, HullError> {
    let Some(first) = points.first() else {
        return Ok(None);
    };
    let expected = first.as_ref().len();
    for (index, point) in points.iter().enumerate() {
        let found = point.as_ref().len();
        if found != expected {
            return Err(HullError::InconsistentDimension {
                index,
                expected,
                found,
            });
        }
    }
    Ok(Some(expected))
}

fn initial_simplex<const N: usize>(
    points: &[[f64; N]],
    candidates: &[usize],
    min_residual: f64,
) -> Option<Vec<usize>> {
    let mut extremes: Vec<usize> = Vec::with_capacity(2 * N);
    for axis in 0..N {
        let lo = candidates.iter().copied().min_by(|&a, &b| {
            points[a][axis]
                .total_cmp(&points[b][axis])
                .then(a.cmp(&b))
        })?;
        let hi = candidates.iter().copied().max_by(|&a, &b| {
            points[a][axis]
                .total_cmp(&points[b][axis])
                .then(b.cmp(&a))
        })?;
        extremes.push(lo);
        extremes.push(hi);
    }
    extremes.sort_unstable();
    extremes.dedup();

    let mut best_pair: Option<(usize, usize, f64)> = None;
    for (k, &a) in extremes.iter().enumerate() {
        for &b in &extremes[k + 1..] {
            let distance = squared_distance(&points[a], &points[b]).sqrt();
            if best_pair.is_none_or(|(_, _, d)| distance > d) {
                best_pair = Some((a, b, distance));
            }
        }
    }
    let (a, b, distance) = best_pair?;
    if distance <= min_residual {
        return None;
    }

    let origin = points[a];
    let mut simplex = vec![a, b];
    let mut basis: Vec<[f64; N]> = Vec::with_capacity(N);
    basis.push(scaled(&difference(&points[b], &origin), 1.0 / distance));

    while simplex.len() < N + 1 {
        let mut best: Option<(usize, f64, [f64; N])> = None;
        for &idx in candidates {
            if simplex.contains(&idx) {
                continue;
            }
            let residual = orthogonal_residual(&points[idx], &origin, &basis);
            let length = dot(&residual, &residual).sqrt();
            if best.as_ref().is_none_or(|(_, l, _)| length > *l) {
                best = Some((idx, length, residual));
            }
        }
        let (idx, length, residual) = best?;
        if length <= min_residual {
            return None;
        }
        basis.push(scaled(&residual, 1.0 / length));
        simplex.push(idx);
    }
    Some(simplex)
}

/// Ridges bounding the visible region: those belonging to exactly one visible facet.
fn horizon_ridges<const N: usize>(facets: &[WorkingFacet<N>], visible: &[usize]) -> Vec<Vec<usize>> {
    let mut counts: HashMap<Vec<usize>, usize> = HashMap::new();
    let mut first_seen: Vec<Vec<usize>> = Vec::new();
    for &i in visible {
        for ridge in facets[i].ridges() {
            let count = counts.entry(ridge.clone()).or_insert(0);
            if *count == 0 {
                first_seen.push(ridge);
            }
            *count += 1;
        }
    }
    first_seen
        .into_iter()
        .filter(|ridge| counts.get(ridge) == Some(&1))
        .collect()
}

/// Assigns each point to the live facet at index `first` or later that it is
/// furthest outside of; points outside none of them are dropped.
fn assign_outside<const N: usize>(
    facets: &mut [WorkingFacet<N>],
    first: usize,
    point_indices: &[usize],
    points: &[[f64; N]],
    plane_eps: f64,
) {
    for &p in point_indices {
        let mut best: Option<(usize, f64)> = None;
        for (i, facet) in facets.iter().enumerate().skip(first) {
            if !facet.alive {
                continue;
            }
            let distance = facet.signed_distance(&points[p]);
            if distance > plane_eps && best.is_none_or(|(_, d)| distance > d) {
                best = Some((i, distance));
            }
        }
        if let Some((i, _)) = best {
            facets[i].outside.push(p);
        }
    }
}

fn orthogonal_residual<const N: usize>(
    point: &[f64; N],
    origin: &[f64; N],
    basis: &[[f64; N]],
) -> [f64; N] {
    let mut residual = difference(point, origin);
    for direction in basis {
        let projection = dot(&residual, direction);
        for (r, d) in residual.iter_mut().zip(direction) {
            *r -= projection * d;
        }
    }
    residual
}

#[inline]
fn difference<const N: usize>(a: &[f64; N], b: &[f64; N]) -> [f64; N] {
    std::array::from_fn(|i| a[i] - b[i])
}

#[inline]
fn scaled<const N: usize>(v: &[f64; N], factor: f64) -> [f64; N] {
    std::array::from_fn(|i| v[i] * factor)
}

#[inline]
fn squared_distance<const N: usize>(a: &[f64; N], b: &[f64; N]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
