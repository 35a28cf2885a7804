use super::config::Tolerances;
use super::error::HullError;
use super::facet::{Facet, HullFacet};
use super::geometry::barycentric_weights;
use super::quickhull::common_dimension;
use std::collections::BTreeMap;
use tracing::{instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A lower-hull facet located for a composition, with the barycentric weights
/// of that composition over the facet's vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetLocation<'a, F> {
    pub facet: &'a F,
    pub weights: Vec<f64>,
    /// Whether all weights lie in `[0, 1]` within tolerance. When `false` the
    /// facet is the closest match rather than a containing facet.
    pub contained: bool,
}

/// Finds the lower-hull facet whose composition projection contains `composition`.
///
/// The first containing facet in `facets` order is returned. If none contains
/// it, the facet with the smallest sum of negative weights is returned as the
/// closest match. Facets whose projection is singular are skipped.
pub fn locate_facet<'a, F, P>(
    composition: &[f64],
    facets: &'a [F],
    points: &[P],
    tolerances: &Tolerances,
) -> Option<FacetLocation<'a, F>>
where
    F: HullFacet,
    P: AsRef<[f64]>,
{
    let slack = tolerances.barycentric;
    let mut closest: Option<(f64, &'a F, Vec<f64>)> = None;

    for facet in facets {
        let Some(weights) = barycentric_weights(composition, facet.vertex_indices(), points) else {
            continue;
        };
        if weights.iter().all(|&w| w >= -slack && w <= 1.0 + slack) {
            return Some(FacetLocation {
                facet,
                weights,
                contained: true,
            });
        }
        let violation: f64 = weights.iter().filter(|&&w| w < 0.0).map(|w| -w).sum();
        if closest.as_ref().is_none_or(|(v, _, _)| violation < *v) {
            closest = Some((violation, facet, weights));
        }
    }

    closest.map(|(violation, facet, weights)| {
        trace!(violation, "No containing facet; using closest match.");
        FacetLocation {
            facet,
            weights,
            contained: false,
        }
    })
}

/// Energy of the lower hull at `composition` (the first `dim - 1` coordinates).
///
/// Returns `None` when there are no usable lower-hull facets.
pub fn interpolate_hull_energy<F, P>(
    composition: &[f64],
    facets: &[F],
    points: &[P],
    tolerances: &Tolerances,
) -> Option<f64>
where
    F: HullFacet,
    P: AsRef<[f64]>,
{
    let location = locate_facet(composition, facets, points, tolerances)?;
    Some(
        location
            .facet
            .vertex_indices()
            .iter()
            .zip(&location.weights)
            .map(|(&v, w)| {
                let vertex = points[v].as_ref();
                w * vertex[vertex.len() - 1]
            })
            .sum(),
    )
}

/// Energy above hull of a single point whose last coordinate is its energy.
///
/// `None` when the energy is not finite or no lower-hull facet is available.
pub fn e_above_hull_at<F, P>(
    point: &[f64],
    facets: &[F],
    points: &[P],
    tolerances: &Tolerances,
) -> Option<f64>
where
    F: HullFacet,
    P: AsRef<[f64]>,
{
    let (energy, composition) = point.split_last()?;
    if !energy.is_finite() {
        trace!(energy, "Query energy is not finite.");
        return None;
    }
    let hull_energy = interpolate_hull_energy(composition, facets, points, tolerances)?;
    Some((energy - hull_energy).max(0.0))
}

/// Energy above hull for each query point, in input order.
///
/// Hull points must share one dimension `d`. A query of length `d` is a
/// composition plus energy and yields its distance above the hull; a query of
/// length `d - 1` is a composition alone and yields the hull energy there.
/// Any other length is an input error. An entry is `None` when its energy is
/// not finite or no lower-hull facet is available.
#[instrument(skip_all, name = "e_above_hull_nd", fields(queries = queries.len(), facets = lower_hull.len()))]
pub fn compute_e_above_hull_nd<Q, F, P>(
    queries: &[Q],
    lower_hull: &[F],
    points: &[P],
    tolerances: &Tolerances,
) -> Result<Vec<Option<f64>>, HullError>
where
    Q: AsRef<[f64]> + Sync,
    F: HullFacet + Sync,
    P: AsRef<[f64]> + Sync,
{
    if queries.is_empty() {
        return Ok(Vec::new());
    }
    let Some(expected) = common_dimension(points)? else {
        return Ok(vec![None; queries.len()]);
    };
    for (index, query) in queries.iter().enumerate() {
        let found = query.as_ref().len();
        if found != expected && found + 1 != expected {
            return Err(HullError::InconsistentDimension {
                index,
                expected,
                found,
            });
        }
    }

    #[cfg(not(feature = "parallel"))]
    let iterator = queries.iter();

    #[cfg(feature = "parallel")]
    let iterator = queries.par_iter();

    Ok(iterator
        .map(|query| {
            let query = query.as_ref();
            if query.len() == expected {
                e_above_hull_at(query, lower_hull, points, tolerances)
            } else {
                interpolate_hull_energy(query, lower_hull, points, tolerances)
            }
        })
        .collect())
}

/// Keyed variant of [`compute_e_above_hull_nd`]: returns one value per key.
pub fn compute_e_above_hull_keyed<K, Q, F, P>(
    queries: &BTreeMap<K, Q>,
    lower_hull: &[F],
    points: &[P],
    tolerances: &Tolerances,
) -> Result<BTreeMap<K, Option<f64>>, HullError>
where
    K: Ord + Clone,
    Q: AsRef<[f64]> + Sync,
    F: HullFacet + Sync,
    P: AsRef<[f64]> + Sync,
{
    let (keys, values): (Vec<&K>, Vec<&Q>) = queries.iter().unzip();
    let values: Vec<&[f64]> = values.into_iter().map(|q| q.as_ref()).collect();
    let results = compute_e_above_hull_nd(&values, lower_hull, points, tolerances)?;
    Ok(keys.into_iter().cloned().zip(results).collect())
}

pub fn compute_e_above_hull_3d(
    queries: &[[f64; 3]],
    lower_hull: &[Facet<3>],
    points: &[[f64; 3]],
    tolerances: &Tolerances,
) -> Vec<Option<f64>> {
    batch_e_above_hull(queries, lower_hull, points, tolerances)
}

pub fn compute_e_above_hull_4d(
    queries: &[[f64; 4]],
    lower_hull: &[Facet<4>],
    points: &[[f64; 4]],
    tolerances: &Tolerances,
) -> Vec<Option<f64>> {
    batch_e_above_hull(queries, lower_hull, points, tolerances)
}

fn batch_e_above_hull<Q, F, P>(
    queries: &[Q],
    lower_hull: &[F],
    points: &[P],
    tolerances: &Tolerances,
) -> Vec<Option<f64>>
where
    Q: AsRef<[f64]> + Sync,
    F: HullFacet + Sync,
    P: AsRef<[f64]> + Sync,
{
    #[cfg(not(feature = "parallel"))]
    let iterator = queries.iter();

    #[cfg(feature = "parallel")]
    let iterator = queries.par_iter();

    iterator
        .map(|query| e_above_hull_at(query.as_ref(), lower_hull, points, tolerances))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::facet::FacetNd;
    use crate::engine::lower_hull::{compute_lower_hull_3d, compute_lower_hull_4d, compute_lower_hull_nd};
    use crate::engine::quickhull::{compute_quickhull_4d, compute_quickhull_triangles, quickhull_nd};

    fn tol() -> Tolerances {
        Tolerances::default()
    }

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    fn ternary_points() -> Vec<[f64; 3]> {
        vec![
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
            [0.4, 0.3, -0.8],
            [0.2, 0.2, 0.6],
            [1.0 / 3.0, 1.0 / 3.0, 2.0],
        ]
    }

    fn ternary_lower_hull() -> (Vec<[f64; 3]>, Vec<Facet<3>>) {
        let points = ternary_points();
        let facets = compute_quickhull_triangles(&points, &tol());
        let lower = compute_lower_hull_3d(&facets, &tol());
        (points, lower)
    }

    #[test]
    fn hull_vertices_have_zero_e_above_hull() {
        let (points, lower) = ternary_lower_hull();
        for vertex in &points[..4] {
            let e = e_above_hull_at(vertex, &lower, &points, &tol()).unwrap();
            assert!(f64_approx_equal(e, 0.0), "vertex {vertex:?} gave {e}");
        }
    }

    #[test]
    fn point_above_hull_reports_vertical_distance() {
        let (points, lower) = ternary_lower_hull();
        let hull_energy = interpolate_hull_energy(&[0.2, 0.2], &lower, &points, &tol()).unwrap();
        let e = e_above_hull_at(&[0.2, 0.2, 0.6], &lower, &points, &tol()).unwrap();
        assert!(f64_approx_equal(e, 0.6 - hull_energy));
        assert!(hull_energy < 0.0);
    }

    #[test]
    fn points_below_hull_are_clamped_to_zero() {
        let (points, lower) = ternary_lower_hull();
        let e = e_above_hull_at(&[0.4, 0.3, -5.0], &lower, &points, &tol()).unwrap();
        assert_eq!(e, 0.0);
    }

    #[test]
    fn locate_facet_falls_back_to_closest_match_outside_hull() {
        let (points, lower) = ternary_lower_hull();
        let location = locate_facet(&[1.0 + 1e-6, 0.0], &lower, &points, &tol()).unwrap();
        assert!(!location.contained);
        let inside = locate_facet(&[0.1, 0.1], &lower, &points, &tol()).unwrap();
        assert!(inside.contained);
        assert!(inside.weights.iter().all(|&w| w >= -1e-9));
        assert!(f64_approx_equal(inside.weights.iter().sum::<f64>(), 1.0));
    }

    #[test]
    fn no_lower_facets_yields_none() {
        let facets: Vec<Facet<3>> = Vec::new();
        let points = ternary_points();
        assert!(e_above_hull_at(&[0.2, 0.2, 0.0], &facets, &points, &tol()).is_none());
        let results = compute_e_above_hull_3d(&[[0.2, 0.2, 0.0]], &facets, &points, &tol());
        assert_eq!(results, vec![None]);
    }

    #[test]
    fn asymmetric_five_component_hull_interpolates_corner_energies() {
        let corners = [-1.0, -2.0, -3.0, -4.0, -5.0];
        let mut points: Vec<Vec<f64>> = Vec::new();
        for (axis, &energy) in corners.iter().enumerate() {
            let mut p = vec![0.0; 5];
            if axis < 4 {
                p[axis] = 1.0;
            }
            p[4] = energy;
            points.push(p);
        }
        points.push(vec![0.2, 0.2, 0.2, 0.2, 10.0]);

        let facets = quickhull_nd(&points, &tol()).unwrap();
        let lower: Vec<FacetNd> = compute_lower_hull_nd(&facets, &tol());
        assert_eq!(lower.len(), 1);

        let query = vec![vec![0.25, 0.25, 0.25, 0.25, 0.0]];
        let results = compute_e_above_hull_nd(&query, &lower, &points, &tol()).unwrap();
        assert!(f64_approx_equal(results[0].unwrap(), 2.5));
    }

    #[test]
    fn quaternary_vertex_query_is_on_hull() {
        let points = [
            [0.0, 0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.25, 0.25, 0.25, -0.5],
            [0.25, 0.25, 0.25, 2.0],
        ];
        let lower = compute_lower_hull_4d(&compute_quickhull_4d(&points, &tol()), &tol());
        let results = compute_e_above_hull_4d(
            &[[0.25, 0.25, 0.25, -0.5], [0.25, 0.25, 0.25, 0.0]],
            &lower,
            &points,
            &tol(),
        );
        assert!(f64_approx_equal(results[0].unwrap(), 0.0));
        assert!(f64_approx_equal(results[1].unwrap(), 0.5));
    }

    #[test]
    fn mismatched_query_dimension_is_rejected() {
        let (points, lower) = ternary_lower_hull();
        let queries = vec![vec![0.2, 0.2, 0.0], vec![0.2]];
        assert_eq!(
            compute_e_above_hull_nd(&queries, &lower, &points, &tol()),
            Err(HullError::InconsistentDimension {
                index: 1,
                expected: 3,
                found: 1
            })
        );
        let too_long = vec![vec![0.2, 0.2, 0.0, 0.0]];
        assert!(compute_e_above_hull_nd(&too_long, &lower, &points, &tol()).is_err());
    }

    #[test]
    fn composition_only_queries_return_hull_energy() {
        let (points, lower) = ternary_lower_hull();
        let hull_energy = interpolate_hull_energy(&[0.3, 0.3], &lower, &points, &tol()).unwrap();
        assert!(hull_energy < 0.0);

        let queries = vec![vec![0.3, 0.3], vec![0.3, 0.3, 0.1], vec![0.4, 0.3]];
        let results = compute_e_above_hull_nd(&queries, &lower, &points, &tol()).unwrap();
        assert!(f64_approx_equal(results[0].unwrap(), hull_energy));
        assert!(f64_approx_equal(results[1].unwrap(), 0.1 - hull_energy));
        assert!(f64_approx_equal(results[2].unwrap(), -0.8));
    }

    #[test]
    fn non_finite_query_energy_yields_none() {
        let (points, lower) = ternary_lower_hull();
        assert!(e_above_hull_at(&[0.2, 0.2, f64::NAN], &lower, &points, &tol()).is_none());
        let queries = vec![[0.2, 0.2, f64::NAN], [0.2, 0.2, f64::INFINITY], [0.4, 0.3, -0.8]];
        let results = compute_e_above_hull_nd(&queries, &lower, &points, &tol()).unwrap();
        assert_eq!(results[0], None);
        assert_eq!(results[1], None);
        assert!(f64_approx_equal(results[2].unwrap(), 0.0));
    }

    #[test]
    fn empty_batches_return_empty_results() {
        let (points, lower) = ternary_lower_hull();
        let queries: Vec<[f64; 3]> = Vec::new();
        assert!(compute_e_above_hull_nd(&queries, &lower, &points, &tol())
            .unwrap()
            .is_empty());
        let keyed: BTreeMap<String, [f64; 3]> = BTreeMap::new();
        assert!(compute_e_above_hull_keyed(&keyed, &lower, &points, &tol())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn keyed_batch_preserves_keys() {
        let (points, lower) = ternary_lower_hull();
        let queries = BTreeMap::from([
            ("stable".to_string(), [0.4, 0.3, -0.8]),
            ("corner".to_string(), [0.0, 0.0, 0.25]),
        ]);
        let results = compute_e_above_hull_keyed(&queries, &lower, &points, &tol()).unwrap();
        assert_eq!(results.len(), 2);
        assert!(f64_approx_equal(results["stable"].unwrap(), 0.0));
        assert!(f64_approx_equal(results["corner"].unwrap(), 0.25));
    }
}
