use super::config::Tolerances;
use super::error::HullError;
use super::facet::{Facet, FacetNd};
use super::lower_hull::compute_lower_hull_nd;
use super::quickhull::{quickhull, quickhull_nd};
use serde::Serialize;

/// Full convex hull of a point set together with its lower envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hull<const N: usize> {
    pub facets: Vec<Facet<N>>,
    pub lower_hull: Vec<Facet<N>>,
}

impl<const N: usize> Hull<N> {
    pub fn build(points: &[[f64; N]], tolerances: &Tolerances) -> Self {
        let facets = quickhull::<N>(points, tolerances);
        let lower_hull = compute_lower_hull_nd(&facets, tolerances);
        Self { facets, lower_hull }
    }

    /// `true` when the point set had no full-dimensional hull.
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }
}

/// Runtime-dimension counterpart of [`Hull`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HullNd {
    pub dimension: usize,
    pub facets: Vec<FacetNd>,
    pub lower_hull: Vec<FacetNd>,
}

impl HullNd {
    pub fn build(points: &[Vec<f64>], tolerances: &Tolerances) -> Result<Self, HullError> {
        let facets = quickhull_nd(points, tolerances)?;
        let lower_hull = compute_lower_hull_nd(&facets, tolerances);
        Ok(Self {
            dimension: points.first().map(Vec::len).unwrap_or_default(),
            facets,
            lower_hull,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }
}

impl<const N: usize> From<Hull<N>> for HullNd {
    fn from(hull: Hull<N>) -> Self {
        Self {
            dimension: N,
            facets: hull.facets.into_iter().map(FacetNd::from).collect(),
            lower_hull: hull.lower_hull.into_iter().map(FacetNd::from).collect(),
        }
    }
}
