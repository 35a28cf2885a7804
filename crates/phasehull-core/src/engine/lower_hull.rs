use super::config::Tolerances;
use super::facet::{Facet, HullFacet};

/// Keeps the facets whose outward normal points down the energy axis.
///
/// A facet is kept only when the energy (last) component of its unit normal
/// is below `-tolerances.lower_normal`. Vertical walls, horizontal caps and
/// upward-facing facets are discarded.
pub fn compute_lower_hull_nd<F: HullFacet + Clone>(facets: &[F], tolerances: &Tolerances) -> Vec<F> {
    facets
        .iter()
        .filter(|facet| facet.energy_normal() < -tolerances.lower_normal)
        .cloned()
        .collect()
}

pub fn compute_lower_hull_3d(facets: &[Facet<3>], tolerances: &Tolerances) -> Vec<Facet<3>> {
    compute_lower_hull_nd(facets, tolerances)
}

pub fn compute_lower_hull_4d(facets: &[Facet<4>], tolerances: &Tolerances) -> Vec<Facet<4>> {
    compute_lower_hull_nd(facets, tolerances)
}
