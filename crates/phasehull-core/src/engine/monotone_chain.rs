use super::config::Tolerances;
use super::facet::Facet;
use super::geometry::coordinate_extent;
use super::lower_hull::compute_lower_hull_nd;
use tracing::{debug, instrument};

/// Lower hull of binary-system points `[composition, energy]` by Andrew's
/// monotone chain.
///
/// Points are scanned in order of composition, then energy, then index. A
/// point is popped from the chain when it does not lie strictly below the
/// segment joining its neighbours by more than the plane tolerance, matching
/// the outside test of the general engine. The resulting segments go through
/// the same lower-hull filter, so vertical end segments are dropped and the
/// output equals `compute_lower_hull_nd(quickhull::<2>(points))` up to facet order.
#[instrument(skip_all, name = "lower_hull_2d", fields(points = points.len()))]
pub fn compute_lower_hull_2d(points: &[[f64; 2]], tolerances: &Tolerances) -> Vec<Facet<2>> {
    let mut order: Vec<usize> = (0..points.len())
        .filter(|&i| points[i].iter().all(|c| c.is_finite()))
        .collect();
    if order.len() < 2 {
        return Vec::new();
    }
    order.sort_by(|&a, &b| {
        points[a][0]
            .total_cmp(&points[b][0])
            .then(points[a][1].total_cmp(&points[b][1]))
            .then(a.cmp(&b))
    });

    let plane_eps = tolerances.plane_distance * coordinate_extent(points, 2).max(1.0);

    let mut chain: Vec<usize> = Vec::with_capacity(order.len());
    for &idx in &order {
        while chain.len() >= 2 {
            let o = points[chain[chain.len() - 2]];
            let a = points[chain[chain.len() - 1]];
            let b = points[idx];
            let base = ((b[0] - o[0]).powi(2) + (b[1] - o[1]).powi(2)).sqrt();
            // Distance of `a` below the line o -> b, scaled by |ob|.
            let cross = (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0]);
            if cross <= plane_eps * base {
                chain.pop();
            } else {
                break;
            }
        }
        chain.push(idx);
    }

    let segments: Vec<Facet<2>> = chain
        .windows(2)
        .filter_map(|pair| segment_facet(points, pair[0], pair[1]))
        .collect();
    let lower = compute_lower_hull_nd(&segments, tolerances);
    debug!(segments = lower.len(), "Monotone chain finished.");
    lower
}

/// Segment from `left` to `right` with its outward (downward-right-hand) normal.
fn segment_facet(points: &[[f64; 2]], left: usize, right: usize) -> Option<Facet<2>> {
    let a = points[left];
    let b = points[right];
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let length = (dx * dx + dy * dy).sqrt();
    if !length.is_finite() || length <= 0.0 {
        return None;
    }
    let normal = [dy / length, -dx / length];
    Some(Facet {
        vertices: [left, right],
        normal,
        centroid: [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0],
        offset: normal[0] * a[0] + normal[1] * a[1],
    })
}
