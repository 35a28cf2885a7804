use nalgebra::{DMatrix, DVector};

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn centroid<P: AsRef<[f64]>>(points: &[P], vertices: &[usize], dim: usize) -> Vec<f64> {
    let mut center = vec![0.0; dim];
    if vertices.is_empty() {
        return center;
    }
    for &v in vertices {
        for (c, x) in center.iter_mut().zip(points[v].as_ref()) {
            *c += x;
        }
    }
    let count = vertices.len() as f64;
    center.iter_mut().for_each(|c| *c /= count);
    center
}

/// Largest coordinate span of the point set along any axis.
pub(crate) fn coordinate_extent<P: AsRef<[f64]>>(points: &[P], dim: usize) -> f64 {
    (0..dim)
        .map(|axis| {
            let (lo, hi) = points
                .iter()
                .map(|p| p.as_ref()[axis])
                .filter(|x| x.is_finite())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                    (lo.min(x), hi.max(x))
                });
            if hi >= lo { hi - lo } else { 0.0 }
        })
        .fold(0.0, f64::max)
}

/// Hyperplane through `vertices.len()` points of that same dimension.
///
/// The normal is the generalized cross product of the edge vectors from the
/// first vertex, computed from signed cofactors. Returns `None` when the
/// vertices are affinely dependent, measured as the normal magnitude relative
/// to the product of edge lengths falling to or below `min_sine`.
pub(crate) fn hyperplane<P: AsRef<[f64]>>(
    points: &[P],
    vertices: &[usize],
    min_sine: f64,
) -> Option<(Vec<f64>, f64)> {
    let dim = vertices.len();
    if dim < 2 {
        return None;
    }
    let origin = points[vertices[0]].as_ref();
    let edges = DMatrix::from_fn(dim - 1, dim, |r, c| {
        points[vertices[r + 1]].as_ref()[c] - origin[c]
    });

    let edge_length_product: f64 = edges.row_iter().map(|row| row.norm()).product();
    if edge_length_product.is_nan() || edge_length_product <= 0.0 {
        return None;
    }

    let mut normal: Vec<f64> = (0..dim)
        .map(|j| {
            let minor = edges.clone().remove_column(j);
            let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
            sign * minor.determinant()
        })
        .collect();

    let norm = dot(&normal, &normal).sqrt();
    if !norm.is_finite() || norm <= min_sine * edge_length_product {
        return None;
    }
    normal.iter_mut().for_each(|n| *n /= norm);
    let offset = dot(&normal, origin);
    Some((normal, offset))
}

/// Barycentric weights of `composition` with respect to the composition
/// projection of a facet.
///
/// Each vertex contributes its first `dim - 1` coordinates. The weights solve
/// `Σ w_i · vertex_i = composition` together with `Σ w_i = 1`. Returns `None`
/// when the projected facet is singular.
pub(crate) fn barycentric_weights<P: AsRef<[f64]>>(
    composition: &[f64],
    vertices: &[usize],
    points: &[P],
) -> Option<Vec<f64>> {
    let n = vertices.len();
    if n == 0 || composition.len() + 1 != n {
        return None;
    }
    let a = DMatrix::from_fn(n, n, |r, c| {
        if r + 1 < n {
            points[vertices[c]].as_ref()[r]
        } else {
            1.0
        }
    });
    let b = DVector::from_fn(n, |r, _| if r + 1 < n { composition[r] } else { 1.0 });
    let weights = a.lu().solve(&b)?;
    if weights.iter().any(|w| !w.is_finite()) {
        return None;
    }
    Some(weights.iter().copied().collect())
}
