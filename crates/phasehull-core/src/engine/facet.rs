use serde::Serialize;

/// Common view over fixed- and runtime-dimension facets.
pub trait HullFacet {
    /// Indices into the point set the hull was built from.
    fn vertex_indices(&self) -> &[usize];
    /// Outward unit normal.
    fn normal(&self) -> &[f64];
    fn centroid(&self) -> &[f64];

    /// Energy (last) component of the outward normal.
    fn energy_normal(&self) -> f64 {
        self.normal().last().copied().unwrap_or(0.0)
    }
}

/// A hull facet in `N` dimensions: a simplex of `N` affinely independent vertices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facet<const N: usize> {
    #[serde(with = "serde_arrays")]
    pub vertices: [usize; N],
    #[serde(with = "serde_arrays")]
    pub normal: [f64; N],
    #[serde(with = "serde_arrays")]
    pub centroid: [f64; N],
    /// Plane offset: points `x` on the facet satisfy `normal · x = offset`.
    pub offset: f64,
}

impl<const N: usize> HullFacet for Facet<N> {
    fn vertex_indices(&self) -> &[usize] {
        &self.vertices
    }
    fn normal(&self) -> &[f64] {
        &self.normal
    }
    fn centroid(&self) -> &[f64] {
        &self.centroid
    }
}

/// Runtime-dimension facet, produced by [`crate::engine::quickhull::quickhull_nd`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetNd {
    pub vertices: Vec<usize>,
    pub normal: Vec<f64>,
    pub centroid: Vec<f64>,
    pub offset: f64,
}

impl HullFacet for FacetNd {
    fn vertex_indices(&self) -> &[usize] {
        &self.vertices
    }
    fn normal(&self) -> &[f64] {
        &self.normal
    }
    fn centroid(&self) -> &[f64] {
        &self.centroid
    }
}

impl<const N: usize> From<Facet<N>> for FacetNd {
    fn from(facet: Facet<N>) -> Self {
        Self {
            vertices: facet.vertices.to_vec(),
            normal: facet.normal.to_vec(),
            centroid: facet.centroid.to_vec(),
            offset: facet.offset,
        }
    }
}

mod serde_arrays {
    use serde::Serializer;
    use serde::ser::SerializeSeq;

    pub fn serialize<S, T, const N: usize>(values: &[T; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: serde::Serialize,
    {
        let mut seq = serializer.serialize_seq(Some(N))?;
        for value in values {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facet_converts_to_runtime_form() {
        let facet = Facet::<3> {
            vertices: [0, 1, 2],
            normal: [0.0, 0.0, -1.0],
            centroid: [1.0 / 3.0, 1.0 / 3.0, 0.0],
            offset: 0.0,
        };
        let nd = FacetNd::from(facet.clone());
        assert_eq!(nd.vertex_indices(), facet.vertex_indices());
        assert_eq!(nd.normal(), facet.normal());
        assert_eq!(nd.energy_normal(), -1.0);
    }

    #[test]
    fn facet_serializes_arrays_as_sequences() {
        let facet = Facet::<2> {
            vertices: [3, 7],
            normal: [0.0, -1.0],
            centroid: [0.5, 0.0],
            offset: 0.0,
        };
        let text = toml::to_string(&facet).unwrap();
        assert!(text.contains("vertices = [3, 7]"));
    }
}
