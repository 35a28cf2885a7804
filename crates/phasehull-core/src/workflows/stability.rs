use crate::core::entries::normalize::sanitize_composition;
use crate::core::entries::references::{
    ElementRefs, compute_e_form_per_atom, find_lowest_energy_unary_refs, first_missing_reference,
};
use crate::core::models::entry::{Composition, PhaseEntry};
use crate::core::system::ChemicalSystem;
use crate::engine::config::Tolerances;
use crate::engine::error::HullError;
use crate::engine::facet::{Facet, FacetNd};
use crate::engine::lower_hull::{compute_lower_hull_3d, compute_lower_hull_4d, compute_lower_hull_nd};
use crate::engine::monotone_chain::compute_lower_hull_2d;
use crate::engine::quickhull::{compute_quickhull_4d, compute_quickhull_triangles, quickhull_nd};
use crate::engine::query::{compute_e_above_hull_nd, e_above_hull_at, interpolate_hull_energy};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, trace, warn};

/// A lower convex hull built once for a chemical system and queried many times.
///
/// Hull coordinates are composition fractions plus formation energy per atom,
/// so the elemental references sit at zero energy. Systems of three or more
/// elements get one extra virtual point above every entry; it closes the hull
/// when the references alone are not full-dimensional and never appears on
/// the lower hull.
#[derive(Debug, Clone)]
pub struct PhaseHull {
    system: ChemicalSystem,
    el_refs: ElementRefs,
    tolerances: Tolerances,
    points: Vec<Vec<f64>>,
    lower_hull: Vec<FacetNd>,
}

impl PhaseHull {
    /// Builds the hull spanned by `reference_entries`.
    ///
    /// Every element of every reference entry must have a unary reference
    /// among them. Entries whose composition is empty after dropping invalid
    /// amounts are skipped.
    #[instrument(skip_all, name = "phase_hull_build", fields(references = reference_entries.len()))]
    pub fn build(reference_entries: &[PhaseEntry], tolerances: &Tolerances) -> Result<Self, HullError> {
        let references: Vec<PhaseEntry> = reference_entries.iter().filter_map(sanitized).collect();
        if references.is_empty() {
            return Err(HullError::EmptyReferenceSet);
        }

        let el_refs = find_lowest_energy_unary_refs(&references);
        let system = ChemicalSystem::from_entries(&references);

        let mut points = Vec::with_capacity(references.len() + 1);
        for entry in &references {
            let e_form = formation_energy(entry, &el_refs)?;
            points.push(system.point(entry, e_form)?);
        }
        if system.len() >= 3 {
            let ceiling = ceiling_point(&system, &points, tolerances);
            trace!(energy = ceiling[ceiling.len() - 1], "Added virtual ceiling point.");
            points.push(ceiling);
        }

        let lower_hull = build_lower_hull(&points, system.len(), tolerances)?;
        info!(
            system = %system,
            points = points.len(),
            lower_facets = lower_hull.len(),
            "Built phase hull."
        );

        Ok(Self {
            system,
            el_refs,
            tolerances: *tolerances,
            points,
            lower_hull,
        })
    }

    pub fn system(&self) -> &ChemicalSystem {
        &self.system
    }

    pub fn el_refs(&self) -> &ElementRefs {
        &self.el_refs
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// Hull points, including the virtual ceiling point when one was added.
    pub fn points(&self) -> &[Vec<f64>] {
        &self.points
    }

    pub fn lower_hull(&self) -> &[FacetNd] {
        &self.lower_hull
    }

    /// Formation energy per atom of `entry` against this hull's references.
    pub fn formation_energy(&self, entry: &PhaseEntry) -> Result<f64, HullError> {
        formation_energy(&prepare_query(entry)?, &self.el_refs)
    }

    /// Energy above hull of `entry` in eV/atom, never negative.
    ///
    /// Fails with [`HullError::NonFiniteEnergy`] when the entry's formation
    /// energy is NaN or infinite.
    pub fn e_above_hull(&self, entry: &PhaseEntry) -> Result<f64, HullError> {
        let entry = prepare_query(entry)?;
        let e_form = finite_formation_energy(&entry, &self.el_refs)?;
        if self.system.len() < 2 {
            return Ok(e_form.max(0.0));
        }
        let point = self.system.point(&entry, e_form)?;
        Ok(
            match e_above_hull_at(&point, &self.lower_hull, &self.points, &self.tolerances) {
                Some(value) => value,
                None => fallback_e_above_hull(&entry.entry_id, e_form),
            },
        )
    }

    /// Energy above hull for each entry, in input order.
    pub fn e_above_hull_batch(&self, entries: &[PhaseEntry]) -> Result<Vec<f64>, HullError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut queries = Vec::with_capacity(entries.len());
        let mut formation = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = prepare_query(entry)?;
            let e_form = finite_formation_energy(&entry, &self.el_refs)?;
            queries.push(self.system.point(&entry, e_form)?);
            formation.push((e_form, entry.entry_id));
        }

        if self.system.len() < 2 {
            return Ok(formation.iter().map(|(e_form, _)| e_form.max(0.0)).collect());
        }

        let results =
            compute_e_above_hull_nd(&queries, &self.lower_hull, &self.points, &self.tolerances)?;
        Ok(results
            .into_iter()
            .zip(&formation)
            .map(|(result, (e_form, entry_id))| {
                result.unwrap_or_else(|| fallback_e_above_hull(entry_id, *e_form))
            })
            .collect())
    }

    /// Formation energy of the lower hull at `composition`.
    ///
    /// `None` means the hull has no lower facets to interpolate from.
    pub fn hull_energy_at(&self, composition: &Composition) -> Result<Option<f64>, HullError> {
        let composition = sanitize_composition(composition);
        if composition.is_empty() {
            return Err(HullError::EmptyComposition { entry_id: None });
        }
        if let Some(&element) = composition.keys().find(|el| !self.el_refs.contains_key(*el)) {
            return Err(HullError::MissingElementReference {
                element,
                entry_id: None,
            });
        }
        if self.system.len() < 2 {
            return Ok(Some(0.0));
        }
        let coordinates = self.system.composition_coordinates(&composition)?;
        Ok(interpolate_hull_energy(
            &coordinates,
            &self.lower_hull,
            &self.points,
            &self.tolerances,
        ))
    }
}

/// Energy above hull of `entry` against the hull of `reference_entries`.
#[instrument(skip_all, name = "calculate_e_above_hull")]
pub fn calculate_e_above_hull(
    entry: &PhaseEntry,
    reference_entries: &[PhaseEntry],
) -> Result<f64, HullError> {
    PhaseHull::build(reference_entries, &Tolerances::default())?.e_above_hull(entry)
}

/// Energy above hull for every entry, keyed by `entry_id`.
///
/// Entries without an id are keyed `entry-{index}` by their input position.
/// An empty `entries` slice yields an empty map without touching the
/// references.
#[instrument(skip_all, name = "calculate_e_above_hull_batch", fields(entries = entries.len()))]
pub fn calculate_e_above_hull_batch(
    entries: &[PhaseEntry],
    reference_entries: &[PhaseEntry],
) -> Result<BTreeMap<String, f64>, HullError> {
    if entries.is_empty() {
        return Ok(BTreeMap::new());
    }
    let hull = PhaseHull::build(reference_entries, &Tolerances::default())?;
    let values = hull.e_above_hull_batch(entries)?;
    Ok(entries
        .iter()
        .enumerate()
        .zip(values)
        .map(|((index, entry), value)| (entry_key(entry, index), value))
        .collect())
}

/// Builds one hull from `entries` and returns copies carrying
/// `e_form_per_atom`, `e_above_hull` and `is_stable`.
///
/// Entries with an empty composition or a non-finite formation energy are
/// returned unchanged.
#[instrument(skip_all, name = "annotate_stability", fields(entries = entries.len()))]
pub fn annotate_stability(
    entries: &[PhaseEntry],
    tolerances: &Tolerances,
) -> Result<Vec<PhaseEntry>, HullError> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }
    let hull = PhaseHull::build(entries, tolerances)?;

    let mut indices = Vec::with_capacity(entries.len());
    let mut queries = Vec::with_capacity(entries.len());
    let mut formation = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Some(clean) = sanitized(entry) else {
            continue;
        };
        let e_form = formation_energy(&clean, hull.el_refs())?;
        if !e_form.is_finite() {
            debug!(entry_id = ?entry.entry_id, "Skipping entry with non-finite energy.");
            continue;
        }
        indices.push(index);
        queries.push(clean);
        formation.push(e_form);
    }
    let values = hull.e_above_hull_batch(&queries)?;

    let mut annotated = entries.to_vec();
    let mut stable = 0usize;
    for ((index, e_form), e_above_hull) in indices.into_iter().zip(formation).zip(values) {
        let is_stable = e_above_hull <= tolerances.stability;
        stable += usize::from(is_stable);
        let entry = &mut annotated[index];
        entry.e_form_per_atom = Some(e_form);
        entry.e_above_hull = Some(e_above_hull);
        entry.is_stable = Some(is_stable);
    }
    info!(stable, total = annotated.len(), "Annotated entry stability.");
    Ok(annotated)
}

fn entry_key(entry: &PhaseEntry, index: usize) -> String {
    entry
        .entry_id
        .clone()
        .unwrap_or_else(|| format!("entry-{index}"))
}

/// Copy of `entry` with invalid amounts removed, or `None` if nothing remains.
fn sanitized(entry: &PhaseEntry) -> Option<PhaseEntry> {
    let composition = sanitize_composition(&entry.composition);
    if composition.is_empty() {
        debug!(entry_id = ?entry.entry_id, "Skipping entry with empty composition.");
        return None;
    }
    let mut clean = entry.clone();
    clean.composition = composition;
    Some(clean)
}

fn prepare_query(entry: &PhaseEntry) -> Result<PhaseEntry, HullError> {
    sanitized(entry).ok_or_else(|| HullError::EmptyComposition {
        entry_id: entry.entry_id.clone(),
    })
}

fn formation_energy(entry: &PhaseEntry, el_refs: &ElementRefs) -> Result<f64, HullError> {
    if let Some(element) = first_missing_reference(entry, el_refs) {
        return Err(HullError::MissingElementReference {
            element,
            entry_id: entry.entry_id.clone(),
        });
    }
    compute_e_form_per_atom(entry, el_refs).ok_or_else(|| HullError::EmptyComposition {
        entry_id: entry.entry_id.clone(),
    })
}

fn finite_formation_energy(entry: &PhaseEntry, el_refs: &ElementRefs) -> Result<f64, HullError> {
    let e_form = formation_energy(entry, el_refs)?;
    if e_form.is_finite() {
        Ok(e_form)
    } else {
        Err(HullError::NonFiniteEnergy {
            entry_id: entry.entry_id.clone(),
        })
    }
}

fn fallback_e_above_hull(entry_id: &Option<String>, e_form: f64) -> f64 {
    warn!(
        entry_id = ?entry_id,
        e_form,
        "No lower-hull facet for entry; using its formation energy."
    );
    e_form.max(0.0)
}

/// Virtual point at the equimolar composition, above every finite energy.
fn ceiling_point(system: &ChemicalSystem, points: &[Vec<f64>], tolerances: &Tolerances) -> Vec<f64> {
    let n = system.len();
    let top = points
        .iter()
        .filter_map(|p| p.last().copied())
        .filter(|e| e.is_finite())
        .fold(0.0_f64, f64::max);
    let mut ceiling = vec![1.0 / n as f64; n - 1];
    ceiling.push(top + tolerances.energy_ceiling_margin);
    ceiling
}

fn build_lower_hull(
    points: &[Vec<f64>],
    dimension: usize,
    tolerances: &Tolerances,
) -> Result<Vec<FacetNd>, HullError> {
    match dimension {
        0 | 1 => Ok(Vec::new()),
        2 => {
            let fixed = fixed_points::<2>(points)?;
            Ok(into_nd(compute_lower_hull_2d(&fixed, tolerances)))
        }
        3 => {
            let fixed = fixed_points::<3>(points)?;
            let facets = compute_quickhull_triangles(&fixed, tolerances);
            Ok(into_nd(compute_lower_hull_3d(&facets, tolerances)))
        }
        4 => {
            let fixed = fixed_points::<4>(points)?;
            let facets = compute_quickhull_4d(&fixed, tolerances);
            Ok(into_nd(compute_lower_hull_4d(&facets, tolerances)))
        }
        _ => {
            let facets = quickhull_nd(points, tolerances)?;
            Ok(compute_lower_hull_nd(&facets, tolerances))
        }
    }
}

fn fixed_points<const N: usize>(points: &[Vec<f64>]) -> Result<Vec<[f64; N]>, HullError> {
    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            <[f64; N]>::try_from(point.as_slice()).map_err(|_| HullError::InconsistentDimension {
                index,
                expected: N,
                found: point.len(),
            })
        })
        .collect()
}

fn into_nd<const N: usize>(facets: Vec<Facet<N>>) -> Vec<FacetNd> {
    facets.into_iter().map(FacetNd::from).collect()
}
