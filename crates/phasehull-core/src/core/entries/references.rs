use crate::core::models::element::ElementSymbol;
use crate::core::models::entry::PhaseEntry;
use std::collections::BTreeMap;

/// One reference entry per element: its lowest-energy unary phase.
pub type ElementRefs = BTreeMap<ElementSymbol, PhaseEntry>;

/// Picks, for every element that occurs as the sole component of an entry,
/// the entry with the lowest `energy_per_atom`.
///
/// Entries with more than one element are ignored. Ties keep the entry seen
/// first; entries with a non-finite `energy_per_atom` are skipped.
pub fn find_lowest_energy_unary_refs<'a, I>(entries: I) -> ElementRefs
where
    I: IntoIterator<Item = &'a PhaseEntry>,
{
    let mut refs = ElementRefs::new();
    for entry in entries {
        let Some(element) = entry.unary_element() else {
            continue;
        };
        if !entry.energy_per_atom.is_finite() {
            continue;
        }
        match refs.get(&element) {
            Some(current) if current.energy_per_atom <= entry.energy_per_atom => {}
            _ => {
                refs.insert(element, entry.clone());
            }
        }
    }
    refs
}

/// Formation energy per atom of `entry` relative to `el_refs`.
///
/// `e_form = e_pa - Σ f_i·ref_i.e_pa + correction - Σ f_i·ref_i.correction`,
/// with `f_i` the normalized fraction of element `i` and missing corrections
/// counted as zero. Returns `None` when the composition is empty or any of
/// its elements has no reference.
pub fn compute_e_form_per_atom(entry: &PhaseEntry, el_refs: &ElementRefs) -> Option<f64> {
    let fractions = entry.fractions();
    if fractions.is_empty() {
        return None;
    }
    let mut reference_energy = 0.0;
    let mut reference_correction = 0.0;
    for (element, fraction) in &fractions {
        let reference = el_refs.get(element)?;
        reference_energy += fraction * reference.energy_per_atom;
        reference_correction += fraction * reference.correction.unwrap_or(0.0);
    }
    Some(
        entry.energy_per_atom - reference_energy + entry.correction.unwrap_or(0.0)
            - reference_correction,
    )
}

/// First element of `entry` (in canonical order) that has no reference.
pub fn first_missing_reference(entry: &PhaseEntry, el_refs: &ElementRefs) -> Option<ElementSymbol> {
    entry.elements().find(|el| !el_refs.contains_key(el))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::entry::Composition;

    fn el(symbol: &str) -> ElementSymbol {
        symbol.parse().unwrap()
    }

    fn entry(pairs: &[(&str, f64)], energy_per_atom: f64) -> PhaseEntry {
        let composition: Composition = pairs.iter().map(|&(s, n)| (el(s), n)).collect();
        let atoms: f64 = composition.values().sum();
        PhaseEntry::new(composition, energy_per_atom * atoms)
    }

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn selects_lowest_energy_polymorph() {
        let entries = vec![
            entry(&[("Fe", 1.0)], -3.5).with_id("fe-a"),
            entry(&[("Fe", 2.0)], -4.0).with_id("fe-b"),
            entry(&[("Fe", 1.0)], -3.8).with_id("fe-c"),
        ];
        let refs = find_lowest_energy_unary_refs(&entries);
        assert_eq!(refs.len(), 1);
        assert!(f64_approx_equal(refs[&el("Fe")].energy_per_atom, -4.0));
        assert_eq!(refs[&el("Fe")].entry_id.as_deref(), Some("fe-b"));
    }

    #[test]
    fn ignores_non_unary_entries() {
        let entries = vec![
            entry(&[("Fe", 1.0), ("O", 1.0)], -10.0),
            entry(&[("O", 2.0)], -4.9),
        ];
        let refs = find_lowest_energy_unary_refs(&entries);
        assert_eq!(refs.keys().copied().collect::<Vec<_>>(), vec![el("O")]);
    }

    #[test]
    fn ties_keep_first_entry() {
        let entries = vec![
            entry(&[("Li", 1.0)], -1.9).with_id("first"),
            entry(&[("Li", 1.0)], -1.9).with_id("second"),
        ];
        let refs = find_lowest_energy_unary_refs(&entries);
        assert_eq!(refs[&el("Li")].entry_id.as_deref(), Some("first"));
    }

    #[test]
    fn formation_energy_of_element_reference_is_zero() {
        let fe = entry(&[("Fe", 1.0)], -4.0);
        let refs = find_lowest_energy_unary_refs([&fe]);
        assert!(f64_approx_equal(compute_e_form_per_atom(&fe, &refs).unwrap(), 0.0));
    }

    #[test]
    fn formation_energy_uses_normalized_fractions() {
        let refs = find_lowest_energy_unary_refs(&[
            entry(&[("Fe", 1.0)], -4.0),
            entry(&[("O", 1.0)], -2.0),
        ]);
        // Fe2O3: 0.4 * -4 + 0.6 * -2 = -2.8
        let fe2o3 = entry(&[("Fe", 2.0), ("O", 3.0)], -3.5);
        assert!(f64_approx_equal(compute_e_form_per_atom(&fe2o3, &refs).unwrap(), -0.7));
    }

    #[test]
    fn formation_energy_applies_corrections() {
        let refs = find_lowest_energy_unary_refs(&[
            entry(&[("Fe", 1.0)], -4.0).with_correction(0.2),
            entry(&[("O", 1.0)], -2.0),
        ]);
        let feo = entry(&[("Fe", 1.0), ("O", 1.0)], -3.5).with_correction(-0.3);
        // -3.5 - (-3.0) + (-0.3) - 0.1
        assert!(f64_approx_equal(compute_e_form_per_atom(&feo, &refs).unwrap(), -0.9));
    }

    #[test]
    fn formation_energy_is_none_when_reference_missing() {
        let refs = find_lowest_energy_unary_refs(&[entry(&[("Fe", 1.0)], -4.0)]);
        let feo = entry(&[("Fe", 1.0), ("O", 1.0)], -3.5);
        assert!(compute_e_form_per_atom(&feo, &refs).is_none());
        assert_eq!(first_missing_reference(&feo, &refs), Some(el("O")));
    }

    #[test]
    fn formation_energy_is_none_for_empty_composition() {
        let refs = ElementRefs::new();
        let empty = PhaseEntry::new(Composition::new(), -1.0);
        assert!(compute_e_form_per_atom(&empty, &refs).is_none());
    }
}
