use super::normalize::sanitize_composition;
use super::references::{ElementRefs, find_lowest_energy_unary_refs};
use crate::core::models::element::ElementSymbol;
use crate::core::models::entry::PhaseEntry;
use crate::engine::config::Tolerances;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Entry set split by stability, with the elemental references derived from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedEntries {
    pub stable_entries: Vec<PhaseEntry>,
    pub unstable_entries: Vec<PhaseEntry>,
    /// All entries with a non-empty composition, in input order. Compositions
    /// are sanitized, so zero, negative and non-finite amounts are gone.
    pub entries: Vec<PhaseEntry>,
    /// Every element appearing in `entries`, sorted and deduplicated.
    pub elements: Vec<ElementSymbol>,
    /// References built from the stable unary entries only.
    pub el_refs: ElementRefs,
}

/// Whether `entry` counts as stable.
///
/// An explicit `is_stable` flag wins. Otherwise the entry is stable when its
/// recorded `e_above_hull` is within `tolerances.stability` of zero; entries
/// with neither field are unstable.
pub fn is_entry_stable(entry: &PhaseEntry, tolerances: &Tolerances) -> bool {
    match (entry.is_stable, entry.e_above_hull) {
        (Some(flag), _) => flag,
        (None, Some(e_above_hull)) => e_above_hull <= tolerances.stability,
        (None, None) => false,
    }
}

#[instrument(skip_all, name = "process_hull_entries", fields(entries = entries.len()))]
pub fn process_hull_entries(entries: &[PhaseEntry], tolerances: &Tolerances) -> ProcessedEntries {
    let kept: Vec<PhaseEntry> = entries
        .iter()
        .filter_map(|entry| {
            let composition = sanitize_composition(&entry.composition);
            if composition.is_empty() {
                return None;
            }
            let mut clean = entry.clone();
            clean.composition = composition;
            Some(clean)
        })
        .collect();

    let elements: BTreeSet<ElementSymbol> = kept.iter().flat_map(|entry| entry.elements()).collect();

    let (stable_entries, unstable_entries): (Vec<PhaseEntry>, Vec<PhaseEntry>) = kept
        .iter()
        .cloned()
        .partition(|entry| is_entry_stable(entry, tolerances));

    let el_refs = find_lowest_energy_unary_refs(&stable_entries);

    debug!(
        kept = kept.len(),
        stable = stable_entries.len(),
        unstable = unstable_entries.len(),
        references = el_refs.len(),
        "Processed hull entries."
    );

    ProcessedEntries {
        stable_entries,
        unstable_entries,
        entries: kept,
        elements: elements.into_iter().collect(),
        el_refs,
    }
}
