use crate::core::entries::processing::is_entry_stable;
use crate::core::models::element::ElementSymbol;
use crate::core::models::entry::PhaseEntry;
use crate::engine::config::Tolerances;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Entry counts by number of distinct elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArityCounts {
    pub unary: usize,
    pub binary: usize,
    pub ternary: usize,
    pub quaternary: usize,
    /// Five or more elements.
    pub higher: usize,
}

impl ArityCounts {
    fn record(&mut self, arity: usize) {
        match arity {
            0 => {}
            1 => self.unary += 1,
            2 => self.binary += 1,
            3 => self.ternary += 1,
            4 => self.quaternary += 1,
            _ => self.higher += 1,
        }
    }
}

/// Summary of a phase dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseStats {
    pub total_entries: usize,
    pub by_arity: ArityCounts,
    pub stable: usize,
    pub unstable: usize,
    /// Entries with neither a stability flag nor a recorded `e_above_hull`.
    pub unclassified: usize,
    pub elements: Vec<ElementSymbol>,
    /// Minimum and maximum finite `e_form_per_atom`.
    pub e_form_range: Option<(f64, f64)>,
    pub max_e_above_hull: Option<f64>,
    pub mean_e_above_hull: Option<f64>,
}

/// Summarizes `entries` using the values already recorded on them.
///
/// Stability follows the same rule as entry processing with default
/// tolerances. Non-finite energies are left out of the energy figures.
#[instrument(skip_all, name = "phase_stats", fields(entries = entries.len()))]
pub fn compute_phase_stats(entries: &[PhaseEntry]) -> PhaseStats {
    let tolerances = Tolerances::default();
    let mut stats = PhaseStats {
        total_entries: entries.len(),
        ..PhaseStats::default()
    };
    let mut elements = BTreeSet::new();
    let mut e_above_hull_sum = 0.0;
    let mut e_above_hull_count = 0usize;

    for entry in entries {
        stats.by_arity.record(entry.arity());
        elements.extend(entry.elements());

        if entry.is_stable.is_none() && entry.e_above_hull.is_none() {
            stats.unclassified += 1;
        } else if is_entry_stable(entry, &tolerances) {
            stats.stable += 1;
        } else {
            stats.unstable += 1;
        }

        if let Some(e_form) = entry.e_form_per_atom.filter(|e| e.is_finite()) {
            stats.e_form_range = Some(match stats.e_form_range {
                Some((lo, hi)) => (lo.min(e_form), hi.max(e_form)),
                None => (e_form, e_form),
            });
        }

        if let Some(e_above_hull) = entry.e_above_hull.filter(|e| e.is_finite()) {
            e_above_hull_sum += e_above_hull;
            e_above_hull_count += 1;
            stats.max_e_above_hull = Some(
                stats
                    .max_e_above_hull
                    .map_or(e_above_hull, |max| max.max(e_above_hull)),
            );
        }
    }

    if e_above_hull_count > 0 {
        stats.mean_e_above_hull = Some(e_above_hull_sum / e_above_hull_count as f64);
    }
    stats.elements = elements.into_iter().collect();

    debug!(
        elements = stats.elements.len(),
        stable = stats.stable,
        unstable = stats.unstable,
        "Computed phase statistics."
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::entry::Composition;

    fn el(symbol: &str) -> ElementSymbol {
        symbol.parse().unwrap()
    }

    fn entry(symbols: &[&str]) -> PhaseEntry {
        let composition: Composition = symbols.iter().map(|s| (el(s), 1.0)).collect();
        PhaseEntry::new(composition, -1.0)
    }

    fn annotated(symbols: &[&str], e_form: f64, e_above_hull: f64) -> PhaseEntry {
        let mut e = entry(symbols);
        e.e_form_per_atom = Some(e_form);
        e.e_above_hull = Some(e_above_hull);
        e
    }

    #[test]
    fn counts_entries_by_arity() {
        let entries = vec![
            entry(&["Fe"]),
            entry(&["O"]),
            entry(&["Fe", "O"]),
            entry(&["Fe", "Li", "O"]),
            entry(&["Fe", "Li", "O", "P"]),
            entry(&["Fe", "Li", "Mn", "O", "P"]),
            PhaseEntry::new(Composition::new(), 0.0),
        ];
        let stats = compute_phase_stats(&entries);
        assert_eq!(stats.total_entries, 7);
        assert_eq!(
            stats.by_arity,
            ArityCounts {
                unary: 2,
                binary: 1,
                ternary: 1,
                quaternary: 1,
                higher: 1,
            }
        );
        assert_eq!(
            stats.elements,
            vec![el("Fe"), el("Li"), el("Mn"), el("O"), el("P")]
        );
        assert_eq!(stats.unclassified, 7);
    }

    #[test]
    fn summarizes_recorded_energies() {
        let entries = vec![
            annotated(&["Fe"], 0.0, 0.0),
            annotated(&["Fe", "O"], -0.5, 0.0),
            annotated(&["Fe", "O"], -0.2, 0.3),
            annotated(&["O"], 0.1, 0.1),
            entry(&["Li"]).with_stability(true),
        ];
        let stats = compute_phase_stats(&entries);
        assert_eq!(stats.stable, 3);
        assert_eq!(stats.unstable, 2);
        assert_eq!(stats.unclassified, 0);
        assert_eq!(stats.e_form_range, Some((-0.5, 0.1)));
        assert_eq!(stats.max_e_above_hull, Some(0.3));
        assert!((stats.mean_e_above_hull.unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn non_finite_energies_are_ignored() {
        let entries = vec![annotated(&["Fe"], f64::NAN, f64::INFINITY)];
        let stats = compute_phase_stats(&entries);
        assert!(stats.e_form_range.is_none());
        assert!(stats.max_e_above_hull.is_none());
        assert!(stats.mean_e_above_hull.is_none());
    }

    #[test]
    fn empty_dataset() {
        let stats = compute_phase_stats(&[]);
        assert_eq!(stats, PhaseStats::default());
    }
}
