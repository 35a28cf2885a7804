use super::element::ElementSymbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Amounts (or fractions) per element, iterated in canonical element order.
pub type Composition = BTreeMap<ElementSymbol, f64>;

/// Composition as supplied by a dataset, keyed by arbitrary strings such as `"Fe2+"`.
pub type RawComposition = BTreeMap<String, f64>;

/// A single computed phase: a composition together with its energy.
///
/// Entries are treated as read-only inputs. Derived quantities such as
/// formation energy or distance to the hull are computed into new values
/// rather than written back, except by [`crate::workflows::stability::annotate_stability`],
/// which returns annotated copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseEntry {
    /// Element amounts. They need not sum to one.
    pub composition: Composition,
    /// Total energy of the entry in eV.
    pub energy: f64,
    /// Energy per atom in eV/atom.
    pub energy_per_atom: f64,
    /// Formation energy per atom relative to the elemental references, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_form_per_atom: Option<f64>,
    /// Energy correction in eV/atom (e.g. anion or Hubbard-U corrections).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_stable: Option<bool>,
    /// Previously computed distance to the hull in eV/atom, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_above_hull: Option<f64>,
}

impl PhaseEntry {
    /// Creates an entry from a composition and its total energy.
    ///
    /// `energy_per_atom` is derived from the total amount of the composition;
    /// an empty composition yields an `energy_per_atom` equal to `energy`.
    pub fn new(composition: Composition, energy: f64) -> Self {
        let total: f64 = composition.values().sum();
        let energy_per_atom = if total > 0.0 { energy / total } else { energy };
        Self {
            composition,
            energy,
            energy_per_atom,
            e_form_per_atom: None,
            correction: None,
            entry_id: None,
            is_stable: None,
            e_above_hull: None,
        }
    }

    pub fn with_id(mut self, entry_id: impl Into<String>) -> Self {
        self.entry_id = Some(entry_id.into());
        self
    }

    pub fn with_correction(mut self, correction: f64) -> Self {
        self.correction = Some(correction);
        self
    }

    pub fn with_stability(mut self, is_stable: bool) -> Self {
        self.is_stable = Some(is_stable);
        self
    }

    /// Sum of all element amounts.
    pub fn total_amount(&self) -> f64 {
        self.composition.values().sum()
    }

    /// Number of distinct elements.
    pub fn arity(&self) -> usize {
        self.composition.len()
    }

    /// Returns the element of a single-element entry.
    pub fn unary_element(&self) -> Option<ElementSymbol> {
        match self.composition.len() {
            1 => self.composition.keys().next().copied(),
            _ => None,
        }
    }

    /// Element fractions normalized to sum to one.
    ///
    /// Returns an empty map when the composition has no positive total amount.
    pub fn fractions(&self) -> Composition {
        let total = self.total_amount();
        if total.is_nan() || total <= 0.0 {
            return Composition::new();
        }
        self.composition
            .iter()
            .map(|(&el, &amount)| (el, amount / total))
            .collect()
    }

    pub fn elements(&self) -> impl Iterator<Item = ElementSymbol> + '_ {
        self.composition.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(symbol: &str) -> ElementSymbol {
        symbol.parse().unwrap()
    }

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn new_derives_energy_per_atom_from_total_amount() {
        let entry = PhaseEntry::new(Composition::from([(el("Fe"), 2.0), (el("O"), 3.0)]), -20.0);
        assert!(f64_approx_equal(entry.energy_per_atom, -4.0));
        assert_eq!(entry.arity(), 2);
        assert!(entry.unary_element().is_none());
    }

    #[test]
    fn fractions_sum_to_one() {
        let entry = PhaseEntry::new(Composition::from([(el("Li"), 1.0), (el("O"), 3.0)]), -10.0);
        let fractions = entry.fractions();
        assert!(f64_approx_equal(fractions[&el("Li")], 0.25));
        assert!(f64_approx_equal(fractions[&el("O")], 0.75));
    }

    #[test]
    fn fractions_of_empty_composition_is_empty() {
        let entry = PhaseEntry::new(Composition::new(), -1.0);
        assert!(entry.fractions().is_empty());
        assert!(f64_approx_equal(entry.energy_per_atom, -1.0));
    }

    #[test]
    fn unary_element_is_reported_for_single_element_entries() {
        let entry = PhaseEntry::new(Composition::from([(el("Fe"), 4.0)]), -16.0);
        assert_eq!(entry.unary_element(), Some(el("Fe")));
    }

    #[test]
    fn deserializes_from_toml_with_optional_fields_missing() {
        let entry: PhaseEntry = toml::from_str(
            r#"
            energy = -8.0
            energy_per_atom = -4.0
            entry_id = "mp-13"
            [composition]
            Fe = 2.0
            "#,
        )
        .unwrap();
        assert_eq!(entry.entry_id.as_deref(), Some("mp-13"));
        assert_eq!(entry.unary_element(), Some(el("Fe")));
        assert!(entry.correction.is_none());
        assert!(entry.is_stable.is_none());
    }

    #[test]
    fn deserialization_rejects_unknown_element_keys() {
        let result: Result<PhaseEntry, _> = toml::from_str(
            r#"
            energy = -8.0
            energy_per_atom = -4.0
            [composition]
            Xx = 2.0
            "#,
        );
        assert!(result.is_err());
    }
}
