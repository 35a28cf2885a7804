//! Chemical systems and their mapping onto hull coordinates.
//!
//! A system of `n` elements maps a composition onto `n - 1` fraction axes in
//! canonical element order (the last fraction is implied) plus one energy
//! axis, giving points of dimension `n`.

use crate::core::models::element::ElementSymbol;
use crate::core::models::entry::{Composition, PhaseEntry};
use crate::engine::error::HullError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChemicalSystem {
    elements: Vec<ElementSymbol>,
}

impl ChemicalSystem {
    /// Builds a system from any collection of elements; order and duplicates
    /// in the input do not matter.
    pub fn new<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = ElementSymbol>,
    {
        let mut elements: Vec<ElementSymbol> = elements.into_iter().collect();
        elements.sort_unstable();
        elements.dedup();
        Self { elements }
    }

    /// The system spanned by every element of `entries`.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a PhaseEntry>,
    {
        Self::new(entries.into_iter().flat_map(|entry| entry.elements()))
    }

    pub fn elements(&self) -> &[ElementSymbol] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, element: ElementSymbol) -> bool {
        self.elements.binary_search(&element).is_ok()
    }

    /// Dimension of hull points for this system.
    pub fn point_dimension(&self) -> usize {
        self.elements.len()
    }

    /// Fractions of the first `n - 1` elements of the system for `composition`.
    ///
    /// The composition is normalized first. Elements absent from the
    /// composition contribute zero; an element outside the system is an error.
    pub fn composition_coordinates(&self, composition: &Composition) -> Result<Vec<f64>, HullError> {
        if let Some(&element) = composition.keys().find(|&&el| !self.contains(el)) {
            return Err(HullError::ElementNotInSystem {
                element,
                system: self.to_string(),
            });
        }
        let total: f64 = composition.values().sum();
        let axes = self.elements.len().saturating_sub(1);
        Ok(self.elements[..axes]
            .iter()
            .map(|el| match composition.get(el) {
                Some(amount) if total > 0.0 => amount / total,
                _ => 0.0,
            })
            .collect())
    }

    /// Hull point of `entry` at formation energy `e_form`.
    pub fn point(&self, entry: &PhaseEntry, e_form: f64) -> Result<Vec<f64>, HullError> {
        if entry.composition.is_empty() {
            return Err(HullError::EmptyComposition {
                entry_id: entry.entry_id.clone(),
            });
        }
        let mut point = self.composition_coordinates(&entry.composition)?;
        point.push(e_form);
        Ok(point)
    }

    /// Fixed-size form of [`ChemicalSystem::point`] for systems with `N` elements.
    pub fn fixed_point<const N: usize>(
        &self,
        entry: &PhaseEntry,
        e_form: f64,
    ) -> Result<[f64; N], HullError> {
        let point = self.point(entry, e_form)?;
        let found = point.len();
        point
            .try_into()
            .map_err(|_| HullError::InconsistentDimension {
                index: 0,
                expected: N,
                found,
            })
    }
}

impl fmt::Display for ChemicalSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            f.write_str(element.as_str())?;
        }
        Ok(())
    }
}
