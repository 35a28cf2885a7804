use crate::core::models::element::ElementSymbol;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HullError {
    #[error("Reference entry set is empty")]
    EmptyReferenceSet,

    #[error("No elemental reference energy for {element}{}", entry_label(.entry_id))]
    MissingElementReference {
        element: ElementSymbol,
        entry_id: Option<String>,
    },

    #[error("Element {element} is not part of the chemical system {system}")]
    ElementNotInSystem {
        element: ElementSymbol,
        system: String,
    },

    #[error("Point {index} has dimension {found}, expected {expected}")]
    InconsistentDimension {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Hull dimension {dimension} is not supported (supported: 2..={max})")]
    UnsupportedDimension { dimension: usize, max: usize },

    #[error("Entry{} has an empty composition after normalization", entry_label(.entry_id))]
    EmptyComposition { entry_id: Option<String> },

    #[error("Entry{} has a non-finite formation energy", entry_label(.entry_id))]
    NonFiniteEnergy { entry_id: Option<String> },
}

fn entry_label(entry_id: &Option<String>) -> String {
    entry_id
        .as_deref()
        .map(|id| format!(" (entry '{id}')"))
        .unwrap_or_default()
}
