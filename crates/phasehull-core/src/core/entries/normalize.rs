use crate::core::models::element::ElementSymbol;
use crate::core::models::entry::{Composition, RawComposition};
use tracing::trace;

/// Strips a trailing oxidation-state marker such as `2+`, `+3` or `-`.
///
/// Only suffixes that contain a sign are removed, so `"Fe2"` is returned
/// unchanged (and later rejected as a symbol) rather than read as iron.
fn strip_oxidation_state(key: &str) -> &str {
    let trimmed = key.trim();
    let base = trimmed.trim_end_matches(|c: char| c.is_ascii_digit() || c == '+' || c == '-');
    let suffix = &trimmed[base.len()..];
    if suffix.contains(['+', '-']) { base } else { trimmed }
}

#[inline]
fn is_usable_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

/// Maps raw dataset keys onto element symbols.
///
/// Oxidation-state markers are stripped and amounts of keys that collide
/// afterwards are summed. Keys that are not element symbols are dropped, as
/// are amounts that are zero, negative or not finite. The result may be empty.
pub fn normalize_hull_composition_keys(composition: &RawComposition) -> Composition {
    let mut normalized = Composition::new();
    for (key, &amount) in composition {
        if !is_usable_amount(amount) {
            trace!(key = key.as_str(), amount, "Dropping unusable amount.");
            continue;
        }
        match strip_oxidation_state(key).parse::<ElementSymbol>() {
            Ok(element) => *normalized.entry(element).or_insert(0.0) += amount,
            Err(_) => trace!(key = key.as_str(), "Dropping non-element composition key."),
        }
    }
    normalized
}

/// Removes amounts that are zero, negative or not finite from a composition
/// whose keys are already element symbols.
pub fn sanitize_composition(composition: &Composition) -> Composition {
    composition
        .iter()
        .filter(|&(_, &amount)| is_usable_amount(amount))
        .map(|(&el, &amount)| (el, amount))
        .collect()
}
