//! # phasehull
//!
//! Thermodynamic phase stability from convex hulls of formation energies.
//!
//! Given computed phase entries (a composition and an energy each), the
//! library builds the lower convex hull in composition-energy space and
//! reports how far any entry lies above it (`e_above_hull`, eV/atom).
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Element and entry models, key
//!   normalization, elemental references, formation energies and the mapping
//!   of entries onto hull coordinates.
//!
//! - **[`engine`]: The Geometry Core.** A const-generic quickhull with 2D, 3D
//!   and 4D specializations and a runtime-dimension entry point, the
//!   lower-hull filter, barycentric queries and the tolerance configuration.
//!
//! - **[`workflows`]: The Public API.** [`PhaseHull`] and the
//!   `calculate_e_above_hull` family, which compose the layers below for
//!   systems of any number of elements.
//!
//! ## Example
//!
//! ```
//! use phasehull::core::models::entry::{Composition, PhaseEntry};
//! use phasehull::calculate_e_above_hull;
//!
//! let fe = "Fe".parse().unwrap();
//! let refs = vec![PhaseEntry::new(Composition::from([(fe, 1.0)]), -4.0)];
//! let query = PhaseEntry::new(Composition::from([(fe, 1.0)]), -3.5);
//! let e_above_hull = calculate_e_above_hull(&query, &refs).unwrap();
//! assert!((e_above_hull - 0.5).abs() < 1e-12);
//! ```

pub mod core;
pub mod engine;
pub mod workflows;

pub use crate::engine::config::{HullConfig, HullConfigBuilder, Tolerances};
pub use crate::engine::error::HullError;
pub use crate::workflows::stability::{
    PhaseHull, annotate_stability, calculate_e_above_hull, calculate_e_above_hull_batch,
};
