//! # Core Models Module
//!
//! Data types shared by every layer of the library.
//!
//! - [`element`] - Periodic-table validated element symbols
//! - [`entry`] - Phase entries and element-keyed compositions
//!
//! Compositions are ordered maps keyed by [`element::ElementSymbol`], so
//! iterating one always visits elements in canonical (alphabetical) order.
//! That order fixes which element maps onto which hull axis.
//!
//! ```
//! use phasehull::core::models::entry::{Composition, PhaseEntry};
//!
//! let fe: phasehull::core::models::element::ElementSymbol = "Fe".parse().unwrap();
//! let o = "O".parse().unwrap();
//! let entry = PhaseEntry::new(Composition::from([(fe, 2.0), (o, 3.0)]), -35.0).with_id("fe2o3");
//! assert_eq!(entry.energy_per_atom, -7.0);
//! assert_eq!(entry.arity(), 2);
//! ```

pub mod element;
pub mod entry;
