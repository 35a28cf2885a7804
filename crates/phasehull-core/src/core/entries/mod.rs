//! # Entry Processing
//!
//! Turns raw phase entries into the inputs a hull is built from: element-keyed
//! compositions, elemental references and formation energies.
//!
//! - [`normalize`] - Oxidation-state stripping and amount sanitation for dataset keys
//! - [`references`] - Lowest-energy unary references and formation energy per atom
//! - [`processing`] - Stability split of an entry set and reference extraction

pub mod normalize;
pub mod processing;
pub mod references;
