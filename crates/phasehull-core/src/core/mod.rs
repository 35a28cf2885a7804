//! # Core Module
//!
//! Stateless chemistry-side building blocks: element and entry models, entry
//! processing and the mapping from entries onto hull coordinates.
//!
//! ## Architecture
//!
//! - **Models** ([`models`]) - Element symbols, compositions and phase entries
//! - **Entry Processing** ([`entries`]) - Key normalization, elemental references and formation energies
//! - **Coordinate Mapping** ([`system`]) - Chemical systems and their barycentric hull coordinates
//!
//! Nothing in this layer builds geometry; that is the job of [`crate::engine`].

pub mod entries;
pub mod models;
pub mod system;
