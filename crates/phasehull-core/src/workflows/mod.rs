//! # Workflows Module
//!
//! End-to-end entry points that tie [`crate::core`] and [`crate::engine`]
//! together.
//!
//! - **Stability** ([`stability`]) - Energy above hull for single entries, batches and whole datasets
//! - **Statistics** ([`stats`]) - Dataset summaries over recorded stability data

pub mod stability;
pub mod stats;
