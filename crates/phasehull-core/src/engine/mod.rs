//! # Engine Module
//!
//! The geometry core: convex hulls of point sets in any supported dimension,
//! their lower envelopes and the queries answered against them.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Tolerances for every geometric decision, loadable from TOML
//! - **Error Handling** ([`error`]) - Input errors raised by engine and workflows
//! - **Facets** ([`facet`]) - Fixed- and runtime-dimension facet records behind one trait
//! - **Quickhull** ([`quickhull`]) - One const-generic engine with named 3D/4D entry points and runtime dispatch
//! - **Lower Hull** ([`lower_hull`], [`monotone_chain`]) - Energy-axis filtering and the 2D chain specialization
//! - **Queries** ([`query`]) - Facet location, barycentric interpolation and energy above hull
//! - **Hulls** ([`hull`]) - Built hulls bundling full and lower facet sets
//!
//! ## Conventions
//!
//! Points are `[f64; N]` (or `Vec<f64>` at runtime dimension) whose last
//! coordinate is energy. Degenerate input never raises an error; it produces
//! an empty facet list, and queries against no facets produce `None`.

pub mod config;
pub mod error;
pub mod facet;
pub(crate) mod geometry;
pub mod hull;
pub mod lower_hull;
pub mod monotone_chain;
pub mod query;
pub mod quickhull;
