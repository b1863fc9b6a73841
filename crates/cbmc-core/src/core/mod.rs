//! # Core Module
//!
//! Stateless building blocks for configurational-bias growth: force field
//! tables, molecular models, geometry, and the energy evaluators a link
//! consults for its trial positions.
//!
//! ## Architecture
//!
//! - **Force Field** ([`forcefield`]) - Bonded parameter tables, pair potentials and the energy decomposition
//! - **Molecular Representation** ([`models`]) - Molecule kinds, the surrounding system and the trial molecule
//! - **Energy Evaluation** ([`energy`]) - Short-range and long-range evaluator interfaces with reference implementations
//! - **Geometry** ([`utils`]) - Periodic boundaries and internal-coordinate conversions
//!
//! Nothing in this layer holds sampling state or a random source; that lives in
//! [`crate::engine`].

pub mod energy;
pub mod forcefield;
pub mod models;
pub mod utils;
