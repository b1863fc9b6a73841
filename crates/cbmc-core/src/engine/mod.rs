//! # Engine Module
//!
//! This module implements the stateful side of configurational-bias growth:
//! everything that draws random numbers, holds scratch buffers, or mutates a
//! trial molecule.
//!
//! ## Overview
//!
//! A growth move is built from link operators, each of which places one atom
//! onto an already-placed focus atom. A link samples the bond length, the bend
//! and a batch of torsion placements, weighs every placement by its nonbonded
//! Boltzmann factor, and multiplies the resulting Rosenbluth weight into the
//! trial molecule. The same link retraces an existing conformation so that the
//! old and new weights can be compared by the caller's acceptance test.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Trial counts and the parallel toggle, from a builder or TOML
//! - **Error Handling** ([`error`]) - Engine-specific error types wrapping the core failures
//! - **Workspace** ([`workspace`]) - The arena of shared evaluators, random stream and scratch buffers
//! - **Link Operator** ([`link`]) - Topology lookup, stage samplers and the growth orchestrator
//! - **Sampling Utilities** ([`utils`]) - The seeded random source and roulette-wheel selection
//!
//! ## Concurrency
//!
//! Link stages run sequentially. The four batch energy evaluations of one
//! link may run as a fork-join group when the `parallel` feature is enabled
//! and the configuration asks for it; results are identical either way.

pub mod config;
pub mod error;
pub mod link;
pub mod utils;
pub mod workspace;
