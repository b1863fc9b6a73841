//! # CBMC Core Library
//!
//! Configurational-bias Monte Carlo growth of flexible molecules: the link
//! operator that places one atom onto a bonded focus with biased bond, angle
//! and torsion sampling, nonbonded reweighting and Rosenbluth weights.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer architecture so that the sampling
//! logic can be tested apart from the energy models it consults.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`MoleculeKind`,
//!   `ParticleSystem`, `TrialMol`), the force field tables and functional forms,
//!   periodic-box geometry, and the energy-evaluator interfaces with their
//!   reference implementations.
//!
//! - **[`engine`]: The Logic Core.** The stateful layer. It owns the trial
//!   workspace, the random source and the link operator (`DcLink`) with its
//!   bond, angle, dihedral and nonbonded stages.
//!
//! - **[`workflows`]: The Public API.** Chains link operators into complete
//!   moves, such as regrowing the tail of a linear molecule and retracing the
//!   existing one for an acceptance test.

pub mod core;
pub mod engine;
pub mod workflows;
