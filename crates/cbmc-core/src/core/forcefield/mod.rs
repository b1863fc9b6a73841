//! # Force Field Module
//!
//! Bonded parameter tables and the pair potentials used while growing a molecule.
//!
//! ## Key Components
//!
//! - [`params`] - Bond, angle and dihedral tables keyed by kind, and the inverse temperature
//! - [`potentials`] - Closed-form potentials (harmonic, periodic torsion, Lennard-Jones, Ewald terms)
//! - [`term`] - The [`term::Energy`] decomposition accumulated by a trial molecule
//!
//! ```ignore
//! use cbmc::core::forcefield::params::Forcefield;
//!
//! let forcefield = Forcefield::load(Path::new("alkane.toml"))?;
//! let bond = forcefield.bond(0).ok_or(...)?;
//! let u = bond.energy(1.56);
//! ```

pub mod params;
pub mod potentials;
pub mod term;
