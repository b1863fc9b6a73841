//! # Core Models Module
//!
//! Data structures describing the molecules that are grown and the particles around them.
//!
//! ## Key Components
//!
//! - [`topology`] - Molecule kinds: atom parameters and bond/angle/dihedral connectivity
//! - [`system`] - The surrounding periodic system of molecules
//! - [`trial_mol`] - A molecule under construction, with its running weight and energy
//! - [`ids`] - Stable identifiers for molecules stored in a system
//!
//! ```ignore
//! use cbmc::core::models::{topology::MoleculeKind, trial_mol::TrialMol};
//!
//! let kind = MoleculeKind::linear_chain("butane", atoms, 0, 0, 0)?;
//! let mut mol = TrialMol::new(&kind, PeriodicBox::cubic(30.0));
//! mol.add_atom(0, Point3::new(1.0, 2.0, 3.0));
//! ```

pub mod ids;
pub mod system;
pub mod topology;
pub mod trial_mol;
