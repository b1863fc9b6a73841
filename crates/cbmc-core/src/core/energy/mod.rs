//! # Energy Evaluators
//!
//! Interfaces to the short-range and long-range energy engines consulted while
//! a link evaluates its trial positions, plus reference implementations.
//!
//! Batch methods receive one slot per trial position and **accumulate** into
//! buffers the caller has zeroed. Implementations must be `Sync`: the four
//! batch evaluations of one link may run concurrently, each writing its own
//! buffer.
//!
//! - [`pairwise::PairwiseCalculator`] - cutoff Lennard-Jones plus real-space electrostatics
//! - [`ewald::EwaldCorrections`] - Ewald self and exclusion-correction terms
//! - [`ewald::NoEwald`] - a long-range engine for systems without Ewald electrostatics

pub mod ewald;
pub mod pairwise;

use crate::core::models::topology::MoleculeKind;
use crate::core::models::trial_mol::TrialMol;
use nalgebra::Point3;
use serde::Deserialize;

pub trait ShortRangeCalculator: Sync {
    /// Scaled nonbonded energy of a 1-3 pair at the given squared distance.
    fn intra_energy_1_3(&self, kind: &MoleculeKind, dist_sq: f64, a: usize, b: usize) -> f64;

    /// Scaled nonbonded energy of a 1-4 pair at the given squared distance.
    fn intra_energy_1_4(&self, kind: &MoleculeKind, dist_sq: f64, a: usize, b: usize) -> f64;

    /// Intermolecular Lennard-Jones (`inter`) and real-space electrostatic
    /// (`real`) energy of `atom` at each trial position against every other
    /// molecule in the system.
    fn particle_inter(
        &self,
        inter: &mut [f64],
        real: &mut [f64],
        positions: &[Point3<f64>],
        atom: usize,
        mol: &TrialMol,
    );

    /// Intramolecular energy of `atom` at each trial position with the
    /// existing atoms of `mol` separated from it by more than three bonds.
    fn particle_nonbonded(
        &self,
        nonbonded: &mut [f64],
        mol: &TrialMol,
        positions: &[Point3<f64>],
        atom: usize,
    );
}

pub trait LongRangeCalculator: Sync {
    fn swap_self(&self, self_energy: &mut [f64], kind: &MoleculeKind, atom: usize);

    fn swap_correction(
        &self,
        correction: &mut [f64],
        mol: &TrialMol,
        positions: &[Point3<f64>],
        atom: usize,
    );

    /// Correction for `atom` at its current position in `mol`.
    fn old_correction(&self, mol: &TrialMol, atom: usize) -> f64;
}

/// Parameters of the reference evaluators.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct NonbondedSettings {
    pub cutoff: f64,
    /// Applied to both Lennard-Jones and electrostatics of 1-3 pairs.
    pub scale_1_3: f64,
    pub lj_scale_1_4: f64,
    pub elect_scale_1_4: f64,
    pub dielectric: f64,
    /// Ewald splitting parameter in 1/Å. Plain Coulomb is used when absent.
    pub ewald_alpha: Option<f64>,
}

impl Default for NonbondedSettings {
    fn default() -> Self {
        Self {
            cutoff: 10.0,
            scale_1_3: 0.0,
            lj_scale_1_4: 0.5,
            elect_scale_1_4: 0.5,
            dielectric: 1.0,
            ewald_alpha: None,
        }
    }
}
