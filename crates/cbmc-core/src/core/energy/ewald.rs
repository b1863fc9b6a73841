use super::LongRangeCalculator;
use crate::core::forcefield::potentials;
use crate::core::models::topology::MoleculeKind;
use crate::core::models::trial_mol::TrialMol;
use nalgebra::Point3;

/// Self and intramolecular-exclusion terms of an Ewald sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EwaldCorrections {
    alpha: f64,
}

impl EwaldCorrections {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    fn exclusion_sum(&self, mol: &TrialMol, atom: usize, position: &Point3<f64>) -> f64 {
        let kind = mol.kind();
        let Some(charge) = kind.atom(atom).map(|a| a.charge) else {
            return 0.0;
        };
        if charge == 0.0 {
            return 0.0;
        }
        kind.atoms()
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != atom && mol.atom_exists(i))
            .map(|(i, params)| {
                let dist = mol.sim_box().dist_sq(position, &mol.atom_position(i)).sqrt();
                potentials::ewald_exclusion(dist, params.charge, charge, self.alpha)
            })
            .sum()
    }
}

impl LongRangeCalculator for EwaldCorrections {
    fn swap_self(&self, self_energy: &mut [f64], kind: &MoleculeKind, atom: usize) {
        let charge = kind.atom(atom).map_or(0.0, |a| a.charge);
        let energy = potentials::ewald_self(charge, self.alpha);
        for slot in self_energy.iter_mut() {
            *slot += energy;
        }
    }

    fn swap_correction(
        &self,
        correction: &mut [f64],
        mol: &TrialMol,
        positions: &[Point3<f64>],
        atom: usize,
    ) {
        for (slot, p) in correction.iter_mut().zip(positions) {
            *slot += self.exclusion_sum(mol, atom, p);
        }
    }

    fn old_correction(&self, mol: &TrialMol, atom: usize) -> f64 {
        self.exclusion_sum(mol, atom, &mol.atom_position(atom))
    }
}

/// Long-range engine for simulations without Ewald electrostatics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoEwald;

impl LongRangeCalculator for NoEwald {
    fn swap_self(&self, _self_energy: &mut [f64], _kind: &MoleculeKind, _atom: usize) {}

    fn swap_correction(
        &self,
        _correction: &mut [f64],
        _mol: &TrialMol,
        _positions: &[Point3<f64>],
        _atom: usize,
    ) {
    }

    fn old_correction(&self, _mol: &TrialMol, _atom: usize) -> f64 {
        0.0
    }
}
