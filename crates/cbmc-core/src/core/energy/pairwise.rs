use super::{NonbondedSettings, ShortRangeCalculator};
use crate::core::forcefield::potentials;
use crate::core::models::system::ParticleSystem;
use crate::core::models::topology::{AtomParams, FAR_SEPARATION, MoleculeKind};
use crate::core::models::trial_mol::TrialMol;
use nalgebra::Point3;

/// Cutoff pair sums over the molecules of a [`ParticleSystem`].
#[derive(Debug, Clone, Copy)]
pub struct PairwiseCalculator<'a> {
    system: &'a ParticleSystem,
    settings: NonbondedSettings,
}

impl<'a> PairwiseCalculator<'a> {
    pub fn new(system: &'a ParticleSystem, settings: NonbondedSettings) -> Self {
        Self { system, settings }
    }

    #[inline]
    fn lennard_jones(a: &AtomParams, b: &AtomParams, dist: f64) -> f64 {
        let r_min = (a.r_min + b.r_min) / 2.0;
        let well_depth = (a.well_depth * b.well_depth).sqrt();
        potentials::lennard_jones_12_6(dist, r_min, well_depth)
    }

    #[inline]
    fn electrostatic(&self, a: &AtomParams, b: &AtomParams, dist: f64) -> f64 {
        if a.charge == 0.0 || b.charge == 0.0 {
            return 0.0;
        }
        match self.settings.ewald_alpha {
            Some(alpha) => potentials::damped_coulomb(dist, a.charge, b.charge, alpha),
            None => potentials::coulomb(dist, a.charge, b.charge, self.settings.dielectric),
        }
    }

    fn scaled_pair(
        &self,
        kind: &MoleculeKind,
        dist_sq: f64,
        a: usize,
        b: usize,
        lj_scale: f64,
        elect_scale: f64,
    ) -> f64 {
        if lj_scale == 0.0 && elect_scale == 0.0 {
            return 0.0;
        }
        let (Some(pa), Some(pb)) = (kind.atom(a), kind.atom(b)) else {
            return 0.0;
        };
        let dist = dist_sq.sqrt();
        lj_scale * Self::lennard_jones(pa, pb, dist) + elect_scale * self.electrostatic(pa, pb, dist)
    }
}

impl ShortRangeCalculator for PairwiseCalculator<'_> {
    fn intra_energy_1_3(&self, kind: &MoleculeKind, dist_sq: f64, a: usize, b: usize) -> f64 {
        let scale = self.settings.scale_1_3;
        self.scaled_pair(kind, dist_sq, a, b, scale, scale)
    }

    fn intra_energy_1_4(&self, kind: &MoleculeKind, dist_sq: f64, a: usize, b: usize) -> f64 {
        self.scaled_pair(
            kind,
            dist_sq,
            a,
            b,
            self.settings.lj_scale_1_4,
            self.settings.elect_scale_1_4,
        )
    }

    fn particle_inter(
        &self,
        inter: &mut [f64],
        real: &mut [f64],
        positions: &[Point3<f64>],
        atom: usize,
        mol: &TrialMol,
    ) {
        let Some(params) = mol.kind().atom(atom) else {
            return;
        };
        let cutoff_sq = self.settings.cutoff * self.settings.cutoff;
        let sim_box = mol.sim_box();

        for (id, other, other_kind) in self.system.molecules_iter() {
            if Some(id) == mol.molecule() {
                continue;
            }
            for (pos_j, params_j) in other.coords.iter().zip(other_kind.atoms()) {
                for (t, p) in positions.iter().enumerate() {
                    let dist_sq = sim_box.dist_sq(p, pos_j);
                    if dist_sq < cutoff_sq {
                        let dist = dist_sq.sqrt();
                        inter[t] += Self::lennard_jones(params, params_j, dist);
                        real[t] += self.electrostatic(params, params_j, dist);
                    }
                }
            }
        }
    }

    fn particle_nonbonded(
        &self,
        nonbonded: &mut [f64],
        mol: &TrialMol,
        positions: &[Point3<f64>],
        atom: usize,
    ) {
        let kind = mol.kind();
        let Some(params) = kind.atom(atom) else {
            return;
        };
        let cutoff_sq = self.settings.cutoff * self.settings.cutoff;
        let sim_box = mol.sim_box();

        for (i, params_i) in kind.atoms().iter().enumerate() {
            if i == atom || !mol.atom_exists(i) || kind.separation(i, atom) < FAR_SEPARATION {
                continue;
            }
            let pos_i = mol.atom_position(i);
            for (t, p) in positions.iter().enumerate() {
                let dist_sq = sim_box.dist_sq(p, &pos_i);
                if dist_sq < cutoff_sq {
                    let dist = dist_sq.sqrt();
                    nonbonded[t] += Self::lennard_jones(params, params_i, dist)
                        + self.electrostatic(params, params_i, dist);
                }
            }
        }
    }
}
