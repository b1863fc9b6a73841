use super::{StageContext, clamp_degenerate};
use crate::core::utils::geometry::dihedral_dist_sq;
use crate::engine::utils::sampling::Prng;
use crate::engine::workspace::TrialBuffers;
use std::f64::consts::PI;

/// Internal coordinates along `prevprev-prev-focus-atom` that fix the 1-4 distance.
///
/// `prevprev_bond` and `theta_prev` are unused when the link has no `prevprev`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainGeometry {
    pub prevprev_bond: f64,
    pub prev_bond: f64,
    pub bond: f64,
    /// Angle `prevprev-prev-focus`.
    pub theta_prev: f64,
    /// Angle `prev-focus-atom`.
    pub theta: f64,
}

/// The torsion picked for one placement, with the summed weight of its trials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DihedralChoice {
    pub phi: f64,
    pub energy: f64,
    pub one_four: f64,
    pub weight: f64,
}

fn one_four_energy(ctx: &StageContext, dist_sq: f64) -> f64 {
    match ctx.topology.prevprev {
        Some(prevprev) => clamp_degenerate(ctx.short_range.intra_energy_1_4(
            ctx.kind,
            dist_sq,
            prevprev,
            ctx.topology.atom,
        )),
        None => 0.0,
    }
}

fn trial_energy(ctx: &StageContext, geometry: &ChainGeometry, phi: f64) -> (f64, f64) {
    let energy = ctx.topology.dihedral_energy(phi);
    let dist_sq = dihedral_dist_sq(
        geometry.prevprev_bond,
        geometry.prev_bond,
        geometry.bond,
        geometry.theta_prev,
        geometry.theta,
        phi,
    );
    (energy, one_four_energy(ctx, dist_sq))
}

/// Fills the dihedral buffers with fresh trials and returns their summed weight.
fn generate(
    ctx: &StageContext,
    geometry: &ChainGeometry,
    buffers: &mut TrialBuffers,
    prng: &mut Prng,
) -> f64 {
    let mut step_weight = 0.0;
    for trial in 0..buffers.dihedrals.len() {
        let phi = prng.rand_bound(2.0 * PI);
        let (energy, one_four) = trial_energy(ctx, geometry, phi);
        let weight = (-ctx.beta * (energy + one_four)).exp();

        buffers.dihedrals[trial] = phi;
        buffers.dihedral_energy[trial] = energy;
        buffers.nonbonded_1_4[trial] = one_four;
        buffers.dihedral_weights[trial] = weight;
        step_weight += weight;
    }
    step_weight
}

/// Samples the torsion of one placement.
pub(crate) fn sample(
    ctx: &StageContext,
    geometry: &ChainGeometry,
    buffers: &mut TrialBuffers,
    prng: &mut Prng,
) -> DihedralChoice {
    let weight = generate(ctx, geometry, buffers, prng);
    let winner = prng.pick_weighted(&buffers.dihedral_weights, weight);
    DihedralChoice {
        phi: buffers.dihedrals[winner],
        energy: buffers.dihedral_energy[winner],
        one_four: buffers.nonbonded_1_4[winner],
        weight,
    }
}

/// Keeps the measured torsion of an existing conformation and weighs it
/// against `trials - 1` random ones.
///
/// `one_four_dist_sq` is the actual `prevprev-atom` distance; it is ignored
/// when the link has no `prevprev`.
pub(crate) fn use_old(
    ctx: &StageContext,
    geometry: &ChainGeometry,
    phi: f64,
    one_four_dist_sq: f64,
    trials: usize,
    prng: &mut Prng,
) -> DihedralChoice {
    let energy = ctx.topology.dihedral_energy(phi);
    let one_four = one_four_energy(ctx, one_four_dist_sq);
    let mut weight = (-ctx.beta * (energy + one_four)).exp();

    for _ in 1..trials {
        let trial_phi = prng.rand_bound(2.0 * PI);
        let (trial_energy, trial_one_four) = trial_energy(ctx, geometry, trial_phi);
        weight += (-ctx.beta * (trial_energy + trial_one_four)).exp();
    }

    DihedralChoice {
        phi,
        energy,
        one_four,
        weight,
    }
}
