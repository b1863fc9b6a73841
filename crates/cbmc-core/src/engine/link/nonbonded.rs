use crate::core::energy::{LongRangeCalculator, ShortRangeCalculator};
use crate::core::models::trial_mol::TrialMol;
use crate::engine::workspace::TrialBuffers;
use nalgebra::Point3;

/// Wraps the placement positions into the box and fills the inter, real,
/// intramolecular, self and correction buffers for `atom`.
///
/// The four evaluations write disjoint buffers. With `parallel` set (and the
/// `parallel` feature enabled) they run as a fork-join group; the results are
/// identical to the sequential path.
pub(crate) fn evaluate(
    short_range: &dyn ShortRangeCalculator,
    long_range: &dyn LongRangeCalculator,
    mol: &TrialMol,
    atom: usize,
    buffers: &mut TrialBuffers,
    parallel: bool,
) {
    let TrialBuffers {
        positions,
        nonbonded,
        inter,
        real,
        self_energy,
        correction,
        ..
    } = buffers;
    mol.sim_box().wrap_all(positions);
    let positions: &[Point3<f64>] = positions;
    let kind = mol.kind();

    #[cfg(feature = "parallel")]
    {
        if parallel {
            rayon::join(
                || {
                    rayon::join(
                        || short_range.particle_inter(inter, real, positions, atom, mol),
                        || short_range.particle_nonbonded(nonbonded, mol, positions, atom),
                    )
                },
                || {
                    rayon::join(
                        || long_range.swap_self(self_energy, kind, atom),
                        || long_range.swap_correction(correction, mol, positions, atom),
                    )
                },
            );
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    short_range.particle_inter(inter, real, positions, atom, mol);
    short_range.particle_nonbonded(nonbonded, mol, positions, atom);
    long_range.swap_self(self_energy, kind, atom);
    long_range.swap_correction(correction, mol, positions, atom);
}

/// Folds the nonbonded Boltzmann factor into each placement weight and
/// returns the batch total.
pub(crate) fn reweight(buffers: &mut TrialBuffers, beta: f64) -> f64 {
    let mut total = 0.0;
    for (t, weight) in buffers.lj_weights.iter_mut().enumerate() {
        let energy = buffers.inter[t]
            + buffers.real[t]
            + buffers.nonbonded[t]
            + buffers.self_energy[t]
            + buffers.correction[t];
        *weight *= (-beta * energy).exp();
        total += *weight;
    }
    total
}
