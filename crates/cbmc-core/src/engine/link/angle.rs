use super::{StageContext, clamp_degenerate};
use crate::core::forcefield::params::AngleParam;
use crate::core::utils::geometry::angle_dist_sq;
use crate::engine::utils::sampling::Prng;
use crate::engine::workspace::TrialBuffers;
use std::f64::consts::PI;
use tracing::trace;

/// The bend chosen (or measured) for one link, with its Rosenbluth bend weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleSample {
    pub theta: f64,
    pub energy: f64,
    pub one_three: f64,
    pub bend_weight: f64,
}

impl AngleSample {
    /// A link without a bend: the angle stage contributes nothing.
    pub fn skipped(theta: f64) -> Self {
        Self {
            theta,
            energy: 0.0,
            one_three: 0.0,
            bend_weight: 1.0,
        }
    }
}

/// Bend energy and 1-3 energy of the growing atom at `theta`.
///
/// `prev_bond` is the `prev-focus` length and `bond` the `focus-atom` length.
fn trial_energy(
    ctx: &StageContext,
    param: &AngleParam,
    prev: usize,
    prev_bond: f64,
    bond: f64,
    theta: f64,
) -> (f64, f64) {
    let energy = param.energy(theta);
    let dist_sq = angle_dist_sq(prev_bond, bond, theta);
    let one_three = clamp_degenerate(ctx.short_range.intra_energy_1_3(
        ctx.kind,
        dist_sq,
        prev,
        ctx.topology.atom,
    ));
    (energy, one_three)
}

#[inline]
fn draw_theta(param: &AngleParam, prng: &mut Prng) -> f64 {
    if param.fixed {
        param.theta
    } else {
        prng.rand_bound(PI)
    }
}

/// Draws one trial bend per angle buffer slot and picks one by its weight.
pub(crate) fn sample_new(
    ctx: &StageContext,
    param: &AngleParam,
    prev: usize,
    prev_bond: f64,
    bond: f64,
    buffers: &mut TrialBuffers,
    prng: &mut Prng,
) -> AngleSample {
    let mut bend_weight = 0.0;
    for trial in 0..buffers.angles.len() {
        let theta = draw_theta(param, prng);
        let (energy, one_three) = trial_energy(ctx, param, prev, prev_bond, bond, theta);
        let weight = (-ctx.beta * (energy + one_three)).exp();

        buffers.angles[trial] = theta;
        buffers.angle_energy[trial] = energy;
        buffers.nonbonded_1_3[trial] = one_three;
        buffers.angle_weights[trial] = weight;
        bend_weight += weight;
    }

    let winner = prng.pick_weighted(&buffers.angle_weights, bend_weight);
    trace!(winner, bend_weight, theta = buffers.angles[winner], "Selected bend trial.");

    AngleSample {
        theta: buffers.angles[winner],
        energy: buffers.angle_energy[winner],
        one_three: buffers.nonbonded_1_3[winner],
        bend_weight,
    }
}

/// Summed weight of `count` random bends standing in for the trials the
/// measured angle competed against.
pub(crate) fn retrace_trials(
    ctx: &StageContext,
    param: &AngleParam,
    prev: usize,
    prev_bond: f64,
    bond: f64,
    count: usize,
    prng: &mut Prng,
) -> f64 {
    (0..count)
        .map(|_| {
            let theta = draw_theta(param, prng);
            let (energy, one_three) = trial_energy(ctx, param, prev, prev_bond, bond, theta);
            (-ctx.beta * (energy + one_three)).exp()
        })
        .sum()
}

/// Adds the measured bend of an existing conformation to its retrace trials.
///
/// The 1-3 term uses the actual `prev-atom` distance rather than one rebuilt
/// from internal coordinates.
pub(crate) fn incorporate_old(
    ctx: &StageContext,
    param: &AngleParam,
    prev: usize,
    theta: f64,
    one_three_dist_sq: f64,
    trial_weight: f64,
) -> AngleSample {
    let energy = param.energy(theta);
    let one_three = clamp_degenerate(ctx.short_range.intra_energy_1_3(
        ctx.kind,
        one_three_dist_sq,
        prev,
        ctx.topology.atom,
    ));
    AngleSample {
        theta,
        energy,
        one_three,
        bend_weight: trial_weight + (-ctx.beta * (energy + one_three)).exp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::energy::pairwise::PairwiseCalculator;
    use crate::core::energy::{NonbondedSettings, ShortRangeCalculator};
    use crate::core::forcefield::params::Forcefield;
    use crate::core::models::topology::{AtomParams, MoleculeKind};
    use crate::core::models::system::ParticleSystem;
    use crate::core::models::trial_mol::TrialMol;
    use crate::core::utils::geometry::PeriodicBox;
    use crate::engine::config::CbmcConfigBuilder;
    use crate::engine::link::BIG_ENERGY;
    use crate::engine::link::topology::LinkTopology;
    use nalgebra::Point3;

    /// Short-range evaluator returning a fixed 1-3 energy and nothing else.
    struct ConstantOneThree(f64);

    impl ShortRangeCalculator for ConstantOneThree {
        fn intra_energy_1_3(&self, _: &MoleculeKind, _: f64, _: usize, _: usize) -> f64 {
            self.0
        }
        fn intra_energy_1_4(&self, _: &MoleculeKind, _: f64, _: usize, _: usize) -> f64 {
            0.0
        }
        fn particle_inter(&self, _: &mut [f64], _: &mut [f64], _: &[Point3<f64>], _: usize, _: &TrialMol) {}
        fn particle_nonbonded(&self, _: &mut [f64], _: &TrialMol, _: &[Point3<f64>], _: usize) {}
    }

    const FF_TOML: &str = r#"
        temperature = 300.0

        [[bonds]]
        length = 1.5
        k = 0.0
        fixed = true

        [[angles]]
        theta = 110.0
        k = 50.0

        [[angles]]
        theta = 0.0
        k = 0.0
        fixed = true
    "#;

    fn setup(angle_kind: usize) -> (MoleculeKind, Forcefield) {
        let kind = MoleculeKind::linear_chain(
            "propane",
            vec![AtomParams::new("C", 0.0, 2.0, 0.1); 3],
            0,
            angle_kind,
            0,
        )
        .unwrap();
        (kind, Forcefield::from_toml_str(FF_TOML).unwrap())
    }

    fn buffers(n_angle: usize) -> TrialBuffers {
        let config = CbmcConfigBuilder::new()
            .n_angle_trials(n_angle)
            .n_dihedral_trials(1)
            .n_lj_trials(1)
            .build()
            .unwrap();
        TrialBuffers::new(&config)
    }

    #[test]
    fn bend_weight_sums_every_trial() {
        let (kind, ff) = setup(0);
        let topology = LinkTopology::resolve(&kind, &ff, 2, 1).unwrap();
        let calc = ConstantOneThree(0.0);
        let ctx = StageContext::new(&topology, &kind, &calc, ff.beta);
        let param = topology.angle.unwrap().param;
        let mut buffers = buffers(20);
        let mut prng = Prng::seeded(8);

        let sample = sample_new(&ctx, &param, 0, 1.5, 1.5, &mut buffers, &mut prng);

        let expected: f64 = buffers.angle_weights.iter().sum();
        assert!((sample.bend_weight - expected).abs() < 1e-12 * expected);
        assert!(buffers.angles.iter().all(|&t| (0.0..PI).contains(&t)));
        assert!(buffers.angles.contains(&sample.theta));
        assert!((sample.energy - param.energy(sample.theta)).abs() < 1e-12);
    }

    #[test]
    fn fixed_angle_uses_equilibrium_for_every_trial() {
        let (kind, ff) = setup(1);
        let topology = LinkTopology::resolve(&kind, &ff, 2, 1).unwrap();
        let calc = ConstantOneThree(0.0);
        let ctx = StageContext::new(&topology, &kind, &calc, ff.beta);
        let param = topology.angle.unwrap().param;
        let mut buffers = buffers(4);
        let mut prng = Prng::seeded(1);

        let sample = sample_new(&ctx, &param, 0, 1.5, 1.5, &mut buffers, &mut prng);

        assert!(buffers.angles.iter().all(|&t| t == 0.0));
        assert_eq!(sample.theta, 0.0);
        assert!((sample.bend_weight - 4.0).abs() < 1e-12);
    }

    #[test]
    fn nan_one_three_energy_is_clamped_to_negligible_weight() {
        // Fixed zero angle with equal bonds puts `prev` and `atom` on top of each other.
        let (kind, ff) = setup(1);
        let topology = LinkTopology::resolve(&kind, &ff, 2, 1).unwrap();
        let calc = ConstantOneThree(f64::NAN);
        let ctx = StageContext::new(&topology, &kind, &calc, ff.beta);
        let param = topology.angle.unwrap().param;
        let mut buffers = buffers(3);
        let mut prng = Prng::seeded(4);

        let sample = sample_new(&ctx, &param, 0, 1.5, 1.5, &mut buffers, &mut prng);

        assert_eq!(sample.one_three, BIG_ENERGY);
        assert!(sample.one_three.is_finite());
        assert!(sample.bend_weight.is_finite());
        assert!(sample.bend_weight >= 0.0);
        assert!(sample.bend_weight < f64::EPSILON);
        assert!(buffers.angle_weights.iter().all(|w| !w.is_nan()));
    }

    #[test]
    fn coincident_opposite_charges_get_negligible_bend_weight() {
        let kind = MoleculeKind::linear_chain(
            "zwitterion",
            vec![
                AtomParams::new("N", 0.5, 2.0, 0.1),
                AtomParams::new("C", 0.0, 2.0, 0.1),
                AtomParams::new("O", -0.5, 2.0, 0.1),
            ],
            0,
            1,
            0,
        )
        .unwrap();
        let ff = Forcefield::from_toml_str(FF_TOML).unwrap();
        let topology = LinkTopology::resolve(&kind, &ff, 2, 1).unwrap();
        let system = ParticleSystem::new(PeriodicBox::cubic(30.0));
        let calc = PairwiseCalculator::new(
            &system,
            NonbondedSettings {
                scale_1_3: 1.0,
                ..Default::default()
            },
        );
        let ctx = StageContext::new(&topology, &kind, &calc, ff.beta);
        let param = topology.angle.unwrap().param;
        let mut buffers = buffers(3);
        let mut prng = Prng::seeded(4);

        let sample = sample_new(&ctx, &param, 0, 1.5, 1.5, &mut buffers, &mut prng);

        assert!(sample.one_three > 1e9);
        assert!(sample.bend_weight >= 0.0);
        assert!(sample.bend_weight < f64::EPSILON);
    }

    #[test]
    fn retrace_trials_with_zero_count_contribute_nothing() {
        let (kind, ff) = setup(0);
        let topology = LinkTopology::resolve(&kind, &ff, 2, 1).unwrap();
        let calc = ConstantOneThree(0.0);
        let ctx = StageContext::new(&topology, &kind, &calc, ff.beta);
        let param = topology.angle.unwrap().param;
        let mut prng = Prng::seeded(2);

        assert_eq!(retrace_trials(&ctx, &param, 0, 1.5, 1.5, 0, &mut prng), 0.0);
        let some = retrace_trials(&ctx, &param, 0, 1.5, 1.5, 5, &mut prng);
        assert!(some > 0.0 && some <= 5.0);
    }

    #[test]
    fn incorporate_old_adds_boltzmann_factor_of_measured_angle() {
        let (kind, ff) = setup(0);
        let topology = LinkTopology::resolve(&kind, &ff, 2, 1).unwrap();
        let calc = ConstantOneThree(0.25);
        let ctx = StageContext::new(&topology, &kind, &calc, ff.beta);
        let param = topology.angle.unwrap().param;

        let theta = 100f64.to_radians();
        let sample = incorporate_old(&ctx, &param, 0, theta, 6.0, 0.5);

        let energy = param.energy(theta);
        assert!((sample.energy - energy).abs() < 1e-12);
        assert_eq!(sample.one_three, 0.25);
        let expected = 0.5 + (-ff.beta * (energy + 0.25)).exp();
        assert!((sample.bend_weight - expected).abs() < 1e-12);
    }

    #[test]
    fn skipped_angle_is_neutral() {
        let sample = AngleSample::skipped(1.2);
        assert_eq!(sample.bend_weight, 1.0);
        assert_eq!(sample.energy, 0.0);
        assert_eq!(sample.theta, 1.2);
    }
}
