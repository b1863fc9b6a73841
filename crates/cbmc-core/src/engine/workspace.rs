use super::config::CbmcConfig;
use super::utils::sampling::Prng;
use crate::core::energy::{LongRangeCalculator, ShortRangeCalculator};
use crate::core::forcefield::params::Forcefield;
use nalgebra::Point3;

/// Scratch arrays sized once from the trial counts and overwritten by every link call.
#[derive(Debug, Clone, Default)]
pub(crate) struct TrialBuffers {
    pub angles: Vec<f64>,
    pub angle_energy: Vec<f64>,
    pub angle_weights: Vec<f64>,
    pub nonbonded_1_3: Vec<f64>,

    pub dihedrals: Vec<f64>,
    pub dihedral_energy: Vec<f64>,
    pub dihedral_weights: Vec<f64>,
    pub nonbonded_1_4: Vec<f64>,

    pub lj_weights: Vec<f64>,
    pub torsion: Vec<f64>,
    pub one_four: Vec<f64>,
    pub thetas: Vec<f64>,
    pub phis: Vec<f64>,
    pub positions: Vec<Point3<f64>>,
    pub nonbonded: Vec<f64>,
    pub inter: Vec<f64>,
    pub real: Vec<f64>,
    pub self_energy: Vec<f64>,
    pub correction: Vec<f64>,
}

impl TrialBuffers {
    pub(crate) fn new(config: &CbmcConfig) -> Self {
        let n_angle = config.n_angle_trials;
        let n_dih = config.n_dihedral_trials;
        let n_lj = config.n_lj_trials;
        Self {
            angles: vec![0.0; n_angle],
            angle_energy: vec![0.0; n_angle],
            angle_weights: vec![0.0; n_angle],
            nonbonded_1_3: vec![0.0; n_angle],
            dihedrals: vec![0.0; n_dih],
            dihedral_energy: vec![0.0; n_dih],
            dihedral_weights: vec![0.0; n_dih],
            nonbonded_1_4: vec![0.0; n_dih],
            lj_weights: vec![0.0; n_lj],
            torsion: vec![0.0; n_lj],
            one_four: vec![0.0; n_lj],
            thetas: vec![0.0; n_lj],
            phis: vec![0.0; n_lj],
            positions: vec![Point3::origin(); n_lj],
            nonbonded: vec![0.0; n_lj],
            inter: vec![0.0; n_lj],
            real: vec![0.0; n_lj],
            self_energy: vec![0.0; n_lj],
            correction: vec![0.0; n_lj],
        }
    }

    /// Zeroes every per-placement array ahead of a build.
    pub fn reset_placements(&mut self) {
        for buffer in [
            &mut self.lj_weights,
            &mut self.torsion,
            &mut self.one_four,
            &mut self.thetas,
            &mut self.phis,
            &mut self.nonbonded,
            &mut self.inter,
            &mut self.real,
            &mut self.self_energy,
            &mut self.correction,
        ] {
            buffer.fill(0.0);
        }
        self.positions.fill(Point3::origin());
    }
}

/// The arena every link borrows while it samples.
///
/// Holds the shared read-only collaborators (force field and energy
/// evaluators), the trial counts, the random stream and the scratch buffers.
/// Buffers are mutated in place on each call, so one workspace serves one
/// link evaluation at a time; concurrent workers each own a workspace with
/// its own [`Prng`].
pub struct TrialWorkspace<'a> {
    pub forcefield: &'a Forcefield,
    pub short_range: &'a dyn ShortRangeCalculator,
    pub long_range: &'a dyn LongRangeCalculator,
    pub config: CbmcConfig,
    pub prng: Prng,
    pub(crate) buffers: TrialBuffers,
}

impl<'a> TrialWorkspace<'a> {
    pub fn new(
        forcefield: &'a Forcefield,
        short_range: &'a dyn ShortRangeCalculator,
        long_range: &'a dyn LongRangeCalculator,
        config: CbmcConfig,
        prng: Prng,
    ) -> Self {
        Self {
            forcefield,
            short_range,
            long_range,
            config,
            prng,
            buffers: TrialBuffers::new(&config),
        }
    }

    #[inline]
    pub fn beta(&self) -> f64 {
        self.forcefield.beta
    }
}
