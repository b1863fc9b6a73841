use crate::core::forcefield::params::BondParam;
use crate::engine::utils::sampling::Prng;

/// Lower edge of the fractional stretch interval.
const STRETCH_MIN: f64 = 0.9;
/// Width of the fractional stretch interval `[0.9, 1.1]`.
const STRETCH_WIDTH: f64 = 0.2;
/// `1.1³`, the largest value of the radial Jacobian on the interval.
const STRETCH_JACOBIAN_MAX: f64 = 1.331;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondSample {
    pub length: f64,
    pub energy: f64,
    pub weight: f64,
}

impl BondSample {
    fn at(param: &BondParam, beta: f64, length: f64) -> Self {
        let energy = param.energy(length);
        Self {
            length,
            energy,
            weight: (-beta * energy).exp(),
        }
    }
}

/// Bond length for a newly grown atom.
///
/// A fixed bond sits at its equilibrium length. A free bond is drawn from
/// `f³ exp(-β U(f L0))` over `f ∈ [0.9, 1.1]` by two nested rejections: the
/// inner loop accepts `f` against the Jacobian `f³ / 1.1³`, the outer loop
/// accepts the resulting length against its Boltzmann factor.
pub fn sample_new(param: &BondParam, beta: f64, prng: &mut Prng) -> BondSample {
    if param.fixed {
        return BondSample::at(param, beta, param.length);
    }
    loop {
        let stretch = loop {
            let f = STRETCH_MIN + prng.rand_bound(STRETCH_WIDTH);
            if f * f * f / STRETCH_JACOBIAN_MAX >= prng.rand() {
                break f;
            }
        };
        let sample = BondSample::at(param, beta, stretch * param.length);
        if sample.weight >= prng.rand() {
            return sample;
        }
    }
}

/// Bond energy and weight for a length measured from an existing conformation.
pub fn measure_old(param: &BondParam, beta: f64, length: f64) -> BondSample {
    BondSample::at(param, beta, length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::BOLTZMANN_KCAL;

    const BETA: f64 = 1.0 / (BOLTZMANN_KCAL * 298.15);

    fn free_bond() -> BondParam {
        BondParam {
            length: 1.5,
            k: 100.0,
            fixed: false,
        }
    }

    #[test]
    fn fixed_bond_always_sits_at_equilibrium() {
        let param = BondParam {
            length: 1.54,
            k: 300.0,
            fixed: true,
        };
        let mut prng = Prng::seeded(17);
        for _ in 0..100 {
            let sample = sample_new(&param, BETA, &mut prng);
            assert_eq!(sample.length, 1.54);
            assert_eq!(sample.energy, 0.0);
            assert_eq!(sample.weight, 1.0);
        }
    }

    #[test]
    fn fixed_bond_weight_is_boltzmann_factor_of_its_energy() {
        // A fixed bond may carry a nonzero constant energy if it is off its own minimum.
        let param = BondParam {
            length: 1.0,
            k: 2.0,
            fixed: true,
        };
        let sample = measure_old(&param, BETA, 1.1);
        assert!((sample.energy - 0.02).abs() < 1e-12);
        assert!((sample.weight - (-BETA * 0.02).exp()).abs() < 1e-12);
    }

    #[test]
    fn free_bond_stays_inside_stretch_interval() {
        let param = free_bond();
        let mut prng = Prng::seeded(99);
        for _ in 0..2_000 {
            let sample = sample_new(&param, BETA, &mut prng);
            assert!(sample.length >= 0.9 * 1.5 - 1e-12);
            assert!(sample.length <= 1.1 * 1.5 + 1e-12);
            assert!(sample.weight > 0.0 && sample.weight <= 1.0);
        }
    }

    fn target_density(param: &BondParam, f: f64) -> f64 {
        f * f * f * (-BETA * param.energy(f * param.length)).exp()
    }

    /// Simpson's rule over `[a, b]` with an even number of panels.
    fn integrate(param: &BondParam, a: f64, b: f64) -> f64 {
        let panels = 200;
        let h = (b - a) / panels as f64;
        let mut sum = target_density(param, a) + target_density(param, b);
        for i in 1..panels {
            let coeff = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += coeff * target_density(param, a + i as f64 * h);
        }
        sum * h / 3.0
    }

    #[test]
    fn free_bond_matches_target_density_chi_square() {
        let param = free_bond();
        let mut prng = Prng::seeded(20240611);
        let samples = 10_000;
        let bins = 10;
        let width = 0.2 / bins as f64;

        let mut observed = vec![0usize; bins];
        for _ in 0..samples {
            let f = sample_new(&param, BETA, &mut prng).length / param.length;
            let bin = (((f - 0.9) / width) as usize).min(bins - 1);
            observed[bin] += 1;
        }

        let norm = integrate(&param, 0.9, 1.1);
        let chi_square: f64 = (0..bins)
            .map(|i| {
                let lo = 0.9 + i as f64 * width;
                let p = integrate(&param, lo, lo + width) / norm;
                let expected = p * samples as f64;
                let diff = observed[i] as f64 - expected;
                diff * diff / expected
            })
            .sum();

        // Critical value for 9 degrees of freedom at a significance of 0.001.
        assert!(chi_square < 27.877, "chi-square {chi_square}, bins {observed:?}");
    }

    #[test]
    fn measured_length_is_not_resampled() {
        let sample = measure_old(&free_bond(), BETA, 1.4);
        assert_eq!(sample.length, 1.4);
        assert!((sample.energy - 100.0 * 0.01).abs() < 1e-12);
    }
}
