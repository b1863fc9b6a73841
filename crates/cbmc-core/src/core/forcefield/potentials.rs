use std::f64::consts::PI;

pub const COULOMB_CONSTANT: f64 = 332.0637; // In kcal·Å/(mol·e²)

/// Energy of two overlapping sites, repulsive whatever the sign of the charges.
pub const OVERLAP_ENERGY: f64 = 1e10;

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return OVERLAP_ENERGY;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

#[inline]
pub fn coulomb(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < 1e-6 {
        return OVERLAP_ENERGY;
    }
    COULOMB_CONSTANT * q1 * q2 / (dielectric * dist)
}

/// Real-space part of the Ewald sum for a single pair.
#[inline]
pub fn damped_coulomb(dist: f64, q1: f64, q2: f64, alpha: f64) -> f64 {
    if dist < 1e-6 {
        return OVERLAP_ENERGY;
    }
    COULOMB_CONSTANT * q1 * q2 * erfc(alpha * dist) / dist
}

/// Interaction of a point charge with its own screening cloud.
#[inline]
pub fn ewald_self(q: f64, alpha: f64) -> f64 {
    -COULOMB_CONSTANT * q * q * alpha / PI.sqrt()
}

/// Removes the reciprocal-space interaction of an excluded intramolecular pair.
///
/// Finite at zero separation, where it tends to `-K q1 q2 2 alpha / sqrt(pi)`.
#[inline]
pub fn ewald_exclusion(dist: f64, q1: f64, q2: f64, alpha: f64) -> f64 {
    if dist < 1e-6 {
        return -COULOMB_CONSTANT * q1 * q2 * 2.0 * alpha / PI.sqrt();
    }
    -COULOMB_CONSTANT * q1 * q2 * erf(alpha * dist) / dist
}

#[inline]
pub fn harmonic(value: f64, equilibrium: f64, force_constant: f64) -> f64 {
    let delta = value - equilibrium;
    force_constant * delta * delta
}

#[inline]
pub fn periodic_torsion(phi: f64, force_constant: f64, periodicity: f64, phase: f64) -> f64 {
    force_constant * (1.0 + (periodicity * phi - phase).cos())
}

/// Below this argument `erf` is summed as a series, above it `erfc` as a continued fraction.
const ERF_SERIES_LIMIT: f64 = 2.5;
const ERFC_FRACTION_DEPTH: u32 = 160;

/// Complementary error function, accurate to near machine precision over the whole real line.
pub fn erfc(x: f64) -> f64 {
    if x < 0.0 {
        return 2.0 - erfc(-x);
    }
    if x < ERF_SERIES_LIMIT {
        return 1.0 - erf_series(x);
    }
    // erfc(x) = exp(-x²)/√π · 1/(x + (1/2)/(x + 1/(x + (3/2)/(x + ...))))
    let mut f = x;
    for n in (1..=ERFC_FRACTION_DEPTH).rev() {
        f = x + 0.5 * f64::from(n) / f;
    }
    (-x * x).exp() / (PI.sqrt() * f)
}

pub fn erf(x: f64) -> f64 {
    if x < 0.0 {
        return -erf(-x);
    }
    if x < ERF_SERIES_LIMIT {
        erf_series(x)
    } else {
        1.0 - erfc(x)
    }
}

/// `erf(x) = 2/√π · exp(-x²) · Σ (2x²)^n x / (2n+1)!!` for `x >= 0`; every term is positive.
fn erf_series(x: f64) -> f64 {
    let x2 = x * x;
    let mut term = x;
    let mut sum = x;
    let mut n = 0.0;
    while term > f64::EPSILON * 1e-2 * sum {
        n += 1.0;
        term *= 2.0 * x2 / (2.0 * n + 1.0);
        sum += term;
    }
    2.0 / PI.sqrt() * (-x2).exp() * sum
}
