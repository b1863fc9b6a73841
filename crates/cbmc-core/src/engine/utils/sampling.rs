use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::warn;

/// The pseudo-random stream consumed by link sampling.
///
/// One stream serves one workspace. Concurrent workers get their own
/// instance (for example with seeds derived from a master seed), never a
/// shared one, so each worker's sequence stays reproducible.
#[derive(Debug, Clone)]
pub struct Prng {
    rng: StdRng,
}

impl Prng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform draw in `[0, 1)`.
    #[inline]
    pub fn rand(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    /// Uniform draw in `[0, bound)`.
    #[inline]
    pub fn rand_bound(&mut self, bound: f64) -> f64 {
        self.rand() * bound
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Roulette-wheel selection over non-negative `weights` summing to `total`.
    ///
    /// Falls back to a uniform pick when `total` is zero or not finite, so a
    /// batch in which every trial overlaps still yields a valid index.
    pub fn pick_weighted(&mut self, weights: &[f64], total: f64) -> usize {
        debug_assert!(!weights.is_empty());
        if weights.is_empty() {
            return 0;
        }
        if !(total > 0.0 && total.is_finite()) {
            warn!(
                total,
                trials = weights.len(),
                "Total trial weight is not positive; picking a trial uniformly."
            );
            return self.index(weights.len());
        }
        let draw = self.rand() * total;
        select_by_draw(weights, draw)
    }
}

/// Index of the first entry whose running sum exceeds `draw`.
///
/// Zero weights never advance the running sum and so are never selected
/// while a positive weight exists. If rounding leaves `draw` beyond the
/// final sum, the last positive entry is returned.
pub fn select_by_draw(weights: &[f64], draw: f64) -> usize {
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w > 0.0 {
            cumulative += w;
            last_positive = i;
            if cumulative > draw {
                return i;
            }
        }
    }
    last_positive
}
