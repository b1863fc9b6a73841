use std::ops::{Add, AddAssign};

/// Energy decomposition carried by a growing molecule.
///
/// `intra_bond` holds the bond stretch, bend and torsion energies, while
/// `intra_nonbond` collects the 1-3, 1-4 and longer-range intramolecular
/// nonbonded terms. The remaining fields follow the Ewald split of the
/// electrostatics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Energy {
    pub intra_bond: f64,
    pub intra_nonbond: f64,
    pub inter: f64,
    pub real: f64,
    pub recip: f64,
    pub self_energy: f64,
    pub correction: f64,
}

impl Energy {
    pub fn new(
        intra_bond: f64,
        intra_nonbond: f64,
        inter: f64,
        real: f64,
        recip: f64,
        self_energy: f64,
        correction: f64,
    ) -> Self {
        Self {
            intra_bond,
            intra_nonbond,
            inter,
            real,
            recip,
            self_energy,
            correction,
        }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.intra_bond
            + self.intra_nonbond
            + self.inter
            + self.real
            + self.recip
            + self.self_energy
            + self.correction
    }
}

impl Add for Energy {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            intra_bond: self.intra_bond + rhs.intra_bond,
            intra_nonbond: self.intra_nonbond + rhs.intra_nonbond,
            inter: self.inter + rhs.inter,
            real: self.real + rhs.real,
            recip: self.recip + rhs.recip,
            self_energy: self.self_energy + rhs.self_energy,
            correction: self.correction + rhs.correction,
        }
    }
}

impl AddAssign for Energy {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
