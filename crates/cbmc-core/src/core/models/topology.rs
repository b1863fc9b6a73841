use std::collections::VecDeque;
use thiserror::Error;

/// Bond separation reported for pairs more than three bonds apart (or disconnected).
pub const FAR_SEPARATION: u8 = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Atom index {atom} is out of range for a molecule kind with {count} atoms")]
    AtomOutOfRange { atom: usize, count: usize },

    #[error("Atom {atom} is not bonded to focus atom {focus}")]
    NotBonded { atom: usize, focus: usize },

    #[error("Bond kind {0} has no forcefield parameters")]
    UnknownBondKind(usize),

    #[error("Angle kind {0} has no forcefield parameters")]
    UnknownAngleKind(usize),

    #[error("Dihedral kind {0} has no forcefield parameters")]
    UnknownDihedralKind(usize),

    #[error("Growth chain for atom {atom} around focus {focus} is inconsistent: {reason}")]
    InconsistentChain {
        atom: usize,
        focus: usize,
        reason: String,
    },

    #[error("Molecule kind index {0} is not registered")]
    UnknownMoleculeKind(usize),

    #[error("Expected {expected} coordinates for the molecule kind, got {got}")]
    CoordinateCount { expected: usize, got: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub a0: usize,
    pub a1: usize,
    pub kind: usize,
}

impl Bond {
    pub fn new(a0: usize, a1: usize, kind: usize) -> Self {
        Self { a0, a1, kind }
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.a0 == atom || self.a1 == atom
    }

    pub fn partner(&self, atom: usize) -> Option<usize> {
        if self.a0 == atom {
            Some(self.a1)
        } else if self.a1 == atom {
            Some(self.a0)
        } else {
            None
        }
    }
}

/// Bend `a0-a1-a2` with the vertex at `a1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Angle {
    pub a0: usize,
    pub a1: usize,
    pub a2: usize,
    pub kind: usize,
}

impl Angle {
    pub fn new(a0: usize, a1: usize, a2: usize, kind: usize) -> Self {
        Self { a0, a1, a2, kind }
    }

    /// Returns the angle oriented so that `atom` is `a0`, if it is a terminal.
    pub fn ending_at(&self, atom: usize) -> Option<Self> {
        if self.a0 == atom {
            Some(*self)
        } else if self.a2 == atom {
            Some(Self::new(self.a2, self.a1, self.a0, self.kind))
        } else {
            None
        }
    }
}

/// Torsion `a0-a1-a2-a3` about the `a1-a2` bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dihedral {
    pub a0: usize,
    pub a1: usize,
    pub a2: usize,
    pub a3: usize,
    pub kind: usize,
}

impl Dihedral {
    pub fn new(a0: usize, a1: usize, a2: usize, a3: usize, kind: usize) -> Self {
        Self {
            a0,
            a1,
            a2,
            a3,
            kind,
        }
    }

    /// Returns the dihedral oriented so that `atom` is `a0`, if it is a terminal.
    pub fn ending_at(&self, atom: usize) -> Option<Self> {
        if self.a0 == atom {
            Some(*self)
        } else if self.a3 == atom {
            Some(Self::new(self.a3, self.a2, self.a1, self.a0, self.kind))
        } else {
            None
        }
    }
}

/// Per-atom nonbonded parameters. `r_min` and `well_depth` follow the 12-6 form.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomParams {
    pub name: String,
    pub charge: f64,
    pub r_min: f64,
    pub well_depth: f64,
}

impl AtomParams {
    pub fn new(name: &str, charge: f64, r_min: f64, well_depth: f64) -> Self {
        Self {
            name: name.to_string(),
            charge,
            r_min,
            well_depth,
        }
    }
}

/// Static connectivity shared by every molecule of one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeKind {
    name: String,
    atoms: Vec<AtomParams>,
    bonds: Vec<Bond>,
    angles: Vec<Angle>,
    dihedrals: Vec<Dihedral>,
    /// Row-major topological distance, capped at [`FAR_SEPARATION`].
    separation: Vec<u8>,
}

impl MoleculeKind {
    pub fn new(
        name: &str,
        atoms: Vec<AtomParams>,
        bonds: Vec<Bond>,
        angles: Vec<Angle>,
        dihedrals: Vec<Dihedral>,
    ) -> Result<Self, TopologyError> {
        let count = atoms.len();
        let check = |atom: usize| {
            if atom < count {
                Ok(())
            } else {
                Err(TopologyError::AtomOutOfRange { atom, count })
            }
        };
        for b in &bonds {
            check(b.a0)?;
            check(b.a1)?;
        }
        for a in &angles {
            check(a.a0)?;
            check(a.a1)?;
            check(a.a2)?;
        }
        for d in &dihedrals {
            check(d.a0)?;
            check(d.a1)?;
            check(d.a2)?;
            check(d.a3)?;
        }

        let separation = bond_separations(count, &bonds);
        Ok(Self {
            name: name.to_string(),
            atoms,
            bonds,
            angles,
            dihedrals,
            separation,
        })
    }

    /// Unbranched chain `0-1-2-...` with every bond, angle and dihedral of one kind each.
    pub fn linear_chain(
        name: &str,
        atoms: Vec<AtomParams>,
        bond_kind: usize,
        angle_kind: usize,
        dihedral_kind: usize,
    ) -> Result<Self, TopologyError> {
        let n = atoms.len();
        let bonds = (1..n).map(|i| Bond::new(i - 1, i, bond_kind)).collect();
        let angles = (2..n)
            .map(|i| Angle::new(i - 2, i - 1, i, angle_kind))
            .collect();
        let dihedrals = (3..n)
            .map(|i| Dihedral::new(i - 3, i - 2, i - 1, i, dihedral_kind))
            .collect();
        Self::new(name, atoms, bonds, angles, dihedrals)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn atom(&self, index: usize) -> Option<&AtomParams> {
        self.atoms.get(index)
    }

    pub fn atoms(&self) -> &[AtomParams] {
        &self.atoms
    }

    pub fn atom_bonds(&self, atom: usize) -> impl Iterator<Item = &Bond> {
        self.bonds.iter().filter(move |b| b.contains(atom))
    }

    /// Angles with `atom` as a terminal, oriented so that `atom` comes first.
    pub fn atom_end_angles(&self, atom: usize) -> impl Iterator<Item = Angle> + '_ {
        self.angles.iter().filter_map(move |a| a.ending_at(atom))
    }

    /// Dihedrals with `atom` as a terminal, oriented so that `atom` comes first.
    pub fn atom_end_dihedrals(&self, atom: usize) -> impl Iterator<Item = Dihedral> + '_ {
        self.dihedrals.iter().filter_map(move |d| d.ending_at(atom))
    }

    /// Number of bonds on the shortest path between two atoms, capped at [`FAR_SEPARATION`].
    pub fn separation(&self, i: usize, j: usize) -> u8 {
        self.separation
            .get(i * self.atoms.len() + j)
            .copied()
            .unwrap_or(FAR_SEPARATION)
    }
}

fn bond_separations(count: usize, bonds: &[Bond]) -> Vec<u8> {
    let mut neighbors = vec![Vec::new(); count];
    for b in bonds {
        neighbors[b.a0].push(b.a1);
        neighbors[b.a1].push(b.a0);
    }

    let mut separation = vec![FAR_SEPARATION; count * count];
    let mut queue = VecDeque::new();
    for start in 0..count {
        let row = &mut separation[start * count..(start + 1) * count];
        row[start] = 0;
        queue.clear();
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            let next = row[current] + 1;
            if next >= FAR_SEPARATION {
                continue;
            }
            for &n in &neighbors[current] {
                if row[n] > next {
                    row[n] = next;
                    queue.push_back(n);
                }
            }
        }
    }
    separation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carbon() -> AtomParams {
        AtomParams::new("C", 0.0, 3.9, 0.09)
    }

    fn pentane() -> MoleculeKind {
        MoleculeKind::linear_chain("pentane", vec![carbon(); 5], 0, 0, 0).unwrap()
    }

    #[test]
    fn linear_chain_generates_consecutive_bonded_terms() {
        let kind = pentane();
        assert_eq!(kind.atom_count(), 5);
        assert_eq!(kind.atom_bonds(2).count(), 2);
        assert_eq!(kind.atom_end_angles(4).count(), 1);
        assert_eq!(kind.atom_end_dihedrals(0).count(), 1);
    }

    #[test]
    fn end_lookups_orient_queried_atom_first() {
        let kind = pentane();
        let angle = kind.atom_end_angles(4).next().unwrap();
        assert_eq!((angle.a0, angle.a1, angle.a2), (4, 3, 2));
        let dih = kind.atom_end_dihedrals(4).next().unwrap();
        assert_eq!((dih.a0, dih.a1, dih.a2, dih.a3), (4, 3, 2, 1));
    }

    #[test]
    fn middle_atoms_are_not_angle_terminals() {
        let kind = pentane();
        assert!(kind.atom_end_angles(2).all(|a| a.a0 == 2));
        assert_eq!(kind.atom_end_angles(2).count(), 2);
    }

    #[test]
    fn separation_counts_bonds_and_caps_far_pairs() {
        let kind = pentane();
        assert_eq!(kind.separation(0, 0), 0);
        assert_eq!(kind.separation(0, 1), 1);
        assert_eq!(kind.separation(0, 2), 2);
        assert_eq!(kind.separation(3, 0), 3);
        assert_eq!(kind.separation(0, 4), FAR_SEPARATION);
    }

    #[test]
    fn disconnected_atoms_are_far_apart() {
        let kind = MoleculeKind::new("pair", vec![carbon(), carbon()], vec![], vec![], vec![])
            .unwrap();
        assert_eq!(kind.separation(0, 1), FAR_SEPARATION);
    }

    #[test]
    fn new_rejects_out_of_range_atoms() {
        let result = MoleculeKind::new(
            "broken",
            vec![carbon(), carbon()],
            vec![Bond::new(0, 2, 0)],
            vec![],
            vec![],
        );
        assert_eq!(
            result.unwrap_err(),
            TopologyError::AtomOutOfRange { atom: 2, count: 2 }
        );
    }

    #[test]
    fn bond_partner_returns_other_endpoint() {
        let bond = Bond::new(3, 7, 0);
        assert_eq!(bond.partner(3), Some(7));
        assert_eq!(bond.partner(7), Some(3));
        assert_eq!(bond.partner(5), None);
    }
}
