use super::ids::MoleculeId;
use super::topology::{MoleculeKind, TopologyError};
use crate::core::forcefield::term::Energy;
use crate::core::utils::geometry::{Basis, PeriodicBox};
use nalgebra::Point3;

/// A molecule being grown (or retraced) atom by atom.
///
/// Atoms only take part in energy sums once they exist: new atoms are added by
/// [`TrialMol::add_atom`], while the atoms of an existing conformation are
/// switched on one at a time by [`TrialMol::confirm_old_atom`]. The running
/// Rosenbluth weight and energy decomposition accumulate across links.
#[derive(Debug, Clone)]
pub struct TrialMol<'a> {
    kind: &'a MoleculeKind,
    molecule: Option<MoleculeId>,
    coords: Vec<Point3<f64>>,
    exists: Vec<bool>,
    sim_box: PeriodicBox,
    basis: Basis,
    weight: f64,
    energy: Energy,
}

impl<'a> TrialMol<'a> {
    /// An empty molecule: every atom still has to be placed.
    pub fn new(kind: &'a MoleculeKind, sim_box: PeriodicBox) -> Self {
        let n = kind.atom_count();
        Self {
            kind,
            molecule: None,
            coords: vec![Point3::origin(); n],
            exists: vec![false; n],
            sim_box,
            basis: Basis::from_anchors(Point3::origin(), None, None, &sim_box),
            weight: 1.0,
            energy: Energy::default(),
        }
    }

    /// An existing conformation to be retraced. No atom is confirmed yet.
    pub fn from_coordinates(
        kind: &'a MoleculeKind,
        coords: Vec<Point3<f64>>,
        sim_box: PeriodicBox,
    ) -> Result<Self, TopologyError> {
        if coords.len() != kind.atom_count() {
            return Err(TopologyError::CoordinateCount {
                expected: kind.atom_count(),
                got: coords.len(),
            });
        }
        let mut mol = Self::new(kind, sim_box);
        mol.coords = coords;
        Ok(mol)
    }

    /// Marks this trial as a molecule already present in the system, so that
    /// intermolecular sums skip its own stored copy.
    pub fn with_molecule(mut self, id: MoleculeId) -> Self {
        self.molecule = Some(id);
        self
    }

    pub fn kind(&self) -> &'a MoleculeKind {
        self.kind
    }

    pub fn molecule(&self) -> Option<MoleculeId> {
        self.molecule
    }

    pub fn sim_box(&self) -> &PeriodicBox {
        &self.sim_box
    }

    pub fn coords(&self) -> &[Point3<f64>] {
        &self.coords
    }

    pub fn atom_exists(&self, atom: usize) -> bool {
        self.exists.get(atom).copied().unwrap_or(false)
    }

    pub fn atom_position(&self, atom: usize) -> Point3<f64> {
        self.coords[atom]
    }

    pub fn dist_sq(&self, a: usize, b: usize) -> f64 {
        self.sim_box.dist_sq(&self.coords[a], &self.coords[b])
    }

    /// Angle `a-vertex-c` in radians.
    pub fn theta(&self, a: usize, vertex: usize, c: usize) -> f64 {
        self.sim_box
            .angle(&self.coords[a], &self.coords[vertex], &self.coords[c])
    }

    pub fn set_basis(&mut self, focus: usize, prev: Option<usize>, prevprev: Option<usize>) {
        self.basis = Basis::from_anchors(
            self.coords[focus],
            prev.map(|p| self.coords[p]),
            prevprev.map(|p| self.coords[p]),
            &self.sim_box,
        );
    }

    /// Position at `(bond, theta, phi)` in the current basis.
    pub fn rect_coords(&self, bond: f64, theta: f64, phi: f64) -> Point3<f64> {
        self.basis.to_world(bond, theta, phi)
    }

    /// Measured `(theta, phi)` of an atom in the current basis.
    pub fn old_theta_and_phi(&self, atom: usize) -> (f64, f64) {
        let (_, theta, phi) = self.basis.to_local(&self.coords[atom], &self.sim_box);
        (theta, phi)
    }

    pub fn add_atom(&mut self, atom: usize, position: Point3<f64>) {
        self.coords[atom] = position;
        self.exists[atom] = true;
    }

    pub fn confirm_old_atom(&mut self, atom: usize) {
        self.exists[atom] = true;
    }

    pub fn mult_weight(&mut self, factor: f64) {
        self.weight *= factor;
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn add_energy(&mut self, energy: Energy) {
        self.energy += energy;
    }

    pub fn energy(&self) -> &Energy {
        &self.energy
    }
}
