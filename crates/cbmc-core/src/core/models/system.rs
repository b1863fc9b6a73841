use super::ids::MoleculeId;
use super::topology::{MoleculeKind, TopologyError};
use crate::core::utils::geometry::PeriodicBox;
use nalgebra::Point3;
use slotmap::SlotMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub kind: usize,
    pub coords: Vec<Point3<f64>>,
}

/// The surrounding particles a growing molecule interacts with.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    sim_box: PeriodicBox,
    kinds: Vec<MoleculeKind>,
    molecules: SlotMap<MoleculeId, Molecule>,
}

impl ParticleSystem {
    pub fn new(sim_box: PeriodicBox) -> Self {
        Self {
            sim_box,
            kinds: Vec::new(),
            molecules: SlotMap::with_key(),
        }
    }

    pub fn sim_box(&self) -> &PeriodicBox {
        &self.sim_box
    }

    /// Registers a molecule kind and returns its index.
    pub fn add_kind(&mut self, kind: MoleculeKind) -> usize {
        self.kinds.push(kind);
        self.kinds.len() - 1
    }

    pub fn kind(&self, index: usize) -> Option<&MoleculeKind> {
        self.kinds.get(index)
    }

    pub fn add_molecule(
        &mut self,
        kind: usize,
        coords: Vec<Point3<f64>>,
    ) -> Result<MoleculeId, TopologyError> {
        let expected = self
            .kinds
            .get(kind)
            .ok_or(TopologyError::UnknownMoleculeKind(kind))?
            .atom_count();
        if coords.len() != expected {
            return Err(TopologyError::CoordinateCount {
                expected,
                got: coords.len(),
            });
        }
        let coords = coords.into_iter().map(|p| self.sim_box.wrap(p)).collect();
        Ok(self.molecules.insert(Molecule { kind, coords }))
    }

    pub fn remove_molecule(&mut self, id: MoleculeId) -> Option<Molecule> {
        self.molecules.remove(id)
    }

    pub fn molecule(&self, id: MoleculeId) -> Option<&Molecule> {
        self.molecules.get(id)
    }

    pub fn molecule_count(&self) -> usize {
        self.molecules.len()
    }

    /// Every molecule paired with its kind.
    pub fn molecules_iter(&self) -> impl Iterator<Item = (MoleculeId, &Molecule, &MoleculeKind)> {
        self.molecules
            .iter()
            .filter_map(|(id, mol)| self.kinds.get(mol.kind).map(|kind| (id, mol, kind)))
    }
}
