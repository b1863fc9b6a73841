use crate::core::forcefield::params::{AngleParam, BondParam, DihedralParam, Forcefield};
use crate::core::models::topology::{MoleculeKind, TopologyError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedAngle {
    pub kind: usize,
    pub param: AngleParam,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDihedral {
    pub kind: usize,
    pub param: DihedralParam,
}

/// Bonded terms and chain anchors of one `(atom, focus)` growth step.
///
/// `angle` is `None` when no angle ends at `atom` with its vertex on `focus`,
/// and `dihedral` is `None` when no torsion runs `atom-focus-prev-prevprev`.
/// Both are legitimate at the start of a chain; the samplers skip the
/// corresponding stage.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTopology {
    pub atom: usize,
    pub focus: usize,
    pub prev: Option<usize>,
    pub prevprev: Option<usize>,
    pub bond_kind: usize,
    pub bond: BondParam,
    pub angle: Option<ResolvedAngle>,
    pub dihedral: Option<ResolvedDihedral>,
}

impl LinkTopology {
    pub fn resolve(
        kind: &MoleculeKind,
        forcefield: &Forcefield,
        atom: usize,
        focus: usize,
    ) -> Result<Self, TopologyError> {
        let count = kind.atom_count();
        for index in [atom, focus] {
            if index >= count {
                return Err(TopologyError::AtomOutOfRange { atom: index, count });
            }
        }

        let bond = kind
            .atom_bonds(atom)
            .find(|b| atom != focus && b.partner(atom) == Some(focus))
            .ok_or(TopologyError::NotBonded { atom, focus })?;
        let bond_param = *forcefield
            .bond(bond.kind)
            .ok_or(TopologyError::UnknownBondKind(bond.kind))?;

        let dihedral = kind.atom_end_dihedrals(atom).find(|d| d.a1 == focus);
        let angle_term = match dihedral {
            Some(d) => Some(
                kind.atom_end_angles(atom)
                    .find(|a| a.a1 == focus && a.a2 == d.a2)
                    .ok_or_else(|| TopologyError::InconsistentChain {
                        atom,
                        focus,
                        reason: format!(
                            "dihedral {}-{}-{}-{} has no matching angle {}-{}-{}",
                            d.a0, d.a1, d.a2, d.a3, atom, focus, d.a2
                        ),
                    })?,
            ),
            None => kind.atom_end_angles(atom).find(|a| a.a1 == focus),
        };

        let prev = angle_term.map(|a| a.a2);
        let prevprev = dihedral.map(|d| d.a3);

        let angle = angle_term
            .map(|a| {
                forcefield
                    .angle(a.kind)
                    .map(|param| ResolvedAngle {
                        kind: a.kind,
                        param: *param,
                    })
                    .ok_or(TopologyError::UnknownAngleKind(a.kind))
            })
            .transpose()?;
        let resolved_dihedral = dihedral
            .map(|d| {
                forcefield
                    .dihedral(d.kind)
                    .map(|param| ResolvedDihedral {
                        kind: d.kind,
                        param: param.clone(),
                    })
                    .ok_or(TopologyError::UnknownDihedralKind(d.kind))
            })
            .transpose()?;

        debug!(
            atom,
            focus,
            ?prev,
            ?prevprev,
            bond_kind = bond.kind,
            bond_fixed = bond_param.fixed,
            "Resolved link topology."
        );

        Ok(Self {
            atom,
            focus,
            prev,
            prevprev,
            bond_kind: bond.kind,
            bond: bond_param,
            angle,
            dihedral: resolved_dihedral,
        })
    }

    pub fn bond_fixed(&self) -> bool {
        self.bond.fixed
    }

    pub fn angle_fixed(&self) -> bool {
        self.angle.is_some_and(|a| a.param.fixed)
    }

    /// Torsion energy at `phi`, zero for a free rotation.
    pub fn dihedral_energy(&self, phi: f64) -> f64 {
        self.dihedral.as_ref().map_or(0.0, |d| d.param.energy(phi))
    }

    /// Bend energy at `theta`, zero when there is no bend.
    pub fn angle_energy(&self, theta: f64) -> f64 {
        self.angle.map_or(0.0, |a| a.param.energy(theta))
    }
}
