//! # Link Operator
//!
//! Grows one atom onto a bonded focus atom, or retraces an atom that is
//! already there, and reports the Rosenbluth weight of that step.
//!
//! A link runs its stages strictly in order, each one consuming the value the
//! previous stage chose:
//!
//! - **Topology** ([`topology`]) - bond, angle and dihedral terms plus the `prev`/`prevprev` anchors
//! - **Bond** ([`bond`]) - fixed length or two-stage rejection sampling
//! - **Angle** ([`angle`]) - biased bend trials with a 1-3 correction
//! - **Dihedral** ([`dihedral`]) - biased torsion trials with a 1-4 correction, one set per placement
//! - **Nonbonded** - batch inter, real-space, intramolecular, self and correction energies
//!
//! When growing, every stage picks a winner by roulette-wheel selection. When
//! retracing, the measured conformation takes the place of trial 0 at each
//! stage, and the remaining trials are drawn exactly as for growth so that the
//! two weights can be compared in an acceptance test.

pub mod angle;
pub mod bond;
pub mod dihedral;
pub(crate) mod nonbonded;
pub mod topology;

use self::angle::AngleSample;
use self::bond::BondSample;
use self::dihedral::{ChainGeometry, DihedralChoice};
use self::topology::LinkTopology;
use super::error::EngineError;
use super::utils::sampling::Prng;
use super::workspace::{TrialBuffers, TrialWorkspace};
use crate::core::energy::ShortRangeCalculator;
use crate::core::forcefield::params::Forcefield;
use crate::core::forcefield::term::Energy;
use crate::core::models::topology::MoleculeKind;
use crate::core::models::trial_mol::TrialMol;
use nalgebra::Point3;
use std::f64::consts::PI;
use tracing::{debug, instrument, trace};

/// Energy substituted for a NaN pair term from degenerate geometry.
pub const BIG_ENERGY: f64 = 1.0e20;

#[inline]
pub(crate) fn clamp_degenerate(energy: f64) -> f64 {
    if energy.is_nan() { BIG_ENERGY } else { energy }
}

/// Read-only inputs shared by the angle and dihedral stages of one call.
#[derive(Clone, Copy)]
pub(crate) struct StageContext<'s> {
    pub topology: &'s LinkTopology,
    pub kind: &'s MoleculeKind,
    pub short_range: &'s dyn ShortRangeCalculator,
    pub beta: f64,
}

impl<'s> StageContext<'s> {
    pub fn new(
        topology: &'s LinkTopology,
        kind: &'s MoleculeKind,
        short_range: &'s dyn ShortRangeCalculator,
        beta: f64,
    ) -> Self {
        Self {
            topology,
            kind,
            short_range,
            beta,
        }
    }
}

/// Progress of the current call. Construction already resolves the topology,
/// so a link is never observed before [`LinkStage::TopologyResolved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStage {
    TopologyResolved,
    BondSet,
    AngleSet,
    PlacementsGenerated,
    NonbondedEvaluated,
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkWeights {
    pub bond: f64,
    pub bend: f64,
    /// Sum over placements of torsion and nonbonded Boltzmann factors.
    pub nonbonded: f64,
}

impl LinkWeights {
    #[inline]
    pub fn total(&self) -> f64 {
        self.bond * self.bend * self.nonbonded
    }
}

/// What one link call placed (or measured) and what it contributed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkResult {
    pub position: Point3<f64>,
    pub bond_length: f64,
    pub theta: f64,
    pub phi: f64,
    pub energy: Energy,
    pub weights: LinkWeights,
    /// Index of the accepted placement; always 0 for a retrace.
    pub trial: usize,
}

impl LinkResult {
    #[inline]
    pub fn weight(&self) -> f64 {
        self.weights.total()
    }
}

/// Two-phase contract of a growth component.
///
/// `prepare_*` settles the bond and bend, `build_*` generates the placements,
/// evaluates them and updates the trial molecule. A `build_*` call that does
/// not follow its matching `prepare_*` prepares first.
///
/// The trial molecule must be of the kind the component was built for, with
/// the focus and its preceding anchors already placed or confirmed.
pub trait DcComponent {
    fn prepare_new(&mut self, ws: &mut TrialWorkspace<'_>, mol: &TrialMol<'_>);
    fn build_new(&mut self, ws: &mut TrialWorkspace<'_>, mol: &mut TrialMol<'_>) -> LinkResult;
    fn prepare_old(&mut self, ws: &mut TrialWorkspace<'_>, mol: &TrialMol<'_>);
    fn build_old(&mut self, ws: &mut TrialWorkspace<'_>, mol: &mut TrialMol<'_>) -> LinkResult;

    /// Places the growing atom into `mol`, multiplying the link weight into it.
    fn grow_new(&mut self, ws: &mut TrialWorkspace<'_>, mol: &mut TrialMol<'_>) -> LinkResult {
        self.prepare_new(ws, mol);
        self.build_new(ws, mol)
    }

    /// Confirms the existing atom in `mol`, multiplying its retrace weight into it.
    fn retrace_old(&mut self, ws: &mut TrialWorkspace<'_>, mol: &mut TrialMol<'_>) -> LinkResult {
        self.prepare_old(ws, mol);
        self.build_old(ws, mol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrowthMode {
    New,
    Old,
}

#[derive(Debug, Clone, Copy)]
struct Prepared {
    mode: GrowthMode,
    bond: BondSample,
    prev_bond: f64,
    prevprev_bond: f64,
    /// For a retrace only `bend_weight` is set: the summed weight of the extra bend trials.
    angle: AngleSample,
}

/// The link operator for one `(atom, focus)` pair of a molecule kind.
///
/// Reusable across any number of calls: the topology persists while the
/// per-call state is rebuilt each time.
#[derive(Debug, Clone)]
pub struct DcLink {
    topology: LinkTopology,
    stage: LinkStage,
    prepared: Option<Prepared>,
}

impl DcLink {
    pub fn new(
        kind: &MoleculeKind,
        forcefield: &Forcefield,
        atom: usize,
        focus: usize,
    ) -> Result<Self, EngineError> {
        let topology = LinkTopology::resolve(kind, forcefield, atom, focus)?;
        Ok(Self {
            topology,
            stage: LinkStage::TopologyResolved,
            prepared: None,
        })
    }

    pub fn topology(&self) -> &LinkTopology {
        &self.topology
    }

    pub fn atom(&self) -> usize {
        self.topology.atom
    }

    pub fn focus(&self) -> usize {
        self.topology.focus
    }

    pub fn stage(&self) -> LinkStage {
        self.stage
    }

    fn anchor_lengths(&self, mol: &TrialMol) -> (f64, f64) {
        let focus = self.topology.focus;
        match (self.topology.prev, self.topology.prevprev) {
            (Some(prev), Some(prevprev)) => (
                mol.dist_sq(prev, focus).sqrt(),
                mol.dist_sq(prevprev, prev).sqrt(),
            ),
            (Some(prev), None) => (mol.dist_sq(prev, focus).sqrt(), 0.0),
            _ => (0.0, 0.0),
        }
    }

    fn chain_geometry(&self, mol: &TrialMol, prepared: &Prepared, theta: f64) -> ChainGeometry {
        let theta_prev = match (self.topology.prevprev, self.topology.prev) {
            (Some(prevprev), Some(prev)) => mol.theta(prevprev, prev, self.topology.focus),
            _ => 0.0,
        };
        ChainGeometry {
            prevprev_bond: prepared.prevprev_bond,
            prev_bond: prepared.prev_bond,
            bond: prepared.bond.length,
            theta_prev,
            theta,
        }
    }

    /// True when `mol` covers this link's atoms and its anchors are already placed.
    fn anchors_placed(&self, mol: &TrialMol) -> bool {
        let t = &self.topology;
        let count = mol.kind().atom_count();
        let anchors = [Some(t.focus), t.prev, t.prevprev];
        t.atom < count
            && anchors.iter().flatten().all(|&i| i < count && mol.atom_exists(i))
    }

    fn prepare(&mut self, ws: &mut TrialWorkspace, mol: &TrialMol, mode: GrowthMode) -> Prepared {
        debug_assert!(
            self.anchors_placed(mol),
            "link {}-{} needs its focus and anchors placed",
            self.topology.atom,
            self.topology.focus
        );
        self.stage = LinkStage::TopologyResolved;
        let beta = ws.forcefield.beta;
        let (atom, focus) = (self.topology.atom, self.topology.focus);

        let bond = match mode {
            GrowthMode::New => bond::sample_new(&self.topology.bond, beta, &mut ws.prng),
            GrowthMode::Old => {
                bond::measure_old(&self.topology.bond, beta, mol.dist_sq(focus, atom).sqrt())
            }
        };
        self.stage = LinkStage::BondSet;

        let (prev_bond, prevprev_bond) = self.anchor_lengths(mol);
        let ctx = StageContext::new(&self.topology, mol.kind(), ws.short_range, beta);
        let angle = match (self.topology.prev, self.topology.angle) {
            (Some(prev), Some(resolved)) => match mode {
                GrowthMode::New => angle::sample_new(
                    &ctx,
                    &resolved.param,
                    prev,
                    prev_bond,
                    bond.length,
                    &mut ws.buffers,
                    &mut ws.prng,
                ),
                GrowthMode::Old => {
                    let extra = ws.config.n_angle_trials.saturating_sub(1);
                    let bend_weight = angle::retrace_trials(
                        &ctx,
                        &resolved.param,
                        prev,
                        prev_bond,
                        bond.length,
                        extra,
                        &mut ws.prng,
                    );
                    AngleSample {
                        theta: 0.0,
                        energy: 0.0,
                        one_three: 0.0,
                        bend_weight,
                    }
                }
            },
            _ => AngleSample::skipped(0.0),
        };
        self.stage = LinkStage::AngleSet;

        trace!(
            ?mode,
            bond = bond.length,
            bond_weight = bond.weight,
            bend_weight = angle.bend_weight,
            "Prepared link."
        );

        Prepared {
            mode,
            bond,
            prev_bond,
            prevprev_bond,
            angle,
        }
    }

    fn take_prepared(&mut self, ws: &mut TrialWorkspace, mol: &TrialMol, mode: GrowthMode) -> Prepared {
        match self.prepared.take() {
            Some(prepared) if prepared.mode == mode => prepared,
            _ => self.prepare(ws, mol, mode),
        }
    }

    /// Fills placement slot `trial` with a freshly sampled torsion (or, with
    /// no `prev`, a uniform direction on the sphere).
    fn place_trial(
        &self,
        ctx: &StageContext,
        geometry: &ChainGeometry,
        mol: &TrialMol,
        buffers: &mut TrialBuffers,
        prng: &mut Prng,
        trial: usize,
    ) {
        let (theta, choice) = if self.topology.prev.is_some() {
            (geometry.theta, dihedral::sample(ctx, geometry, buffers, prng))
        } else {
            let theta = (1.0 - 2.0 * prng.rand()).acos();
            let phi = prng.rand_bound(2.0 * PI);
            (theta, free_choice(phi))
        };
        record_placement(buffers, trial, theta, &choice);
        buffers.positions[trial] = mol.rect_coords(geometry.bond, theta, choice.phi);
    }
}

fn free_choice(phi: f64) -> DihedralChoice {
    DihedralChoice {
        phi,
        energy: 0.0,
        one_four: 0.0,
        weight: 1.0,
    }
}

fn record_placement(buffers: &mut TrialBuffers, trial: usize, theta: f64, choice: &DihedralChoice) {
    buffers.lj_weights[trial] = choice.weight;
    buffers.torsion[trial] = choice.energy;
    buffers.one_four[trial] = choice.one_four;
    buffers.thetas[trial] = theta;
    buffers.phis[trial] = choice.phi;
}

fn collect_result(
    buffers: &TrialBuffers,
    bond: &BondSample,
    angle: &AngleSample,
    winner: usize,
    batch_weight: f64,
) -> LinkResult {
    let energy = Energy::new(
        buffers.torsion[winner] + angle.energy + bond.energy,
        buffers.nonbonded[winner] + angle.one_three + buffers.one_four[winner],
        buffers.inter[winner],
        buffers.real[winner],
        0.0,
        buffers.self_energy[winner],
        buffers.correction[winner],
    );
    LinkResult {
        position: buffers.positions[winner],
        bond_length: bond.length,
        theta: buffers.thetas[winner],
        phi: buffers.phis[winner],
        energy,
        weights: LinkWeights {
            bond: bond.weight,
            bend: angle.bend_weight,
            nonbonded: batch_weight,
        },
        trial: winner,
    }
}

impl DcComponent for DcLink {
    fn prepare_new(&mut self, ws: &mut TrialWorkspace<'_>, mol: &TrialMol<'_>) {
        let prepared = self.prepare(ws, mol, GrowthMode::New);
        self.prepared = Some(prepared);
    }

    #[instrument(level = "debug", skip_all, name = "grow_link", fields(atom = self.topology.atom, focus = self.topology.focus))]
    fn build_new(&mut self, ws: &mut TrialWorkspace<'_>, mol: &mut TrialMol<'_>) -> LinkResult {
        let prepared = self.take_prepared(ws, mol, GrowthMode::New);
        let (atom, focus) = (self.topology.atom, self.topology.focus);
        let beta = ws.forcefield.beta;

        mol.set_basis(focus, self.topology.prev, self.topology.prevprev);
        let geometry = self.chain_geometry(mol, &prepared, prepared.angle.theta);
        let ctx = StageContext::new(&self.topology, mol.kind(), ws.short_range, beta);

        ws.buffers.reset_placements();
        for trial in 0..ws.buffers.lj_weights.len() {
            self.place_trial(&ctx, &geometry, mol, &mut ws.buffers, &mut ws.prng, trial);
        }
        self.stage = LinkStage::PlacementsGenerated;

        nonbonded::evaluate(
            ws.short_range,
            ws.long_range,
            mol,
            atom,
            &mut ws.buffers,
            ws.config.parallel_nonbonded,
        );
        let batch_weight = nonbonded::reweight(&mut ws.buffers, beta);
        self.stage = LinkStage::NonbondedEvaluated;

        let winner = ws.prng.pick_weighted(&ws.buffers.lj_weights, batch_weight);
        let result = collect_result(&ws.buffers, &prepared.bond, &prepared.angle, winner, batch_weight);

        mol.mult_weight(result.weight());
        mol.add_atom(atom, result.position);
        mol.add_energy(result.energy);
        self.stage = LinkStage::Finalized;

        debug!(
            trial = winner,
            weight = result.weight(),
            energy = result.energy.total(),
            "Grew atom."
        );
        result
    }

    fn prepare_old(&mut self, ws: &mut TrialWorkspace<'_>, mol: &TrialMol<'_>) {
        let prepared = self.prepare(ws, mol, GrowthMode::Old);
        self.prepared = Some(prepared);
    }

    #[instrument(level = "debug", skip_all, name = "retrace_link", fields(atom = self.topology.atom, focus = self.topology.focus))]
    fn build_old(&mut self, ws: &mut TrialWorkspace<'_>, mol: &mut TrialMol<'_>) -> LinkResult {
        let prepared = self.take_prepared(ws, mol, GrowthMode::Old);
        let (atom, focus) = (self.topology.atom, self.topology.focus);
        let beta = ws.forcefield.beta;

        mol.set_basis(focus, self.topology.prev, self.topology.prevprev);
        let (theta, phi) = mol.old_theta_and_phi(atom);
        let ctx = StageContext::new(&self.topology, mol.kind(), ws.short_range, beta);

        let angle = match (self.topology.prev, self.topology.angle) {
            (Some(prev), Some(resolved)) => angle::incorporate_old(
                &ctx,
                &resolved.param,
                prev,
                theta,
                mol.dist_sq(prev, atom),
                prepared.angle.bend_weight,
            ),
            _ => AngleSample::skipped(theta),
        };
        let geometry = self.chain_geometry(mol, &prepared, theta);

        ws.buffers.reset_placements();
        let measured = if self.topology.prev.is_some() {
            let one_four_dist_sq = self
                .topology
                .prevprev
                .map_or(0.0, |prevprev| mol.dist_sq(prevprev, atom));
            dihedral::use_old(
                &ctx,
                &geometry,
                phi,
                one_four_dist_sq,
                ws.config.n_dihedral_trials,
                &mut ws.prng,
            )
        } else {
            free_choice(phi)
        };
        record_placement(&mut ws.buffers, 0, theta, &measured);
        ws.buffers.positions[0] = mol.atom_position(atom);

        for trial in 1..ws.buffers.lj_weights.len() {
            self.place_trial(&ctx, &geometry, mol, &mut ws.buffers, &mut ws.prng, trial);
        }
        self.stage = LinkStage::PlacementsGenerated;

        nonbonded::evaluate(
            ws.short_range,
            ws.long_range,
            mol,
            atom,
            &mut ws.buffers,
            ws.config.parallel_nonbonded,
        );
        ws.buffers.correction[0] = ws.long_range.old_correction(mol, atom);
        let batch_weight = nonbonded::reweight(&mut ws.buffers, beta);
        self.stage = LinkStage::NonbondedEvaluated;

        let result = collect_result(&ws.buffers, &prepared.bond, &angle, 0, batch_weight);

        mol.mult_weight(result.weight());
        mol.confirm_old_atom(atom);
        mol.add_energy(result.energy);
        self.stage = LinkStage::Finalized;

        debug!(
            weight = result.weight(),
            energy = result.energy.total(),
            "Retraced atom."
        );
        result
    }
}
