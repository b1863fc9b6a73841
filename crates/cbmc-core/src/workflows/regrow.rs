use crate::core::forcefield::params::Forcefield;
use crate::core::forcefield::term::Energy;
use crate::core::models::topology::{MoleculeKind, TopologyError};
use crate::core::models::trial_mol::TrialMol;
use crate::engine::error::EngineError;
use crate::engine::link::{DcComponent, DcLink, LinkResult};
use crate::engine::workspace::TrialWorkspace;
use tracing::{debug, info, instrument};

/// Accumulated result of growing or retracing a chain tail.
#[derive(Debug, Clone, PartialEq)]
pub struct RegrowthOutcome {
    /// Product of the Rosenbluth weights of every link.
    pub weight: f64,
    pub energy: Energy,
    pub links: Vec<LinkResult>,
}

impl RegrowthOutcome {
    fn from_links(links: Vec<LinkResult>) -> Self {
        let weight = links.iter().map(LinkResult::weight).product();
        let energy = links
            .iter()
            .fold(Energy::default(), |acc, link| acc + link.energy);
        Self {
            weight,
            energy,
            links,
        }
    }
}

/// Regrows atoms `start..n` of an unbranched molecule, one link per atom,
/// each grown from the atom before it.
///
/// Atoms `0..start` are the seed and must already be in place.
#[derive(Debug, Clone)]
pub struct ChainRegrowth {
    start: usize,
    atom_count: usize,
    links: Vec<DcLink>,
}

impl ChainRegrowth {
    #[instrument(skip_all, name = "chain_regrowth_setup", fields(kind = kind.name(), start = start))]
    pub fn new(
        kind: &MoleculeKind,
        forcefield: &Forcefield,
        start: usize,
    ) -> Result<Self, EngineError> {
        let atom_count = kind.atom_count();
        if start == 0 || start >= atom_count {
            return Err(EngineError::InvalidRegrowthStart {
                start,
                last: atom_count.saturating_sub(1),
            });
        }

        let links = (start..atom_count)
            .map(|atom| DcLink::new(kind, forcefield, atom, atom - 1))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(links = links.len(), "Built regrowth links.");
        Ok(Self {
            start,
            atom_count,
            links,
        })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn links(&self) -> &[DcLink] {
        &self.links
    }

    fn check_kind(&self, mol: &TrialMol) -> Result<(), EngineError> {
        let got = mol.kind().atom_count();
        if got != self.atom_count {
            return Err(TopologyError::CoordinateCount {
                expected: self.atom_count,
                got,
            }
            .into());
        }
        Ok(())
    }

    /// Grows every tail atom into `mol` in order.
    #[instrument(skip_all, name = "chain_grow", fields(start = self.start))]
    pub fn grow(
        &mut self,
        ws: &mut TrialWorkspace<'_>,
        mol: &mut TrialMol<'_>,
    ) -> Result<RegrowthOutcome, EngineError> {
        self.check_kind(mol)?;
        if let Some(missing) = (0..self.start).find(|&atom| !mol.atom_exists(atom)) {
            return Err(EngineError::MissingSeedAtom(missing));
        }

        let results = self
            .links
            .iter_mut()
            .map(|link| link.grow_new(ws, mol))
            .collect();
        let outcome = RegrowthOutcome::from_links(results);

        info!(
            weight = outcome.weight,
            energy = outcome.energy.total(),
            "Chain tail grown."
        );
        Ok(outcome)
    }

    /// Retraces the existing tail of `mol`, whose coordinates are all set.
    ///
    /// Seed atoms are confirmed first; tail atoms are confirmed one link at a time.
    #[instrument(skip_all, name = "chain_retrace", fields(start = self.start))]
    pub fn retrace(
        &mut self,
        ws: &mut TrialWorkspace<'_>,
        mol: &mut TrialMol<'_>,
    ) -> Result<RegrowthOutcome, EngineError> {
        self.check_kind(mol)?;
        for atom in 0..self.start {
            mol.confirm_old_atom(atom);
        }

        let results = self
            .links
            .iter_mut()
            .map(|link| link.retrace_old(ws, mol))
            .collect();
        let outcome = RegrowthOutcome::from_links(results);

        info!(
            weight = outcome.weight,
            energy = outcome.energy.total(),
            "Chain tail retraced."
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::energy::NonbondedSettings;
    use crate::core::energy::ewald::NoEwald;
    use crate::core::energy::pairwise::PairwiseCalculator;
    use crate::core::models::system::ParticleSystem;
    use crate::core::models::topology::AtomParams;
    use crate::core::utils::geometry::PeriodicBox;
    use crate::engine::config::CbmcConfigBuilder;
    use crate::engine::utils::sampling::Prng;
    use nalgebra::Point3;
    use std::fs::File;
    use tracing_subscriber::{fmt, prelude::*};

    const FF_TOML: &str = r#"
        temperature = 350.0

        [[bonds]]
        length = 1.54
        k = 200.0

        [[angles]]
        theta = 114.0
        k = 62.1

        [[dihedrals]]
        terms = [
            { k = 0.7, n = 1.0 },
            { k = -0.2, n = 2.0, delta = 180.0 },
            { k = 1.6, n = 3.0 },
        ]
    "#;

    fn hexane() -> MoleculeKind {
        MoleculeKind::linear_chain(
            "hexane",
            vec![AtomParams::new("CH2", 0.0, 4.4, 0.09); 6],
            0,
            0,
            0,
        )
        .unwrap()
    }

    fn workspace<'a>(
        ff: &'a Forcefield,
        pairwise: &'a PairwiseCalculator<'a>,
        seed: u64,
    ) -> TrialWorkspace<'a> {
        let config = CbmcConfigBuilder::new()
            .n_angle_trials(10)
            .n_dihedral_trials(8)
            .n_lj_trials(6)
            .build()
            .unwrap();
        TrialWorkspace::new(ff, pairwise, &NoEwald, config, Prng::seeded(seed))
    }

    fn seeded<'a>(kind: &'a MoleculeKind, sim_box: PeriodicBox) -> TrialMol<'a> {
        let mut mol = TrialMol::new(kind, sim_box);
        mol.add_atom(0, Point3::new(5.0, 5.0, 5.0));
        mol.add_atom(1, Point3::new(6.54, 5.0, 5.0));
        mol
    }

    #[test]
    fn new_rejects_start_outside_tail() {
        let kind = hexane();
        let ff = Forcefield::from_toml_str(FF_TOML).unwrap();

        assert!(matches!(
            ChainRegrowth::new(&kind, &ff, 0),
            Err(EngineError::InvalidRegrowthStart { start: 0, last: 5 })
        ));
        assert!(matches!(
            ChainRegrowth::new(&kind, &ff, 6),
            Err(EngineError::InvalidRegrowthStart { start: 6, .. })
        ));
        assert_eq!(ChainRegrowth::new(&kind, &ff, 2).unwrap().links().len(), 4);
    }

    #[test]
    fn new_propagates_missing_forcefield_terms() {
        let kind = hexane();
        let ff = Forcefield::from_toml_str("temperature = 300.0").unwrap();
        assert!(matches!(
            ChainRegrowth::new(&kind, &ff, 1),
            Err(EngineError::Topology { .. })
        ));
    }

    #[test]
    fn grow_requires_seed_atoms() {
        let kind = hexane();
        let ff = Forcefield::from_toml_str(FF_TOML).unwrap();
        let system = ParticleSystem::new(PeriodicBox::cubic(40.0));
        let pairwise = PairwiseCalculator::new(&system, NonbondedSettings::default());
        let mut ws = workspace(&ff, &pairwise, 1);
        let mut regrowth = ChainRegrowth::new(&kind, &ff, 2).unwrap();

        let mut mol = TrialMol::new(&kind, *system.sim_box());
        mol.add_atom(0, Point3::new(1.0, 1.0, 1.0));

        assert!(matches!(
            regrowth.grow(&mut ws, &mut mol),
            Err(EngineError::MissingSeedAtom(1))
        ));
    }

    #[test]
    fn grow_rejects_molecule_of_another_size() {
        let kind = hexane();
        let butane = MoleculeKind::linear_chain(
            "butane",
            vec![AtomParams::new("CH2", 0.0, 4.4, 0.09); 4],
            0,
            0,
            0,
        )
        .unwrap();
        let ff = Forcefield::from_toml_str(FF_TOML).unwrap();
        let system = ParticleSystem::new(PeriodicBox::cubic(40.0));
        let pairwise = PairwiseCalculator::new(&system, NonbondedSettings::default());
        let mut ws = workspace(&ff, &pairwise, 1);
        let mut regrowth = ChainRegrowth::new(&kind, &ff, 2).unwrap();

        let mut mol = seeded(&butane, *system.sim_box());
        assert!(matches!(
            regrowth.grow(&mut ws, &mut mol),
            Err(EngineError::Topology { .. })
        ));
    }

    #[test]
    fn grow_places_every_tail_atom_and_accumulates_weight() {
        let kind = hexane();
        let ff = Forcefield::from_toml_str(FF_TOML).unwrap();
        let system = ParticleSystem::new(PeriodicBox::cubic(40.0));
        let pairwise = PairwiseCalculator::new(&system, NonbondedSettings::default());
        let mut ws = workspace(&ff, &pairwise, 11);
        let mut regrowth = ChainRegrowth::new(&kind, &ff, 2).unwrap();
        let mut mol = seeded(&kind, *system.sim_box());

        let outcome = regrowth.grow(&mut ws, &mut mol).unwrap();

        assert_eq!(outcome.links.len(), 4);
        assert!((2..6).all(|atom| mol.atom_exists(atom)));
        for atom in 2..6 {
            let bond = mol.dist_sq(atom - 1, atom).sqrt();
            assert!((0.9 * 1.54 - 1e-12..=1.1 * 1.54 + 1e-12).contains(&bond));
        }
        assert!(outcome.weight.is_finite() && outcome.weight > 0.0);
        assert!((mol.weight() - outcome.weight).abs() <= 1e-12 * outcome.weight);
        assert!((mol.energy().total() - outcome.energy.total()).abs() < 1e-9);
    }

    #[test]
    fn retrace_of_grown_chain_reproduces_its_energy() {
        let kind = hexane();
        let ff = Forcefield::from_toml_str(FF_TOML).unwrap();
        let system = ParticleSystem::new(PeriodicBox::cubic(40.0));
        let pairwise = PairwiseCalculator::new(&system, NonbondedSettings::default());
        let mut regrowth = ChainRegrowth::new(&kind, &ff, 2).unwrap();

        let mut grown = seeded(&kind, *system.sim_box());
        let new = regrowth
            .grow(&mut workspace(&ff, &pairwise, 3), &mut grown)
            .unwrap();

        let mut old =
            TrialMol::from_coordinates(&kind, grown.coords().to_vec(), *system.sim_box()).unwrap();
        let retraced = regrowth
            .retrace(&mut workspace(&ff, &pairwise, 4), &mut old)
            .unwrap();

        assert!((0..6).all(|atom| old.atom_exists(atom)));
        assert!(retraced.links.iter().all(|link| link.trial == 0));
        let scale = new.energy.total().abs().max(1.0);
        assert!((retraced.energy.total() - new.energy.total()).abs() <= 1e-9 * scale);
        assert!(retraced.weight.is_finite() && retraced.weight > 0.0);
    }

    #[test]
    fn regrowth_logs_setup_and_completion() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("regrow.log");
        let file = File::create(&log_path).unwrap();
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false),
        );

        let kind = hexane();
        let ff = Forcefield::from_toml_str(FF_TOML).unwrap();
        let system = ParticleSystem::new(PeriodicBox::cubic(40.0));
        let pairwise = PairwiseCalculator::new(&system, NonbondedSettings::default());

        tracing::subscriber::with_default(subscriber, || {
            let mut regrowth = ChainRegrowth::new(&kind, &ff, 2).unwrap();
            let mut mol = seeded(&kind, *system.sim_box());
            regrowth
                .grow(&mut workspace(&ff, &pairwise, 9), &mut mol)
                .unwrap();
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Built regrowth links."));
        assert!(content.contains("Grew atom."));
        assert!(content.contains("Chain tail grown."));
        assert!(content.contains("chain_grow"));
    }
}
