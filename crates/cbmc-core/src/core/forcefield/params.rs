use super::potentials;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Boltzmann constant in kcal/(mol·K).
pub const BOLTZMANN_KCAL: f64 = 0.001_987_204_1;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct BondParam {
    pub length: f64,
    pub k: f64,
    #[serde(default)]
    pub fixed: bool,
}

impl BondParam {
    #[inline]
    pub fn energy(&self, length: f64) -> f64 {
        potentials::harmonic(length, self.length, self.k)
    }
}

/// Angle parameters with `theta` in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleParam {
    pub theta: f64,
    pub k: f64,
    pub fixed: bool,
}

impl AngleParam {
    #[inline]
    pub fn energy(&self, theta: f64) -> f64 {
        potentials::harmonic(theta, self.theta, self.k)
    }
}

/// One cosine term of a torsion, `delta` in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DihedralTerm {
    pub k: f64,
    pub n: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DihedralParam {
    pub terms: Vec<DihedralTerm>,
}

impl DihedralParam {
    pub fn energy(&self, phi: f64) -> f64 {
        self.terms
            .iter()
            .map(|t| potentials::periodic_torsion(phi, t.k, t.n, t.delta))
            .sum()
    }
}

#[derive(Debug, Deserialize)]
struct RawAngle {
    theta: f64,
    k: f64,
    #[serde(default)]
    fixed: bool,
}

#[derive(Debug, Deserialize)]
struct RawDihedralTerm {
    k: f64,
    n: f64,
    #[serde(default)]
    delta: f64,
}

#[derive(Debug, Deserialize)]
struct RawDihedral {
    #[serde(default)]
    terms: Vec<RawDihedralTerm>,
}

#[derive(Debug, Deserialize)]
struct RawForcefield {
    temperature: f64,
    #[serde(default)]
    bonds: Vec<BondParam>,
    #[serde(default)]
    angles: Vec<RawAngle>,
    #[serde(default)]
    dihedrals: Vec<RawDihedral>,
}

/// Bonded parameter tables indexed by kind, plus the inverse temperature.
///
/// Constructed once and shared by reference; nothing here is mutated after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct Forcefield {
    pub beta: f64,
    pub bonds: Vec<BondParam>,
    pub angles: Vec<AngleParam>,
    pub dihedrals: Vec<DihedralParam>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },
    #[error("Invalid forcefield parameter: {0}")]
    InvalidParameter(String),
}

impl Forcefield {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ParamLoadError> {
        let raw: RawForcefield = toml::from_str(content)?;
        if !(raw.temperature > 0.0) {
            return Err(ParamLoadError::InvalidParameter(format!(
                "temperature must be positive, got {}",
                raw.temperature
            )));
        }
        if let Some(bad) = raw.bonds.iter().position(|b| !(b.length > 0.0)) {
            return Err(ParamLoadError::InvalidParameter(format!(
                "bond kind {bad} has a non-positive equilibrium length"
            )));
        }

        let angles = raw
            .angles
            .into_iter()
            .map(|a| AngleParam {
                theta: a.theta.to_radians(),
                k: a.k,
                fixed: a.fixed,
            })
            .collect();
        let dihedrals = raw
            .dihedrals
            .into_iter()
            .map(|d| DihedralParam {
                terms: d
                    .terms
                    .into_iter()
                    .map(|t| DihedralTerm {
                        k: t.k,
                        n: t.n,
                        delta: t.delta.to_radians(),
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            beta: 1.0 / (BOLTZMANN_KCAL * raw.temperature),
            bonds: raw.bonds,
            angles,
            dihedrals,
        })
    }

    pub fn bond(&self, kind: usize) -> Option<&BondParam> {
        self.bonds.get(kind)
    }

    pub fn angle(&self, kind: usize) -> Option<&AngleParam> {
        self.angles.get(kind)
    }

    pub fn dihedral(&self, kind: usize) -> Option<&DihedralParam> {
        self.dihedrals.get(kind)
    }
}
