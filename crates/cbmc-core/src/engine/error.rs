use super::config::ConfigError;
use crate::core::forcefield::params::ParamLoadError;
use crate::core::models::topology::TopologyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid growth topology: {source}")]
    Topology {
        #[from]
        source: TopologyError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Forcefield loading failed: {source}")]
    Forcefield {
        #[from]
        source: ParamLoadError,
    },

    #[error("Regrowth must start between atom 1 and {last}, got {start}")]
    InvalidRegrowthStart { start: usize, last: usize },

    #[error("Seed atom {0} must be placed before growth starts")]
    MissingSeedAtom(usize),
}
