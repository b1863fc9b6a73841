use crate::core::energy::NonbondedSettings;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Trial count '{0}' must be at least 1")]
    ZeroTrials(&'static str),

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
}

fn default_parallel() -> bool {
    true
}

/// Simulation-wide trial counts consumed by every link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CbmcConfig {
    pub n_angle_trials: usize,
    pub n_dihedral_trials: usize,
    pub n_lj_trials: usize,
    /// Evaluate the independent nonbonded terms as a fork-join group.
    #[serde(default = "default_parallel")]
    pub parallel_nonbonded: bool,
}

impl CbmcConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.n_angle_trials == 0 {
            return Err(ConfigError::ZeroTrials("n_angle_trials"));
        }
        if self.n_dihedral_trials == 0 {
            return Err(ConfigError::ZeroTrials("n_dihedral_trials"));
        }
        if self.n_lj_trials == 0 {
            return Err(ConfigError::ZeroTrials("n_lj_trials"));
        }
        Ok(self)
    }
}

#[derive(Default)]
pub struct CbmcConfigBuilder {
    n_angle_trials: Option<usize>,
    n_dihedral_trials: Option<usize>,
    n_lj_trials: Option<usize>,
    parallel_nonbonded: Option<bool>,
}

impl CbmcConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_angle_trials(mut self, n: usize) -> Self {
        self.n_angle_trials = Some(n);
        self
    }
    pub fn n_dihedral_trials(mut self, n: usize) -> Self {
        self.n_dihedral_trials = Some(n);
        self
    }
    pub fn n_lj_trials(mut self, n: usize) -> Self {
        self.n_lj_trials = Some(n);
        self
    }
    pub fn parallel_nonbonded(mut self, enabled: bool) -> Self {
        self.parallel_nonbonded = Some(enabled);
        self
    }

    pub fn build(self) -> Result<CbmcConfig, ConfigError> {
        CbmcConfig {
            n_angle_trials: self
                .n_angle_trials
                .ok_or(ConfigError::MissingParameter("n_angle_trials"))?,
            n_dihedral_trials: self
                .n_dihedral_trials
                .ok_or(ConfigError::MissingParameter("n_dihedral_trials"))?,
            n_lj_trials: self
                .n_lj_trials
                .ok_or(ConfigError::MissingParameter("n_lj_trials"))?,
            parallel_nonbonded: self.parallel_nonbonded.unwrap_or_else(default_parallel),
        }
        .validate()
    }
}

/// Growth settings as read from a TOML file with `[cbmc]` and optional `[nonbonded]` tables.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GrowthConfig {
    pub cbmc: CbmcConfig,
    #[serde(default)]
    pub nonbonded: NonbondedSettings,
}

impl GrowthConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.cbmc.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn builder_produces_config_with_parallel_default() {
        let config = CbmcConfigBuilder::new()
            .n_angle_trials(100)
            .n_dihedral_trials(10)
            .n_lj_trials(8)
            .build()
            .unwrap();
        assert_eq!(config.n_angle_trials, 100);
        assert_eq!(config.n_dihedral_trials, 10);
        assert_eq!(config.n_lj_trials, 8);
        assert!(config.parallel_nonbonded);
    }

    #[test]
    fn builder_reports_missing_parameter() {
        let result = CbmcConfigBuilder::new()
            .n_angle_trials(10)
            .n_lj_trials(4)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::MissingParameter("n_dihedral_trials"))
        ));
    }

    #[test]
    fn builder_rejects_zero_trials() {
        let result = CbmcConfigBuilder::new()
            .n_angle_trials(10)
            .n_dihedral_trials(10)
            .n_lj_trials(0)
            .build();
        assert!(matches!(result, Err(ConfigError::ZeroTrials("n_lj_trials"))));
    }

    #[test]
    fn from_toml_str_reads_both_tables() {
        let config = GrowthConfig::from_toml_str(
            r#"
            [cbmc]
            n_angle_trials = 50
            n_dihedral_trials = 20
            n_lj_trials = 6
            parallel_nonbonded = false

            [nonbonded]
            cutoff = 12.0
            ewald_alpha = 0.28
            "#,
        )
        .unwrap();
        assert_eq!(config.cbmc.n_dihedral_trials, 20);
        assert!(!config.cbmc.parallel_nonbonded);
        assert_eq!(config.nonbonded.cutoff, 12.0);
        assert_eq!(config.nonbonded.ewald_alpha, Some(0.28));
        assert_eq!(config.nonbonded.lj_scale_1_4, 0.5);
    }

    #[test]
    fn from_toml_str_defaults_nonbonded_table() {
        let config = GrowthConfig::from_toml_str(
            "[cbmc]\nn_angle_trials = 1\nn_dihedral_trials = 1\nn_lj_trials = 1\n",
        )
        .unwrap();
        assert_eq!(config.nonbonded, NonbondedSettings::default());
        assert!(config.cbmc.parallel_nonbonded);
    }

    #[test]
    fn from_toml_str_validates_trial_counts() {
        let result = GrowthConfig::from_toml_str(
            "[cbmc]\nn_angle_trials = 0\nn_dihedral_trials = 1\nn_lj_trials = 1\n",
        );
        assert!(matches!(result, Err(ConfigError::ZeroTrials("n_angle_trials"))));
    }

    #[test]
    fn load_reads_file_and_reports_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("growth.toml");
        fs::write(
            &path,
            "[cbmc]\nn_angle_trials = 3\nn_dihedral_trials = 2\nn_lj_trials = 1\n",
        )
        .unwrap();
        assert_eq!(GrowthConfig::load(&path).unwrap().cbmc.n_angle_trials, 3);

        let missing = GrowthConfig::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
