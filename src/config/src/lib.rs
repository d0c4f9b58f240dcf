//! Option-surface structs for the ancestry, covariance, and scan subsystems.
//!
//! Command-line parsing stays out of scope; these structs only own validation of
//! an already-populated option set, deserializable via `serde` the way the
//! workspace's `FromYaml` precedent already does.

mod error;

use std::path::PathBuf;

pub use error::ConfigError;

/// Inner QP solver used by the ancestry optimizer's `Q`/`F` updates.
///
/// `Qpas` is the active-set solver and the default; `Lemke` is kept as the
/// legacy complementary-pivoting path rather than silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    Qpas,
    Lemke,
}

impl Default for Solver {
    fn default() -> Self {
        Solver::Qpas
    }
}

fn default_epsilon() -> f64 {
    1.0e-6
}

fn default_max_iterations() -> usize {
    1000
}

fn default_max_time() -> f64 {
    0.0
}

fn default_seed() -> u64 {
    0
}

fn default_f_epsilon() -> f64 {
    1.0e-10
}

fn default_steps() -> usize {
    30
}

/// Options governing the QPAS ancestry optimizer (`Q`, `F`).
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct AncestryConfig {
    pub ksize: Option<usize>,
    pub qin: Option<PathBuf>,
    pub qout: Option<PathBuf>,
    pub fin: Option<PathBuf>,
    pub fout: Option<PathBuf>,
    pub fin_force: Option<PathBuf>,
    #[serde(default)]
    pub fixed_q: bool,
    #[serde(default)]
    pub fixed_f: bool,
    pub force: Option<PathBuf>,
    #[serde(default)]
    pub frequency_bounds: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_max_time")]
    pub max_time: f64,
    #[serde(default)]
    pub solver: Solver,
    pub num_threads: Option<usize>,
}

impl Default for AncestryConfig {
    fn default() -> Self {
        Self {
            ksize: None,
            qin: None,
            qout: None,
            fin: None,
            fout: None,
            fin_force: None,
            fixed_q: false,
            fixed_f: false,
            force: None,
            frequency_bounds: false,
            seed: default_seed(),
            epsilon: default_epsilon(),
            max_iterations: default_max_iterations(),
            max_time: default_max_time(),
            solver: Solver::default(),
            num_threads: None,
        }
    }
}

impl AncestryConfig {
    /// Enforces the mutual-exclusion rules from the option table: `fin-force`
    /// excludes `fin`; `fixed-q` excludes `force`; `fixed-f` requires `fin`;
    /// `fixed-q` requires `qin`; numeric bounds are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fin_force.is_some() && self.fin.is_some() {
            return Err(ConfigError::FinForceExcludesFin);
        }
        if self.fixed_q && self.force.is_some() {
            return Err(ConfigError::FixedQExcludesForce);
        }
        if self.fixed_f && self.fin.is_none() {
            return Err(ConfigError::FixedFRequiresFin);
        }
        if self.fixed_q && self.qin.is_none() {
            return Err(ConfigError::FixedQRequiresQin);
        }
        if let Some(k) = self.ksize {
            if k < 2 {
                return Err(ConfigError::KsizeTooSmall(k));
            }
        }
        if self.epsilon < 0.0 {
            return Err(ConfigError::NegativeEpsilon(self.epsilon));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroMaxIterations(self.max_iterations));
        }
        if self.max_time < 0.0 {
            return Err(ConfigError::NegativeMaxTime(self.max_time));
        }
        Ok(())
    }
}

/// Options governing the NEMECO covariance optimizer (`C`).
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct CovarianceConfig {
    pub cin: Option<PathBuf>,
    pub cout: Option<PathBuf>,
    pub tin: Option<PathBuf>,
    pub tout: Option<PathBuf>,
    pub ain: Option<PathBuf>,
    #[serde(default = "default_f_epsilon")]
    pub f_epsilon: f64,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_max_time")]
    pub max_time: f64,
}

impl Default for CovarianceConfig {
    fn default() -> Self {
        Self {
            cin: None,
            cout: None,
            tin: None,
            tout: None,
            ain: None,
            f_epsilon: default_f_epsilon(),
            epsilon: default_epsilon(),
            max_iterations: default_max_iterations(),
            max_time: default_max_time(),
        }
    }
}

impl CovarianceConfig {
    /// Enforces "at most one of `ain`/`cin`/`tin`" and the numeric bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let input_count =
            [self.ain.is_some(), self.cin.is_some(), self.tin.is_some()].iter().filter(|b| **b).count();
        if input_count > 1 {
            return Err(ConfigError::MultipleCovarianceInputs);
        }
        if !(self.f_epsilon > 0.0 && self.f_epsilon < 0.1) {
            return Err(ConfigError::FEpsilonOutOfRange(self.f_epsilon));
        }
        if self.epsilon < 0.0 {
            return Err(ConfigError::NegativeEpsilon(self.epsilon));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroMaxIterations(self.max_iterations));
        }
        if self.max_time < 0.0 {
            return Err(ConfigError::NegativeMaxTime(self.max_time));
        }
        Ok(())
    }
}

/// Options governing the SELSCAN/NEOSCAN selection scanners.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ScanConfig {
    #[serde(default = "default_steps")]
    pub steps: usize,
    pub c_scale: Option<PathBuf>,
    #[serde(default = "default_f_epsilon")]
    pub f_epsilon: f64,
    /// Per-individual sample ages, used by NEOSCAN's time-weighted shift
    /// search. Read as a single-column matrix file; absent entirely when
    /// NEOSCAN should treat every individual as equally weighted.
    pub years: Option<PathBuf>,
    pub num_threads: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { steps: default_steps(), c_scale: None, f_epsilon: default_f_epsilon(), years: None, num_threads: None }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps < 2 {
            return Err(ConfigError::StepsTooSmall(self.steps));
        }
        if !(self.f_epsilon > 0.0 && self.f_epsilon < 0.1) {
            return Err(ConfigError::FEpsilonOutOfRange(self.f_epsilon));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fin_force_excludes_fin() {
        let cfg = AncestryConfig {
            fin_force: Some("x.fg".into()),
            fin: Some("x.fin".into()),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::FinForceExcludesFin));
    }

    #[test]
    fn fixed_q_requires_qin() {
        let cfg = AncestryConfig { fixed_q: true, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::FixedQRequiresQin));
    }

    #[test]
    fn fixed_f_requires_fin() {
        let cfg = AncestryConfig { fixed_f: true, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::FixedFRequiresFin));
    }

    #[test]
    fn fixed_q_excludes_force() {
        let cfg = AncestryConfig {
            fixed_q: true,
            qin: Some("q.txt".into()),
            force: Some("fg.txt".into()),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::FixedQExcludesForce));
    }

    #[test]
    fn valid_ancestry_config_passes() {
        let cfg = AncestryConfig { ksize: Some(3), ..Default::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn covariance_rejects_multiple_inputs() {
        let cfg = CovarianceConfig {
            cin: Some("c.txt".into()),
            tin: Some("t.nwk".into()),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::MultipleCovarianceInputs));
    }

    #[test]
    fn scan_rejects_too_few_steps() {
        let cfg = ScanConfig { steps: 1, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::StepsTooSmall(1)));
    }

    #[test]
    fn ancestry_config_round_trips_through_yaml() {
        let cfg = AncestryConfig { ksize: Some(4), seed: 1864, ..Default::default() };
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: AncestryConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.ksize, Some(4));
        assert_eq!(parsed.seed, 1864);
    }
}
