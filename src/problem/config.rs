use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::error::{Result, SoftmaxError};

pub const ENV_EXAMPLES: &str = "SOFTMAX_EXAMPLES";
pub const ENV_FEATURES: &str = "SOFTMAX_FEATURES";
pub const ENV_CLASSES: &str = "SOFTMAX_CLASSES";
pub const ENV_REG: &str = "SOFTMAX_REG";
pub const ENV_WEIGHT_SCALE: &str = "SOFTMAX_WEIGHT_SCALE";
pub const ENV_SEED: &str = "SOFTMAX_SEED";
pub const ENV_GRAD_SAMPLES: &str = "SOFTMAX_GRAD_SAMPLES";

/// Shape and sampling parameters for a randomly generated [`Problem`].
///
/// [`Problem`]: crate::problem::Problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemConfig {
    /// N, number of examples.
    pub examples: usize,
    /// D, input dimension.
    pub features: usize,
    /// C, number of classes.
    pub classes: usize,
    pub reg: f64,
    /// Standard deviation of the Gaussian weights.
    pub weight_scale: f64,
    pub seed: Option<u64>,
    /// Entries compared by the sparse gradient check.
    pub grad_samples: usize,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        ProblemConfig {
            examples: 16,
            features: 10,
            classes: 4,
            reg: 5e-3,
            weight_scale: 1e-3,
            seed: None,
            grad_samples: 10,
        }
    }
}

impl ProblemConfig {
    /// Reads overrides from the `SOFTMAX_*` environment variables. Unset
    /// variables keep their default; unparsable ones are an error.
    pub fn from_env() -> Result<ProblemConfig> {
        ProblemConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ProblemConfig::from_env`] with a caller-supplied variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<ProblemConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ProblemConfig::default();
        let config = ProblemConfig {
            examples: parse_var(&lookup, ENV_EXAMPLES)?.unwrap_or(defaults.examples),
            features: parse_var(&lookup, ENV_FEATURES)?.unwrap_or(defaults.features),
            classes: parse_var(&lookup, ENV_CLASSES)?.unwrap_or(defaults.classes),
            reg: parse_var(&lookup, ENV_REG)?.unwrap_or(defaults.reg),
            weight_scale: parse_var(&lookup, ENV_WEIGHT_SCALE)?.unwrap_or(defaults.weight_scale),
            seed: parse_var(&lookup, ENV_SEED)?.or(defaults.seed),
            grad_samples: parse_var(&lookup, ENV_GRAD_SAMPLES)?.unwrap_or(defaults.grad_samples),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.examples == 0 {
            return Err(SoftmaxError::EmptyBatch);
        }
        if self.features == 0 || self.classes == 0 {
            return Err(SoftmaxError::InvalidConfig(format!(
                "features and classes must be at least 1, got D={} C={}",
                self.features, self.classes
            )));
        }
        if !(self.reg.is_finite() && self.reg >= 0.0) {
            return Err(SoftmaxError::InvalidRegularization(self.reg));
        }
        if !(self.weight_scale.is_finite() && self.weight_scale >= 0.0) {
            return Err(SoftmaxError::InvalidConfig(format!(
                "weight_scale must be finite and non-negative, got {}",
                self.weight_scale
            )));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            SoftmaxError::InvalidConfig(format!("{key}={raw:?}: {e}"))
        }),
    }
}
