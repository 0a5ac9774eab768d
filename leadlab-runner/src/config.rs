//! Serializable analysis configuration.
//!
//! One TOML file describes the data sources, the index convention, the
//! default signal rule, and one or more weight models to backtest.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use leadlab_core::domain::{IndicatorId, WeightMap};
use leadlab_core::index::Normalization;
use leadlab_core::signals::{CooldownPolicy, SignalRule, ThresholdDirection};

use crate::weights::normalize_to_percent;

/// Unique identifier for an analysis run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config defines no [[model]]")]
    NoModels,

    #[error("duplicate model name '{0}'")]
    DuplicateModel(String),

    #[error("model '{model}': unknown indicator '{name}'")]
    UnknownIndicator { model: String, name: String },

    #[error("model '{model}': weight for {indicator} is not finite")]
    NonFiniteWeight {
        model: String,
        indicator: IndicatorId,
    },

    #[error("{scope}: threshold must be finite, got {value}")]
    NonFiniteThreshold { scope: String, value: f64 },

    #[error("{scope}: gated cooldown needs release_after_gap or release_after_recession")]
    NoCooldownRelease { scope: String },

    #[error("{scope}: min_gap_days must be positive, got {days}")]
    InvalidGap { scope: String, days: i64 },

    #[error("fingerprint serialization failed: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Top-level analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(rename = "model", default)]
    pub models: Vec<ModelConfig>,
}

/// Input files. Relative paths are resolved against the config file's directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub observations: PathBuf,
    pub recessions: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub normalization: Normalization,
    /// Rescale each model's weights to sum to 100 before building.
    #[serde(default)]
    pub normalize_weights: bool,
}

/// Signal rule as written in the config. `threshold = None` means "use the
/// mean of the index, rounded to one decimal".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub direction: ThresholdDirection,
    #[serde(default)]
    pub cooldown: CooldownPolicy,
}

impl SignalConfig {
    /// Concrete rule once the threshold is known.
    pub fn rule(&self, threshold: f64) -> SignalRule {
        SignalRule::new(threshold, self.direction, self.cooldown)
    }

    fn validate(&self, scope: &str) -> Result<(), ConfigError> {
        if let Some(value) = self.threshold {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteThreshold {
                    scope: scope.to_string(),
                    value,
                });
            }
        }
        if let CooldownPolicy::Gated(gate) = self.cooldown {
            if !gate.has_release() {
                return Err(ConfigError::NoCooldownRelease {
                    scope: scope.to_string(),
                });
            }
            if gate.release_after_gap && gate.min_gap_days <= 0 {
                return Err(ConfigError::InvalidGap {
                    scope: scope.to_string(),
                    days: gate.min_gap_days,
                });
            }
        }
        Ok(())
    }
}

/// Per-model signal settings. Keys left out inherit from the top-level
/// `[signal]` table; a `cooldown` given here replaces the inherited one whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<ThresholdDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<CooldownPolicy>,
}

impl SignalOverride {
    pub fn apply(&self, base: SignalConfig) -> SignalConfig {
        SignalConfig {
            threshold: self.threshold.or(base.threshold),
            direction: self.direction.unwrap_or(base.direction),
            cooldown: self.cooldown.unwrap_or(base.cooldown),
        }
    }
}

/// One weighting to backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    /// Keys are indicator ids or source column codes.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    /// Overrides individual keys of the top-level `[signal]` table.
    #[serde(default)]
    pub signal: Option<SignalOverride>,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>, weights: &WeightMap) -> Self {
        Self {
            name: name.into(),
            weights: weights
                .iter()
                .map(|(id, w)| (id.as_str().to_string(), w))
                .collect(),
            signal: None,
        }
    }

    /// Resolve string keys to a typed weight map.
    pub fn weight_map(&self) -> Result<WeightMap, ConfigError> {
        let mut map = WeightMap::new();
        for (name, weight) in &self.weights {
            let id = IndicatorId::from_name(name).ok_or_else(|| ConfigError::UnknownIndicator {
                model: self.name.clone(),
                name: name.clone(),
            })?;
            if !weight.is_finite() {
                return Err(ConfigError::NonFiniteWeight {
                    model: self.name.clone(),
                    indicator: id,
                });
            }
            map.set(id, *weight);
        }
        Ok(map)
    }
}

/// Parameters that determine a model's result, hashed into its `RunId`.
#[derive(Serialize)]
struct RunFingerprint<'a> {
    model: &'a str,
    weights: WeightMap,
    normalization: Normalization,
    signal: SignalConfig,
    dataset_hash: &'a str,
}

impl AnalysisConfig {
    /// Read, parse, resolve paths, and validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.data.observations = resolve(base, &config.data.observations);
            config.data.recessions = resolve(base, &config.data.recessions);
        }
        Ok(config)
    }

    /// Parse and validate. Paths are left as written.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        self.signal.validate("[signal]")?;

        let mut names = HashSet::new();
        for model in &self.models {
            if !names.insert(model.name.as_str()) {
                return Err(ConfigError::DuplicateModel(model.name.clone()));
            }
            model.weight_map()?;
            if model.signal.is_some() {
                self.signal_for(model)
                    .validate(&format!("model '{}'", model.name))?;
            }
        }
        Ok(())
    }

    /// Signal settings in force for `model`.
    pub fn signal_for(&self, model: &ModelConfig) -> SignalConfig {
        match model.signal {
            Some(over) => over.apply(self.signal),
            None => self.signal,
        }
    }

    /// Weights exactly as the index builder will see them.
    pub fn effective_weights(&self, model: &ModelConfig) -> Result<WeightMap, ConfigError> {
        let weights = model.weight_map()?;
        Ok(if self.index.normalize_weights {
            normalize_to_percent(&weights)
        } else {
            weights
        })
    }

    pub fn model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Deterministic BLAKE3 fingerprint of a model's effective parameters and
    /// the dataset it runs on.
    ///
    /// Two runs with the same id produce the same result.
    pub fn run_id(&self, model: &ModelConfig, dataset_hash: &str) -> Result<RunId, ConfigError> {
        let fingerprint = RunFingerprint {
            model: &model.name,
            weights: self.effective_weights(model)?,
            normalization: self.index.normalization,
            signal: self.signal_for(model),
            dataset_hash,
        };
        let json = serde_json::to_vec(&fingerprint)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadlab_core::signals::CooldownGate;

    const SAMPLE: &str = r#"
[data]
observations = "data/leading_zscores.csv"
recessions = "data/recessions.csv"

[index]
normalization = "global"

[signal]
threshold = -0.5
direction = "below"

[signal.cooldown]
type = "gated"
min_gap_days = 365

[[model]]
name = "class"
[model.weights]
yield_curve_10y2y = 30
Initial_Claims = 20

[[model]]
name = "mine"
[model.weights]
pmi = 100
[model.signal]
threshold = -0.8
"#;

    #[test]
    fn parses_full_sample() {
        let cfg = AnalysisConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cfg.index.normalization, Normalization::Global);
        assert!(!cfg.index.normalize_weights);
        assert_eq!(cfg.models.len(), 2);

        let gate = CooldownGate {
            min_gap_days: 365,
            ..CooldownGate::default()
        };
        assert_eq!(cfg.signal.cooldown, CooldownPolicy::Gated(gate));

        let weights = cfg.models[0].weight_map().unwrap();
        assert_eq!(weights.get(IndicatorId::YieldCurve10y2y), 30.0);
        assert_eq!(weights.get(IndicatorId::InitialClaims), 20.0);
    }

    #[test]
    fn model_signal_override_inherits_unset_keys() {
        let cfg = AnalysisConfig::from_toml_str(SAMPLE).unwrap();
        let mine = cfg.model("mine").unwrap();
        let signal = cfg.signal_for(mine);
        assert_eq!(signal.threshold, Some(-0.8));
        assert_eq!(signal.direction, ThresholdDirection::Below);
        // Gated 365-day cooldown comes from [signal].
        assert_eq!(signal.cooldown, cfg.signal.cooldown);

        let class = cfg.model("class").unwrap();
        assert_eq!(cfg.signal_for(class), cfg.signal);
    }

    #[test]
    fn threshold_only_override_keeps_direction_and_cooldown() {
        let text = r#"
[data]
observations = "a"
recessions = "b"

[signal]
threshold = 0.5
direction = "above"
[signal.cooldown]
type = "gated"

[[model]]
name = "x"
[model.signal]
threshold = 1.0

[[model]]
name = "y"
[model.signal]
direction = "below"
[model.signal.cooldown]
type = "edge_triggered"
"#;
        let cfg = AnalysisConfig::from_toml_str(text).unwrap();

        let x = cfg.signal_for(cfg.model("x").unwrap());
        assert_eq!(x.threshold, Some(1.0));
        assert_eq!(x.direction, ThresholdDirection::Above);
        assert_eq!(x.cooldown, CooldownPolicy::standard_gate());

        let y = cfg.signal_for(cfg.model("y").unwrap());
        assert_eq!(y.threshold, Some(0.5));
        assert_eq!(y.direction, ThresholdDirection::Below);
        assert_eq!(y.cooldown, CooldownPolicy::EdgeTriggered);
    }

    #[test]
    fn override_is_validated_after_merging() {
        let text = "[data]\nobservations = \"a\"\nrecessions = \"b\"\n\
                    [[model]]\nname = \"x\"\n[model.signal]\nthreshold = inf\n";
        let err = AnalysisConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::NonFiniteThreshold { scope, .. } if scope == "model 'x'"));
    }

    #[test]
    fn defaults_when_tables_omitted() {
        let cfg = AnalysisConfig::from_toml_str(
            r#"
[data]
observations = "a.csv"
recessions = "b.csv"

[[model]]
name = "only"
"#,
        )
        .unwrap();
        assert_eq!(cfg.index.normalization, Normalization::PerDate);
        assert_eq!(cfg.signal.threshold, None);
        assert_eq!(cfg.signal.direction, ThresholdDirection::Below);
        assert_eq!(cfg.signal.cooldown, CooldownPolicy::EdgeTriggered);
        assert!(cfg.models[0].weight_map().unwrap().is_empty());
    }

    #[test]
    fn rejects_missing_models() {
        let err = AnalysisConfig::from_toml_str(
            "[data]\nobservations = \"a.csv\"\nrecessions = \"b.csv\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoModels));
    }

    #[test]
    fn rejects_duplicate_model_names() {
        let text = "[data]\nobservations = \"a\"\nrecessions = \"b\"\n\
                    [[model]]\nname = \"x\"\n[[model]]\nname = \"x\"\n";
        let err = AnalysisConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateModel(name) if name == "x"));
    }

    #[test]
    fn rejects_unknown_indicator() {
        let text = "[data]\nobservations = \"a\"\nrecessions = \"b\"\n\
                    [[model]]\nname = \"x\"\n[model.weights]\ngdp = 10\n";
        let err = AnalysisConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownIndicator { name, .. } if name == "gdp"));
    }

    #[test]
    fn rejects_gate_without_release() {
        let text = "[data]\nobservations = \"a\"\nrecessions = \"b\"\n\
                    [signal.cooldown]\ntype = \"gated\"\nrelease_after_gap = false\n\
                    release_after_recession = false\n\
                    [[model]]\nname = \"x\"\n";
        let err = AnalysisConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::NoCooldownRelease { .. }));
    }

    #[test]
    fn rejects_non_finite_threshold() {
        let text = "[data]\nobservations = \"a\"\nrecessions = \"b\"\n\
                    [signal]\nthreshold = nan\n[[model]]\nname = \"x\"\n";
        let err = AnalysisConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::NonFiniteThreshold { .. }));
    }

    #[test]
    fn run_id_is_deterministic_and_sensitive() {
        let cfg = AnalysisConfig::from_toml_str(SAMPLE).unwrap();
        let class = cfg.model("class").unwrap();
        let a = cfg.run_id(class, "abc").unwrap();
        let b = cfg.run_id(class, "abc").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        assert_ne!(a, cfg.run_id(class, "abd").unwrap());
        assert_ne!(a, cfg.run_id(cfg.model("mine").unwrap(), "abc").unwrap());

        let mut other = cfg.clone();
        other.index.normalization = Normalization::PerDate;
        assert_ne!(a, other.run_id(class, "abc").unwrap());
    }

    #[test]
    fn normalize_weights_rescales_effective_weights() {
        let mut cfg = AnalysisConfig::from_toml_str(SAMPLE).unwrap();
        cfg.index.normalize_weights = true;
        let w = cfg.effective_weights(cfg.model("class").unwrap()).unwrap();
        assert_eq!(w.get(IndicatorId::YieldCurve10y2y), 60.0);
        assert_eq!(w.get(IndicatorId::InitialClaims), 40.0);
    }

    #[test]
    fn from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let cfg = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(
            cfg.data.observations,
            dir.path().join("data/leading_zscores.csv")
        );
        assert_eq!(cfg.data.recessions, dir.path().join("data/recessions.csv"));
    }

    #[test]
    fn from_file_reports_missing_file() {
        let err = AnalysisConfig::from_file(Path::new("/nonexistent/analysis.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
