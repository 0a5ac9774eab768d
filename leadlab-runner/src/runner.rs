//! Analysis runner: wires together config, loading, the engine, and stats.
//!
//! Two entry points:
//! - `run_analysis()`: loads data named in the config, then runs one model. Used by CLI.
//! - `run_model_on_data()`: takes pre-loaded data. Used by model comparison.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use leadlab_core::classify::Classified;
use leadlab_core::domain::{IndexPoint, Signal};
use leadlab_core::index::CompositeIndexBuilder;
use leadlab_core::metrics::PerformanceReport;
use leadlab_core::pipeline::backtest_index;

use crate::config::{AnalysisConfig, ConfigError, ModelConfig, RunId};
use crate::data_loader::{load_data, LoadError, LoadedData};
use crate::stats::{default_threshold, DistributionStats};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("model '{0}' not found in config")]
    ModelNotFound(String),
}

/// Everything the presentation layer needs from one model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub run_id: RunId,
    pub model: String,
    /// Threshold actually applied (explicit or derived from the index mean).
    pub threshold: f64,
    pub index: Vec<IndexPoint>,
    pub index_stats: DistributionStats,
    pub signals: Vec<Signal>,
    pub classified: Classified,
    pub report: PerformanceReport,
    pub dataset_hash: String,
}

/// Load the configured data and run `model_name` (or the first model).
pub fn run_analysis(
    config: &AnalysisConfig,
    model_name: Option<&str>,
) -> Result<AnalysisResult, RunError> {
    let model = match model_name {
        Some(name) => config
            .model(name)
            .ok_or_else(|| RunError::ModelNotFound(name.to_string()))?,
        None => config.models.first().ok_or(ConfigError::NoModels)?,
    };
    let data = load_data(&config.data)?;
    run_model_on_data(config, model, &data)
}

/// Run one model on pre-loaded data. Performs no I/O.
pub fn run_model_on_data(
    config: &AnalysisConfig,
    model: &ModelConfig,
    data: &LoadedData,
) -> Result<AnalysisResult, RunError> {
    let weights = config.effective_weights(model)?;
    let signal = config.signal_for(model);
    let run_id = config.run_id(model, &data.dataset_hash)?;

    let index = CompositeIndexBuilder::new(weights, config.index.normalization)
        .build(&data.observations);
    let index_stats = DistributionStats::of_index(&index);
    let threshold = signal
        .threshold
        .unwrap_or_else(|| default_threshold(&index));

    let backtest = backtest_index(index, &signal.rule(threshold), &data.recessions);

    info!(
        model = %model.name,
        run_id = %&run_id[..12],
        threshold,
        signals = backtest.signals.len(),
        true_positives = backtest.report.true_positives,
        detection_rate = backtest.report.detection_rate_pct,
        "analysis complete"
    );

    Ok(AnalysisResult {
        run_id,
        model: model.name.clone(),
        threshold,
        index: backtest.index,
        index_stats,
        signals: backtest.signals,
        classified: backtest.classified,
        report: backtest.report,
        dataset_hash: data.dataset_hash.clone(),
    })
}
