//! Side-by-side comparison of every configured model on the same data.

use serde::{Deserialize, Serialize};
use tracing::debug;

use leadlab_core::metrics::PerformanceReport;

use crate::config::{AnalysisConfig, RunId};
use crate::data_loader::{load_data, LoadedData};
use crate::runner::{run_model_on_data, RunError};

/// One model's headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub model: String,
    pub run_id: RunId,
    pub threshold: f64,
    pub signal_count: usize,
    pub report: PerformanceReport,
}

/// Load the configured data once and run every model, in config order.
pub fn compare_from_config(config: &AnalysisConfig) -> Result<Vec<ComparisonRow>, RunError> {
    let data = load_data(&config.data)?;
    compare_models(config, &data)
}

/// Run every model on pre-loaded data, in config order.
pub fn compare_models(
    config: &AnalysisConfig,
    data: &LoadedData,
) -> Result<Vec<ComparisonRow>, RunError> {
    let rows = config
        .models
        .iter()
        .map(|model| {
            let result = run_model_on_data(config, model, data)?;
            Ok(ComparisonRow {
                model: result.model,
                run_id: result.run_id,
                threshold: result.threshold,
                signal_count: result.signals.len(),
                report: result.report,
            })
        })
        .collect::<Result<Vec<_>, RunError>>()?;
    debug!(models = rows.len(), "compared models");
    Ok(rows)
}
