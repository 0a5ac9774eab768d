//! LeadLab Runner: analysis orchestration on top of `leadlab-core`.
//!
//! This crate provides:
//! - TOML analysis configuration with validation and run fingerprints
//! - Strict CSV ingestion for observations, recessions and weight submissions
//! - Class-average weights and percentage normalization
//! - Summaries of the GDP and recession forecasts submitted with the weights
//! - Distribution statistics and the default threshold
//! - Single-model runs and multi-model comparison

pub mod comparison;
pub mod config;
pub mod data_loader;
pub mod forecasts;
pub mod runner;
pub mod stats;
pub mod weights;

pub use comparison::{compare_from_config, compare_models, ComparisonRow};
pub use config::{
    AnalysisConfig, ConfigError, DataConfig, ModelConfig, RunId, SignalConfig, SignalOverride,
};
pub use data_loader::{load_data, LoadError, LoadedData};
pub use forecasts::{
    summarize_forecasts, BandCount, ClassForecasts, ForecastField, ForecastSummary, HistogramBin,
    ProbabilityBand,
};
pub use runner::{run_analysis, run_model_on_data, AnalysisResult, RunError};
pub use stats::{default_threshold, DistributionStats};
pub use weights::{aggregate_submissions, normalize_to_percent, ClassWeights, WeightSubmission};
