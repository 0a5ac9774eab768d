//! LeadLab Core: composite leading index and recession-signal backtesting engine.
//!
//! This crate contains the pure, synchronous engine:
//! - Domain types (indicators, observations, recession windows, signals)
//! - Composite index builder with explicit normalization
//! - Signal generator with edge-triggered and cooldown-gated policies
//! - Recession classifier (coincident / true positive / false positive)
//! - Performance metrics (lead time, detection rate, accuracy)
//!
//! No I/O happens here. Loading, configuration and orchestration live in
//! `leadlab-runner`.

pub mod classify;
pub mod domain;
pub mod index;
pub mod metrics;
pub mod pipeline;
pub mod signals;

pub use classify::{classify, Classified, LEAD_HORIZON_MONTHS};
pub use index::{CompositeIndexBuilder, Normalization};
pub use metrics::{summarize, PerformanceReport};
pub use pipeline::{run_backtest, Backtest};
pub use signals::{CooldownGate, CooldownPolicy, RecessionRelease, SignalRule, ThresholdDirection};
