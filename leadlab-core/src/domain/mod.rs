//! Domain types for LeadLab

pub mod indicator;
pub mod observation;
pub mod recession;
pub mod signal;

pub use indicator::{Indicator, IndicatorId, WeightMap};
pub use observation::{IndexPoint, IndicatorObservation};
pub use recession::{RecessionError, RecessionInterval, RecessionTable};
pub use signal::{Classification, Signal, SignalOutcome};
