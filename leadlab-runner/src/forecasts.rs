//! Forecasts handed in next to the weights: GDP growth 12 and 24 months out,
//! and the probability of a recession.
//!
//! Each forecast column is summarized with [`DistributionStats`] and a
//! fixed-width histogram. Recession probabilities are also counted into five
//! 20-point bands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::DistributionStats;
use crate::weights::WeightSubmission;

/// A forecast column on a submissions sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastField {
    Gdp12Month,
    Gdp24Month,
    RecessionProbability,
}

impl ForecastField {
    pub const ALL: [ForecastField; 3] = [
        ForecastField::Gdp12Month,
        ForecastField::Gdp24Month,
        ForecastField::RecessionProbability,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ForecastField::Gdp12Month => "gdp_12_month",
            ForecastField::Gdp24Month => "gdp_24_month",
            ForecastField::RecessionProbability => "recession_probability",
        }
    }

    /// Column header used by the class sheet.
    pub fn source_code(self) -> &'static str {
        match self {
            ForecastField::Gdp12Month => "GDP_12Month",
            ForecastField::Gdp24Month => "GDP_24Month",
            ForecastField::RecessionProbability => "Recession_Probability",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ForecastField::Gdp12Month => "GDP growth, 12 months (%)",
            ForecastField::Gdp24Month => "GDP growth, 24 months (%)",
            ForecastField::RecessionProbability => "Recession probability (%)",
        }
    }

    /// Exact match on the id or the sheet header, after trimming.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == name || f.source_code() == name)
    }

    /// Histogram bin width, in percentage points.
    pub fn bin_width(self) -> f64 {
        match self {
            ForecastField::Gdp12Month | ForecastField::Gdp24Month => 0.5,
            ForecastField::RecessionProbability => 10.0,
        }
    }
}

impl std::fmt::Display for ForecastField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open bin `[start, end)`. The last bin also holds the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub stats: DistributionStats,
    pub histogram: Vec<HistogramBin>,
}

/// 20-point recession probability bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityBand {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl ProbabilityBand {
    pub const ALL: [ProbabilityBand; 5] = [
        ProbabilityBand::VeryLow,
        ProbabilityBand::Low,
        ProbabilityBand::Moderate,
        ProbabilityBand::High,
        ProbabilityBand::VeryHigh,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProbabilityBand::VeryLow => "Very Low (0-20%)",
            ProbabilityBand::Low => "Low (20-40%)",
            ProbabilityBand::Moderate => "Moderate (40-60%)",
            ProbabilityBand::High => "High (60-80%)",
            ProbabilityBand::VeryHigh => "Very High (80-100%)",
        }
    }

    /// Band for a probability in percent. Outside `[0, 100]` has no band;
    /// exactly 100 is Very High.
    pub fn of(probability: f64) -> Option<Self> {
        if !(0.0..=100.0).contains(&probability) {
            return None;
        }
        let slot = ((probability / 20.0).floor() as usize).min(Self::ALL.len() - 1);
        Some(Self::ALL[slot])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandCount {
    pub band: ProbabilityBand,
    pub count: usize,
    /// Share of all submitters, in percent.
    pub share_pct: f64,
}

/// Forecast summaries for a class. Only columns present on the sheet appear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassForecasts {
    pub summaries: BTreeMap<ForecastField, ForecastSummary>,
    /// Empty unless the sheet has a recession probability column.
    pub probability_bands: Vec<BandCount>,
}

impl ClassForecasts {
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

/// Summarize every forecast column any submitter filled in.
///
/// A submitter without a value for a column counts as 0 for it.
pub fn summarize_forecasts(submissions: &[WeightSubmission]) -> ClassForecasts {
    let mut forecasts = ClassForecasts::default();
    for field in ForecastField::ALL {
        if !submissions.iter().any(|s| s.forecasts.contains_key(&field)) {
            continue;
        }
        let column: Vec<f64> = submissions
            .iter()
            .map(|s| s.forecasts.get(&field).copied().unwrap_or(0.0))
            .collect();

        if field == ForecastField::RecessionProbability {
            forecasts.probability_bands = probability_bands(&column);
        }
        forecasts.summaries.insert(
            field,
            ForecastSummary {
                stats: DistributionStats::from_values(&column),
                histogram: histogram(&column, field.bin_width()),
            },
        );
    }
    forecasts
}

/// Fixed-width bins from `floor(min)` through `ceil(max)`.
///
/// Non-finite values are ignored. Empty input, or a width that is not
/// positive, gives no bins.
pub fn histogram(values: &[f64], bin_width: f64) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bin_width.is_nan() || bin_width <= 0.0 {
        return Vec::new();
    }
    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min).floor();
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max).ceil();

    let num_bins = ((hi - lo) / bin_width).floor() as usize + 1;
    let mut counts = vec![0usize; num_bins];
    for v in finite {
        let bin = (((v - lo) / bin_width).floor() as usize).min(num_bins - 1);
        counts[bin] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let start = lo + i as f64 * bin_width;
            HistogramBin {
                start,
                end: start + bin_width,
                count,
            }
        })
        .collect()
}

/// Count probabilities (in percent) per band, in band order.
pub fn probability_bands(probabilities: &[f64]) -> Vec<BandCount> {
    let total = probabilities.len();
    ProbabilityBand::ALL
        .into_iter()
        .map(|band| {
            let count = probabilities
                .iter()
                .filter(|p| ProbabilityBand::of(**p) == Some(band))
                .count();
            let share_pct = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            BandCount {
                band,
                count,
                share_pct,
            }
        })
        .collect()
}
