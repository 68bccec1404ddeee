//! Descriptive statistics over a filtered summary set.
//!
//! Everything here is computed from the sorted daily-gain array: central
//! tendency, population dispersion, nearest-rank quartiles, Tukey outlier
//! fences, and the fixed performance distribution buckets. An empty input
//! yields no statistics rather than degenerate values.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::analyzers::utility::{mean, round_to, stddev};
use crate::timeline::AnimalSummary;

/// One fixed gain range for the distribution view.
#[derive(Debug, Clone, Copy)]
pub struct GainBucket {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
}

/// Fixed half-open gain ranges, in kg/day.
pub static GAIN_BUCKETS: &[GainBucket] = &[
    GainBucket {
        label: "Muito Baixo (< 0.5)",
        min: f64::NEG_INFINITY,
        max: 0.5,
    },
    GainBucket {
        label: "Baixo (0.5 - 0.8)",
        min: 0.5,
        max: 0.8,
    },
    GainBucket {
        label: "Médio (0.8 - 1.2)",
        min: 0.8,
        max: 1.2,
    },
    GainBucket {
        label: "Alto (1.2 - 1.5)",
        min: 1.2,
        max: 1.5,
    },
    GainBucket {
        label: "Muito Alto (> 1.5)",
        min: 1.5,
        max: f64::INFINITY,
    },
];

/// Count of summaries whose gain falls in one bucket.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DistributionBucket {
    pub label: &'static str,
    pub count: usize,
}

/// Descriptive statistics for one filtered set.
///
/// `mean`, `median`, `std_dev`, `q1`, `q3`, and `iqr` carry four decimals;
/// `coef_variation_pct` carries two and is `None` when the mean is zero.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub coef_variation_pct: Option<f64>,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_outlier_bound: f64,
    pub upper_outlier_bound: f64,
    pub outliers: Vec<AnimalSummary>,
    pub distribution: Vec<DistributionBucket>,
    pub min: f64,
    pub max: f64,
}

/// Computes statistics over the daily gains of a filtered set, or `None`
/// when the set is empty.
pub fn compute(filtered: &[AnimalSummary]) -> Option<StatsSummary> {
    if filtered.is_empty() {
        return None;
    }

    let mut gains: Vec<f64> = filtered.iter().map(|s| s.daily_gain_kg_per_day).collect();
    gains.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = gains.len();

    let raw_mean = mean(&gains);
    let median = if n % 2 == 0 {
        (gains[n / 2 - 1] + gains[n / 2]) / 2.0
    } else {
        gains[n / 2]
    };
    let raw_std = stddev(&gains, raw_mean);

    // Zero mean makes the coefficient of variation meaningless; surface
    // the sentinel instead of a non-finite value.
    let coef_variation_pct = if raw_mean == 0.0 {
        None
    } else {
        Some(round_to(raw_std / raw_mean * 100.0, 2))
    };

    // Nearest-rank quartiles, no interpolation.
    let q1 = gains[(n as f64 * 0.25).floor() as usize];
    let q3 = gains[(n as f64 * 0.75).floor() as usize];
    let iqr = q3 - q1;

    let lower_outlier_bound = q1 - 1.5 * iqr;
    let upper_outlier_bound = q3 + 1.5 * iqr;
    let outliers: Vec<AnimalSummary> = filtered
        .iter()
        .filter(|s| {
            s.daily_gain_kg_per_day < lower_outlier_bound
                || s.daily_gain_kg_per_day > upper_outlier_bound
        })
        .cloned()
        .collect();

    let distribution = GAIN_BUCKETS
        .iter()
        .map(|bucket| DistributionBucket {
            label: bucket.label,
            count: filtered
                .iter()
                .filter(|s| {
                    s.daily_gain_kg_per_day >= bucket.min && s.daily_gain_kg_per_day < bucket.max
                })
                .count(),
        })
        .collect();

    debug!(n, outliers = outliers.len(), "Statistics computed");

    Some(StatsSummary {
        mean: round_to(raw_mean, 4),
        median: round_to(median, 4),
        std_dev: round_to(raw_std, 4),
        coef_variation_pct,
        q1: round_to(q1, 4),
        q3: round_to(q3, 4),
        iqr: round_to(iqr, 4),
        lower_outlier_bound,
        upper_outlier_bound,
        outliers,
        distribution,
        min: gains[0],
        max: gains[n - 1],
    })
}
