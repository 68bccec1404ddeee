//! Quartile-relative performance tiers.
//!
//! Tiers are relative to the *current filtered set's* own mean and
//! quartiles, so they shift whenever the filter changes.

use serde::Serialize;

use crate::analyzers::stats::StatsSummary;
use crate::analyzers::utility::round_to;
use crate::timeline::AnimalSummary;

/// Classifies one gain against the set's statistics.
///
/// | Range              | Tier      |
/// |--------------------|-----------|
/// | gain > Q3          | Excellent |
/// | mean ≤ gain ≤ Q3   | Good      |
/// | Q1 ≤ gain < mean   | Regular   |
/// | gain < Q1          | Poor      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Excellent,
    Good,
    Regular,
    Poor,
}

impl Tier {
    pub fn classify(gain: f64, stats: &StatsSummary) -> Tier {
        if gain > stats.q3 {
            Tier::Excellent
        } else if gain >= stats.mean {
            Tier::Good
        } else if gain >= stats.q1 {
            Tier::Regular
        } else {
            Tier::Poor
        }
    }
}

/// Count and share of one tier within the filtered set.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TierShare {
    pub count: usize,
    /// Share of the filtered set, rounded to 1 decimal.
    pub percent: f64,
}

/// Tier breakdown of a filtered set.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceTiers {
    pub excellent: TierShare,
    pub good: TierShare,
    pub regular: TierShare,
    pub poor: TierShare,
}

/// Partitions the filtered set into performance tiers. `None` when the
/// set is empty (there are no quartiles to classify against).
pub fn classify(filtered: &[AnimalSummary], stats: &StatsSummary) -> Option<PerformanceTiers> {
    if filtered.is_empty() {
        return None;
    }

    let total = filtered.len();
    let mut counts = [0usize; 4];
    for summary in filtered {
        match Tier::classify(summary.daily_gain_kg_per_day, stats) {
            Tier::Excellent => counts[0] += 1,
            Tier::Good => counts[1] += 1,
            Tier::Regular => counts[2] += 1,
            Tier::Poor => counts[3] += 1,
        }
    }

    let share = |count: usize| TierShare {
        count,
        percent: round_to(count as f64 / total as f64 * 100.0, 1),
    };

    Some(PerformanceTiers {
        excellent: share(counts[0]),
        good: share(counts[1]),
        regular: share(counts[2]),
        poor: share(counts[3]),
    })
}
