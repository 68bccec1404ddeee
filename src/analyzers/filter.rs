//! Filter predicates over animal summaries.
//!
//! Location, sex, and age bracket are independent conjunctive predicates;
//! an omitted predicate passes everything, so filtering is idempotent and
//! order-insensitive.

use serde::Serialize;

use crate::timeline::AnimalSummary;

/// User-selected filter configuration. `None` means "all". Doubles as the
/// memoization key for derived views, so it hashes structurally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FilterState {
    pub location: Option<String>,
    pub age_bracket: Option<String>,
    pub sex: Option<String>,
}

impl FilterState {
    pub fn new(
        location: Option<String>,
        age_bracket: Option<String>,
        sex: Option<String>,
    ) -> Self {
        FilterState {
            location,
            age_bracket,
            sex,
        }
    }

    fn matches(&self, summary: &AnimalSummary) -> bool {
        if let Some(location) = &self.location {
            if summary.location != *location {
                return false;
            }
        }
        if let Some(sex) = &self.sex {
            if summary.sex != *sex {
                return false;
            }
        }
        if let Some(id) = &self.age_bracket {
            if let Some(bracket) = bracket_by_id(id) {
                if !bracket.contains(summary.age_months) {
                    return false;
                }
            }
        }
        true
    }
}

/// One age bracket: a half-open month range used both for filtering and
/// for comparative partitioning.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AgeBracket {
    pub id: &'static str,
    pub label: &'static str,
    pub min_months: f64,
    pub max_months: f64,
}

impl AgeBracket {
    /// Membership check. Ages are truncated toward zero first, so an
    /// animal at 5.9 months still counts as 5.
    pub fn contains(&self, age_months: f64) -> bool {
        let age = age_months.trunc();
        age >= self.min_months && age < self.max_months
    }
}

/// The fixed bracket table, ordered youngest first.
pub static AGE_BRACKETS: &[AgeBracket] = &[
    AgeBracket {
        id: "0-6",
        label: "0-6 meses (Bezerros)",
        min_months: 0.0,
        max_months: 6.0,
    },
    AgeBracket {
        id: "6-12",
        label: "6-12 meses (Desmama)",
        min_months: 6.0,
        max_months: 12.0,
    },
    AgeBracket {
        id: "12-18",
        label: "12-18 meses (Recria)",
        min_months: 12.0,
        max_months: 18.0,
    },
    AgeBracket {
        id: "18-24",
        label: "18-24 meses (Engorda)",
        min_months: 18.0,
        max_months: 24.0,
    },
    AgeBracket {
        id: "24+",
        label: "24+ meses (Adultos)",
        min_months: 24.0,
        max_months: f64::INFINITY,
    },
];

pub fn bracket_by_id(id: &str) -> Option<&'static AgeBracket> {
    AGE_BRACKETS.iter().find(|b| b.id == id)
}

/// Applies the filter, preserving summary order.
pub fn apply(summaries: &[AnimalSummary], filter: &FilterState) -> Vec<AnimalSummary> {
    summaries
        .iter()
        .filter(|s| filter.matches(s))
        .cloned()
        .collect()
}
