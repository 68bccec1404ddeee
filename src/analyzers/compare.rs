//! Comparative views over a filtered summary set.
//!
//! Partitions by sex and by age bracket with per-partition population
//! statistics, plus the scatter and heatmap projections presentation
//! consumers plot directly. Empty partitions are omitted, never emitted
//! as zero-filled rows.

use serde::Serialize;

use crate::analyzers::filter::AGE_BRACKETS;
use crate::analyzers::utility::{mean, round_to, stddev};
use crate::timeline::AnimalSummary;

/// Sex tokens that participate in the sex comparison. Anything else
/// (including the `N/A` placeholder) is excluded from this view.
const COMPARED_SEXES: &[(&str, &str)] = &[("M", "Machos"), ("F", "Fêmeas")];

/// Population statistics for one partition of the filtered set.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    /// Partition key: a sex token or an age-bracket id.
    pub group: String,
    /// Human-facing partition name.
    pub label: String,
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

fn group_stats(group: &str, label: &str, gains: &[f64]) -> GroupStats {
    let raw_mean = mean(gains);
    GroupStats {
        group: group.to_string(),
        label: label.to_string(),
        count: gains.len(),
        mean: round_to(raw_mean, 4),
        std_dev: round_to(stddev(gains, raw_mean), 4),
        min: gains.iter().copied().fold(f64::INFINITY, f64::min),
        max: gains.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

/// Per-sex statistics over the filtered set, `M` then `F`, present sexes only.
pub fn by_sex(filtered: &[AnimalSummary]) -> Vec<GroupStats> {
    COMPARED_SEXES
        .iter()
        .filter_map(|(token, label)| {
            let gains: Vec<f64> = filtered
                .iter()
                .filter(|s| s.sex == *token)
                .map(|s| s.daily_gain_kg_per_day)
                .collect();
            if gains.is_empty() {
                None
            } else {
                Some(group_stats(token, label, &gains))
            }
        })
        .collect()
}

/// Per-age-bracket statistics over the filtered set, youngest bracket
/// first, populated brackets only.
pub fn by_age(filtered: &[AnimalSummary]) -> Vec<GroupStats> {
    AGE_BRACKETS
        .iter()
        .filter_map(|bracket| {
            let gains: Vec<f64> = filtered
                .iter()
                .filter(|s| bracket.contains(s.age_months))
                .map(|s| s.daily_gain_kg_per_day)
                .collect();
            if gains.is_empty() {
                None
            } else {
                Some(group_stats(bracket.id, bracket.label, &gains))
            }
        })
        .collect()
}

/// One plotted animal in the scatter view.
#[derive(Debug, Clone, Serialize)]
pub struct ScatterPoint {
    /// 1-based position in the filtered set's order.
    pub position: usize,
    pub animal_id: String,
    pub location: String,
    pub sex: String,
    pub age_months: f64,
    pub gain: f64,
    pub above_mean: bool,
}

/// Scatter projection of the filtered set around its own mean.
#[derive(Debug, Clone, Serialize)]
pub struct ScatterView {
    pub points: Vec<ScatterPoint>,
    /// Filtered-set mean gain, rounded to 4 decimals.
    pub mean: f64,
}

pub fn scatter(filtered: &[AnimalSummary]) -> ScatterView {
    if filtered.is_empty() {
        return ScatterView {
            points: Vec::new(),
            mean: 0.0,
        };
    }

    let gains: Vec<f64> = filtered.iter().map(|s| s.daily_gain_kg_per_day).collect();
    let raw_mean = mean(&gains);

    let points = filtered
        .iter()
        .enumerate()
        .map(|(i, s)| ScatterPoint {
            position: i + 1,
            animal_id: s.animal_id.clone(),
            location: s.location.clone(),
            sex: s.sex.clone(),
            age_months: s.age_months,
            gain: s.daily_gain_kg_per_day,
            above_mean: s.daily_gain_kg_per_day >= raw_mean,
        })
        .collect();

    ScatterView {
        points,
        mean: round_to(raw_mean, 4),
    }
}

/// Mean gain for one location × age-bracket cell.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapCell {
    pub location: String,
    pub bracket: String,
    pub mean_gain: f64,
}

/// Location × age-bracket heatmap. The open-ended adult bracket is not
/// plotted; cells with no animals are omitted.
pub fn heatmap(filtered: &[AnimalSummary]) -> Vec<HeatmapCell> {
    let mut locations: Vec<&str> = Vec::new();
    for s in filtered {
        if !locations.contains(&s.location.as_str()) {
            locations.push(&s.location);
        }
    }

    let brackets = &AGE_BRACKETS[..AGE_BRACKETS.len() - 1];
    let mut cells = Vec::new();
    for location in locations {
        for bracket in brackets {
            let gains: Vec<f64> = filtered
                .iter()
                .filter(|s| s.location == location && bracket.contains(s.age_months))
                .map(|s| s.daily_gain_kg_per_day)
                .collect();
            if !gains.is_empty() {
                cells.push(HeatmapCell {
                    location: location.to_string(),
                    bracket: bracket.id.to_string(),
                    mean_gain: mean(&gains),
                });
            }
        }
    }
    cells
}
