//! Timeline reconstruction and per-animal gain aggregation.
//!
//! Rows are grouped by animal identity, ordered by resolved date, and
//! reduced to one [`AnimalSummary`] per animal with enough usable history.
//! Rows whose date or weight cannot be resolved are dropped silently;
//! intervals with a non-positive day delta are skipped without penalizing
//! the animal.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::utility::{mean, round_to};
use crate::dates::resolve_date;
use crate::fields::{LogicalField, RawRow};

/// Bucket id for rows that carry no animal identifier. Retained so the
/// rows still flow through the minimum-history rule like any other group.
pub const UNKNOWN_ANIMAL: &str = "UNKNOWN";

/// Placeholder for sex and location values the source never provided.
pub const MISSING_TOKEN: &str = "N/A";

/// One usable weighing: resolved date and weight, plus the raw descriptor
/// fields carried along so the newest row can win them.
#[derive(Debug, Clone)]
pub struct WeighingEvent {
    pub animal_id: String,
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub sex_raw: Option<String>,
    pub location_raw: Option<String>,
    pub age_months_raw: Option<f64>,
}

/// Per-animal growth summary, the durable artifact of one file load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimalSummary {
    pub animal_id: String,
    /// Last known location, `N/A` when the source never said.
    pub location: String,
    /// Upper-cased sex token from the newest weighing (`M`, `F`, or
    /// whatever the source used), `N/A` when absent.
    pub sex: String,
    /// Last known age in months; 0 when unparseable.
    pub age_months: f64,
    /// Mean of per-interval daily gains, rounded to 4 decimals.
    pub daily_gain_kg_per_day: f64,
    pub total_gain_kg: f64,
    pub period_days: f64,
    pub weighing_count: usize,
    pub initial_weight_kg: f64,
    pub final_weight_kg: f64,
}

/// Reduces one file's rows to ordered animal summaries.
///
/// Animals appear in the order their first row appears in the source.
/// An animal contributes a summary only when it has at least two usable
/// weighings and at least one interval with a positive day delta.
pub fn build_summaries(rows: &[RawRow]) -> Vec<AnimalSummary> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&RawRow>> = HashMap::new();

    for row in rows {
        let id = row
            .text(LogicalField::Identifier)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_ANIMAL.to_string());

        match groups.get_mut(&id) {
            Some(bucket) => bucket.push(row),
            None => {
                order.push(id.clone());
                groups.insert(id, vec![row]);
            }
        }
    }

    let mut summaries = Vec::new();
    for id in &order {
        if let Some(summary) = summarize_animal(id, &groups[id]) {
            summaries.push(summary);
        }
    }

    debug!(
        animals = order.len(),
        summaries = summaries.len(),
        "Timelines reconstructed"
    );
    summaries
}

fn summarize_animal(animal_id: &str, rows: &[&RawRow]) -> Option<AnimalSummary> {
    let mut events: Vec<WeighingEvent> = rows
        .iter()
        .filter_map(|row| {
            let date = resolve_date(row.resolve(LogicalField::Date)?)?;
            let weight_kg = row.number(LogicalField::Weight)?;
            Some(WeighingEvent {
                animal_id: animal_id.to_string(),
                date,
                weight_kg,
                sex_raw: row.text(LogicalField::Sex),
                location_raw: row.text(LogicalField::Location),
                age_months_raw: row.number(LogicalField::AgeMonths),
            })
        })
        .collect();

    if events.len() < 2 {
        return None;
    }

    // Stable sort: rows sharing a date keep their source order.
    events.sort_by_key(|e| e.date);

    let mut gains = Vec::new();
    for pair in events.windows(2) {
        let day_delta = (pair[1].date - pair[0].date).num_days();
        if day_delta > 0 {
            gains.push((pair[1].weight_kg - pair[0].weight_kg) / day_delta as f64);
        }
    }

    // Same-day-only history: nothing to average, no summary.
    if gains.is_empty() {
        return None;
    }

    let first = events.first()?;
    let last = events.last()?;

    Some(AnimalSummary {
        animal_id: animal_id.to_string(),
        location: last
            .location_raw
            .clone()
            .unwrap_or_else(|| MISSING_TOKEN.to_string()),
        sex: last
            .sex_raw
            .as_deref()
            .unwrap_or(MISSING_TOKEN)
            .trim()
            .to_uppercase(),
        age_months: last.age_months_raw.unwrap_or(0.0),
        daily_gain_kg_per_day: round_to(mean(&gains), 4),
        total_gain_kg: last.weight_kg - first.weight_kg,
        period_days: (last.date - first.date).num_days() as f64,
        weighing_count: events.len(),
        initial_weight_kg: first.weight_kg,
        final_weight_kg: last.weight_kg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Scalar;

    fn row(index: usize, pairs: &[(&str, &str)]) -> RawRow {
        let fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Scalar::from_text(v)))
            .collect();
        RawRow::new(index, fields)
    }

    #[test]
    fn test_ten_day_twenty_kilo_gain() {
        let rows = vec![
            row(0, &[("ANIMAL", "A1"), ("DATA", "01/01/2024"), ("PESO", "100")]),
            row(1, &[("ANIMAL", "A1"), ("DATA", "11/01/2024"), ("PESO", "120")]),
        ];
        let summaries = build_summaries(&rows);
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];
        assert_eq!(s.daily_gain_kg_per_day, 2.0);
        assert_eq!(s.total_gain_kg, 20.0);
        assert_eq!(s.period_days, 10.0);
        assert_eq!(s.weighing_count, 2);
        assert_eq!(s.initial_weight_kg, 100.0);
        assert_eq!(s.final_weight_kg, 120.0);
    }

    #[test]
    fn test_two_rows_sharing_a_date_yield_no_summary() {
        let rows = vec![
            row(0, &[("ANIMAL", "A1"), ("DATA", "05/03/2024"), ("PESO", "200")]),
            row(1, &[("ANIMAL", "A1"), ("DATA", "05/03/2024"), ("PESO", "204")]),
        ];
        assert!(build_summaries(&rows).is_empty());
    }

    #[test]
    fn test_zero_delta_interval_skipped_but_animal_kept() {
        let rows = vec![
            row(0, &[("ANIMAL", "A1"), ("DATA", "01/01/2024"), ("PESO", "100")]),
            row(1, &[("ANIMAL", "A1"), ("DATA", "01/01/2024"), ("PESO", "105")]),
            row(2, &[("ANIMAL", "A1"), ("DATA", "11/01/2024"), ("PESO", "120")]),
        ];
        let summaries = build_summaries(&rows);
        assert_eq!(summaries.len(), 1);
        // The same-day pair is excluded; the surviving interval runs from
        // the second row (stable tie-break) to the third.
        assert_eq!(summaries[0].daily_gain_kg_per_day, 1.5);
        assert_eq!(summaries[0].weighing_count, 3);
    }

    #[test]
    fn test_single_row_yields_nothing() {
        let rows = vec![row(
            0,
            &[("ANIMAL", "A1"), ("DATA", "01/01/2024"), ("PESO", "100")],
        )];
        assert!(build_summaries(&rows).is_empty());
    }

    #[test]
    fn test_rows_with_bad_date_or_weight_are_dropped() {
        let rows = vec![
            row(0, &[("ANIMAL", "A1"), ("DATA", "01/01/2024"), ("PESO", "100")]),
            row(1, &[("ANIMAL", "A1"), ("DATA", "sem data"), ("PESO", "110")]),
            row(2, &[("ANIMAL", "A1"), ("DATA", "11/01/2024"), ("PESO", "gordo")]),
            row(3, &[("ANIMAL", "A1"), ("DATA", "21/01/2024"), ("PESO", "130")]),
        ];
        let summaries = build_summaries(&rows);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].weighing_count, 2);
        assert_eq!(summaries[0].daily_gain_kg_per_day, 1.5);
    }

    #[test]
    fn test_rows_without_identifier_share_the_unknown_bucket() {
        let rows = vec![
            row(0, &[("DATA", "01/01/2024"), ("PESO", "300")]),
            row(1, &[("DATA", "31/01/2024"), ("PESO", "330")]),
        ];
        let summaries = build_summaries(&rows);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].animal_id, UNKNOWN_ANIMAL);
        assert_eq!(summaries[0].daily_gain_kg_per_day, 1.0);
    }

    #[test]
    fn test_last_row_wins_descriptor_fields() {
        let rows = vec![
            row(
                0,
                &[
                    ("ANIMAL", "A1"),
                    ("DATA", "01/01/2024"),
                    ("PESO", "100"),
                    ("SEXO", "f"),
                    ("LOCAL", "Pasto A"),
                    ("MESES", "10"),
                ],
            ),
            row(
                1,
                &[
                    ("ANIMAL", "A1"),
                    ("DATA", "11/02/2024"),
                    ("PESO", "130"),
                    ("SEXO", "m"),
                    ("LOCAL", "Pasto B"),
                    ("MESES", "11"),
                ],
            ),
        ];
        let summaries = build_summaries(&rows);
        let s = &summaries[0];
        assert_eq!(s.sex, "M");
        assert_eq!(s.location, "Pasto B");
        assert_eq!(s.age_months, 11.0);
    }

    #[test]
    fn test_missing_descriptors_fall_back() {
        let rows = vec![
            row(0, &[("ANIMAL", "A1"), ("DATA", "01/01/2024"), ("PESO", "100")]),
            row(1, &[("ANIMAL", "A1"), ("DATA", "11/01/2024"), ("PESO", "110")]),
        ];
        let s = &build_summaries(&rows)[0];
        assert_eq!(s.sex, MISSING_TOKEN);
        assert_eq!(s.location, MISSING_TOKEN);
        assert_eq!(s.age_months, 0.0);
    }

    #[test]
    fn test_summaries_keep_first_appearance_order() {
        let rows = vec![
            row(0, &[("ANIMAL", "B2"), ("DATA", "01/01/2024"), ("PESO", "100")]),
            row(1, &[("ANIMAL", "A1"), ("DATA", "01/01/2024"), ("PESO", "200")]),
            row(2, &[("ANIMAL", "B2"), ("DATA", "11/01/2024"), ("PESO", "110")]),
            row(3, &[("ANIMAL", "A1"), ("DATA", "11/01/2024"), ("PESO", "220")]),
        ];
        let ids: Vec<_> = build_summaries(&rows)
            .into_iter()
            .map(|s| s.animal_id)
            .collect();
        assert_eq!(ids, vec!["B2".to_string(), "A1".to_string()]);
    }

    #[test]
    fn test_unsorted_input_is_ordered_by_date() {
        let rows = vec![
            row(0, &[("ANIMAL", "A1"), ("DATA", "21/01/2024"), ("PESO", "140")]),
            row(1, &[("ANIMAL", "A1"), ("DATA", "01/01/2024"), ("PESO", "100")]),
            row(2, &[("ANIMAL", "A1"), ("DATA", "11/01/2024"), ("PESO", "120")]),
        ];
        let s = &build_summaries(&rows)[0];
        assert_eq!(s.initial_weight_kg, 100.0);
        assert_eq!(s.final_weight_kg, 140.0);
        assert_eq!(s.period_days, 20.0);
        assert_eq!(s.daily_gain_kg_per_day, 2.0);
    }

    #[test]
    fn test_serial_dates_mix_with_calendar_dates() {
        // 45292 is the serial for 2024-01-01.
        let rows = vec![
            row(0, &[("ANIMAL", "A1"), ("DATA", "45292"), ("PESO", "100")]),
            row(1, &[("ANIMAL", "A1"), ("DATA", "11/01/2024"), ("PESO", "120")]),
        ];
        let s = &build_summaries(&rows)[0];
        assert_eq!(s.period_days, 10.0);
        assert_eq!(s.daily_gain_kg_per_day, 2.0);
    }
}
