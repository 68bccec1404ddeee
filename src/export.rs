//! Flattened export of a filtered summary set.
//!
//! One row per animal, Portuguese column headers, and a filename that
//! encodes the active filter so exports stay distinguishable on disk.

use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analyzers::filter::FilterState;
use crate::analyzers::utility::{mean, round_to};
use crate::timeline::AnimalSummary;

pub const ABOVE_MEAN: &str = "Acima da Média";
pub const BELOW_MEAN: &str = "Abaixo da Média";

/// One export row. Field order is the column order.
#[derive(Debug, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Animal")]
    pub animal: String,
    #[serde(rename = "Pasto")]
    pub location: String,
    #[serde(rename = "Sexo")]
    pub sex: String,
    #[serde(rename = "Idade (meses)")]
    pub age_months: f64,
    #[serde(rename = "Ganho Diário (kg/dia)")]
    pub daily_gain: f64,
    #[serde(rename = "Peso Inicial (kg)")]
    pub initial_weight: f64,
    #[serde(rename = "Peso Final (kg)")]
    pub final_weight: f64,
    #[serde(rename = "Ganho Total (kg)")]
    pub total_gain: f64,
    #[serde(rename = "Período (dias)")]
    pub period_days: i64,
    #[serde(rename = "Total de Pesagens")]
    pub weighing_count: usize,
    #[serde(rename = "Status")]
    pub status: String,
}

/// Projects the filtered set into export rows. Status compares each gain
/// against the set's own mean, rounded like every reported gain.
pub fn export_rows(filtered: &[AnimalSummary]) -> Vec<ExportRow> {
    let gains: Vec<f64> = filtered.iter().map(|s| s.daily_gain_kg_per_day).collect();
    let set_mean = round_to(mean(&gains), 4);

    filtered
        .iter()
        .map(|s| ExportRow {
            animal: s.animal_id.clone(),
            location: s.location.clone(),
            sex: s.sex.clone(),
            age_months: s.age_months,
            daily_gain: s.daily_gain_kg_per_day,
            initial_weight: s.initial_weight_kg,
            final_weight: s.final_weight_kg,
            total_gain: s.total_gain_kg,
            period_days: s.period_days.round() as i64,
            weighing_count: s.weighing_count,
            status: if s.daily_gain_kg_per_day >= set_mean {
                ABOVE_MEAN.to_string()
            } else {
                BELOW_MEAN.to_string()
            },
        })
        .collect()
}

/// Serializes the filtered set as delimited text to any writer.
pub fn write_csv<W: io::Write>(writer: W, filtered: &[AnimalSummary]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in export_rows(filtered) {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Builds the export filename from the active filter, e.g.
/// `analise_peso_animais_Pasto A_0-6meses_M.csv`.
pub fn export_filename(filter: &FilterState) -> String {
    let mut name = String::from("analise_peso_animais");
    if let Some(location) = &filter.location {
        name.push('_');
        name.push_str(location);
    }
    if let Some(bracket) = &filter.age_bracket {
        name.push('_');
        name.push_str(bracket);
        name.push_str("meses");
    }
    if let Some(sex) = &filter.sex {
        name.push('_');
        name.push_str(sex);
    }
    name.push_str(".csv");
    name
}

/// Writes the filtered set into `dir` under the filter-derived filename
/// and returns the full path.
pub fn export_to_dir(
    dir: &Path,
    filtered: &[AnimalSummary],
    filter: &FilterState,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(filter));
    let file = File::create(&path)?;
    write_csv(file, filtered)?;
    info!(path = %path.display(), animals = filtered.len(), "Export written");
    Ok(path)
}

/// Pretty JSON rendering used by the CLI for every non-CSV output.
pub fn json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, gain: f64) -> AnimalSummary {
        AnimalSummary {
            animal_id: id.to_string(),
            location: "Pasto A".to_string(),
            sex: "M".to_string(),
            age_months: 10.0,
            daily_gain_kg_per_day: gain,
            total_gain_kg: 30.0,
            period_days: 30.0,
            weighing_count: 3,
            initial_weight_kg: 200.0,
            final_weight_kg: 230.0,
        }
    }

    #[test]
    fn test_filename_with_no_filter() {
        assert_eq!(
            export_filename(&FilterState::default()),
            "analise_peso_animais.csv"
        );
    }

    #[test]
    fn test_filename_encodes_every_active_predicate() {
        let filter = FilterState::new(
            Some("Pasto B".into()),
            Some("12-18".into()),
            Some("F".into()),
        );
        assert_eq!(
            export_filename(&filter),
            "analise_peso_animais_Pasto B_12-18meses_F.csv"
        );
    }

    #[test]
    fn test_status_splits_around_the_mean() {
        let rows = export_rows(&[summary("A1", 0.5), summary("A2", 1.5)]);
        assert_eq!(rows[0].status, BELOW_MEAN);
        assert_eq!(rows[1].status, ABOVE_MEAN);
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_animal() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &[summary("A1", 0.5), summary("A2", 1.5)]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Animal,Pasto,Sexo"));
    }

    #[test]
    fn test_export_round_trips_gain_values() {
        let set = vec![summary("A1", 0.7321), summary("A2", 1.0), summary("A3", 1.25)];
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &set).unwrap();

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let headers = reader.headers().unwrap().clone();
        let gain_col = headers
            .iter()
            .position(|h| h == "Ganho Diário (kg/dia)")
            .unwrap();

        let reparsed: Vec<f64> = reader
            .records()
            .map(|r| r.unwrap().get(gain_col).unwrap().parse::<f64>().unwrap())
            .collect();
        let original: Vec<f64> = set.iter().map(|s| s.daily_gain_kg_per_day).collect();
        assert_eq!(reparsed, original);
    }
}
