//! Loosely-typed scalars and header-alias resolution.
//!
//! Source files arrive with inconsistent column naming, so every logical
//! field carries an ordered alias list. Headers are normalized (trimmed,
//! upper-cased) once at ingestion; later stages only ever see resolved
//! logical fields.

use std::collections::HashMap;

use serde::Serialize;

/// A cell value after best-effort typing. Numeric-looking text becomes
/// [`Scalar::Number`]; blank cells become [`Scalar::Empty`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Empty,
}

impl Scalar {
    /// Builds a scalar from raw cell text, trimming and typing numerics.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Scalar::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) => Scalar::Number(n),
            Err(_) => Scalar::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Scalar::Empty)
    }

    /// Numeric view of the scalar. Text is parsed leniently; empty is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
            Scalar::Empty => None,
        }
    }

    /// String view of the scalar, as it would print. Empty is `None`.
    pub fn stringify(&self) -> Option<String> {
        match self {
            Scalar::Number(n) => Some(format!("{}", n)),
            Scalar::Text(s) => Some(s.clone()),
            Scalar::Empty => None,
        }
    }
}

/// Logical fields the engine understands, each matched against source
/// headers through its alias list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalField {
    Identifier,
    Date,
    Weight,
    Sex,
    Location,
    AgeMonths,
    RecordId,
}

impl LogicalField {
    /// Ordered alias list. First alias present with a non-empty value wins.
    /// Aliases are already in normalized (upper-case) form.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            LogicalField::Identifier => &["ANIMAL"],
            LogicalField::Date => &["DATA", "DATA_PESAGEM"],
            LogicalField::Weight => &["PESO"],
            LogicalField::Sex => &["SX", "SEXO"],
            LogicalField::Location => &["LOCAL"],
            LogicalField::AgeMonths => &["MESES"],
            LogicalField::RecordId => &["ID", "REGISTRO"],
        }
    }
}

/// Normalizes a source header: surrounding whitespace removed, upper-cased.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// One ingested row: normalized header -> scalar, plus the row's position
/// in the source file. The position is the tie-breaker when two weighings
/// share a date.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub source_index: usize,
    fields: HashMap<String, Scalar>,
}

impl RawRow {
    pub fn new(source_index: usize, fields: HashMap<String, Scalar>) -> Self {
        RawRow {
            source_index,
            fields,
        }
    }

    /// True when every cell in the row is empty.
    pub fn is_blank(&self) -> bool {
        self.fields.values().all(Scalar::is_empty)
    }

    /// Resolves a logical field through its alias list; `None` when no
    /// alias carries a non-empty value.
    pub fn resolve(&self, field: LogicalField) -> Option<&Scalar> {
        field
            .aliases()
            .iter()
            .filter_map(|alias| self.fields.get(*alias))
            .find(|scalar| !scalar.is_empty())
    }

    pub fn text(&self, field: LogicalField) -> Option<String> {
        self.resolve(field).and_then(Scalar::stringify)
    }

    pub fn number(&self, field: LogicalField) -> Option<f64> {
        self.resolve(field).and_then(Scalar::as_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Scalar)]) -> RawRow {
        let fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        RawRow::new(0, fields)
    }

    #[test]
    fn test_scalar_from_text_types_numerics() {
        assert_eq!(Scalar::from_text("350.5"), Scalar::Number(350.5));
        assert_eq!(Scalar::from_text(" 42 "), Scalar::Number(42.0));
        assert_eq!(Scalar::from_text("BR-101"), Scalar::Text("BR-101".into()));
        assert_eq!(Scalar::from_text("   "), Scalar::Empty);
    }

    #[test]
    fn test_scalar_stringify_number_has_no_trailing_zeroes() {
        assert_eq!(Scalar::Number(44197.0).stringify().unwrap(), "44197");
        assert_eq!(Scalar::Number(350.5).stringify().unwrap(), "350.5");
    }

    #[test]
    fn test_alias_first_non_empty_wins() {
        let r = row(&[
            ("SX", Scalar::Empty),
            ("SEXO", Scalar::Text("F".into())),
        ]);
        assert_eq!(r.text(LogicalField::Sex).unwrap(), "F");
    }

    #[test]
    fn test_alias_order_prefers_earlier_alias() {
        let r = row(&[
            ("DATA", Scalar::Text("15/03/2024".into())),
            ("DATA_PESAGEM", Scalar::Text("01/01/2020".into())),
        ]);
        assert_eq!(r.text(LogicalField::Date).unwrap(), "15/03/2024");
    }

    #[test]
    fn test_resolve_missing_field() {
        let r = row(&[("PESO", Scalar::Number(300.0))]);
        assert!(r.resolve(LogicalField::Identifier).is_none());
        assert_eq!(r.number(LogicalField::Weight), Some(300.0));
    }

    #[test]
    fn test_number_parses_numeric_text() {
        let r = row(&[("PESO", Scalar::Text("287.5".into()))]);
        assert_eq!(r.number(LogicalField::Weight), Some(287.5));
    }

    #[test]
    fn test_blank_row_detection() {
        let r = row(&[("ANIMAL", Scalar::Empty), ("PESO", Scalar::Empty)]);
        assert!(r.is_blank());
    }
}
