//! Row-to-entity parsing helpers and SQL building blocks.
//!
//! Every repo needs to convert `libsql::Row` (column-indexed) into typed entity
//! structs. Datetimes are stored as fixed-width RFC 3339 strings with
//! microsecond precision, so lexical order in SQL equals chronological order.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::error::DatabaseError;

/// Current time truncated to the precision stored in the database.
#[must_use]
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Truncate a caller-supplied time to stored precision.
#[must_use]
pub fn to_stored_precision(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.trunc_subsecs(6)
}

/// Format a datetime for storage: `2026-02-09T14:30:00.000000Z`.
#[must_use]
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 and `SQLite`'s default format
/// (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with every farm-core enum, since they serialize to their stored code.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read an INTEGER column holding a 0/1 flag.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_bool(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Accumulates `SET` clauses for a dynamic `UPDATE` statement.
///
/// Only fields that were provided produce a clause; placeholders are numbered
/// in insertion order.
#[derive(Debug, Default)]
pub struct UpdateSql {
    sets: Vec<String>,
    params: Vec<libsql::Value>,
}

impl UpdateSql {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &str, value: impl Into<libsql::Value>) {
        self.params.push(value.into());
        self.sets.push(format!("{column} = ?{}", self.params.len()));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Build the final statement restricted to one row.
    #[must_use]
    pub fn finish(
        mut self,
        table: &str,
        id_column: &str,
        id: &str,
    ) -> (String, Vec<libsql::Value>) {
        self.params.push(id.into());
        let sql = format!(
            "UPDATE {table} SET {} WHERE {id_column} = ?{}",
            self.sets.join(", "),
            self.params.len()
        );
        (sql, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use farm_core::enums::{AnimalType, FinancingType};
    use rstest::rstest;

    #[test]
    fn stored_datetime_roundtrips() {
        let dt = now_micros();
        let parsed = parse_datetime(&format_datetime(&dt)).unwrap();
        assert_eq!(parsed, dt);
    }

    #[test]
    fn stored_format_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2026, 2, 9, 14, 30, 0).unwrap();
        assert_eq!(format_datetime(&whole), "2026-02-09T14:30:00.000000Z");
        assert_eq!(
            format_datetime(&whole).len(),
            format_datetime(&now_micros()).len()
        );
    }

    #[test]
    fn parses_sqlite_default_format() {
        let dt = parse_datetime("2026-02-09 14:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 2, 9, 14, 30, 0).unwrap());
    }

    #[test]
    fn rejects_garbage_datetime() {
        assert!(matches!(
            parse_datetime("yesterday"),
            Err(DatabaseError::Query(_))
        ));
    }

    #[rstest]
    #[case("CHV", AnimalType::Chevre)]
    #[case("CH", AnimalType::Chevrette)]
    #[case("B", AnimalType::Bouc)]
    fn parse_enum_uses_stored_codes(#[case] code: &str, #[case] expected: AnimalType) {
        assert_eq!(parse_enum::<AnimalType>(code).unwrap(), expected);
    }

    #[test]
    fn parse_enum_is_case_sensitive() {
        assert_eq!(
            parse_enum::<FinancingType>("Bank").unwrap(),
            FinancingType::Bank
        );
        assert!(parse_enum::<FinancingType>("bank").is_err());
    }

    #[test]
    fn update_sql_numbers_placeholders() {
        let mut update = UpdateSql::new();
        assert!(update.is_empty());
        update.set("liter", 12_i64);
        update.set("comment", "late");
        let (sql, params) = update.finish("deliveries", "id", "dlv-1");
        assert_eq!(
            sql,
            "UPDATE deliveries SET liter = ?1, comment = ?2 WHERE id = ?3"
        );
        assert_eq!(params.len(), 3);
    }
}
