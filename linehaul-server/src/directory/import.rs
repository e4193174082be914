//! Route table import.
//!
//! Route planners maintain the historical route table in a spreadsheet.
//! Each exported row becomes one [`RouteRecord`]. Rows without a mileage are
//! not routes in service and are skipped; rows with unusable codes or times
//! are counted as failures and reported back.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{RouteRecord, TerminalCode, parse_schedule_time};

/// One exported spreadsheet row, keyed by the sheet's column headings.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRow {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Orig")]
    pub origin: Option<String>,
    #[serde(rename = "Dest")]
    pub destination: Option<String>,
    #[serde(rename = "Miles", default)]
    pub miles: Option<f64>,
    #[serde(rename = "Active", default)]
    pub active: Option<bool>,
    #[serde(rename = "Depart Time", default)]
    pub departure_time: Option<String>,
    #[serde(rename = "Arrive Time", default)]
    pub arrival_time: Option<String>,
}

/// Outcome of a route import.
#[derive(Debug, Clone, Default)]
pub struct RouteImport {
    pub records: Vec<RouteRecord>,
    /// Rows without mileage.
    pub skipped: usize,
    /// One message per rejected row.
    pub failures: Vec<String>,
}

impl RouteImport {
    pub fn imported(&self) -> usize {
        self.records.len()
    }
}

/// Convert spreadsheet rows into route records.
pub fn import_route_rows(rows: impl IntoIterator<Item = RouteRow>) -> RouteImport {
    let mut report = RouteImport::default();

    for row in rows {
        let name = row.name.as_deref().map(str::trim).unwrap_or_default();
        if row.miles.is_none() {
            debug!(route = name, "skipping route row without miles");
            report.skipped += 1;
            continue;
        }

        match convert_row(&row) {
            Ok(record) => report.records.push(record),
            Err(message) => {
                warn!(route = name, %message, "failed to import route row");
                report.failures.push(message);
            }
        }
    }

    report
}

fn convert_row(row: &RouteRow) -> Result<RouteRecord, String> {
    let name = row
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| "route row without a name".to_string())?;

    let parse_code = |raw: Option<&str>, column: &str| {
        let raw = raw.unwrap_or_default();
        TerminalCode::parse_normalized(raw)
            .map_err(|e| format!("route {name}: {column} '{raw}': {e}"))
    };
    let origin = parse_code(row.origin.as_deref(), "Orig")?;
    let destination = parse_code(row.destination.as_deref(), "Dest")?;

    let parse_time = |raw: Option<&str>, column: &str| match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_schedule_time(text)
            .map(Some)
            .map_err(|e| format!("route {name}: {column} '{text}': {e}")),
    };

    Ok(RouteRecord {
        name: name.to_string(),
        origin,
        destination,
        miles: row.miles,
        active: row.active.unwrap_or(false),
        departure_time: parse_time(row.departure_time.as_deref(), "Depart Time")?,
        arrival_time: parse_time(row.arrival_time.as_deref(), "Arrive Time")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn rows(json: &str) -> Vec<RouteRow> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn imports_valid_rows_and_cleans_times() {
        let report = import_route_rows(rows(
            r#"[
                {"Name": "PHXDEN1", "Orig": "PHX", "Dest": "DEN", "Miles": 821,
                 "Active": true, "Depart Time": "22:30", "Arrive Time": "1900-01-01 12:45:00"}
            ]"#,
        ));

        assert_eq!(report.imported(), 1);
        assert_eq!(report.skipped, 0);
        assert!(report.failures.is_empty());

        let record = &report.records[0];
        assert_eq!(record.name, "PHXDEN1");
        assert_eq!(record.miles, Some(821.0));
        assert!(record.active);
        assert_eq!(record.departure_time, NaiveTime::from_hms_opt(22, 30, 0));
        assert_eq!(record.arrival_time, NaiveTime::from_hms_opt(12, 45, 0));
    }

    #[test]
    fn rows_without_miles_are_skipped() {
        let report = import_route_rows(rows(
            r#"[
                {"Name": "PHXDEN1", "Orig": "PHX", "Dest": "DEN"},
                {"Name": "DENSLC1", "Orig": "DEN", "Dest": "SLC", "Miles": 525}
            ]"#,
        ));
        assert_eq!(report.skipped, 1);
        assert_eq!(report.imported(), 1);
        assert_eq!(report.records[0].name, "DENSLC1");
    }

    #[test]
    fn bad_codes_and_times_are_failures() {
        let report = import_route_rows(rows(
            r#"[
                {"Name": "X1", "Orig": "P H X", "Dest": "DEN", "Miles": 1},
                {"Name": "X2", "Orig": "PHX", "Dest": "DEN", "Miles": 1, "Depart Time": "late"},
                {"Name": "  ", "Orig": "PHX", "Dest": "DEN", "Miles": 1}
            ]"#,
        ));
        assert_eq!(report.imported(), 0);
        assert_eq!(report.failures.len(), 3);
        assert!(report.failures[0].contains("Orig"));
        assert!(report.failures[1].contains("Depart Time"));
    }

    #[test]
    fn lowercase_codes_are_normalized() {
        let report = import_route_rows(rows(
            r#"[{"Name": "bilfar1", "Orig": "bil", "Dest": "far", "Miles": 400}]"#,
        ));
        assert_eq!(report.records[0].origin.as_str(), "BIL");
        assert!(!report.records[0].active);
    }
}
