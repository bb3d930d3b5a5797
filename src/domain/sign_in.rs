// ============================================================
// SIGN-IN TIMESTAMPS
// ============================================================
// Turn sign-in cells into comparable timestamps

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use super::dataset::CellValue;

/// Date-times with an explicit UTC offset, converted to UTC
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

/// Largest Excel serial date (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Parse a sign-in cell.
///
/// Blank cells yield `Ok(None)`; they sort after every dated record.
/// `Err` carries the text of the value that could not be read.
pub fn parse_sign_in(cell: &CellValue) -> Result<Option<NaiveDateTime>, String> {
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::DateTime(dt) => Ok(Some(*dt)),
        CellValue::Text(s) if s.trim().is_empty() => Ok(None),
        CellValue::Text(s) => parse_timestamp_text(s).map(Some).ok_or_else(|| s.clone()),
        CellValue::Float(serial) => from_excel_serial(*serial)
            .map(Some)
            .ok_or_else(|| cell.as_text()),
        CellValue::Int(serial) => from_excel_serial(*serial as f64)
            .map(Some)
            .ok_or_else(|| cell.as_text()),
        CellValue::Bool(_) => Err(cell.as_text()),
    }
}

/// Parse textual timestamps: RFC 3339 / ISO 8601, common locale date strings
pub fn parse_timestamp_text(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_utc());
        }
    }

    // A bare `Z` suffix outside strict RFC 3339 still means UTC
    let naive = value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
        .unwrap_or(value);

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(naive, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Convert an Excel serial date (days since 1899-12-30) to a timestamp
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}
