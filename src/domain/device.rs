// ============================================================
// DEVICE RECORDS
// ============================================================
// Comparison keys, export records and run outcomes

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::dataset::{CellValue, Row};

/// Comparison key for a device identifier: trimmed and lowercased
pub fn normalize_device_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalized key for an identifier cell. Numeric names compare by their text form.
pub fn device_key(cell: &CellValue) -> String {
    match cell {
        CellValue::Text(s) => normalize_device_name(s),
        other => normalize_device_name(&other.as_text()),
    }
}

/// A row of the export dataset with its comparison key and parsed sign-in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device_name: String,

    /// `None` when the sign-in cell was blank
    pub last_sign_in: Option<NaiveDateTime>,

    pub row: Row,
}

/// Deduplicated export records whose key appears in the compare dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub headers: Vec<String>,
    pub records: Vec<DeviceRecord>,
}

impl MatchResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.records.iter().map(|r| &r.row)
    }
}

/// Successful end states of a comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompareOutcome {
    Exported { row_count: usize, output_path: PathBuf },
    NoMatches,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize_device_name("  PC-01 \t"), "pc-01");
        assert_eq!(normalize_device_name("Laptop-ÄB"), "laptop-äb");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["PC-01", " pc-01 ", "\u{a0}Desk 7\u{a0}", "", "MiXeD-Case-42  "] {
            let once = normalize_device_name(raw);
            assert_eq!(normalize_device_name(&once), once);
        }
    }

    #[test]
    fn test_device_key_for_non_text_cells() {
        assert_eq!(device_key(&CellValue::Float(1001.0)), "1001");
        assert_eq!(device_key(&CellValue::Int(7)), "7");
        assert_eq!(device_key(&CellValue::Empty), "");
    }
}
