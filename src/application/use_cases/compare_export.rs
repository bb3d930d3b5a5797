// ============================================================
// COMPARE AND EXPORT USE CASE
// ============================================================
// Normalize, keep the latest sign-in per device, intersect, export

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::domain::compare_settings::CompareSettings;
use crate::domain::dataset::{CellValue, Dataset, Row};
use crate::domain::device::{device_key, CompareOutcome, DeviceRecord, MatchResult};
use crate::domain::error::CompareError;
use crate::domain::log_entry::LogLevel;
use crate::domain::sign_in::parse_sign_in;
use crate::infrastructure::activity_log::ActivityLog;
use crate::infrastructure::spreadsheet::{SpreadsheetReader, SpreadsheetWriter};
use crate::infrastructure::storage::resolve_output_path;

const LOG_SOURCE: &str = "Compare";

pub struct CompareExportUseCase {
    settings: CompareSettings,
    reader: SpreadsheetReader,
    writer: SpreadsheetWriter,
    log: Arc<ActivityLog>,
}

impl CompareExportUseCase {
    pub fn new(settings: CompareSettings, log: Arc<ActivityLog>) -> Self {
        let reader = SpreadsheetReader::new().with_sheet(settings.sheet_name.clone());
        Self {
            settings,
            reader,
            writer: SpreadsheetWriter::new(),
            log,
        }
    }

    /// Run one comparison and write the matching devices to the output folder.
    ///
    /// Every outcome is logged once: INFO on export, WARNING on no match,
    /// ERROR on failure.
    pub fn execute(
        &self,
        export_path: &Path,
        compare_path: &Path,
        output_dir: &Path,
    ) -> Result<CompareOutcome, CompareError> {
        self.log.add_log(LogLevel::Info, LOG_SOURCE, "Starting comparison process.");

        let result = self.run(export_path, compare_path, output_dir);
        match &result {
            Ok(CompareOutcome::Exported { output_path, .. }) => self.log.add_log(
                LogLevel::Info,
                LOG_SOURCE,
                &format!("Comparison completed. Results saved at: {}", output_path.display()),
            ),
            Ok(CompareOutcome::NoMatches) => {
                self.log
                    .add_log(LogLevel::Warning, LOG_SOURCE, "No matching devices found.")
            }
            Err(err) => self.log.add_log(
                LogLevel::Error,
                LOG_SOURCE,
                &format!("An error occurred: {}", err),
            ),
        }
        result
    }

    fn run(
        &self,
        export_path: &Path,
        compare_path: &Path,
        output_dir: &Path,
    ) -> Result<CompareOutcome, CompareError> {
        let export = self.load(export_path, "Export")?;
        let compare = self.load(compare_path, "Compare")?;

        let matches = self.match_devices(export, &compare)?;
        if matches.is_empty() {
            return Ok(CompareOutcome::NoMatches);
        }

        let output_path = resolve_output_path(output_dir, &self.settings.output_file_name)?;
        let row_count = self
            .writer
            .write_xlsx(&output_path, &matches.headers, matches.rows())?;

        Ok(CompareOutcome::Exported {
            row_count,
            output_path,
        })
    }

    fn load(&self, path: &Path, label: &str) -> Result<Dataset, CompareError> {
        let dataset = self.reader.read(path)?;
        self.log.add_log(
            LogLevel::Debug,
            LOG_SOURCE,
            &format!(
                "{} file loaded: {} ({} rows, {} columns)",
                label,
                path.display(),
                dataset.len(),
                dataset.headers.len()
            ),
        );
        Ok(dataset)
    }

    /// Deduplicate the export dataset by latest sign-in and keep the devices
    /// present in the compare dataset. No files are touched.
    pub fn match_devices(
        &self,
        export: Dataset,
        compare: &Dataset,
    ) -> Result<MatchResult, CompareError> {
        let export_device_col = export.require_column(&self.settings.device_column)?;
        let sign_in_col = export.require_column(&self.settings.sign_in_column)?;
        let compare_device_col = compare.require_column(&self.settings.device_column)?;

        let Dataset {
            source,
            headers,
            rows,
        } = export;
        let records = to_device_records(&source, rows, export_device_col, sign_in_col)?;
        let total = records.len();

        let latest = keep_latest_sign_in(records);
        self.log.add_log(
            LogLevel::Debug,
            LOG_SOURCE,
            &format!(
                "Kept {} of {} export rows after removing duplicate devices",
                latest.len(),
                total
            ),
        );

        let compare_keys = compare_device_keys(compare, compare_device_col);
        let records: Vec<DeviceRecord> = latest
            .into_iter()
            .filter(|r| compare_keys.contains(&r.device_name))
            .collect();

        self.log.add_log(
            LogLevel::Debug,
            LOG_SOURCE,
            &format!(
                "{} devices matched against {} compare identifiers",
                records.len(),
                compare_keys.len()
            ),
        );

        Ok(MatchResult { headers, records })
    }
}

/// Normalize identifiers in place and parse sign-in times.
/// The identifier cell is overwritten with its normalized form.
fn to_device_records(
    source: &Path,
    rows: Vec<Row>,
    device_col: usize,
    sign_in_col: usize,
) -> Result<Vec<DeviceRecord>, CompareError> {
    rows.into_iter()
        .map(|mut row| -> Result<DeviceRecord, CompareError> {
            let device_name = device_key(row.get(device_col));
            let last_sign_in =
                parse_sign_in(row.get(sign_in_col)).map_err(|value| CompareError::TimestampParseFailure {
                    path: source.to_path_buf(),
                    row: row.sheet_row_number(),
                    value,
                })?;
            row.set(device_col, CellValue::from_text(&device_name));
            Ok(DeviceRecord {
                device_name,
                last_sign_in,
                row,
            })
        })
        .collect()
}

/// Sort by sign-in (newest first, blanks last, stable for ties) and keep the
/// first record per device.
pub fn keep_latest_sign_in(mut records: Vec<DeviceRecord>) -> Vec<DeviceRecord> {
    records.sort_by(|a, b| match (a.last_sign_in, b.last_sign_in) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.device_name.clone()))
        .collect()
}

/// Normalized identifiers of the compare dataset; blank identifiers never match
fn compare_device_keys(compare: &Dataset, device_col: usize) -> HashSet<String> {
    compare
        .rows
        .iter()
        .map(|row| device_key(row.get(device_col)))
        .filter(|key| !key.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_xlsxwriter::Workbook;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn text_dataset(source: &str, headers: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::new(
            source,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .enumerate()
                .map(|(i, cells)| Row::new(i, cells.iter().map(|c| CellValue::from_text(c)).collect()))
                .collect(),
        )
    }

    fn export_dataset(rows: &[&[&str]]) -> Dataset {
        text_dataset(
            "export.xlsx",
            &["DeviceName", "approximateLastSignInDateTime", "Owner"],
            rows,
        )
    }

    fn compare_dataset(names: &[&str]) -> Dataset {
        let rows: Vec<Vec<&str>> = names.iter().map(|n| vec![*n]).collect();
        let rows: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
        text_dataset("compare.xlsx", &["DeviceName"], &rows)
    }

    fn write_workbook(path: &Path, headers: &[&str], rows: &[&[&str]]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (r, cells) in rows.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                sheet.write_string(r as u32 + 1, col as u16, *cell).unwrap();
            }
        }
        workbook.save(path).unwrap();
    }

    fn use_case() -> (CompareExportUseCase, Arc<ActivityLog>) {
        let log = Arc::new(ActivityLog::in_memory());
        (
            CompareExportUseCase::new(CompareSettings::default(), log.clone()),
            log,
        )
    }

    #[test]
    fn test_latest_sign_in_wins_and_name_is_normalized() {
        let (use_case, _) = use_case();
        let export = export_dataset(&[
            &["PC-01", "2024-01-01", "alice"],
            &["pc-01 ", "2024-03-01", "bob"],
        ]);

        let result = use_case
            .match_devices(export, &compare_dataset(&["PC-01"]))
            .unwrap();

        assert_eq!(result.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.device_name, "pc-01");
        assert_eq!(record.last_sign_in, Some(day(2024, 3, 1)));
        assert_eq!(record.row.get(0), &CellValue::Text("pc-01".to_string()));
        // Other columns, including the raw sign-in text, are untouched
        assert_eq!(record.row.get(1), &CellValue::Text("2024-03-01".to_string()));
        assert_eq!(record.row.get(2), &CellValue::Text("bob".to_string()));
    }

    #[test]
    fn test_ties_keep_first_row_in_input_order() {
        let export = export_dataset(&[
            &["Desk-7", "2024-05-05", "first"],
            &["DESK-7", "2024-05-05", "second"],
            &["desk-7", "2024-01-01", "older"],
        ]);
        let records = to_device_records(Path::new("export.xlsx"), export.rows, 0, 1).unwrap();

        let latest = keep_latest_sign_in(records);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].row.get(2), &CellValue::Text("first".to_string()));
    }

    #[test]
    fn test_dedup_keeps_one_maximum_per_device() {
        let export = export_dataset(&[
            &["A", "2024-01-03", "a3"],
            &["B", "", "b-blank"],
            &["a", "2024-02-01", "a-max"],
            &["b", "2023-12-31", "b-max"],
            &[" A", "2023-06-01", "a-old"],
            &["C", "2024-01-15", "c"],
        ]);
        let records = to_device_records(Path::new("export.xlsx"), export.rows, 0, 1).unwrap();

        let latest = keep_latest_sign_in(records.clone());
        let names: Vec<_> = latest.iter().map(|r| r.device_name.as_str()).collect();
        // Newest first; undated rows only survive if nothing newer exists
        assert_eq!(names, vec!["a", "c", "b"]);

        for kept in &latest {
            let max = records
                .iter()
                .filter(|r| r.device_name == kept.device_name)
                .filter_map(|r| r.last_sign_in)
                .max();
            assert_eq!(kept.last_sign_in, max);
        }
    }

    #[test]
    fn test_matches_are_unique_subset_in_sign_in_order() {
        let (use_case, _) = use_case();
        let export = export_dataset(&[
            &["PC-1", "2024-01-01", ""],
            &["PC-2", "2024-04-01", ""],
            &["PC-3", "2024-03-01", ""],
            &["pc-2", "2024-02-01", ""],
            &["PC-4", "2024-05-01", ""],
        ]);
        let compare = compare_dataset(&["pc-3", " PC-2", "PC-1", "PC-9", "", "pc-1"]);

        let result = use_case.match_devices(export, &compare).unwrap();
        let names: Vec<_> = result.records.iter().map(|r| r.device_name.clone()).collect();
        assert_eq!(names, vec!["pc-2", "pc-3", "pc-1"]);

        let compare_keys = compare_device_keys(&compare, 0);
        let unique: HashSet<_> = names.iter().cloned().collect();
        assert_eq!(unique.len(), names.len());
        assert!(unique.is_subset(&compare_keys));
    }

    #[test]
    fn test_blank_identifiers_never_match() {
        let (use_case, _) = use_case();
        let export = export_dataset(&[&["", "2024-01-01", "ghost"]]);
        let result = use_case
            .match_devices(export, &compare_dataset(&["", "PC-1"]))
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let (use_case, _) = use_case();

        let export = text_dataset("export.xlsx", &["DeviceName"], &[&["PC-01"]]);
        let err = use_case
            .match_devices(export, &compare_dataset(&["PC-01"]))
            .unwrap_err();
        assert_eq!(
            err,
            CompareError::MissingColumn {
                path: PathBuf::from("export.xlsx"),
                column: "approximateLastSignInDateTime".to_string(),
            }
        );

        let compare = text_dataset("compare.xlsx", &["Hostname"], &[&["PC-01"]]);
        let err = use_case
            .match_devices(export_dataset(&[&["PC-01", "2024-01-01", ""]]), &compare)
            .unwrap_err();
        assert!(matches!(err, CompareError::MissingColumn { ref path, .. } if path == Path::new("compare.xlsx")));
    }

    #[test]
    fn test_unparsable_sign_in_fails_whole_run() {
        let (use_case, _) = use_case();
        let export = export_dataset(&[
            &["PC-01", "2024-01-01", ""],
            &["PC-02", "not a date", ""],
        ]);
        let err = use_case
            .match_devices(export, &compare_dataset(&["PC-01"]))
            .unwrap_err();
        assert_eq!(
            err,
            CompareError::TimestampParseFailure {
                path: PathBuf::from("export.xlsx"),
                row: 3,
                value: "not a date".to_string(),
            }
        );
    }

    #[test]
    fn test_execute_exports_matching_devices() {
        let dir = TempDir::new().unwrap();
        let export_path = dir.path().join("export.xlsx");
        let compare_path = dir.path().join("compare.xlsx");
        write_workbook(
            &export_path,
            &["DeviceName", "approximateLastSignInDateTime", "Owner"],
            &[
                &["PC-01", "2024-01-01", "alice"],
                &["pc-01 ", "2024-03-01", "bob"],
                &["PC-05", "2024-02-01", "carol"],
            ],
        );
        write_workbook(&compare_path, &["DeviceName"], &[&["PC-01"]]);

        let (use_case, log) = use_case();
        let outcome = use_case
            .execute(&export_path, &compare_path, dir.path())
            .unwrap();

        let output_path = dir.path().join("output.xlsx");
        assert_eq!(
            outcome,
            CompareOutcome::Exported {
                row_count: 1,
                output_path: output_path.clone(),
            }
        );

        let written = SpreadsheetReader::new().read(&output_path).unwrap();
        assert_eq!(
            written.headers,
            vec!["DeviceName", "approximateLastSignInDateTime", "Owner"]
        );
        assert_eq!(written.len(), 1);
        assert_eq!(written.rows[0].get(0).as_text(), "pc-01");
        assert_eq!(written.rows[0].get(1).as_text(), "2024-03-01");
        assert_eq!(written.rows[0].get(2).as_text(), "bob");

        let info = log.entries_at(LogLevel::Info);
        assert_eq!(info.first().unwrap().message, "Starting comparison process.");
        assert!(info.last().unwrap().message.starts_with("Comparison completed."));
        assert!(log.entries_at(LogLevel::Error).is_empty());
    }

    #[test]
    fn test_execute_overwrites_previous_output() {
        let dir = TempDir::new().unwrap();
        let export_path = dir.path().join("export.xlsx");
        let compare_path = dir.path().join("compare.xlsx");
        write_workbook(
            &export_path,
            &["DeviceName", "approximateLastSignInDateTime"],
            &[&["PC-01", "2024-01-01"], &["PC-02", "2024-01-02"]],
        );
        write_workbook(&compare_path, &["DeviceName"], &[&["PC-01"], &["PC-02"]]);
        std::fs::write(dir.path().join("output.xlsx"), b"stale").unwrap();

        let (use_case, _) = use_case();
        use_case
            .execute(&export_path, &compare_path, dir.path())
            .unwrap();

        let written = SpreadsheetReader::new()
            .read(&dir.path().join("output.xlsx"))
            .unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written.rows[0].get(0).as_text(), "pc-02");
    }

    #[test]
    fn test_execute_no_matches_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let export_path = dir.path().join("export.xlsx");
        let compare_path = dir.path().join("compare.xlsx");
        write_workbook(
            &export_path,
            &["DeviceName", "approximateLastSignInDateTime"],
            &[&["PC-02", "2024-01-01"]],
        );
        write_workbook(&compare_path, &["DeviceName"], &[&["PC-03"]]);

        let (use_case, log) = use_case();
        let outcome = use_case
            .execute(&export_path, &compare_path, dir.path())
            .unwrap();

        assert_eq!(outcome, CompareOutcome::NoMatches);
        assert!(!dir.path().join("output.xlsx").exists());
        let warnings = log.entries_at(LogLevel::Warning);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "No matching devices found.");
        assert!(log.entries_at(LogLevel::Error).is_empty());
    }

    #[test]
    fn test_execute_missing_sign_in_column_logs_one_error() {
        let dir = TempDir::new().unwrap();
        let export_path = dir.path().join("export.xlsx");
        let compare_path = dir.path().join("compare.xlsx");
        write_workbook(&export_path, &["DeviceName"], &[&["PC-01"]]);
        write_workbook(&compare_path, &["DeviceName"], &[&["PC-01"]]);

        let (use_case, log) = use_case();
        let err = use_case
            .execute(&export_path, &compare_path, dir.path())
            .unwrap_err();

        assert_eq!(
            err,
            CompareError::MissingColumn {
                path: export_path.clone(),
                column: "approximateLastSignInDateTime".to_string(),
            }
        );
        assert!(!dir.path().join("output.xlsx").exists());
        let errors = log.entries_at(LogLevel::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("approximateLastSignInDateTime"));
    }

    #[test]
    fn test_execute_unwritable_output_after_matching() {
        let dir = TempDir::new().unwrap();
        let export_path = dir.path().join("export.csv");
        let compare_path = dir.path().join("compare.csv");
        std::fs::write(
            &export_path,
            "DeviceName,approximateLastSignInDateTime\nPC-01,2024-01-01\n",
        )
        .unwrap();
        std::fs::write(&compare_path, "DeviceName\npc-01\n").unwrap();
        // A regular file cannot hold the output workbook
        let blocked = dir.path().join("not-a-folder");
        std::fs::write(&blocked, b"x").unwrap();

        let (use_case, log) = use_case();
        let err = use_case
            .execute(&export_path, &compare_path, &blocked)
            .unwrap_err();

        assert!(
            matches!(err, CompareError::OutputWriteFailure { ref path, .. } if *path == blocked.join("output.xlsx"))
        );
        // Matching ran before the write was attempted
        assert!(log
            .entries_at(LogLevel::Debug)
            .iter()
            .any(|e| e.message == "1 devices matched against 1 compare identifiers"));
        assert_eq!(log.entries_at(LogLevel::Error).len(), 1);
    }

    #[test]
    fn test_execute_save_failure_reports_output_path() {
        let dir = TempDir::new().unwrap();
        let export_path = dir.path().join("export.csv");
        let compare_path = dir.path().join("compare.csv");
        std::fs::write(
            &export_path,
            "DeviceName,approximateLastSignInDateTime\nPC-01,2024-01-01\n",
        )
        .unwrap();
        std::fs::write(&compare_path, "DeviceName\npc-01\n").unwrap();
        // The folder is valid, but a directory occupies the workbook's name
        let output_path = dir.path().join("output.xlsx");
        std::fs::create_dir(&output_path).unwrap();

        let (use_case, log) = use_case();
        let err = use_case
            .execute(&export_path, &compare_path, dir.path())
            .unwrap_err();

        assert!(
            matches!(err, CompareError::OutputWriteFailure { ref path, .. } if *path == output_path)
        );
        assert!(output_path.is_dir());
        assert!(log
            .entries_at(LogLevel::Debug)
            .iter()
            .any(|e| e.message == "1 devices matched against 1 compare identifiers"));
        let errors = log.entries_at(LogLevel::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("An error occurred: Cannot write"));
    }

    #[test]
    fn test_execute_reports_sheet_row_of_bad_sign_in() {
        let dir = TempDir::new().unwrap();
        let export_path = dir.path().join("export.xlsx");
        let compare_path = dir.path().join("compare.xlsx");

        // Header on sheet row 3, nothing above it
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 0, "DeviceName").unwrap();
        sheet.write_string(2, 1, "approximateLastSignInDateTime").unwrap();
        for (row, (name, signed_in)) in [("PC-01", "2024-01-01"), ("PC-02", "2024-01-02"), ("PC-03", "soon")]
            .iter()
            .enumerate()
        {
            sheet.write_string(row as u32 + 3, 0, *name).unwrap();
            sheet.write_string(row as u32 + 3, 1, *signed_in).unwrap();
        }
        workbook.save(&export_path).unwrap();
        write_workbook(&compare_path, &["DeviceName"], &[&["PC-01"]]);

        let (use_case, _) = use_case();
        let err = use_case
            .execute(&export_path, &compare_path, dir.path())
            .unwrap_err();

        assert_eq!(
            err,
            CompareError::TimestampParseFailure {
                path: export_path.clone(),
                row: 6,
                value: "soon".to_string(),
            }
        );
    }

    #[test]
    fn test_execute_unreadable_source() {
        let dir = TempDir::new().unwrap();
        let (use_case, log) = use_case();
        let missing = dir.path().join("export.xlsx");

        let err = use_case
            .execute(&missing, &dir.path().join("compare.xlsx"), dir.path())
            .unwrap_err();

        assert!(matches!(err, CompareError::SourceUnreadable { ref path, .. } if *path == missing));
        assert_eq!(log.entries_at(LogLevel::Error).len(), 1);
    }
}
