// ============================================================
// SPREADSHEET INFRASTRUCTURE LAYER
// ============================================================
// Load workbooks / CSV files into datasets and write xlsx results

mod csv_reader;
mod workbook_reader;
mod writer;

use std::path::Path;

pub use csv_reader::CsvReader;
pub use writer::SpreadsheetWriter;

use crate::domain::dataset::Dataset;
use crate::domain::error::CompareError;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Loads a tabular file, choosing the parser from the file extension
#[derive(Debug, Default, Clone)]
pub struct SpreadsheetReader {
    sheet_name: Option<String>,
}

impl SpreadsheetReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the named worksheet instead of the first one
    pub fn with_sheet(mut self, sheet_name: Option<String>) -> Self {
        self.sheet_name = sheet_name;
        self
    }

    pub fn read(&self, path: &Path) -> Result<Dataset, CompareError> {
        if !path.is_file() {
            return Err(CompareError::source_unreadable(path, "file does not exist"));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if extension == "csv" {
            CsvReader::new().read_file(path)
        } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            workbook_reader::read_workbook(path, self.sheet_name.as_deref())
        } else {
            Err(CompareError::source_unreadable(
                path,
                format!("unsupported file type '.{}'", extension),
            ))
        }
    }
}
