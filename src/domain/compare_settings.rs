// ============================================================
// COMPARISON SETTINGS
// ============================================================
// Column names and output naming used by a comparison run

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const DEFAULT_DEVICE_COLUMN: &str = "DeviceName";
pub const DEFAULT_SIGN_IN_COLUMN: &str = "approximateLastSignInDateTime";
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "output.xlsx";

/// Settings for a comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CompareSettings {
    /// Identifier column present in both spreadsheets (default: DeviceName)
    #[validate(length(min = 1))]
    pub device_column: String,

    /// Sign-in column of the export spreadsheet (default: approximateLastSignInDateTime)
    #[validate(length(min = 1))]
    pub sign_in_column: String,

    /// File written inside the output directory (default: output.xlsx)
    #[validate(custom(function = "validate_output_file_name"))]
    pub output_file_name: String,

    /// Worksheet to read; the first sheet when unset
    #[validate(length(min = 1))]
    pub sheet_name: Option<String>,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            device_column: DEFAULT_DEVICE_COLUMN.to_string(),
            sign_in_column: DEFAULT_SIGN_IN_COLUMN.to_string(),
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            sheet_name: None,
        }
    }
}

fn validate_output_file_name(name: &str) -> Result<(), ValidationError> {
    if name.contains('/') || name.contains('\\') {
        return Err(ValidationError::new("output_file_name_has_separator"));
    }
    let stem_present = name.len() > ".xlsx".len();
    if !stem_present || !name.to_ascii_lowercase().ends_with(".xlsx") {
        return Err(ValidationError::new("output_file_name_not_xlsx"));
    }
    Ok(())
}
