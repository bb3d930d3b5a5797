use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::device::CompareOutcome;
use crate::domain::error::{AppError, Result};
use crate::domain::log_entry::LogLevel;

use super::state::AppState;

const LOG_SOURCE: &str = "UI";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Export,
    Compare,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Export => f.write_str("Export"),
            SourceKind::Compare => f.write_str("Compare"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareRequest {
    pub export_path: PathBuf,
    pub compare_path: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

/// What the front end shows the user after a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    /// Failure label for error notifications, e.g. `missing_column`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Notification {
    pub fn from_result(result: &Result<CompareOutcome>) -> Self {
        match result {
            Ok(CompareOutcome::Exported {
                row_count,
                output_path,
            }) => Self {
                level: NotificationLevel::Success,
                title: "Success".to_string(),
                message: format!(
                    "Comparison completed and file saved at: {} ({} matching devices)",
                    output_path.display(),
                    row_count
                ),
                kind: None,
            },
            Ok(CompareOutcome::NoMatches) => Self {
                level: NotificationLevel::Warning,
                title: "Warning".to_string(),
                message: "No matching devices found.".to_string(),
                kind: None,
            },
            Err(err) => Self {
                level: NotificationLevel::Error,
                title: "Error".to_string(),
                message: format!("An error occurred: {}", err),
                kind: Some(err.kind().to_string()),
            },
        }
    }
}

pub fn select_source_file(state: &AppState, kind: SourceKind, path: &Path) {
    state.activity_log.add_log(
        LogLevel::Info,
        LOG_SOURCE,
        &format!("{} file uploaded: {}", kind, path.display()),
    );
}

pub fn select_output_folder(state: &AppState, path: &Path) {
    state.activity_log.add_log(
        LogLevel::Info,
        LOG_SOURCE,
        &format!("Output folder selected: {}", path.display()),
    );
}

/// Run the comparison on a blocking worker so the caller's event loop stays free
pub async fn compare_and_export(
    state: Arc<AppState>,
    request: CompareRequest,
) -> Result<CompareOutcome> {
    let use_case = state.compare_use_case.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        use_case.execute(
            &request.export_path,
            &request.compare_path,
            &request.output_dir,
        )
    })
    .await
    .map_err(|e| {
        error!(error = %e, "Comparison worker failed");
        AppError::Internal(format!("Comparison worker failed: {}", e))
    })??;
    Ok(outcome)
}

/// Current log text for display
pub fn read_logs(state: &AppState) -> Result<String> {
    state.activity_log.read_contents()
}
