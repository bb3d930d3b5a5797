use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::device::CompareOutcome;
use crate::domain::error::{AppError, Result};

use super::commands::{
    compare_and_export, read_logs, select_output_folder, select_source_file, CompareRequest,
    Notification, NotificationLevel, SourceKind,
};
use super::state::AppState;

pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_NO_MATCH: i32 = 3;

pub const HELP_TEXT: &str = "\
Device Compare and Export Tool

Compares two device inventory spreadsheets and exports the devices that
appear in both. When a device is listed more than once in the export file,
only its most recent sign-in is kept.

Usage:
  device-compare <EXPORT_FILE> <COMPARE_FILE> <OUTPUT_FOLDER> [--json]
  device-compare --logs
  device-compare --help | --version

Instructions:
  1. Select the export file (needs DeviceName and approximateLastSignInDateTime).
  2. Select the compare file (needs DeviceName).
  3. Choose an output folder; the result is saved there as output.xlsx.

Supported inputs: .xlsx .xlsm .xlsb .xls .ods .csv
Settings are read from device-compare.toml and DEVICE_COMPARE_* variables.
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Compare { request: CompareRequest, json: bool },
    ShowLogs,
    Help,
    Version,
}

pub fn parse_args<I, S>(args: I) -> Result<CliCommand>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut json = false;
    let mut positional = Vec::new();

    for arg in args.into_iter().map(Into::into) {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "-V" | "--version" => return Ok(CliCommand::Version),
            "--logs" => return Ok(CliCommand::ShowLogs),
            "--json" => json = true,
            flag if flag.starts_with("--") => {
                return Err(AppError::ValidationError(format!("Unknown option: {}", flag)))
            }
            other => positional.push(PathBuf::from(other)),
        }
    }

    match <[PathBuf; 3]>::try_from(positional) {
        Ok([export_path, compare_path, output_dir]) => Ok(CliCommand::Compare {
            request: CompareRequest {
                export_path,
                compare_path,
                output_dir,
            },
            json,
        }),
        Err(positional) => Err(AppError::ValidationError(format!(
            "Expected <EXPORT_FILE> <COMPARE_FILE> <OUTPUT_FOLDER>, got {} argument(s)",
            positional.len()
        ))),
    }
}

/// Execute a parsed command and return the process exit status
pub async fn execute(state: Arc<AppState>, command: CliCommand) -> i32 {
    match command {
        CliCommand::Help => {
            print!("{}", HELP_TEXT);
            EXIT_OK
        }
        CliCommand::Version => {
            println!("device-compare {}", env!("CARGO_PKG_VERSION"));
            EXIT_OK
        }
        CliCommand::ShowLogs => match read_logs(&state) {
            Ok(contents) => {
                print!("{}", contents);
                EXIT_OK
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                EXIT_ERROR
            }
        },
        CliCommand::Compare { request, json } => {
            select_source_file(&state, SourceKind::Export, &request.export_path);
            select_source_file(&state, SourceKind::Compare, &request.compare_path);
            select_output_folder(&state, &request.output_dir);

            let result = compare_and_export(state.clone(), request).await;
            let notification = Notification::from_result(&result);

            if json {
                print_json(&result, &notification);
            } else {
                match notification.level {
                    NotificationLevel::Success => println!("{}: {}", notification.title, notification.message),
                    _ => eprintln!("{}: {}", notification.title, notification.message),
                }
            }

            exit_code(&result, state.config.no_match_is_error)
        }
    }
}

fn print_json(result: &Result<CompareOutcome>, notification: &Notification) {
    let body = match result {
        Ok(outcome) => serde_json::json!({ "outcome": outcome, "notification": notification }),
        Err(err) => serde_json::json!({ "error": err, "notification": notification }),
    };
    match serde_json::to_string_pretty(&body) {
        Ok(text) => println!("{}", text),
        Err(err) => eprintln!("Error: failed to render JSON: {}", err),
    }
}

pub fn exit_code(result: &Result<CompareOutcome>, no_match_is_error: bool) -> i32 {
    match result {
        Ok(CompareOutcome::Exported { .. }) => EXIT_OK,
        Ok(CompareOutcome::NoMatches) if no_match_is_error => EXIT_NO_MATCH,
        Ok(CompareOutcome::NoMatches) => EXIT_OK,
        Err(_) => EXIT_ERROR,
    }
}
