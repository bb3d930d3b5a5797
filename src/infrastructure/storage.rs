use std::path::{Path, PathBuf};

use crate::domain::error::CompareError;

/// Path of the result file inside the chosen output folder.
///
/// The folder must already exist; it is never created on the user's behalf.
pub fn resolve_output_path(output_dir: &Path, file_name: &str) -> Result<PathBuf, CompareError> {
    let output_path = output_dir.join(file_name);
    if !output_dir.is_dir() {
        return Err(CompareError::output_write_failure(
            output_path,
            format!("output folder {} is not a directory", output_dir.display()),
        ));
    }
    Ok(output_path)
}
