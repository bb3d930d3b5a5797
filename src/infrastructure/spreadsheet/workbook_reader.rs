use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};

use crate::domain::dataset::{CellValue, Dataset, Row};
use crate::domain::error::CompareError;

/// Read one worksheet of an Excel/ODS workbook; the first row is the header
pub(super) fn read_workbook(path: &Path, sheet_name: Option<&str>) -> Result<Dataset, CompareError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        tracing::debug!(path = %path.display(), error = %e, "Failed to open workbook");
        CompareError::source_unreadable(path, format!("failed to open workbook: {}", e))
    })?;

    let range = match sheet_name {
        Some(name) => workbook.worksheet_range(name).map_err(|e| {
            CompareError::source_unreadable(path, format!("failed to read sheet '{}': {}", name, e))
        })?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| CompareError::source_unreadable(path, "no worksheet found"))?
            .map_err(|e| {
                CompareError::source_unreadable(path, format!("failed to read worksheet: {}", e))
            })?,
    };

    Ok(range_to_dataset(path, &range))
}

fn range_to_dataset(path: &Path, range: &Range<Data>) -> Dataset {
    // The used range may start below row 1; row indexes stay sheet-relative
    let header_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut sheet_rows = range.rows();

    let headers = sheet_rows
        .next()
        .map(|row| row.iter().map(|cell| cell.to_string().trim().to_string()).collect())
        .unwrap_or_default();

    let rows = sheet_rows
        .enumerate()
        .map(|(offset, row)| Row::new(header_row + offset, row.iter().map(to_cell_value).collect()))
        .filter(|row| !row.cells.iter().all(CellValue::is_empty))
        .collect();

    Dataset::new(path, headers, rows)
}

fn to_cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from_text(s),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Text(cell.to_string()),
        },
        other => CellValue::Text(other.to_string()),
    }
}
