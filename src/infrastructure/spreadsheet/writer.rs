use std::path::Path;

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};

use crate::domain::dataset::{CellValue, Row};
use crate::domain::error::CompareError;

const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

// Largest magnitude an Excel number (f64) holds exactly
const MAX_EXACT_INT: u64 = 1 << 53;

/// Writes result tables as `.xlsx` workbooks
#[derive(Debug, Default, Clone)]
pub struct SpreadsheetWriter;

impl SpreadsheetWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write a header row plus `rows` to `path`, replacing any existing file
    pub fn write_xlsx<'a>(
        &self,
        path: &Path,
        headers: &[String],
        rows: impl IntoIterator<Item = &'a Row>,
    ) -> Result<usize, CompareError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let written = fill_worksheet(worksheet, headers, rows)
            .map_err(|e| CompareError::output_write_failure(path, e))?;

        workbook
            .save(path)
            .map_err(|e| CompareError::output_write_failure(path, e))?;

        tracing::debug!(path = %path.display(), rows = written, "Workbook saved");
        Ok(written)
    }
}

fn fill_worksheet<'a>(
    worksheet: &mut Worksheet,
    headers: &[String],
    rows: impl IntoIterator<Item = &'a Row>,
) -> Result<usize, XlsxError> {
    let header_format = Format::new().set_bold();
    let datetime_format = Format::new().set_num_format(DATETIME_NUM_FORMAT);

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col_num(col)?, header, &header_format)?;
    }

    let mut written = 0;
    for (offset, row) in rows.into_iter().enumerate() {
        let row_num = row_num(offset + 1)?;
        for (col, cell) in row.cells.iter().enumerate() {
            let col = col_num(col)?;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    worksheet.write_string(row_num, col, s)?;
                }
                CellValue::Int(i) if i.unsigned_abs() > MAX_EXACT_INT => {
                    worksheet.write_string(row_num, col, i.to_string())?;
                }
                CellValue::Int(i) => {
                    worksheet.write_number(row_num, col, *i as f64)?;
                }
                CellValue::Float(f) => {
                    worksheet.write_number(row_num, col, *f)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row_num, col, *b)?;
                }
                CellValue::DateTime(dt) => {
                    worksheet.write_datetime_with_format(row_num, col, dt, &datetime_format)?;
                }
            }
        }
        written += 1;
    }

    Ok(written)
}

fn row_num(index: usize) -> Result<RowNum, XlsxError> {
    RowNum::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}

fn col_num(index: usize) -> Result<ColNum, XlsxError> {
    ColNum::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}
