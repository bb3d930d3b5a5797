// ============================================================
// CSV READER
// ============================================================
// Parse CSV exports with encoding and delimiter detection

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::domain::dataset::{CellValue, Dataset, Row};
use crate::domain::error::CompareError;

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// CSV reader for device exports; the delimiter is detected per file
#[derive(Debug, Default, Clone)]
pub struct CsvReader;

impl CsvReader {
    pub fn new() -> Self {
        Self
    }

    /// Read a CSV file into a dataset
    pub fn read_file(&self, path: &Path) -> Result<Dataset, CompareError> {
        let bytes = std::fs::read(path)
            .map_err(|e| CompareError::source_unreadable(path, format!("failed to read file: {}", e)))?;
        let content = decode(&bytes);
        self.parse_content(path, &content)
    }

    /// Parse CSV text; values are kept verbatim, including surrounding whitespace
    pub fn parse_content(&self, path: &Path, content: &str) -> Result<Dataset, CompareError> {
        let delimiter = Self::detect_delimiter(content);

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(Trim::None)
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| CompareError::source_unreadable(path, format!("failed to read CSV headers: {}", e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                CompareError::source_unreadable(path, format!("failed to parse CSV row {}: {}", index + 2, e))
            })?;
            let cells: Vec<CellValue> = record.iter().map(CellValue::from_text).collect();
            if cells.iter().all(CellValue::is_empty) {
                continue;
            }
            rows.push(Row::new(index, cells));
        }

        Ok(Dataset::new(path, headers, rows))
    }

    /// Pick the delimiter found on every sampled line, preferring the one
    /// with the most splits and then the steadiest count. Defaults to comma.
    pub fn detect_delimiter(content: &str) -> u8 {
        let sample: Vec<&str> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .take(10)
            .collect();

        let mut best = b',';
        let mut best_rank = (0usize, 0usize);
        for delimiter in DELIMITERS {
            let counts = sample
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count());
            let (fewest, most) = counts.fold((usize::MAX, 0), |(lo, hi), n| (lo.min(n), hi.max(n)));
            if fewest == 0 || fewest == usize::MAX {
                continue;
            }

            // Higher minimum wins; on a tie, the narrower spread
            let rank = (fewest, usize::MAX - (most - fewest));
            if rank > best_rank {
                best_rank = rank;
                best = delimiter;
            }
        }

        best
    }
}

/// Decode file bytes: BOM first, then UTF-8, falling back to Windows-1252
fn decode(bytes: &[u8]) -> String {
    let (encoding, bom_len) = Encoding::for_bom(bytes).unwrap_or((UTF_8, 0));
    let body = &bytes[bom_len..];

    if encoding == UTF_8 {
        if let Ok(text) = std::str::from_utf8(body) {
            return text.to_string();
        }
        let (text, _) = WINDOWS_1252.decode_without_bom_handling(body);
        return text.into_owned();
    }

    let (text, _) = encoding.decode_without_bom_handling(body);
    text.into_owned()
}
