//! Step table (`result.csv`) loading.
//!
//! Epistemic foundation:
//! - K_i: Row count defines the episode length
//! - B_i: Required columns exist → resolved only when rows exist
//! - B_i: Cells parse as numbers → Result

use crate::models::{ConvertError, Result};
use csv::{ReaderBuilder, StringRecord};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parsed step table with a header row.
#[derive(Debug, Clone, Default)]
pub struct StepTable {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl StepTable {
    /// Table with no rows (used when the file is absent).
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Default::default()
        }
    }

    /// Load a table from disk. A zero-byte or header-only file has no rows.
    pub fn load(path: &Path) -> Result<Self> {
        let table_err = |e| ConvertError::Table {
            path: path.to_path_buf(),
            source: e,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(table_err)?;

        let headers = reader
            .headers()
            .map_err(table_err)?
            .iter()
            .map(str::to_string)
            .collect();

        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(table_err)?;

        debug!(path = %path.display(), rows = rows.len(), "Loaded step table");
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    /// Load when the file exists, otherwise an empty table.
    pub fn load_optional(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::empty(path))
        }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Resolve column names to positions.
    pub fn resolve<const N: usize>(&self, columns: &[String; N]) -> Result<[usize; N]> {
        let mut positions = [0usize; N];
        for (slot, column) in positions.iter_mut().zip(columns) {
            *slot = self
                .headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| ConvertError::MissingColumn {
                    path: self.path.clone(),
                    column: column.clone(),
                })?;
        }
        Ok(positions)
    }

    /// Read the resolved columns of one row as `f32`.
    ///
    /// Values are parsed as `f64` first, then narrowed.
    pub fn row_values<const N: usize>(&self, row: usize, positions: &[usize; N]) -> Result<[f32; N]> {
        let record = self.rows.get(row).ok_or_else(|| {
            ConvertError::Internal(format!("row {row} out of range ({} rows)", self.rows.len()))
        })?;

        let mut values = [0f32; N];
        for (value, &pos) in values.iter_mut().zip(positions) {
            // Short rows are padded with blanks
            let raw = record.get(pos).unwrap_or("");
            *value = parse_cell(raw).ok_or_else(|| ConvertError::InvalidCell {
                path: self.path.clone(),
                row,
                column: self.headers[pos].clone(),
                value: raw.to_string(),
            })? as f32;
        }
        Ok(values)
    }
}

/// Missing-value markers read as NaN, matching the default NA set of `pandas.read_csv`.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Parse one numeric cell the way the recorder's tables are usually read:
/// NA markers are NaN and boolean literals are 1/0.
fn parse_cell(raw: &str) -> Option<f64> {
    match raw.trim() {
        na if NA_TOKENS.contains(&na) => Some(f64::NAN),
        "True" | "true" | "TRUE" => Some(1.0),
        "False" | "false" | "FALSE" => Some(0.0),
        other => other.parse::<f64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn cols(names: [&str; 2]) -> [String; 2] {
        names.map(String::from)
    }

    #[test]
    fn test_load_and_read_columns_by_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result.csv");
        fs::write(&path, "t,b,a\n0,2.5,1\n1,-0.125,True\n").unwrap();

        let table = StepTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);

        let positions = table.resolve(&cols(["a", "b"])).unwrap();
        assert_eq!(positions, [2, 1]);
        assert_eq!(table.row_values(0, &positions).unwrap(), [1.0, 2.5]);
        assert_eq!(table.row_values(1, &positions).unwrap(), [1.0, -0.125]);
    }

    #[test]
    fn test_values_round_through_f64() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result.csv");
        fs::write(&path, "x\n0.1\n").unwrap();

        let table = StepTable::load(&path).unwrap();
        let [x] = table.row_values(0, &[0]).unwrap();
        assert_eq!(x.to_bits(), (0.1f64 as f32).to_bits());
    }

    #[test]
    fn test_empty_and_header_only_files_have_no_rows() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.csv");
        fs::write(&empty, "").unwrap();
        assert!(StepTable::load(&empty).unwrap().is_empty());

        let header_only = dir.path().join("header.csv");
        fs::write(&header_only, "a,b\n").unwrap();
        let table = StepTable::load(&header_only).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers(), &["a".to_string(), "b".to_string()]);

        let absent = StepTable::load_optional(&dir.path().join("missing.csv")).unwrap();
        assert!(absent.is_empty());
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result.csv");
        fs::write(&path, "a\n1\n").unwrap();

        let table = StepTable::load(&path).unwrap();
        let err = table.resolve(&cols(["a", "nope"])).unwrap_err();
        assert!(matches!(err, ConvertError::MissingColumn { ref column, .. } if column == "nope"));
    }

    #[test]
    fn test_blank_cell_is_nan_and_garbage_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result.csv");
        fs::write(&path, "a,b\n,oops\n").unwrap();

        let table = StepTable::load(&path).unwrap();
        assert!(table.row_values(0, &[0]).unwrap()[0].is_nan());
        assert!(matches!(
            table.row_values(0, &[1]),
            Err(ConvertError::InvalidCell { row: 0, .. })
        ));
    }

    #[test]
    fn test_na_markers_are_nan() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result.csv");
        let mut content = String::from("a\n");
        for token in NA_TOKENS.iter().filter(|t| !t.is_empty()) {
            content.push_str(token);
            content.push('\n');
        }
        fs::write(&path, content).unwrap();

        let table = StepTable::load(&path).unwrap();
        assert_eq!(table.len(), NA_TOKENS.len() - 1);
        for row in 0..table.len() {
            assert!(table.row_values(row, &[0]).unwrap()[0].is_nan(), "row {row}");
        }
    }

    #[test]
    fn test_na_lookalikes_still_fail() {
        assert!(parse_cell("NAN!").is_none());
        assert!(parse_cell("n.a.").is_none());
        assert_eq!(parse_cell(" 2.5 "), Some(2.5));
    }
}
