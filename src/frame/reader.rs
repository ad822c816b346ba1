use crate::frame::error::FrameError;
use crate::frame::DATE_FORMAT;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Reads a CSV file with a header row into a DataFrame.
///
/// Every column type is inferred from the whole file. Dates are left as
/// strings and parsed by [`ColumnReader::dates`].
pub fn read_csv(path: &Path) -> Result<DataFrame, FrameError> {
    if !path.is_file() {
        return Err(FrameError::MissingFile(path.to_path_buf()));
    }
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| FrameError::CsvRead {
            path: path.to_path_buf(),
            source: e,
        })?
        .finish()
        .map_err(|e| FrameError::CsvRead {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Typed access to the columns of a DataFrame read from `path`.
///
/// Errors name the file, column and row, which is what a user needs to fix a
/// hand-edited or truncated input.
pub struct ColumnReader<'a> {
    frame: &'a DataFrame,
    path: PathBuf,
}

impl<'a> ColumnReader<'a> {
    pub fn new(frame: &'a DataFrame, path: &Path) -> Self {
        Self {
            frame,
            path: path.to_path_buf(),
        }
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    fn column(&self, name: &str) -> Result<&'a Column, FrameError> {
        self.frame
            .column(name)
            .map_err(|_| FrameError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }

    /// Parses the column as ISO dates. Empty cells are an error.
    pub fn dates(&self, name: &str) -> Result<Vec<NaiveDate>, FrameError> {
        let raw = self.column(name)?.cast(&DataType::String)?;
        raw.str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                let value = value.ok_or_else(|| FrameError::MissingDate {
                    path: self.path.clone(),
                    row,
                })?;
                parse_date(value).ok_or_else(|| FrameError::InvalidDate {
                    path: self.path.clone(),
                    row,
                    value: value.to_string(),
                })
            })
            .collect()
    }

    /// Reads a numeric column as `f64`, keeping empty cells as `None`.
    pub fn f64s(&self, name: &str) -> Result<Vec<Option<f64>>, FrameError> {
        let column = self.column(name)?;
        let cast = column.cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = cast.f64()?.into_iter().collect();

        // A non-strict cast turns unparseable text into nulls; report the first one.
        if cast.null_count() > column.null_count() {
            let raw = column.cast(&DataType::String)?;
            let offending = raw
                .str()?
                .into_iter()
                .zip(values.iter())
                .enumerate()
                .find_map(|(row, (text, value))| match (text, value) {
                    (Some(text), None) => Some((row, text.to_string())),
                    _ => None,
                });
            if let Some((row, value)) = offending {
                return Err(FrameError::InvalidNumber {
                    path: self.path.clone(),
                    column: name.to_string(),
                    row,
                    value,
                });
            }
        }
        Ok(values)
    }

    /// Like [`Self::f64s`], but an absent column reads as all `None`.
    pub fn optional_f64s(&self, name: &str) -> Result<Vec<Option<f64>>, FrameError> {
        if self.has_column(name) {
            self.f64s(name)
        } else {
            Ok(vec![None; self.height()])
        }
    }

    /// Reads a 0/1 flag column. Empty cells read as `false`.
    pub fn flags(&self, name: &str) -> Result<Vec<bool>, FrameError> {
        Ok(self
            .f64s(name)?
            .into_iter()
            .map(|v| v.is_some_and(|v| v != 0.0))
            .collect())
    }

    /// Reads a text column; an absent column reads as all `None`.
    pub fn optional_strings(&self, name: &str) -> Result<Vec<Option<String>>, FrameError> {
        if !self.has_column(name) {
            return Ok(vec![None; self.height()]);
        }
        let raw = self.column(name)?.cast(&DataType::String)?;
        Ok(raw
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    /// Reads a required text column. Empty cells read as empty strings.
    pub fn strings(&self, name: &str) -> Result<Vec<String>, FrameError> {
        let raw = self.column(name)?.cast(&DataType::String)?;
        Ok(raw
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect())
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a midnight time component as
/// written by some spreadsheet and dataframe tools.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_dates_in_supported_forms() {
        let expected = NaiveDate::from_ymd_opt(2023, 7, 15);
        assert_eq!(parse_date("2023-07-15"), expected);
        assert_eq!(parse_date(" 2023-07-15 "), expected);
        assert_eq!(parse_date("2023-07-15 00:00:00"), expected);
        assert_eq!(parse_date("2023-07-15T00:00:00"), expected);
        assert_eq!(parse_date("15/07/2023"), None);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_csv(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, FrameError::MissingFile(_)));
    }

    #[test]
    fn reads_numeric_and_text_columns() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = write_file(
            dir.path(),
            "in.csv",
            "date,tavg,location\n2024-01-01,1.5,\"Austin,US\"\n2024-01-02,,\"Austin,US\"\n",
        );
        let df = read_csv(&path)?;
        let reader = ColumnReader::new(&df, &path);
        assert_eq!(reader.dates("date")?.len(), 2);
        assert_eq!(reader.f64s("tavg")?, vec![Some(1.5), None]);
        assert_eq!(
            reader.optional_strings("location")?,
            vec![Some("Austin,US".to_string()), Some("Austin,US".to_string())]
        );
        assert_eq!(reader.optional_f64s("precip")?, vec![None, None]);
        assert!(matches!(
            reader.f64s("precip"),
            Err(FrameError::MissingColumn { .. })
        ));
        Ok(())
    }

    #[test]
    fn reports_first_non_numeric_cell() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = write_file(
            dir.path(),
            "bad.csv",
            "date,tavg\n2024-01-01,1.5\n2024-01-02,warm\n",
        );
        let df = read_csv(&path)?;
        let reader = ColumnReader::new(&df, &path);
        match reader.f64s("tavg") {
            Err(FrameError::InvalidNumber { row, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "warm");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn reports_invalid_date() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = write_file(dir.path(), "bad.csv", "date,tavg\n2024-13-01,1.5\n");
        let df = read_csv(&path)?;
        let reader = ColumnReader::new(&df, &path);
        assert!(matches!(
            reader.dates("date"),
            Err(FrameError::InvalidDate { row: 0, .. })
        ));
        Ok(())
    }
}
