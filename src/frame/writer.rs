use crate::frame::error::FrameError;
use crate::utils::ensure_parent_dir;
use polars::prelude::*;
use std::path::Path;
use tempfile::NamedTempFile;

/// Permission bits of every written table.
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Writes `df` as CSV with a header row.
///
/// The file is first written to a temporary file in the destination
/// directory and then renamed over `path`, so readers never see a partially
/// written table.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), FrameError> {
    ensure_parent_dir(path).map_err(|e| FrameError::Io(path.to_path_buf(), e))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file =
        NamedTempFile::new_in(dir).map_err(|e| FrameError::Io(dir.to_path_buf(), e))?;
    CsvWriter::new(temp_file.as_file_mut())
        .include_header(true)
        .finish(df)
        .map_err(|e| FrameError::CsvWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    // Temporary files are created owner-only; published tables are not.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(OUTPUT_MODE))
            .map_err(|e| FrameError::Io(path.to_path_buf(), e))?;
    }
    temp_file
        .persist(path)
        .map_err(|e| FrameError::Persist(path.to_path_buf(), e))?;
    log::debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::reader::{read_csv, ColumnReader};

    #[test]
    fn writes_into_new_directory_and_replaces_existing() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("table.csv");

        let mut first = DataFrame::new(vec![Column::new("value".into(), vec![1.0f64, 2.0])])?;
        write_csv(&mut first, &path)?;

        let mut second = DataFrame::new(vec![Column::new("value".into(), vec![3.5f64])])?;
        write_csv(&mut second, &path)?;

        let df = read_csv(&path)?;
        let reader = ColumnReader::new(&df, &path);
        assert_eq!(reader.f64s("value")?, vec![Some(3.5)]);

        let leftovers = std::fs::read_dir(path.parent().unwrap())?.count();
        assert_eq!(leftovers, 1, "temporary files must not be left behind");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn written_tables_are_readable_by_others() -> Result<(), Box<dyn std::error::Error>> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("table.csv");
        let mut df = DataFrame::new(vec![Column::new("value".into(), vec![1.0f64])])?;
        write_csv(&mut df, &path)?;

        let mode = std::fs::metadata(&path)?.permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
        Ok(())
    }
}
