//! Conversions between typed records and DataFrames.

use crate::frame::error::FrameError;
use crate::frame::reader::{read_csv, ColumnReader};
use crate::frame::writer::write_csv;
use crate::frame::{DATE_FORMAT, FEATURE_COLUMNS};
use crate::types::observation::ObservationRecord;
use crate::types::processed::ProcessedRecord;
use polars::prelude::*;
use std::path::Path;

fn observation_columns(records: &[&ObservationRecord]) -> Vec<Column> {
    let f64_column = |name: &str, get: fn(&ObservationRecord) -> Option<f64>| {
        Column::new(
            name.into(),
            records.iter().map(|r| get(r)).collect::<Vec<Option<f64>>>(),
        )
    };
    vec![
        Column::new(
            "date".into(),
            records
                .iter()
                .map(|r| r.date.format(DATE_FORMAT).to_string())
                .collect::<Vec<String>>(),
        ),
        f64_column("tmin", |r| r.tmin),
        f64_column("tmax", |r| r.tmax),
        f64_column("tavg", |r| r.tavg),
        f64_column("precip", |r| r.precip),
        f64_column("wind_max", |r| r.wind_max),
        Column::new(
            "location".into(),
            records
                .iter()
                .map(|r| r.location.clone())
                .collect::<Vec<Option<String>>>(),
        ),
        f64_column("lat", |r| r.lat),
        f64_column("lon", |r| r.lon),
    ]
}

/// Builds a DataFrame with the raw observation columns.
pub fn observations_to_frame(records: &[ObservationRecord]) -> PolarsResult<DataFrame> {
    let refs: Vec<&ObservationRecord> = records.iter().collect();
    DataFrame::new(observation_columns(&refs))
}

/// Builds a DataFrame with the observation columns followed by every feature column.
pub fn processed_to_frame(records: &[ProcessedRecord]) -> PolarsResult<DataFrame> {
    let observations: Vec<&ObservationRecord> = records.iter().map(|r| &r.observation).collect();
    let mut columns = observation_columns(&observations);

    let f64_column = |name: &str, get: fn(&ProcessedRecord) -> Option<f64>| {
        Column::new(
            name.into(),
            records.iter().map(get).collect::<Vec<Option<f64>>>(),
        )
    };
    let flag_column = |name: &str, get: fn(&ProcessedRecord) -> bool| {
        Column::new(
            name.into(),
            records
                .iter()
                .map(|r| get(r) as i32)
                .collect::<Vec<i32>>(),
        )
    };
    columns.extend([
        Column::new(
            "dow".into(),
            records.iter().map(|r| r.dow).collect::<Vec<u32>>(),
        ),
        Column::new(
            "month".into(),
            records.iter().map(|r| r.month).collect::<Vec<u32>>(),
        ),
        flag_column("is_weekend", |r| r.is_weekend),
        f64_column("tavg_lag_1", |r| r.tavg_lag_1),
        f64_column("tavg_lag_7", |r| r.tavg_lag_7),
        f64_column("tavg_lag_14", |r| r.tavg_lag_14),
        f64_column("tavg_roll_mean_7", |r| r.tavg_roll_mean_7),
        f64_column("tavg_roll_std_7", |r| r.tavg_roll_std_7),
        f64_column("tavg_roll_mean_30", |r| r.tavg_roll_mean_30),
        flag_column("is_test", |r| r.is_test),
    ]);
    DataFrame::new(columns)
}

fn observations_from_reader(reader: &ColumnReader) -> Result<Vec<ObservationRecord>, FrameError> {
    let dates = reader.dates("date")?;
    let tmin = reader.optional_f64s("tmin")?;
    let tmax = reader.optional_f64s("tmax")?;
    let tavg_present = reader.has_column("tavg");
    let tavg = if tavg_present || !(reader.has_column("tmin") && reader.has_column("tmax")) {
        // Reports the missing `tavg` column when neither source of it exists.
        reader.f64s("tavg")?
    } else {
        vec![None; reader.height()]
    };
    let precip = reader.optional_f64s("precip")?;
    let wind_max = reader.optional_f64s("wind_max")?;
    let location = reader.optional_strings("location")?;
    let lat = reader.optional_f64s("lat")?;
    let lon = reader.optional_f64s("lon")?;

    let records = dates
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let mut record = ObservationRecord {
                date,
                tmin: tmin[i],
                tmax: tmax[i],
                tavg: tavg[i],
                precip: precip[i],
                wind_max: wind_max[i],
                location: location[i].clone(),
                lat: lat[i],
                lon: lon[i],
            };
            if !tavg_present {
                record.tavg = record.tavg_or_midpoint();
            }
            record
        })
        .collect();
    Ok(records)
}

/// Reads a raw observation file.
///
/// Only `date` is strictly required. `tavg` may be absent when both `tmin`
/// and `tmax` are present, in which case it is derived as their midpoint.
/// Any extra columns (for example derived features of a processed file) are
/// ignored. Rows keep file order.
pub fn read_observations(path: &Path) -> Result<Vec<ObservationRecord>, FrameError> {
    let df = read_csv(path)?;
    observations_from_frame(&df, path)
}

/// Converts an already loaded frame; `source` only labels errors.
pub fn observations_from_frame(
    df: &DataFrame,
    source: &Path,
) -> Result<Vec<ObservationRecord>, FrameError> {
    let reader = ColumnReader::new(df, source);
    observations_from_reader(&reader)
}

/// Reads a processed file; every feature column must be present.
pub fn read_processed(path: &Path) -> Result<Vec<ProcessedRecord>, FrameError> {
    let df = read_csv(path)?;
    let reader = ColumnReader::new(&df, path);
    for column in FEATURE_COLUMNS {
        if !reader.has_column(column) {
            return Err(FrameError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
    }

    let observations = observations_from_reader(&reader)?;
    let dow = reader.f64s("dow")?;
    let month = reader.f64s("month")?;
    let is_weekend = reader.flags("is_weekend")?;
    let lag_1 = reader.f64s("tavg_lag_1")?;
    let lag_7 = reader.f64s("tavg_lag_7")?;
    let lag_14 = reader.f64s("tavg_lag_14")?;
    let roll_mean_7 = reader.f64s("tavg_roll_mean_7")?;
    let roll_std_7 = reader.f64s("tavg_roll_std_7")?;
    let roll_mean_30 = reader.f64s("tavg_roll_mean_30")?;
    let is_test = reader.flags("is_test")?;

    Ok(observations
        .into_iter()
        .enumerate()
        .map(|(i, observation)| ProcessedRecord {
            observation,
            dow: dow[i].unwrap_or_default() as u32,
            month: month[i].unwrap_or_default() as u32,
            is_weekend: is_weekend[i],
            tavg_lag_1: lag_1[i],
            tavg_lag_7: lag_7[i],
            tavg_lag_14: lag_14[i],
            tavg_roll_mean_7: roll_mean_7[i],
            tavg_roll_std_7: roll_std_7[i],
            tavg_roll_mean_30: roll_mean_30[i],
            is_test: is_test[i],
        })
        .collect())
}

pub fn write_observations(records: &[ObservationRecord], path: &Path) -> Result<(), FrameError> {
    let mut df = observations_to_frame(records)?;
    write_csv(&mut df, path)
}

pub fn write_processed(records: &[ProcessedRecord], path: &Path) -> Result<(), FrameError> {
    let mut df = processed_to_frame(records)?;
    write_csv(&mut df, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::OBSERVATION_COLUMNS;
    use chrono::NaiveDate;

    fn sample(day: u32, tavg: Option<f64>) -> ObservationRecord {
        ObservationRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            tmin: Some(1.0),
            tmax: Some(9.0),
            tavg,
            precip: Some(0.2),
            wind_max: None,
            location: Some("Austin,US".to_string()),
            lat: Some(30.27),
            lon: Some(-97.74),
        }
    }

    #[test]
    fn observation_frame_has_expected_schema() -> PolarsResult<()> {
        let df = observations_to_frame(&[sample(1, Some(4.0)), sample(2, None)])?;
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, OBSERVATION_COLUMNS);
        assert_eq!(df.height(), 2);
        Ok(())
    }

    #[test]
    fn observations_survive_a_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("raw.csv");
        let records = vec![sample(1, Some(4.25)), sample(2, None), sample(3, Some(-2.5))];
        write_observations(&records, &path)?;
        assert_eq!(read_observations(&path)?, records);
        Ok(())
    }

    #[test]
    fn tavg_is_derived_when_column_absent() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("raw.csv");
        std::fs::write(&path, "date,tmin,tmax\n2024-01-01,0.0,10.0\n2024-01-02,,4.0\n")?;
        let records = read_observations(&path)?;
        assert_eq!(records[0].tavg, Some(5.0));
        assert_eq!(records[1].tavg, None);

        std::fs::write(&path, "date,tmin\n2024-01-01,0.0\n")?;
        assert!(matches!(
            read_observations(&path),
            Err(FrameError::MissingColumn { column, .. }) if column == "tavg"
        ));
        Ok(())
    }

    #[test]
    fn processed_file_requires_features() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("raw.csv");
        write_observations(&[sample(1, Some(4.0))], &path)?;
        assert!(matches!(
            read_processed(&path),
            Err(FrameError::MissingColumn { column, .. }) if column == "dow"
        ));
        Ok(())
    }
}
