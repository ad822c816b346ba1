//! Reindexing to a fixed daily frequency and gap filling.

use crate::preprocess::error::PreprocessError;
use crate::types::date_span::DateSpan;
use crate::types::observation::ObservationRecord;
use std::collections::BTreeMap;

/// Sorts `records` and inserts an empty record for every missing day between
/// the first and the last date.
pub fn reindex_daily(
    records: Vec<ObservationRecord>,
) -> Result<Vec<ObservationRecord>, PreprocessError> {
    let mut by_date = BTreeMap::new();
    for record in records {
        let date = record.date;
        if by_date.insert(date, record).is_some() {
            return Err(PreprocessError::DuplicateDate(date));
        }
    }
    let (first, last) = match (by_date.keys().next(), by_date.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(PreprocessError::EmptyInput),
    };
    let span = DateSpan::new(first, last).ok_or(PreprocessError::EmptyInput)?;

    Ok(span
        .days()
        .map(|day| {
            by_date
                .remove(&day)
                .unwrap_or_else(|| ObservationRecord::empty(day))
        })
        .collect())
}

/// Linearly interpolates every interior run of `None` that is at most
/// `max_gap` long. Longer runs, and runs touching either end, are left alone.
/// Returns how many values were filled.
///
/// Filling is idempotent: the runs left missing are still too long (or still
/// touch an end) on a second pass.
pub fn interpolate_gaps(values: &mut [Option<f64>], max_gap: usize) -> usize {
    let mut filled = 0;
    let mut last_known: Option<usize> = None;
    let mut i = 0;
    while i < values.len() {
        if values[i].is_some() {
            last_known = Some(i);
            i += 1;
            continue;
        }
        let run_start = i;
        while i < values.len() && values[i].is_none() {
            i += 1;
        }
        let run_len = i - run_start;
        if let (Some(left), true) = (last_known, i < values.len()) {
            if run_len <= max_gap {
                let (Some(y0), Some(y1)) = (values[left], values[i]) else {
                    continue;
                };
                let span = (i - left) as f64;
                for (k, slot) in values[run_start..i].iter_mut().enumerate() {
                    let frac = (run_start + k - left) as f64 / span;
                    *slot = Some(y0 + (y1 - y0) * frac);
                }
                filled += run_len;
            }
        }
    }
    filled
}

/// Applies [`interpolate_gaps`] to every numeric column of `records`.
pub fn fill_numeric_gaps(records: &mut [ObservationRecord], max_gap: usize) -> usize {
    let accessors: [fn(&mut ObservationRecord) -> &mut Option<f64>; 7] = [
        |r| &mut r.tmin,
        |r| &mut r.tmax,
        |r| &mut r.tavg,
        |r| &mut r.precip,
        |r| &mut r.wind_max,
        |r| &mut r.lat,
        |r| &mut r.lon,
    ];
    let mut filled = 0;
    for field in accessors {
        let mut column: Vec<Option<f64>> = records.iter_mut().map(|r| *field(r)).collect();
        filled += interpolate_gaps(&mut column, max_gap);
        for (record, value) in records.iter_mut().zip(column) {
            *field(record) = value;
        }
    }
    filled
}

/// Forward-fills, then backward-fills, the location label.
pub fn fill_location(records: &mut [ObservationRecord]) {
    let mut current: Option<String> = None;
    for record in records.iter_mut() {
        match &record.location {
            Some(label) => current = Some(label.clone()),
            None => record.location = current.clone(),
        }
    }
    let mut current: Option<String> = None;
    for record in records.iter_mut().rev() {
        match &record.location {
            Some(label) => current = Some(label.clone()),
            None => record.location = current.clone(),
        }
    }
}
