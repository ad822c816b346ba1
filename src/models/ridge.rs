//! Ridge regression on lag, rolling and calendar features.

use crate::models::error::ModelError;
use crate::models::linalg::solve;
use crate::preprocess::features::{regressors, LONG_WINDOW, N_REGRESSORS};
use chrono::{Days, NaiveDate};

#[derive(Debug, Clone, PartialEq)]
pub struct Ridge {
    pub alpha: f64,
    pub intercept: f64,
    pub weights: [f64; N_REGRESSORS],
}

impl Ridge {
    /// Smallest training slice accepted: the longest rolling window plus
    /// one more row than there are regressors.
    pub const MIN_TRAIN: usize = LONG_WINDOW + N_REGRESSORS + 1;

    /// Fits on `train`, whose first value falls on `start`.
    ///
    /// The design is centered so the intercept is not penalized.
    pub fn fit(train: &[f64], start: NaiveDate, alpha: f64) -> Result<Self, ModelError> {
        if train.len() < Self::MIN_TRAIN {
            return Err(ModelError::InsufficientData {
                model: "ridge",
                needed: Self::MIN_TRAIN,
                got: train.len(),
            });
        }
        let history: Vec<Option<f64>> = train.iter().copied().map(Some).collect();
        let (rows, targets): (Vec<[f64; N_REGRESSORS]>, Vec<f64>) = (0..train.len())
            .filter_map(|t| {
                let date = start.checked_add_days(Days::new(t as u64))?;
                Some((regressors(&history, t, date)?, train[t]))
            })
            .unzip();

        let count = rows.len() as f64;
        let mut x_mean = [0.0; N_REGRESSORS];
        for row in &rows {
            for (m, v) in x_mean.iter_mut().zip(row) {
                *m += v / count;
            }
        }
        let y_mean = targets.iter().sum::<f64>() / count;

        let mut gram = vec![vec![0.0; N_REGRESSORS]; N_REGRESSORS];
        let mut rhs = vec![0.0; N_REGRESSORS];
        for (row, y) in rows.iter().zip(&targets) {
            let centered: Vec<f64> = row.iter().zip(&x_mean).map(|(v, m)| v - m).collect();
            for i in 0..N_REGRESSORS {
                rhs[i] += centered[i] * (y - y_mean);
                for j in 0..N_REGRESSORS {
                    gram[i][j] += centered[i] * centered[j];
                }
            }
        }
        for (i, row) in gram.iter_mut().enumerate() {
            row[i] += alpha;
        }

        let solution = solve(gram, rhs).ok_or(ModelError::SingularSystem { model: "ridge" })?;
        let mut weights = [0.0; N_REGRESSORS];
        weights.copy_from_slice(&solution);
        let intercept = y_mean - weights.iter().zip(&x_mean).map(|(w, m)| w * m).sum::<f64>();
        Ok(Self {
            alpha,
            intercept,
            weights,
        })
    }

    fn predict_row(&self, row: &[f64; N_REGRESSORS]) -> f64 {
        self.intercept + self.weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>()
    }

    /// Forecasts `horizon` days after `train` recursively: every prediction
    /// becomes history for the lags and rolling windows of the next step.
    pub fn forecast(&self, train: &[f64], start: NaiveDate, horizon: usize) -> Vec<f64> {
        let mut history: Vec<Option<f64>> = train.iter().copied().map(Some).collect();
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let t = history.len();
            let prediction = start
                .checked_add_days(Days::new(t as u64))
                .and_then(|date| regressors(&history, t, date))
                .map(|row| self.predict_row(&row))
                .unwrap_or(f64::NAN);
            history.push(Some(prediction));
            out.push(prediction);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 3, 1).unwrap()
    }

    #[test]
    fn constant_series_is_forecast_exactly() {
        let train = vec![7.5; 80];
        let model = Ridge::fit(&train, start(), 1.0).unwrap();
        for value in model.forecast(&train, start(), 10) {
            assert_abs_diff_eq!(value, 7.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn tracks_a_slowly_varying_series() {
        let train: Vec<f64> = (0..200).map(|t| 10.0 + (t as f64 / 15.0).sin() * 5.0).collect();
        let model = Ridge::fit(&train, start(), 1.0).unwrap();

        let forecast = model.forecast(&train, start(), 3);
        let truth: Vec<f64> = (200..203).map(|t| 10.0 + (t as f64 / 15.0).sin() * 5.0).collect();
        for (f, y) in forecast.iter().zip(truth) {
            assert_abs_diff_eq!(*f, y, epsilon = 0.5);
        }
    }

    #[test]
    fn needs_enough_rows() {
        assert!(matches!(
            Ridge::fit(&[1.0; 39], start(), 1.0),
            Err(ModelError::InsufficientData { needed: 40, .. })
        ));
    }
}
