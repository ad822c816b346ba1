//! Forecasting models.
//!
//! Every model fits on a training slice of daily `tavg` values and returns
//! exactly `horizon` forecasts for the days that follow it.

pub mod baseline;
pub mod error;
pub mod linalg;
pub mod optimize;
pub mod ridge;
pub mod sarima;

use crate::config::BacktestSection;
use crate::models::error::ModelError;
use crate::models::ridge::Ridge;
use crate::models::sarima::Sarima;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    Naive,
    SeasonalNaive,
    Sarima,
    Ridge,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Naive,
        ModelKind::SeasonalNaive,
        ModelKind::Sarima,
        ModelKind::Ridge,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Naive => "naive",
            ModelKind::SeasonalNaive => "seasonal_naive",
            ModelKind::Sarima => "sarima",
            ModelKind::Ridge => "ridge",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown model '{s}'"))
    }
}

/// Hyperparameters shared by every window of a backtest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSettings {
    pub seasonal_period: usize,
    pub sarima_period: usize,
    pub ridge_alpha: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::from(&BacktestSection::default())
    }
}

impl From<&BacktestSection> for ModelSettings {
    fn from(section: &BacktestSection) -> Self {
        Self {
            seasonal_period: section.seasonal_period,
            sarima_period: section.sarima_period,
            ridge_alpha: section.ridge_alpha,
        }
    }
}

/// Fits `kind` on `train` (first value dated `start`) and forecasts the next
/// `horizon` days.
pub fn fit_forecast(
    kind: ModelKind,
    settings: &ModelSettings,
    train: &[f64],
    start: NaiveDate,
    horizon: usize,
) -> Result<Vec<f64>, ModelError> {
    if horizon == 0 {
        return Err(ModelError::ZeroHorizon);
    }
    let forecast = match kind {
        ModelKind::Naive => baseline::naive(train, horizon)?,
        ModelKind::SeasonalNaive => {
            baseline::seasonal_naive(train, horizon, settings.seasonal_period)?
        }
        ModelKind::Sarima => Sarima::fit(train, settings.sarima_period)?.forecast(horizon),
        ModelKind::Ridge => {
            Ridge::fit(train, start, settings.ridge_alpha)?.forecast(train, start, horizon)
        }
    };
    if forecast.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFiniteForecast { model: kind.name() });
    }
    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.to_string().parse::<ModelKind>().unwrap(), kind);
        }
        assert!("arima".parse::<ModelKind>().is_err());
    }

    #[test]
    fn every_model_returns_horizon_finite_values() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let train: Vec<f64> = (0..120)
            .map(|t| 15.0 + 8.0 * (t as f64 / 58.0).sin() + (t % 7) as f64 * 0.3)
            .collect();
        let settings = ModelSettings::default();
        for kind in ModelKind::ALL {
            let forecast = fit_forecast(kind, &settings, &train, start, 7).unwrap();
            assert_eq!(forecast.len(), 7, "{kind}");
            assert!(forecast.iter().all(|v| v.is_finite()), "{kind}");
        }
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert!(matches!(
            fit_forecast(ModelKind::Naive, &ModelSettings::default(), &[1.0], start, 0),
            Err(ModelError::ZeroHorizon)
        ));
    }
}
