//! Seasonal ARIMA(1,1,1)(1,1,1)s fitted by conditional sum of squares.
//!
//! The series is differenced once at lag 1 and once at lag `s`. On that scale
//!
//! ```text
//! (1 - φB)(1 - ΦB^s) w_t = (1 + θB)(1 + ΘB^s) e_t
//! ```
//!
//! Innovations before the first usable observation are taken to be zero.
//! Coefficients are searched in an unconstrained space and mapped through
//! `tanh`, which keeps every fitted coefficient inside (-1, 1).

use crate::models::error::ModelError;
use crate::models::optimize::nelder_mead;
use log::debug;

const MAX_ITERATIONS: usize = 400;
const INITIAL_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SarimaCoefficients {
    pub ar: f64,
    pub ma: f64,
    pub seasonal_ar: f64,
    pub seasonal_ma: f64,
}

impl SarimaCoefficients {
    fn from_unconstrained(x: &[f64]) -> Self {
        Self {
            ar: x[0].tanh(),
            ma: x[1].tanh(),
            seasonal_ar: x[2].tanh(),
            seasonal_ma: x[3].tanh(),
        }
    }

    /// One-step prediction of `w[t]` from everything before `t`.
    fn predict(&self, w: &[f64], e: &[f64], t: usize, s: usize) -> f64 {
        let (phi, theta) = (self.ar, self.ma);
        let (big_phi, big_theta) = (self.seasonal_ar, self.seasonal_ma);
        phi * w[t - 1] + big_phi * w[t - s] - phi * big_phi * w[t - s - 1]
            + theta * e[t - 1]
            + big_theta * e[t - s]
            + theta * big_theta * e[t - s - 1]
    }
}

/// A fitted model together with the history it was fitted on.
#[derive(Debug, Clone)]
pub struct Sarima {
    pub coefficients: SarimaCoefficients,
    pub period: usize,
    /// Conditional sum of squared innovations at the optimum.
    pub css: f64,
    history: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
}

/// `(1 - B)(1 - B^s) y`.
fn difference(y: &[f64], s: usize) -> Vec<f64> {
    (s + 1..y.len())
        .map(|t| y[t] - y[t - 1] - y[t - s] + y[t - s - 1])
        .collect()
}

fn residuals(w: &[f64], coefficients: &SarimaCoefficients, s: usize) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in s + 1..w.len() {
        e[t] = w[t] - coefficients.predict(w, &e, t, s);
    }
    e
}

fn sum_of_squares(e: &[f64], s: usize) -> f64 {
    e.iter().skip(s + 1).map(|v| v * v).sum()
}

impl Sarima {
    /// Smallest training slice accepted for seasonal period `period`.
    pub fn min_train(period: usize) -> usize {
        3 * (period + 1)
    }

    pub fn fit(train: &[f64], period: usize) -> Result<Self, ModelError> {
        let s = period.max(1);
        if train.len() < Self::min_train(s) {
            return Err(ModelError::InsufficientData {
                model: "sarima",
                needed: Self::min_train(s),
                got: train.len(),
            });
        }
        let w = difference(train, s);
        let objective = |x: &[f64]| {
            let coefficients = SarimaCoefficients::from_unconstrained(x);
            sum_of_squares(&residuals(&w, &coefficients, s), s)
        };
        let start = [0.0; 4];
        let tol = 1e-10 * (1.0 + objective(&start));
        let minimum = nelder_mead(objective, &start, INITIAL_STEP, tol, MAX_ITERATIONS);
        let coefficients = SarimaCoefficients::from_unconstrained(&minimum.x);
        debug!(
            "SARIMA fit after {} iterations: {:?}, css {:.4}",
            minimum.iterations, coefficients, minimum.value
        );

        let residuals = residuals(&w, &coefficients, s);
        Ok(Self {
            coefficients,
            period: s,
            css: minimum.value,
            history: train.to_vec(),
            differenced: w,
            residuals,
        })
    }

    /// Forecasts `horizon` values past the end of the training slice.
    ///
    /// Future innovations are zero; forecasts on the differenced scale are
    /// integrated back through `y_t = w_t + y_{t-1} + y_{t-s} - y_{t-s-1}`.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        let s = self.period;
        let mut w = self.differenced.clone();
        let mut e = self.residuals.clone();
        let mut y = self.history.clone();
        for _ in 0..horizon {
            let t = w.len();
            let w_next = self.coefficients.predict(&w, &e, t, s);
            w.push(w_next);
            e.push(0.0);

            let n = y.len();
            y.push(w_next + y[n - 1] + y[n - s] - y[n - s - 1]);
        }
        y.split_off(self.history.len())
    }
}
