//! Point forecast error measures.

/// Mean absolute and root mean squared error of a set of forecasts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorMetrics {
    pub mae: f64,
    pub rmse: f64,
    /// Number of forecast points the errors are averaged over.
    pub count: usize,
}

impl ErrorMetrics {
    /// Errors of `predicted` against `actual`, paired by position.
    ///
    /// Returns `None` when there is nothing to compare.
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Option<Self> {
        Self::from_pairs(actual.iter().copied().zip(predicted.iter().copied()))
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let (count, abs_sum, sq_sum) = pairs
            .into_iter()
            .fold((0usize, 0.0, 0.0), |(n, abs, sq), (a, p)| {
                let err = a - p;
                (n + 1, abs + err.abs(), sq + err * err)
            });
        if count == 0 {
            return None;
        }
        let n = count as f64;
        Some(Self {
            mae: abs_sum / n,
            rmse: (sq_sum / n).sqrt(),
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn known_values() {
        let m = ErrorMetrics::evaluate(&[1.0, 2.0, 3.0, 4.0], &[2.0, 2.0, 1.0, 4.0]).unwrap();
        assert_abs_diff_eq!(m.mae, 0.75);
        assert_abs_diff_eq!(m.rmse, (5.0f64 / 4.0).sqrt());
        assert_eq!(m.count, 4);
    }

    #[test]
    fn perfect_forecast_and_empty_input() {
        let m = ErrorMetrics::evaluate(&[3.0, 3.0], &[3.0, 3.0]).unwrap();
        assert_eq!((m.mae, m.rmse), (0.0, 0.0));
        assert!(ErrorMetrics::evaluate(&[], &[]).is_none());
    }

    #[test]
    fn rmse_never_below_mae() {
        let m = ErrorMetrics::evaluate(&[0.0, 0.0, 0.0], &[1.0, -4.0, 0.5]).unwrap();
        assert!(m.rmse >= m.mae);
    }
}
